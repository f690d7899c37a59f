use thiserror::Error;

/// Failures reported by [`MemoryPool`](crate::MemoryPool) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PoolError {
  /// The system allocator could not provide a block of `bytes` bytes, or the
  /// block size does not fit in the address space.
  #[error("system allocator could not provide a block of {bytes} bytes")]
  OutOfMemory { bytes: usize },

  /// `reserve(0)` was requested.
  #[error("cannot reserve zero chunks")]
  ZeroReservation,

  /// The growth factor lies outside `[1.0, 2.0]`.
  #[error("growth factor {0} is outside [1.0, 2.0]")]
  InvalidGrowthFactor(f32),
}
