use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;

use crate::pool::{DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_CHUNKS, is_valid_growth_factor};
use crate::{Malloc, MemoryPool, PoolError, SystemAllocator};

/// Builder for a [`MemoryPool`] with non-default configuration.
///
/// The defaults used by [`MemoryPool::new()`] are a growth factor of 2.0 and a
/// first block of 1024 chunks.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use artpool::MemoryPool;
///
/// let pool = MemoryPool::<u64>::builder()
///   .growth_factor(1.5)
///   .initial_chunks(NonZeroUsize::new(64).unwrap())
///   .build()
///   .unwrap();
///
/// assert_eq!(pool.next_block_chunks(), 64);
/// ```
#[must_use]
pub struct MemoryPoolBuilder<T> {
  growth_factor: f32,
  initial_chunks: usize,

  _item: PhantomData<T>,
}

impl<T> fmt::Debug for MemoryPoolBuilder<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("MemoryPoolBuilder")
      .field("item_type", &format_args!("{}", type_name::<T>()))
      .field("growth_factor", &self.growth_factor)
      .field("initial_chunks", &self.initial_chunks)
      .finish()
  }
}

impl<T> MemoryPoolBuilder<T> {
  pub(crate) fn new() -> Self {
    Self {
      growth_factor: DEFAULT_GROWTH_FACTOR,
      initial_chunks: DEFAULT_INITIAL_CHUNKS,
      _item: PhantomData,
    }
  }

  /// Multiplier applied to the block size after every block acquisition.
  /// Must lie in `[1.0, 2.0]`; checked by [`build()`][Self::build].
  pub fn growth_factor(
    mut self,
    factor: f32,
  ) -> Self {
    self.growth_factor = factor;
    self
  }

  /// Number of chunks the first block is sized for.
  pub fn initial_chunks(
    mut self,
    chunks: NonZeroUsize,
  ) -> Self {
    self.initial_chunks = chunks.get();
    self
  }

  /// Builds a pool backed by `malloc`.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::InvalidGrowthFactor`] if the growth factor is
  /// outside `[1.0, 2.0]`.
  ///
  /// # Panics
  ///
  /// Panics if `T` is smaller than a pointer.
  pub fn build(self) -> Result<MemoryPool<T>, PoolError> {
    self.build_in(Malloc)
  }

  /// Builds a pool that takes its blocks from `system`.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::InvalidGrowthFactor`] if the growth factor is
  /// outside `[1.0, 2.0]`.
  ///
  /// # Panics
  ///
  /// Panics if `T` is smaller than a pointer.
  pub fn build_in<A: SystemAllocator>(
    self,
    system: A,
  ) -> Result<MemoryPool<T, A>, PoolError> {
    if !is_valid_growth_factor(self.growth_factor) {
      return Err(PoolError::InvalidGrowthFactor(self.growth_factor));
    }

    Ok(MemoryPool::new_inner(
      self.growth_factor,
      self.initial_chunks,
      system,
    ))
  }
}
