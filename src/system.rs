use std::ptr::NonNull;

use libc::{c_void, free, malloc};

/// Source of raw blocks for a [`MemoryPool`](crate::MemoryPool).
///
/// Implementations hand out regions of at least the requested size, aligned to
/// at least pointer alignment. The pool calls [`release`](Self::release)
/// exactly once for each region it acquired, when the pool is dropped.
pub trait SystemAllocator {
  /// Acquires `size` bytes, or returns `None` if the request cannot be met.
  fn acquire(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>>;

  /// Returns a region to the system.
  ///
  /// # Safety
  ///
  /// `block` must have come from [`acquire`](Self::acquire) on this allocator
  /// and must not have been released before.
  unsafe fn release(
    &mut self,
    block: NonNull<u8>,
  );
}

/// The C heap, via `malloc(3)` and `free(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Malloc;

impl SystemAllocator for Malloc {
  fn acquire(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    // SAFETY: malloc has no preconditions; a null result means failure.
    NonNull::new(unsafe { malloc(size) }.cast::<u8>())
  }

  unsafe fn release(
    &mut self,
    block: NonNull<u8>,
  ) {
    // SAFETY: The caller guarantees the block came from malloc exactly once.
    unsafe { free(block.as_ptr().cast::<c_void>()) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_malloc_round_trip() {
    let mut system = Malloc;

    let block = system.acquire(128).expect("128 bytes must be available");

    assert_eq!(block.addr().get() % align_of::<usize>(), 0);

    // SAFETY: The block is 128 bytes long.
    unsafe {
      block.as_ptr().write_bytes(0xAB, 128);
      assert_eq!(*block.as_ptr().add(127), 0xAB);
      system.release(block);
    }
  }

  #[test]
  fn test_malloc_reports_exhaustion() {
    assert_eq!(Malloc.acquire(usize::MAX), None);
  }
}
