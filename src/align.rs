use std::ptr::NonNull;

/// Rounds `$value` up to the next multiple of `$align`.
///
/// `$align` must be a power of two. The expression is usable in constant
/// contexts.
///
/// # Examples
///
/// ```rust
/// use artpool::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(1, 64), 64);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Returns the smallest address `>= addr` that is a multiple of `alignment`.
///
/// Debug builds assert that `alignment` is a power of two; in release builds a
/// non-power-of-two alignment produces a meaningless result.
#[inline]
pub fn align_up(
  addr: usize,
  alignment: usize,
) -> usize {
  debug_assert!(
    alignment.is_power_of_two(),
    "alignment {alignment} is not a power of two"
  );

  align_to!(addr, alignment)
}

/// Advances `ptr` forward to the next `alignment` boundary, keeping provenance.
///
/// # Safety
///
/// The aligned address must still lie inside the allocation `ptr` points into.
#[inline]
pub(crate) unsafe fn align_ptr(
  ptr: NonNull<u8>,
  alignment: usize,
) -> NonNull<u8> {
  let offset = align_up(ptr.addr().get(), alignment) - ptr.addr().get();

  // SAFETY: The caller guarantees the aligned address is in bounds.
  unsafe { ptr.add(offset) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_up() {
    for shift in 0..=6 {
      let alignment = 1usize << shift;

      for addr in 0..512 {
        let aligned = align_up(addr, alignment);

        assert_eq!(aligned % alignment, 0);
        assert!(aligned >= addr);
        assert!(aligned - addr < alignment);
      }
    }
  }

  #[test]
  fn test_aligned_input_is_unchanged() {
    assert_eq!(align_up(0, 16), 0);
    assert_eq!(align_up(64, 16), 64);
    assert_eq!(align_up(4096, 4096), 4096);
  }

  #[test]
  fn test_align_ptr() {
    let mut buffer = [0u8; 256];
    let base = NonNull::new(buffer.as_mut_ptr()).unwrap();

    for alignment in [1, 2, 4, 8, 16, 32, 64] {
      // SAFETY: At most 63 bytes forward, well inside the 256 byte buffer.
      let aligned = unsafe { align_ptr(base, alignment) };

      assert_eq!(aligned.addr().get() % alignment, 0);
      assert!(aligned >= base);
    }
  }

  #[test]
  #[should_panic(expected = "not a power of two")]
  #[cfg(debug_assertions)]
  fn test_rejects_non_power_of_two() {
    align_up(10, 12);
  }
}
