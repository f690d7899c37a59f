use std::ptr::{self, NonNull};

/// Link stored in the first pointer-sized bytes of a region while it is listed.
struct Link {
  next: *mut Link,
}

/// Singly-linked LIFO list of raw memory regions.
///
/// The list allocates nothing: each region stores its own `next` link in its
/// first pointer-sized bytes. Those bytes belong to the list for as long as
/// the region is listed, and to the region's owner again once it is popped.
pub(crate) struct PointerList {
  head: *mut Link,
  len: usize,
}

impl PointerList {
  pub(crate) const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
      len: 0,
    }
  }

  /// Links `region` in as the new head.
  ///
  /// # Safety
  ///
  /// `region` must be valid for writes of a pointer and not already present in
  /// this or any other list. No particular alignment is required.
  pub(crate) unsafe fn push(
    &mut self,
    region: NonNull<u8>,
  ) {
    let link = region.cast::<Link>().as_ptr();

    // SAFETY: The caller guarantees the region can hold a link. Chunks of
    // byte-aligned types are not pointer-aligned, hence the unaligned write.
    unsafe { link.write_unaligned(Link { next: self.head }) };

    self.head = link;
    self.len += 1;
  }

  /// Unlinks and returns the most recently pushed region.
  pub(crate) fn pop(&mut self) -> Option<NonNull<u8>> {
    let head = NonNull::new(self.head)?;

    // SAFETY: Every listed region was written with a link in `push` and has
    // not been handed back out since.
    self.head = unsafe { head.as_ptr().read_unaligned().next };
    self.len -= 1;

    Some(head.cast())
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.head.is_null()
  }

  pub(crate) fn len(&self) -> usize {
    self.len
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lifo() {
    let mut slots = [0usize; 4];
    let mut list = PointerList::new();

    assert!(list.is_empty());
    assert_eq!(list.pop(), None);

    let regions: Vec<NonNull<u8>> = slots
      .iter_mut()
      .map(|slot| NonNull::from(slot).cast())
      .collect();

    for region in &regions {
      // SAFETY: Each slot is a distinct, pointer-sized usize.
      unsafe { list.push(*region) };
    }

    assert_eq!(list.len(), 4);
    assert!(!list.is_empty());

    for region in regions.iter().rev() {
      assert_eq!(list.pop(), Some(*region));
    }

    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert_eq!(list.pop(), None);
  }

  #[test]
  fn test_unaligned_regions() {
    let mut bytes = [0u8; 3 * size_of::<usize>() + 1];
    let base = NonNull::new(bytes.as_mut_ptr()).unwrap();
    let mut list = PointerList::new();

    // SAFETY: Offsets 1 and 1 + usize each leave a pointer's worth of bytes.
    let (first, second) = unsafe { (base.add(1), base.add(1 + size_of::<usize>())) };

    // SAFETY: Both regions fit inside the buffer and do not overlap.
    unsafe {
      list.push(first);
      list.push(second);
    }

    assert_eq!(list.pop(), Some(second));
    assert_eq!(list.pop(), Some(first));
    assert_eq!(list.pop(), None);
  }

  #[test]
  fn test_reuse_after_pop() {
    let mut slot = 0usize;
    let region = NonNull::from(&mut slot).cast::<u8>();
    let mut list = PointerList::new();

    // SAFETY: The slot is pointer-sized and only listed once at a time.
    unsafe { list.push(region) };
    assert_eq!(list.pop(), Some(region));

    // SAFETY: Popped above, so it may be listed again.
    unsafe { list.push(region) };
    assert_eq!(list.len(), 1);
    assert_eq!(list.pop(), Some(region));
  }
}
