use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::align::align_ptr;
use crate::builder::MemoryPoolBuilder;
use crate::list::PointerList;
use crate::system::{Malloc, SystemAllocator};
use crate::PoolError;

pub(crate) const DEFAULT_GROWTH_FACTOR: f32 = 2.0;

/// Measured in chunks, not bytes.
pub(crate) const DEFAULT_INITIAL_CHUNKS: usize = 1024;

/// Bytes at the start of every block that link it into the block list.
const BLOCK_HEADER: usize = size_of::<*mut u8>();

/// Unconsumed tail of the most recently acquired block.
struct Cursor {
  next: NonNull<u8>,
  end: NonNull<u8>,
}

impl Cursor {
  fn remaining(&self) -> usize {
    self.end.addr().get() - self.next.addr().get()
  }
}

/// Chunk count of the next block and the factor it is multiplied by after
/// every acquisition.
#[derive(Debug, Clone, Copy)]
struct Growth {
  chunks: usize,
  factor: f32,
}

impl Growth {
  fn after(
    &self,
    chunks: usize,
  ) -> usize {
    // Float to int casts saturate, so huge counts pin at usize::MAX.
    let grown = (chunks as f64 * f64::from(self.factor)) as usize;

    grown.max(1)
  }

  /// Returns the current chunk count and advances to the next one.
  fn advance(&mut self) -> usize {
    let chunks = self.chunks;
    self.chunks = self.after(chunks);
    chunks
  }
}

pub(crate) fn is_valid_growth_factor(factor: f32) -> bool {
  (1.0..=2.0).contains(&factor)
}

/// A pool of uninitialized, fixed-size chunks for objects of type `T`.
///
/// Chunks are carved out of blocks obtained from a [`SystemAllocator`]. Every
/// new block is `growth_factor` times larger than the previous one, so the
/// number of system allocator calls grows only logarithmically with the number
/// of chunks in use. Deallocated chunks go onto an intrusive free list and are
/// handed out again, most recently freed first, before any new memory is
/// touched. Blocks are returned to the system allocator only when the pool is
/// dropped.
///
/// The pool never constructs or drops a `T`. [`allocate()`][1] returns
/// uninitialized memory and [`deallocate()`][2] takes it back without running
/// any destructor; [`insert()`][3] and [`remove()`][4] pair that with moving a
/// value in and out.
///
/// `T` must be at least pointer-sized, because a free chunk stores the free
/// list link in its own bytes.
///
/// # Examples
///
/// ```
/// use artpool::MemoryPool;
///
/// struct Node {
///     value: u64,
///     next: Option<std::ptr::NonNull<Node>>,
/// }
///
/// let mut pool = MemoryPool::<Node>::new();
///
/// let node = pool.insert(Node { value: 7, next: None }).unwrap();
///
/// // SAFETY: The node came from this pool and was initialized by `insert()`.
/// let node = unsafe { pool.remove(node) };
/// assert_eq!(node.value, 7);
/// ```
///
/// # Thread safety
///
/// The pool is neither `Send` nor `Sync`.
///
/// [1]: Self::allocate
/// [2]: Self::deallocate
/// [3]: Self::insert
/// [4]: Self::remove
pub struct MemoryPool<T, A: SystemAllocator = Malloc> {
  /// Every block ever acquired, released on drop.
  blocks: PointerList,

  /// Chunks that were deallocated or reserved and not handed out since.
  chunks: PointerList,

  /// `None` until the first block is carved from.
  cursor: Option<Cursor>,

  growth: Growth,

  system: A,

  _item: PhantomData<*mut T>,
}

impl<T> MemoryPool<T> {
  /// Creates a pool backed by `malloc` that doubles its block size on every
  /// acquisition, starting at 1024 chunks.
  ///
  /// No memory is acquired until the first allocation or reservation.
  ///
  /// # Panics
  ///
  /// Panics if `T` is smaller than a pointer.
  #[must_use]
  pub fn new() -> Self {
    Self::with_growth_factor(DEFAULT_GROWTH_FACTOR)
  }

  /// Creates a pool backed by `malloc` with a custom growth factor.
  ///
  /// # Panics
  ///
  /// Panics if `factor` is outside `[1.0, 2.0]` or `T` is smaller than a pointer.
  #[must_use]
  pub fn with_growth_factor(factor: f32) -> Self {
    assert!(
      is_valid_growth_factor(factor),
      "growth factor {factor} is outside [1.0, 2.0]"
    );

    Self::new_inner(factor, DEFAULT_INITIAL_CHUNKS, Malloc)
  }

  /// Starts configuring a pool.
  pub fn builder() -> MemoryPoolBuilder<T> {
    MemoryPoolBuilder::new()
  }
}

impl<T> Default for MemoryPool<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, A: SystemAllocator> MemoryPool<T, A> {
  pub(crate) fn new_inner(
    factor: f32,
    initial_chunks: usize,
    system: A,
  ) -> Self {
    assert!(
      size_of::<T>() >= size_of::<*mut u8>(),
      "{} is {} bytes, a pooled type must be at least pointer-sized",
      type_name::<T>(),
      size_of::<T>()
    );
    debug_assert!(is_valid_growth_factor(factor));
    debug_assert!(initial_chunks > 0);

    Self {
      blocks: PointerList::new(),
      chunks: PointerList::new(),
      cursor: None,
      growth: Growth {
        chunks: initial_chunks,
        factor,
      },
      system,
      _item: PhantomData,
    }
  }

  /// Hands out an uninitialized chunk for one `T`.
  ///
  /// The most recently deallocated chunk is reused first. Otherwise the chunk
  /// is carved from the current block, and only when that is exhausted is a
  /// new block acquired from the system allocator.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::OutOfMemory`] if a new block was needed and the
  /// system allocator could not provide it. The pool stays usable.
  pub fn allocate(&mut self) -> Result<NonNull<T>, PoolError> {
    if let Some(chunk) = self.chunks.pop() {
      return Ok(chunk.cast());
    }

    if let Some(chunk) = self.carve() {
      return Ok(chunk);
    }

    let chunks = self.growth.advance();
    let first = self.acquire_block(chunks)?;

    // SAFETY: The block holds `chunks >= 1` chunks starting at `first`.
    let (next, end) = unsafe { (first.add(size_of::<T>()), first.add(chunks * size_of::<T>())) };
    self.cursor = Some(Cursor { next, end });

    Ok(first.cast())
  }

  /// Returns a chunk to the pool for reuse. The value in it is not dropped.
  ///
  /// # Safety
  ///
  /// `chunk` must have been returned by [`allocate()`][Self::allocate] (or
  /// [`insert()`][Self::insert]) on this pool and must not have been
  /// deallocated since. Deallocating a chunk twice or deallocating a foreign
  /// pointer corrupts the free list.
  pub unsafe fn deallocate(
    &mut self,
    chunk: NonNull<T>,
  ) {
    debug_assert_eq!(
      chunk.addr().get() % align_of::<T>(),
      0,
      "misaligned chunk cannot have come from this pool"
    );

    // SAFETY: The chunk is at least pointer-sized and, per the caller, free.
    unsafe { self.chunks.push(chunk.cast()) };
  }

  /// Acquires one block sized for exactly `n` chunks and puts all of them on
  /// the free list, so the next `n` allocations need no system allocator call.
  ///
  /// Later blocks grow from `n`, not from the size the pool would otherwise
  /// have requested next.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::ZeroReservation`] if `n` is zero and
  /// [`PoolError::OutOfMemory`] if the block could not be acquired. In both
  /// cases the pool is left exactly as it was.
  pub fn reserve(
    &mut self,
    n: usize,
  ) -> Result<(), PoolError> {
    if n == 0 {
      return Err(PoolError::ZeroReservation);
    }

    let first = self.acquire_block(n)?;

    // Pushed back to front so that allocation walks the block upwards.
    for index in (0..n).rev() {
      // SAFETY: The block holds `n` chunks starting at `first`, none of which
      // has been handed out.
      unsafe { self.chunks.push(first.add(index * size_of::<T>())) };
    }

    self.growth.chunks = self.growth.after(n);

    Ok(())
  }

  /// Allocates a chunk and moves `value` into it.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::OutOfMemory`] under the same conditions as
  /// [`allocate()`][Self::allocate]; `value` is dropped in that case.
  pub fn insert(
    &mut self,
    value: T,
  ) -> Result<NonNull<T>, PoolError> {
    let chunk = self.allocate()?;

    // SAFETY: Freshly allocated chunks are valid, aligned and unused.
    unsafe { chunk.write(value) };

    Ok(chunk)
  }

  /// Moves the value out of `chunk` and deallocates the chunk.
  ///
  /// # Safety
  ///
  /// Same as [`deallocate()`][Self::deallocate], and the chunk must hold an
  /// initialized `T`.
  pub unsafe fn remove(
    &mut self,
    chunk: NonNull<T>,
  ) -> T {
    // SAFETY: The caller guarantees the chunk holds an initialized value.
    let value = unsafe { chunk.read() };

    // SAFETY: Forwarded from the caller.
    unsafe { self.deallocate(chunk) };

    value
  }

  /// Number of blocks acquired from the system allocator so far.
  #[must_use]
  pub fn block_count(&self) -> usize {
    self.blocks.len()
  }

  /// Number of chunks waiting on the free list.
  ///
  /// Chunks not yet carved from the current block are not counted.
  #[must_use]
  pub fn free_chunks(&self) -> usize {
    self.chunks.len()
  }

  /// Chunk count the next acquired block will be sized for.
  #[must_use]
  pub fn next_block_chunks(&self) -> usize {
    self.growth.chunks
  }

  #[must_use]
  pub fn growth_factor(&self) -> f32 {
    self.growth.factor
  }

  /// The system allocator that backs this pool.
  #[must_use]
  pub fn system_allocator(&self) -> &A {
    &self.system
  }

  fn carve(&mut self) -> Option<NonNull<T>> {
    let cursor = self.cursor.as_mut()?;

    if cursor.remaining() < size_of::<T>() {
      return None;
    }

    let chunk = cursor.next;

    // SAFETY: At least one chunk remains before `end`, so this stays in bounds.
    cursor.next = unsafe { chunk.add(size_of::<T>()) };

    Some(chunk.cast())
  }

  /// Acquires a block for `chunks` chunks, links it into the block list and
  /// returns the first aligned chunk address in it.
  ///
  /// Leaves the pool untouched on failure.
  fn acquire_block(
    &mut self,
    chunks: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    let bytes = Self::block_bytes(chunks).ok_or(PoolError::OutOfMemory { bytes: usize::MAX })?;

    let Some(block) = self.system.acquire(bytes) else {
      warn!(
        bytes,
        chunks,
        item = type_name::<T>(),
        "system allocator could not provide a pool block"
      );
      return Err(PoolError::OutOfMemory { bytes });
    };

    // SAFETY: The block is at least BLOCK_HEADER bytes, pointer-aligned and
    // freshly acquired, so its first bytes are free to hold the link.
    unsafe { self.blocks.push(block) };

    debug!(
      bytes,
      chunks,
      blocks = self.blocks.len(),
      item = type_name::<T>(),
      "acquired pool block"
    );

    // SAFETY: The block reserves BLOCK_HEADER bytes plus align_of::<T>() bytes
    // of slack, so the aligned start lies inside it with room for `chunks`
    // chunks behind it.
    Ok(unsafe { align_ptr(block.add(BLOCK_HEADER), align_of::<T>()) })
  }

  /// Header, alignment slack and `chunks` chunks, or `None` on overflow.
  fn block_bytes(chunks: usize) -> Option<usize> {
    chunks
      .checked_mul(size_of::<T>())?
      .checked_add(align_of::<T>())?
      .checked_add(BLOCK_HEADER)
  }
}

impl<T, A: SystemAllocator> Drop for MemoryPool<T, A> {
  fn drop(&mut self) {
    if self.blocks.is_empty() {
      return;
    }

    let released = self.blocks.len();

    while let Some(block) = self.blocks.pop() {
      // SAFETY: Each block is listed exactly once and was acquired from
      // `self.system`. Its header is read by `pop()` before the release.
      unsafe { self.system.release(block) };
    }

    trace!(released, item = type_name::<T>(), "released pool blocks");
  }
}

impl<T, A: SystemAllocator> fmt::Debug for MemoryPool<T, A> {
  #[cfg_attr(test, mutants::skip)] // No API contract to test.
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("MemoryPool")
      .field("item_type", &format_args!("{}", type_name::<T>()))
      .field("blocks", &self.blocks.len())
      .field("free_chunks", &self.chunks.len())
      .field(
        "carvable_chunks",
        &self
          .cursor
          .as_ref()
          .map_or(0, |cursor| cursor.remaining() / size_of::<T>()),
      )
      .field("growth", &self.growth)
      .finish_non_exhaustive()
  }
}
