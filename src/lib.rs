//! # artpool - A Fixed-Size Object Memory Pool
//!
//! This crate provides a **memory pool** for objects of one type: every chunk
//! it hands out has exactly the size and alignment of `T`. It replaces a
//! stream of small, short-lived heap allocations (tree nodes, graph vertices)
//! with O(1) allocation and deallocation and a handful of large allocations
//! from the system.
//!
//! ## Overview
//!
//! ```text
//!   Block (one system allocation):
//!
//!   ┌────────┬───────┬─────────┬─────────┬─────────┬──────────────────────┐
//!   │ header │ slack │ chunk 0 │ chunk 1 │ chunk 2 │   not yet carved     │
//!   └────────┴───────┴─────────┴─────────┴─────────┴──────────────────────┘
//!       │                                          ▲                      ▲
//!       │                                          │                      │
//!       └── next block                          cursor                   end
//!
//!   Blocks grow geometrically: 1024, 2048, 4096, ... chunks.
//! ```
//!
//! Allocation tries three sources in order:
//!
//! 1. the free list of previously deallocated chunks (most recent first),
//! 2. the uncarved tail of the current block,
//! 3. a new block from the [`SystemAllocator`].
//!
//! Both the list of blocks and the list of free chunks are intrusive: a link
//! lives in the first pointer-sized bytes of the block or chunk it tracks, so
//! bookkeeping costs no extra allocations. This is why `T` must be at least
//! pointer-sized.
//!
//! ## Crate Structure
//!
//! ```text
//!   artpool
//!   ├── align      - Alignment helpers (align_to!, align_up)
//!   ├── builder    - MemoryPoolBuilder configuration
//!   ├── error      - PoolError
//!   ├── list       - Intrusive pointer list (internal)
//!   ├── pool       - MemoryPool implementation
//!   └── system     - SystemAllocator trait and the malloc backend
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use artpool::MemoryPool;
//!
//! let mut pool = MemoryPool::<u64>::new();
//!
//! let a = pool.allocate().unwrap();
//! let b = pool.allocate().unwrap();
//!
//! unsafe {
//!   a.write(1);
//!   b.write(2);
//!
//!   pool.deallocate(a);
//! }
//!
//! // The freed chunk is the first one to be reused.
//! assert_eq!(pool.allocate().unwrap(), a);
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the pool is neither `Send` nor `Sync`
//! - **One size**: a pool serves exactly one type
//! - **No shrinking**: blocks go back to the system only when the pool drops
//! - **No destructors**: values still in the pool when it drops are leaked,
//!   not dropped
//!
//! ## Safety
//!
//! Allocation is safe and fallible. Handing a chunk back is `unsafe`: the pool
//! cannot cheaply tell a double free or a foreign pointer apart from a valid
//! chunk, and either one corrupts the free list.

pub mod align;
mod builder;
mod error;
mod list;
mod pool;
mod system;

pub use builder::MemoryPoolBuilder;
pub use error::PoolError;
pub use pool::MemoryPool;
pub use system::{Malloc, SystemAllocator};
