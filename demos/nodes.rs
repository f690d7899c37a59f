use std::ptr::NonNull;

use artpool::MemoryPool;

/// A singly-linked list node, the kind of short-lived object a pool is for.
struct Node {
  value: u64,
  next: Option<NonNull<Node>>,
}

fn main() {
  // Block acquisitions are logged at debug level, teardown at trace level.
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::TRACE)
    .init();

  let mut pool = MemoryPool::<Node>::builder()
    .growth_factor(2.0)
    .initial_chunks(std::num::NonZeroUsize::new(8).expect("8 is not zero"))
    .build()
    .expect("2.0 is a valid growth factor");

  // --------------------------------------------------------------------
  // 1) Build a list of 100 nodes. Blocks of 8, 16, 32 and 64 chunks are
  //    acquired along the way.
  // --------------------------------------------------------------------
  let mut head: Option<NonNull<Node>> = None;

  for value in 0..100 {
    head = Some(pool.insert(Node { value, next: head }).expect("out of memory"));
  }

  println!("[1] 100 nodes in {} blocks", pool.block_count());

  // --------------------------------------------------------------------
  // 2) Tear the list down. Every node goes back onto the free list.
  // --------------------------------------------------------------------
  let mut sum = 0;

  while let Some(node) = head {
    // SAFETY: Every node was initialized by `insert()` and is removed once.
    let node = unsafe { pool.remove(node) };
    sum += node.value;
    head = node.next;
  }

  println!("[2] sum = {sum}, free chunks = {}", pool.free_chunks());

  // --------------------------------------------------------------------
  // 3) Build it again. The free list serves everything, no new blocks.
  // --------------------------------------------------------------------
  for value in 0..100 {
    head = Some(pool.insert(Node { value, next: head }).expect("out of memory"));
  }

  println!("[3] 100 nodes again, still {} blocks", pool.block_count());

  // --------------------------------------------------------------------
  // 4) Reserve room for a burst up front.
  // --------------------------------------------------------------------
  pool.reserve(1000).expect("out of memory");

  println!(
    "[4] reserved 1000, free chunks = {}, next block = {} chunks",
    pool.free_chunks(),
    pool.next_block_chunks()
  );

  println!("{pool:?}");
}
