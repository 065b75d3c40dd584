//! A first-fit allocator managing a single fixed-size simulated heap.
//!
//! A [`Heap`] owns one contiguous region of bytes. The region is carved into
//! blocks, each made of a fixed size header followed by its payload, and the
//! headers form a singly linked list in address order:
//!
//! ```text
//!   ┌────────┬──────────┬────────┬───────┬────────┬───────────────────┐
//!   │ header │ payload  │ header │payload│ header │      payload      │
//!   │ U  40  │          │ F  24  │       │ U  8   │                   │
//!   └────────┴──────────┴────────┴───────┴────────┴───────────────────┘
//!   0        16         56               96
//! ```
//!
//! Allocation coalesces adjacent free blocks, then takes the first free block
//! that either fits the request exactly or can be split into the request plus
//! a new free block. Freeing only flips a block back to free; merging is left
//! to the next allocation.
//!
//! ```rust
//! use heapsim::{FreeError, Heap, HeapConfig};
//!
//! let mut heap = Heap::new(HeapConfig::with_capacity(128)).unwrap();
//!
//! let a = heap.allocate(40).unwrap();
//! let b = heap.allocate(40).unwrap();
//!
//! heap.free(a.as_ptr()).unwrap();
//! assert_eq!(heap.free(a.as_ptr()), Err(FreeError::DoubleFree));
//! assert_eq!(heap.free(b.as_ptr().wrapping_add(1)), Err(FreeError::InvalidPointer));
//!
//! for entry in heap.dump_chain() {
//!     println!("{} {} {}", entry.offset, entry.status, entry.length);
//! }
//! ```
//!
//! A `Heap` is not thread safe. Enable the `multi_threaded` feature for
//! `LockedHeap`, which serializes every operation behind a mutex.

mod arena;
mod chain;
mod config;
mod constants;
mod debug;
mod error;
mod header;
mod heap;
mod metrics;
#[cfg(feature = "multi_threaded")]
mod sync;
pub mod workload;

pub use config::{HeapConfig, HEAP_CONFIG_DEFAULT_CAPACITY};
pub use constants::HEADER_SIZE;
pub use debug::{ChainEntry, ChainReport, MemoryReport};
pub use error::{AllocError, BuildError, FreeError};
pub use header::Status;
pub use heap::Heap;
pub use metrics::HeapMetrics;
#[cfg(feature = "multi_threaded")]
pub use sync::LockedHeap;

#[cfg(test)]
mod test;
