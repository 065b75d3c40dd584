use super::config::HeapConfig;
use super::debug::ChainEntry;
use super::error::{AllocError, BuildError, FreeError};
use super::heap::Heap;
use super::metrics::HeapMetrics;
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard};

/// A [`Heap`] behind a mutex, for sharing between threads.
///
/// Each call holds the lock for the whole operation, so the coalescing pass
/// and the search that follows it in `allocate` can never interleave with
/// another thread's `free`.
pub struct LockedHeap {
    heap: Mutex<Heap>,
}

impl LockedHeap {
    pub fn new(config: HeapConfig) -> Result<Self, BuildError> {
        Ok(Self {
            heap: Mutex::new(Heap::new(config)?),
        })
    }

    #[track_caller]
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.lock().allocate(size)
    }

    #[track_caller]
    pub fn free(&self, ptr: *const u8) -> Result<(), FreeError> {
        self.lock().free(ptr)
    }

    pub fn metrics(&self) -> HeapMetrics {
        self.lock().metrics()
    }

    pub fn dump_chain(&self) -> Vec<ChainEntry> {
        self.lock().dump_chain()
    }

    /// Runs `f` with exclusive access to the underlying heap.
    pub fn with<R>(&self, f: impl FnOnce(&mut Heap) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn into_inner(self) -> Heap {
        self.heap
            .into_inner()
            .expect("a thread panicked while holding the heap lock")
    }

    fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap
            .lock()
            .expect("a thread panicked while holding the heap lock")
    }
}
