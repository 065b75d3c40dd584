use super::arena::Arena;
use super::chain::{BlockChain, Fit};
use super::config::HeapConfig;
use super::constants::HEADER_SIZE;
use super::debug::{self, ChainEntry, ChainReport, MemoryReport};
use super::error::{AllocError, BuildError, FreeError};
use super::header::Status;
use super::metrics::{HeapMetrics, Metrics};
use log::{debug, log_enabled, trace, warn, Level};
use std::panic::Location;
use std::ptr::NonNull;

/// A first-fit allocator over a single fixed-size region.
///
/// The region is split into blocks, each a [`HEADER_SIZE`] byte header
/// followed by its payload. Freed blocks are not merged straight away; every
/// allocation first coalesces adjacent free blocks and then takes the first
/// block, in address order, that can hold the request.
///
/// ```rust
/// use heapsim::{AllocError, Heap, HeapConfig};
///
/// let mut heap = Heap::new(HeapConfig::default()).unwrap();
/// let ptr = heap.allocate(100).unwrap();
///
/// heap.free(ptr.as_ptr()).unwrap();
/// assert_eq!(heap.allocate(0), Err(AllocError::InvalidSize));
/// ```
pub struct Heap {
    chain: BlockChain,
    metrics: Metrics,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Result<Self, BuildError> {
        config.validate()?;

        Ok(Self {
            chain: BlockChain::new(Arena::new(config.capacity)?),
            metrics: Metrics::default(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.chain.capacity()
    }

    /// Address of the first byte of the managed region.
    pub fn base(&self) -> *const u8 {
        self.chain.arena().as_ptr()
    }

    /// Returns a pointer to `size` usable bytes.
    ///
    /// On failure the block chain is left as it was, except that adjacent
    /// free blocks may have been coalesced.
    #[track_caller]
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let caller = Location::caller();

        match self.try_allocate(size) {
            Ok(ptr) => {
                self.metrics.allocations += 1;
                debug!("allocated {size} bytes at {ptr:?} ({caller})");
                self.trace_chain();

                Ok(ptr)
            }
            Err(err) => {
                self.metrics.failed_allocations += 1;
                warn!("allocation error: {err} ({caller})");

                Err(err)
            }
        }
    }

    fn try_allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let capacity = self.capacity();

        if size == 0 {
            return Err(AllocError::InvalidSize);
        }

        if size >= capacity {
            return Err(AllocError::TooLarge {
                requested: size,
                capacity,
            });
        }

        self.chain.init();
        self.coalesce();

        let offset = match self.chain.find_fit(size) {
            Some(Fit::Exact(offset)) => {
                self.chain.set_status(offset, Status::Used);
                offset
            }
            Some(Fit::Split(offset)) => {
                let remainder = self.chain.split(offset, size);

                self.metrics.splits += 1;
                trace!("split block at {offset}, free remainder at {remainder}");
                offset
            }
            None => return Err(AllocError::OutOfMemory { requested: size }),
        };

        Ok(self.chain.arena().at_offset(offset + HEADER_SIZE))
    }

    fn coalesce(&mut self) {
        let merged = self.chain.coalesce();

        self.metrics.coalesce_passes += 1;
        self.metrics.merges += merged as u64;

        if merged > 0 {
            trace!("coalesced {merged} free blocks");
        }
    }

    /// Releases the block whose payload starts at `ptr`.
    ///
    /// Only the exact pointer returned by [`Heap::allocate`] is recognized; an
    /// address inside a payload is rejected. The freed block is merged with
    /// its free neighbors on the next allocation, not here.
    #[track_caller]
    pub fn free(&mut self, ptr: *const u8) -> Result<(), FreeError> {
        let caller = Location::caller();

        match self.try_free(ptr) {
            Ok(offset) => {
                self.metrics.frees += 1;
                debug!("freed block at {offset} ({caller})");
                self.trace_chain();

                Ok(())
            }
            Err(err) => {
                self.metrics.failed_frees += 1;
                warn!("free error: {err} at {ptr:?} ({caller})");

                Err(err)
            }
        }
    }

    fn try_free(&mut self, ptr: *const u8) -> Result<usize, FreeError> {
        if !self.chain.is_initialized() {
            return Err(FreeError::InvalidPointer);
        }

        let payload_offset = self
            .chain
            .arena()
            .offset_of(ptr)
            .ok_or(FreeError::OutOfBounds)?;

        let (offset, header) = self
            .chain
            .find_payload(payload_offset)
            .ok_or(FreeError::InvalidPointer)?;

        match header.status {
            Status::Used => {
                self.chain.set_status(offset, Status::Free);
                Ok(offset)
            }
            Status::Free => Err(FreeError::DoubleFree),
        }
    }

    pub fn metrics(&self) -> HeapMetrics {
        HeapMetrics::new(&self.metrics, &self.chain)
    }

    /// The block chain in address order. Empty until the first allocation.
    pub fn dump_chain(&self) -> Vec<ChainEntry> {
        debug::dump_chain(&self.chain)
    }

    pub fn dump_arena_bytes(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.chain.arena().bytes().iter().copied().enumerate()
    }

    pub fn chain_report(&self) -> ChainReport {
        ChainReport::new(&self.chain)
    }

    pub fn memory_report(&self) -> MemoryReport<'_> {
        MemoryReport::new(self.chain.arena().bytes())
    }

    fn trace_chain(&self) {
        if log_enabled!(Level::Trace) {
            trace!("{}", self.chain_report());
        }
    }
}
