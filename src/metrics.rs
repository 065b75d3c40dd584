use super::chain::BlockChain;

/// Running counters of allocator activity, owned by a heap.
#[derive(Copy, Clone, Debug, Default)]
pub struct Metrics {
    pub allocations: u64,
    pub failed_allocations: u64,
    pub frees: u64,
    pub failed_frees: u64,
    pub splits: u64,
    pub merges: u64,
    pub coalesce_passes: u64,
}

/// A 'snapshot' of a heap's activity counters and the current shape of its
/// block chain.
///
/// Obtained by calling [`crate::Heap::metrics`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapMetrics {
    /// Allocations that returned a pointer.
    pub allocations: u64,

    /// Allocations that reported an error, including rejected sizes.
    pub failed_allocations: u64,

    /// Frees that released a block.
    pub frees: u64,

    /// Frees that reported an error.
    pub failed_frees: u64,

    /// Number of times a free block was split to satisfy an allocation.
    pub splits: u64,

    /// Number of headers absorbed by coalescing.
    pub merges: u64,

    /// Number of coalescing passes, one per allocation that passed validation.
    pub coalesce_passes: u64,

    /// Headers currently in the chain, zero before the first allocation.
    pub blocks: usize,
    pub used_blocks: usize,
    pub free_blocks: usize,

    /// Payload bytes held by used blocks.
    pub used_bytes: usize,

    /// Payload bytes held by free blocks. Adjacent free blocks are counted
    /// separately until the next allocation coalesces them.
    pub free_bytes: usize,

    /// Largest single free payload.
    pub largest_free: usize,
}

impl HeapMetrics {
    pub(crate) fn new(counters: &Metrics, chain: &BlockChain) -> Self {
        let mut metrics = Self {
            allocations: counters.allocations,
            failed_allocations: counters.failed_allocations,
            frees: counters.frees,
            failed_frees: counters.failed_frees,
            splits: counters.splits,
            merges: counters.merges,
            coalesce_passes: counters.coalesce_passes,
            ..Self::default()
        };

        for (_, header) in chain.iter() {
            metrics.blocks += 1;

            if header.is_free() {
                metrics.free_blocks += 1;
                metrics.free_bytes += header.length;
                metrics.largest_free = metrics.largest_free.max(header.length);
            } else {
                metrics.used_blocks += 1;
                metrics.used_bytes += header.length;
            }
        }

        metrics
    }
}
