use crate::{AllocError, ChainEntry, FreeError, Heap, HeapConfig, Status, HEADER_SIZE};
use std::ptr::NonNull;

const SMALL: usize = 128;

fn small_heap() -> Heap {
    Heap::new(HeapConfig::with_capacity(SMALL)).unwrap()
}

fn layout(heap: &Heap) -> Vec<(usize, Status, usize)> {
    heap.dump_chain()
        .iter()
        .map(|entry| (entry.offset, entry.status, entry.length))
        .collect()
}

fn offset_of(heap: &Heap, ptr: NonNull<u8>) -> usize {
    ptr.as_ptr() as usize - heap.base() as usize
}

#[test]
fn first_allocation_initializes_chain() {
    let mut heap = small_heap();

    assert!(heap.dump_chain().is_empty());

    let ptr = heap.allocate(40).unwrap();

    assert_eq!(offset_of(&heap, ptr), HEADER_SIZE);
    assert_eq!(
        layout(&heap),
        vec![(0, Status::Used, 40), (56, Status::Free, 56)]
    );
}

#[test]
fn every_size_on_a_fresh_heap() {
    for size in 1..SMALL {
        let mut heap = small_heap();
        let result = heap.allocate(size);

        if size == SMALL - HEADER_SIZE || size <= SMALL - 2 * HEADER_SIZE {
            let addr = result.unwrap().as_ptr() as usize;
            let base = heap.base() as usize;

            assert!(base < addr && addr < base + SMALL);
        } else {
            assert_eq!(result, Err(AllocError::OutOfMemory { requested: size }));
        }
    }
}

#[test]
fn rejected_sizes_leave_chain_alone() {
    let mut heap = small_heap();

    assert_eq!(heap.allocate(0), Err(AllocError::InvalidSize));
    assert_eq!(
        heap.allocate(SMALL),
        Err(AllocError::TooLarge {
            requested: SMALL,
            capacity: SMALL
        })
    );
    assert!(heap.dump_chain().is_empty());

    heap.allocate(8).unwrap();
    let before = heap.dump_chain();

    assert_eq!(heap.allocate(0), Err(AllocError::InvalidSize));
    assert!(matches!(
        heap.allocate(usize::MAX),
        Err(AllocError::TooLarge { .. })
    ));
    assert_eq!(heap.dump_chain(), before);

    let metrics = heap.metrics();

    assert_eq!(metrics.failed_allocations, 4);
    assert_eq!(metrics.coalesce_passes, 1);
}

#[test]
fn freed_block_reused_by_split() {
    let mut heap = small_heap();

    let first = heap.allocate(40).unwrap();
    let _second = heap.allocate(40).unwrap();

    // the second split leaves a zero length free block at the very end
    assert_eq!(
        layout(&heap),
        vec![
            (0, Status::Used, 40),
            (56, Status::Used, 40),
            (112, Status::Free, 0)
        ]
    );

    heap.free(first.as_ptr()).unwrap();

    let reused = heap.allocate(20).unwrap();

    assert_eq!(reused, first);
    assert_eq!(
        layout(&heap),
        vec![
            (0, Status::Used, 20),
            (36, Status::Free, 4),
            (56, Status::Used, 40),
            (112, Status::Free, 0)
        ]
    );
}

#[test]
fn freed_block_too_small_to_split_is_skipped() {
    let mut heap = small_heap();

    let first = heap.allocate(40).unwrap();
    heap.allocate(40).unwrap();
    heap.free(first.as_ptr()).unwrap();

    // 40 < 30 + HEADER_SIZE, and nothing after it is free
    let before = heap.dump_chain();

    assert_eq!(
        heap.allocate(30),
        Err(AllocError::OutOfMemory { requested: 30 })
    );
    assert_eq!(heap.dump_chain(), before);
}

#[test]
fn exact_fit_is_not_split() {
    let mut heap = small_heap();

    let first = heap.allocate(40).unwrap();
    heap.allocate(40).unwrap();
    heap.free(first.as_ptr()).unwrap();

    assert_eq!(heap.allocate(40).unwrap(), first);
    assert_eq!(heap.dump_chain().len(), 3);
    assert_eq!(heap.metrics().splits, 2);
}

#[test]
fn first_fit_over_best_fit() {
    let mut heap = small_heap();

    // [U 32][U 8][U 8][U 16]
    let large = heap.allocate(32).unwrap();
    heap.allocate(8).unwrap();
    let small = heap.allocate(8).unwrap();
    heap.allocate(16).unwrap();

    heap.free(large.as_ptr()).unwrap();
    heap.free(small.as_ptr()).unwrap();

    // the 8 byte block is an exact fit, but the larger one comes first
    assert_eq!(heap.allocate(8).unwrap(), large);
}

#[test]
fn coalescing_waits_for_next_allocation() {
    let mut heap = small_heap();

    let a = heap.allocate(16).unwrap();
    let b = heap.allocate(16).unwrap();
    let _c = heap.allocate(16).unwrap();

    heap.free(a.as_ptr()).unwrap();
    heap.free(b.as_ptr()).unwrap();

    assert_eq!(
        layout(&heap),
        vec![
            (0, Status::Free, 16),
            (32, Status::Free, 16),
            (64, Status::Used, 16),
            (96, Status::Free, 16)
        ]
    );

    // only the merged a + b region can hold this
    let merged = heap.allocate(48).unwrap();

    assert_eq!(merged, a);
    assert_eq!(
        layout(&heap),
        vec![
            (0, Status::Used, 48),
            (64, Status::Used, 16),
            (96, Status::Free, 16)
        ]
    );
    assert_eq!(heap.metrics().merges, 1);
}

#[test]
fn failed_allocation_keeps_coalescing() {
    let mut heap = small_heap();

    let a = heap.allocate(16).unwrap();
    let b = heap.allocate(16).unwrap();
    heap.allocate(16).unwrap();

    heap.free(a.as_ptr()).unwrap();
    heap.free(b.as_ptr()).unwrap();

    assert!(heap.allocate(100).is_err());
    assert_eq!(heap.dump_chain()[0].length, 48);
    assert_eq!(heap.dump_chain().len(), 3);
}

#[test]
fn fragmented_heap_runs_out_of_memory() {
    let mut heap = small_heap();
    let blocks: Vec<_> = (0..4).map(|_| heap.allocate(16).unwrap()).collect();

    assert!(heap.dump_chain().iter().all(|entry| !entry.is_free()));

    heap.free(blocks[0].as_ptr()).unwrap();
    heap.free(blocks[2].as_ptr()).unwrap();

    let metrics = heap.metrics();

    assert_eq!(metrics.free_bytes, 32);
    assert_eq!(metrics.largest_free, 16);
    assert_eq!(
        heap.allocate(32),
        Err(AllocError::OutOfMemory { requested: 32 })
    );
    assert_eq!(heap.allocate(16).unwrap(), blocks[0]);
}

#[test]
fn double_free() {
    let mut heap = small_heap();
    let ptr = heap.allocate(10).unwrap();

    assert_eq!(heap.free(ptr.as_ptr()), Ok(()));
    assert_eq!(heap.free(ptr.as_ptr()), Err(FreeError::DoubleFree));
}

#[test]
fn free_requires_payload_start() {
    let mut heap = small_heap();
    let ptr = heap.allocate(10).unwrap();

    assert_eq!(
        heap.free(ptr.as_ptr().wrapping_add(1)),
        Err(FreeError::InvalidPointer)
    );
    // the header itself
    assert_eq!(heap.free(heap.base()), Err(FreeError::InvalidPointer));
    assert_eq!(
        heap.free(heap.base().wrapping_add(SMALL - 1)),
        Err(FreeError::InvalidPointer)
    );
    assert_eq!(heap.free(ptr.as_ptr()), Ok(()));
}

#[test]
fn free_outside_heap() {
    let mut heap = small_heap();
    let outside = 7u8;

    heap.allocate(10).unwrap();

    assert_eq!(heap.free(std::ptr::null()), Err(FreeError::OutOfBounds));
    assert_eq!(heap.free(&outside), Err(FreeError::OutOfBounds));
    assert_eq!(
        heap.free(heap.base().wrapping_add(SMALL)),
        Err(FreeError::OutOfBounds)
    );
}

#[test]
fn free_before_first_allocation() {
    let mut heap = small_heap();
    let outside = 7u8;

    assert_eq!(heap.free(heap.base().wrapping_add(HEADER_SIZE)), Err(FreeError::InvalidPointer));
    assert_eq!(heap.free(&outside), Err(FreeError::InvalidPointer));
    assert!(heap.dump_chain().is_empty());
    assert_eq!(heap.metrics().failed_frees, 2);
}

#[test]
fn failed_free_leaves_chain_alone() {
    let mut heap = small_heap();
    let ptr = heap.allocate(10).unwrap();
    heap.free(ptr.as_ptr()).unwrap();

    let before = heap.dump_chain();

    assert!(heap.free(ptr.as_ptr()).is_err());
    assert!(heap.free(ptr.as_ptr().wrapping_add(3)).is_err());
    assert_eq!(heap.dump_chain(), before);
}

#[test]
fn payload_writes_do_not_touch_headers() {
    let mut heap = small_heap();
    let a = heap.allocate(40).unwrap();
    let b = heap.allocate(24).unwrap();

    unsafe {
        a.as_ptr().write_bytes(0xAB, 40);
        b.as_ptr().write_bytes(0xCD, 24);
    }

    let bytes: Vec<u8> = heap.dump_arena_bytes().map(|(_, byte)| byte).collect();

    assert_eq!(bytes.len(), SMALL);
    assert_eq!(bytes[0], b'U');
    assert!(bytes[16..56].iter().all(|byte| *byte == 0xAB));
    assert_eq!(bytes[56], b'U');
    assert!(bytes[72..96].iter().all(|byte| *byte == 0xCD));
    assert_eq!(bytes[96], b'F');

    heap.free(a.as_ptr()).unwrap();
    heap.free(b.as_ptr()).unwrap();
    heap.allocate(1).unwrap();

    assert_eq!(heap.dump_chain().len(), 2);
}

#[test]
fn header_bytes_in_arena() {
    let mut heap = small_heap();

    assert!(heap.dump_arena_bytes().all(|(_, byte)| byte == 0));

    heap.allocate(40).unwrap();

    let bytes: Vec<(usize, u8)> = heap.dump_arena_bytes().take(16).collect();

    assert_eq!(bytes[0], (0, b'U'));
    assert_eq!(bytes[4], (4, 40));
    assert_eq!(bytes[8], (8, 56));
    assert_eq!(bytes[15], (15, 0));
}

#[test]
fn diagnostics_do_not_mutate() {
    let mut heap = small_heap();
    let a = heap.allocate(16).unwrap();
    let b = heap.allocate(16).unwrap();

    heap.free(a.as_ptr()).unwrap();
    heap.free(b.as_ptr()).unwrap();

    let before = heap.dump_chain();
    let metrics = heap.metrics();

    let report = heap.chain_report().to_string();
    let memory = heap.memory_report().to_string();

    assert_eq!(report.matches("Status: F").count(), 3);
    assert_eq!(memory.lines().count(), SMALL);
    assert_eq!(heap.dump_chain(), before);
    assert_eq!(heap.metrics(), metrics);
}

#[test]
fn chain_entries_link_in_address_order() {
    let mut heap = small_heap();

    heap.allocate(8).unwrap();
    heap.allocate(8).unwrap();

    let chain: Vec<ChainEntry> = heap.dump_chain();

    assert_eq!(chain.len(), 3);

    for pair in chain.windows(2) {
        assert_eq!(pair[0].next, Some(pair[1].offset));
        assert_eq!(pair[1].index, pair[0].index + 1);
    }

    assert_eq!(chain[2].next, None);
}

#[test]
fn metrics_count_activity() {
    let mut heap = small_heap();

    let a = heap.allocate(16).unwrap();
    let b = heap.allocate(16).unwrap();

    heap.free(a.as_ptr()).unwrap();
    heap.free(b.as_ptr()).unwrap();
    let _ = heap.free(b.as_ptr());
    heap.allocate(32).unwrap();

    let metrics = heap.metrics();

    assert_eq!(metrics.allocations, 3);
    assert_eq!(metrics.frees, 2);
    assert_eq!(metrics.failed_frees, 1);
    assert_eq!(metrics.coalesce_passes, 3);
    // a + b merged, then the tail merged into them as well
    assert_eq!(metrics.merges, 2);
    assert_eq!(metrics.blocks, 2);
    assert_eq!(metrics.used_bytes, 32);
    assert_eq!(metrics.free_bytes, SMALL - 32 - 2 * HEADER_SIZE);
}
