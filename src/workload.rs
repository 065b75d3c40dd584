//! The memgrind workloads: canned allocation patterns that exercise a
//! [`Heap`] and time how long each pattern takes.
//!
//! Every workload leaves the heap with no used blocks when it returns, so
//! workloads can be run back to back against the same heap.

use super::heap::Heap;
use rand::Rng;
use std::collections::VecDeque;
use std::fmt;
use std::ptr::NonNull;
use std::time::{Duration, Instant};

/// Most pointers workload C will ever allocate in one run.
pub const WORKLOAD_C_MAX_LIVE: usize = 120;

pub const WORKLOAD_E_BLOCK: usize = 200;
pub const WORKLOAD_E_MERGED: usize = 300;
pub const WORKLOAD_E_OVERSIZED: usize = 4080;

/// Outcome of a single workload run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadRun {
    pub elapsed: Duration,
    /// Allocator calls that reported an error.
    pub failures: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Workload {
    A,
    B,
    C,
    D,
    E,
}

impl Workload {
    pub const ALL: [Workload; 5] = [
        Workload::A,
        Workload::B,
        Workload::C,
        Workload::D,
        Workload::E,
    ];

    pub fn default_steps(self) -> usize {
        match self {
            Workload::A | Workload::B | Workload::D => 120,
            Workload::C => 240,
            Workload::E => 1,
        }
    }

    pub fn run<R: Rng + ?Sized>(self, heap: &mut Heap, rng: &mut R, steps: usize) -> WorkloadRun {
        match self {
            Workload::A => workload_a(heap, steps),
            Workload::B => workload_b(heap, steps),
            Workload::C => workload_c(heap, rng, steps),
            Workload::D => workload_d(heap, rng, steps),
            Workload::E => workload_e(heap),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// Counts failed calls so the workloads read as plain sequences of
// allocations and frees.
struct Tally<'a> {
    heap: &'a mut Heap,
    failures: usize,
}

impl<'a> Tally<'a> {
    fn new(heap: &'a mut Heap) -> Self {
        Self { heap, failures: 0 }
    }

    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        let result = self.heap.allocate(size);

        self.failures += result.is_err() as usize;
        result.ok()
    }

    fn free(&mut self, ptr: *const u8) {
        self.failures += self.heap.free(ptr).is_err() as usize;
    }

    fn free_opt(&mut self, ptr: Option<NonNull<u8>>) {
        if let Some(ptr) = ptr {
            self.free(ptr.as_ptr());
        }
    }

    fn finish(self, start: Instant) -> WorkloadRun {
        WorkloadRun {
            elapsed: start.elapsed(),
            failures: self.failures,
        }
    }
}

/// Allocates a single byte and frees it right away, `iterations` times.
pub fn workload_a(heap: &mut Heap, iterations: usize) -> WorkloadRun {
    let mut tally = Tally::new(heap);
    let start = Instant::now();

    for _ in 0..iterations {
        let ptr = tally.alloc(1);

        tally.free_opt(ptr);
    }

    tally.finish(start)
}

/// Allocates `count` single bytes, then frees all of them in order.
pub fn workload_b(heap: &mut Heap, count: usize) -> WorkloadRun {
    let mut tally = Tally::new(heap);
    let mut pointers = Vec::with_capacity(count);
    let start = Instant::now();

    for _ in 0..count {
        pointers.push(tally.alloc(1));
    }

    for ptr in pointers {
        tally.free_opt(ptr);
    }

    tally.finish(start)
}

/// Randomly picks between allocating a single byte and freeing the oldest
/// live allocation, `steps` times. At most [`WORKLOAD_C_MAX_LIVE`] bytes are
/// allocated per run; when the chosen action is impossible the other one is
/// taken instead. Whatever is still live once the steps are done is freed
/// outside of the timed section.
pub fn workload_c<R: Rng + ?Sized>(heap: &mut Heap, rng: &mut R, steps: usize) -> WorkloadRun {
    let mut tally = Tally::new(heap);
    let mut live = VecDeque::with_capacity(WORKLOAD_C_MAX_LIVE);
    let mut allocated = 0;
    let start = Instant::now();

    for _ in 0..steps {
        let can_alloc = allocated < WORKLOAD_C_MAX_LIVE;
        let wants_alloc = rng.gen_bool(0.5);

        if (wants_alloc && can_alloc) || (live.is_empty() && can_alloc) {
            allocated += 1;

            if let Some(ptr) = tally.alloc(1) {
                live.push_back(ptr);
            }
        } else if let Some(ptr) = live.pop_front() {
            tally.free(ptr.as_ptr());
        }
    }

    let elapsed = start.elapsed();

    for ptr in live {
        tally.free(ptr.as_ptr());
    }

    WorkloadRun {
        elapsed,
        failures: tally.failures,
    }
}

/// Like [`workload_a`], but after roughly one in five frees it also tries to
/// free an address two bytes into the block it just released. Those extra
/// frees are always rejected and show up as failures.
pub fn workload_d<R: Rng + ?Sized>(heap: &mut Heap, rng: &mut R, iterations: usize) -> WorkloadRun {
    let mut tally = Tally::new(heap);
    let start = Instant::now();

    for _ in 0..iterations {
        let bogus = rng.gen_ratio(1, 5);

        if let Some(ptr) = tally.alloc(1) {
            tally.free(ptr.as_ptr());

            if bogus {
                tally.free(ptr.as_ptr().wrapping_add(2));
            }
        }
    }

    tally.finish(start)
}

/// Allocates three blocks, frees the first two and then asks for a block
/// that only fits once those two have been coalesced. Finishes with a request
/// larger than anything left in a default sized heap, which fails.
pub fn workload_e(heap: &mut Heap) -> WorkloadRun {
    let mut tally = Tally::new(heap);
    let start = Instant::now();

    let first = tally.alloc(WORKLOAD_E_BLOCK);
    let second = tally.alloc(WORKLOAD_E_BLOCK);
    let third = tally.alloc(WORKLOAD_E_BLOCK);

    tally.free_opt(first);
    tally.free_opt(second);

    let merged = tally.alloc(WORKLOAD_E_MERGED);
    let oversized = tally.alloc(WORKLOAD_E_OVERSIZED);

    tally.free_opt(oversized);
    tally.free_opt(third);
    tally.free_opt(merged);

    tally.finish(start)
}

/// Arithmetic mean of the given durations, zero when there are none.
pub fn mean(times: &[Duration]) -> Duration {
    if times.is_empty() {
        return Duration::ZERO;
    }

    times.iter().sum::<Duration>() / times.len() as u32
}

/// Mean time and total failures of one workload over a memgrind run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub workload: Workload,
    pub mean: Duration,
    pub failures: usize,
}

/// Runs every workload `iterations` times, one after the other, against a
/// single heap.
#[derive(Copy, Clone, Debug)]
pub struct Memgrind {
    pub iterations: usize,
}

pub const MEMGRIND_DEFAULT_ITERATIONS: usize = 50;

impl Default for Memgrind {
    fn default() -> Self {
        Self {
            iterations: MEMGRIND_DEFAULT_ITERATIONS,
        }
    }
}

impl Memgrind {
    pub fn run<R: Rng + ?Sized>(&self, heap: &mut Heap, rng: &mut R) -> Vec<WorkloadSummary> {
        let mut times: Vec<Vec<Duration>> = vec![Vec::with_capacity(self.iterations); 5];
        let mut failures = [0usize; 5];

        for _ in 0..self.iterations {
            for (index, workload) in Workload::ALL.into_iter().enumerate() {
                let run = workload.run(heap, rng, workload.default_steps());

                times[index].push(run.elapsed);
                failures[index] += run.failures;
            }
        }

        Workload::ALL
            .into_iter()
            .zip(times.iter().zip(failures))
            .map(|(workload, (times, failures))| WorkloadSummary {
                workload,
                mean: mean(times),
                failures,
            })
            .collect()
    }
}
