//! Runs the memgrind workloads against a fresh heap and prints the mean time
//! each one took.
//!
//! Set `RUST_LOG=heapsim=warn` to see every error the workloads provoke, or
//! `RUST_LOG=heapsim=trace` to follow the block chain through each call.

use clap::Parser;
use heapsim::workload::{Memgrind, MEMGRIND_DEFAULT_ITERATIONS};
use heapsim::{BuildError, Heap, HeapConfig, HEAP_CONFIG_DEFAULT_CAPACITY};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(name = "memgrind", about = "Time the canned allocation workloads")]
struct Args {
    /// How many times to run each workload.
    #[arg(short, long, env = "MEMGRIND_ITERATIONS", default_value_t = MEMGRIND_DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Size of the simulated heap in bytes.
    #[arg(short, long, env = "MEMGRIND_CAPACITY", default_value_t = HEAP_CONFIG_DEFAULT_CAPACITY)]
    capacity: usize,

    /// Seed for the randomized workloads. Picked at random when absent.
    #[arg(short, long, env = "MEMGRIND_SEED")]
    seed: Option<u64>,

    /// Print the block chain once every workload has run.
    #[arg(long)]
    dump_chain: bool,
}

fn main() -> Result<(), BuildError> {
    env_logger::init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut heap = Heap::new(HeapConfig::with_capacity(args.capacity))?;

    log::info!(
        "running {} iterations on a {} byte heap, seed {seed}",
        args.iterations,
        heap.capacity()
    );

    let summaries = Memgrind {
        iterations: args.iterations,
    }
    .run(&mut heap, &mut rng);

    println!("----------------------------------------------------");
    for summary in &summaries {
        println!(
            "Mean Workload {} Runtime: {} microseconds ({} errors)",
            summary.workload,
            summary.mean.as_micros(),
            summary.failures
        );
    }
    println!("----------------------------------------------------");

    if args.dump_chain {
        print!("{}", heap.chain_report());
    }

    let metrics = heap.metrics();

    log::info!(
        "{} allocations, {} frees, {} splits, {} merges",
        metrics.allocations,
        metrics.frees,
        metrics.splits,
        metrics.merges
    );

    Ok(())
}
