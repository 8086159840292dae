//! rmascope demo driver
//!
//! Runs a scripted communication workload over N simulated processing
//! elements with the instrumentation layer attached, then reports what
//! was recorded: a per-kind event summary, the full JSON trace, or the
//! window definition table handed to the unification pass.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rmascope_core::EventRecord;
use rmascope_shmem::{ActiveSet, Instrumented, SimPe, SimWorld};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Parser)]
#[command(name = "rmascope")]
#[command(about = "PGAS instrumentation layer demo driver", long_about = None)]
struct Cli {
    /// Number of simulated processing elements
    #[arg(short, long, default_value_t = 4)]
    pes: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo workload and print a per-kind event summary
    Run,
    /// Run the demo workload and dump the full trace as JSON
    Trace,
    /// Run the demo workload and list the window definitions
    Windows,
}

const HEAP_BYTES: usize = 4096;

/// The scripted workload: every bracketing shape at least once.
fn run_workload(shmem: &Instrumented<SimPe>) {
    let topology = shmem.context().topology();
    let num_pes = topology.num_pes;
    let next = |pe: u32| (pe + 1) % num_pes;
    let me = topology.my_pe.raw();

    // Point-to-point transfers, blocking and fire-and-forget.
    shmem.put_u64(0, 42, next(me));
    shmem.putmem(8, &[1; 32], next(me));
    shmem.putmem_nbi(48, &[2; 16], next(me));
    shmem.barrier_all();
    let _ = shmem.get_u64(0, next(me));

    // Atomics.
    let _ = shmem.fetch_add(64, 3, next(me));
    let _ = shmem.compare_swap(64, 3, 9, next(me));
    shmem.inc(64, next(me));

    // Subset collectives.
    if num_pes >= 2 {
        let pair = ActiveSet::new(0, 0, 2);
        shmem.broadcast_u64(128, 0, 4, 0, pair);
        shmem.reduce_sum_u64(192, 64, 2, pair);
        shmem.barrier(pair);
    }

    // Locks.
    let lock = 0x200;
    shmem.set_lock(lock);
    shmem.clear_lock(lock);
    let _ = shmem.test_lock(lock);
    shmem.clear_lock(lock);

    // Teams.
    let team = shmem.team_split_strided(ActiveSet::world(num_pes));
    shmem.team_barrier(team);
    shmem.team_free(team);

    // Ordering.
    shmem.fence();
    shmem.quiet();

    shmem.finalize();
}

fn summarize(trace: &[EventRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in trace {
        *counts.entry(format!("{:?}", record.kind())).or_insert(0) += 1;
    }
    counts
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let world = SimWorld::new(cli.pes, HEAP_BYTES);
    let shmem = Instrumented::new(world.pe(0));

    info!("driving workload on PE0 of {} simulated PEs", cli.pes);
    run_workload(&shmem);

    let ctx = shmem.context();
    match cli.command {
        Commands::Run => {
            info!("{} events recorded", ctx.event_count());
            for (kind, count) in summarize(&ctx.trace()) {
                println!("{kind:24} {count}");
            }
        }
        Commands::Trace => {
            println!("{}", serde_json::to_string_pretty(&ctx.trace())?);
        }
        Commands::Windows => {
            for def in ctx.window_definitions() {
                let key = def
                    .active_set
                    .map(|set| set.to_string())
                    .unwrap_or_else(|| "(team)".to_string());
                println!("{:>6}  {:12}  {}", def.handle.to_string(), key, def.label);
            }
        }
    }

    Ok(())
}
