//! Placer simulator driver.
//!
//! Configures a chain and a worker pool from CLI flags, mines until the
//! requested number of blocks is committed (or until Ctrl-C), logs hash-rate
//! statistics along the way, and prints the committed chain on exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use placer_core::chain::Chain;
use placer_core::config::{GenesisSeed, PartitionStrategy, SimConfig};
use placer_core::constants::DEFAULT_PAYLOAD;
use placer_miner::MinerPool;
use placer_miner::stats::MiningStats;

/// CLI arguments for the simulator.
#[derive(Debug, Parser)]
#[command(name = "placer-sim")]
#[command(about = "Placer proof-of-work mining simulator", long_about = None)]
struct Args {
    /// Number of mining workers.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Successful verifications required before a block commits.
    #[arg(long, default_value_t = 2)]
    quorum: usize,

    /// Difficulty of the first block (exact count of leading zeros).
    #[arg(long, default_value_t = 1)]
    difficulty: u64,

    /// Payload stored in every block.
    #[arg(long, default_value = DEFAULT_PAYLOAD)]
    payload: String,

    /// Stop after committing this many blocks (0 = run until Ctrl-C).
    #[arg(long, default_value_t = 5)]
    blocks: usize,

    /// Nonce partitioning strategy.
    #[arg(long, value_enum, default_value = "shared")]
    partition: PartitionArg,

    /// Genesis prev-digest seeding mode.
    #[arg(long, value_enum, default_value = "zeroes")]
    genesis: GenesisArg,

    /// Print the final chain as JSON instead of pipe-delimited lines.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PartitionArg {
    /// One shared nonce counter.
    Shared,
    /// Disjoint per-worker nonce stripes.
    Striped,
}

impl From<PartitionArg> for PartitionStrategy {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Shared => PartitionStrategy::SharedCounter,
            PartitionArg::Striped => PartitionStrategy::Striped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GenesisArg {
    /// All-zero sentinel digest.
    Zeroes,
    /// Double-SHA-256 of the payload.
    PayloadDigest,
}

impl From<GenesisArg> for GenesisSeed {
    fn from(arg: GenesisArg) -> Self {
        match arg {
            GenesisArg::Zeroes => GenesisSeed::Zeroes,
            GenesisArg::PayloadDigest => GenesisSeed::PayloadDigest,
        }
    }
}

/// Log mining statistics periodically.
async fn stats_logger(stats: Arc<MiningStats>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_secs(10)).await;
        info!(
            "hashrate: {:.0} H/s | blocks: {} | rejected rounds: {}",
            stats.hashrate(),
            stats.blocks_committed(),
            stats.rounds_rejected(),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("placer-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig {
        workers: args.workers,
        quorum: args.quorum,
        initial_difficulty: args.difficulty,
        payload: args.payload.clone(),
        genesis_seed: args.genesis.into(),
        partition: args.partition.into(),
    };
    config.validate().context("invalid configuration")?;

    let chain = Arc::new(Chain::new(&config));
    let pool = MinerPool::spawn(&config, Arc::clone(&chain))
        .context("failed to start miner pool")?;

    let running = Arc::new(AtomicBool::new(true));

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        warn!("received SIGINT, shutting down...");
        running_clone.store(false, Ordering::Relaxed);
    });

    let stats_clone = Arc::clone(pool.stats());
    let running_clone = Arc::clone(&running);
    tokio::spawn(stats_logger(stats_clone, running_clone));

    // Run until the target depth is reached or Ctrl-C lands.
    while running.load(Ordering::Relaxed) {
        if args.blocks > 0 && chain.len() >= args.blocks {
            info!("target of {} blocks reached", args.blocks);
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    pool.shutdown();

    if args.json {
        let rendered = serde_json::to_string_pretty(&chain.blocks())
            .context("failed to render chain as JSON")?;
        println!("{rendered}");
    } else {
        print!("{}", chain.dump());
    }

    info!("simulator shutdown complete");
    Ok(())
}
