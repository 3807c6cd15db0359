use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use miner::{bench, load_config_file, sha256_hex_predicate, Coordinator, MinerConfig, StopSignal};
use shared::TaskDescriptor;
use tokio::signal;
use tracing::*;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    #[arg(
        long,
        value_name = "WORKERS_COUNT",
        help = "The number of worker threads, defaults to the number of CPU cores",
        global = true
    )]
    workers: Option<usize>,

    #[arg(long, help = "Pin each worker thread to its own CPU core", global = true)]
    pin_cores: bool,

    #[arg(long, value_name = "CONFIG_FILE", help = "JSON settings file", global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Log per-worker progress", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for a nonce whose SHA-256 hex digest of `payload ++ nonce` starts with zeros
    Mine {
        #[arg(long, value_name = "PAYLOAD", help = "Block data the nonce is appended to")]
        payload: String,

        #[arg(long, value_name = "DIFFICULTY", help = "Number of leading zero hex digits")]
        difficulty: u32,

        #[arg(long, value_name = "MILLIS", help = "Give up after this many milliseconds")]
        deadline_ms: Option<u64>,

        #[arg(long, value_name = "MAX", help = "Only try nonces below this bound")]
        limit: Option<u64>,

        #[arg(long, help = "Print the witness as JSON")]
        json: bool,
    },
    /// Measure the hashrate
    Bench {
        #[arg(long, value_name = "SECONDS", default_value = "10")]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    shared::log::init_log(args.verbose);

    let mut cfg = match &args.config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => MinerConfig::default(),
    };
    debug!("{cfg:?}");

    let workers = args.workers.or(cfg.workers).unwrap_or_else(num_cpus::get);
    cfg.search.pin_cores |= args.pin_cores;

    match args.command {
        Command::Mine {
            payload,
            difficulty,
            deadline_ms,
            limit,
            json,
        } => {
            if deadline_ms.is_some() {
                cfg.search.deadline_ms = deadline_ms;
            }
            if limit.is_some() {
                cfg.search.candidate_limit = limit;
            }

            let stop = StopSignal::new();
            let ctrl_c = stop.clone();
            tokio::spawn(async move {
                if let Err(err) = signal::ctrl_c().await {
                    error!("failed to listen for Ctrl+C: {err}");
                    return;
                }
                info!("ctrl+c received, stopping workers");
                ctrl_c.raise();
            });

            info!("Starting mining with {workers} workers and difficulty {difficulty}...");

            let coordinator = Coordinator::new(sha256_hex_predicate(), cfg.search).with_signal(stop);
            let task = TaskDescriptor::new(payload, difficulty);
            let report = tokio::task::spawn_blocking(move || coordinator.run(task, workers))
                .await
                .context("search thread panicked")??;

            if json {
                let output = serde_json::json!({
                    "witness": report.witness,
                    "worker": report.worker,
                    "hashes": report.hashes,
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                    "found_at": shared::timestamp(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", "Block mined!".green().bold());
                println!("Hash: {}", report.witness.proof_hex().yellow());
                println!("Nonce: {}", report.witness.candidate.to_string().yellow());
                println!("Time taken: {:.2} seconds", report.elapsed.as_secs_f64());
                println!("Hashrate: {:.2} H/s", report.hashrate());
            }
        }
        Command::Bench {
            seconds,
        } => {
            let pin = cfg.search.pin_cores;
            let report = tokio::task::spawn_blocking(move || {
                bench::run(workers, Duration::from_secs(seconds), pin)
            })
            .await
            .context("benchmark thread panicked")??;

            println!(
                "{} {} H/sec ({} workers, {} hashes)",
                "Hashrate:".green().bold(),
                format!("{:.0}", report.hashrate()).yellow(),
                report.workers,
                report.hashes
            );
        }
    }

    Ok(())
}
