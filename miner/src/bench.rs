use std::{
    hint::black_box,
    time::{Duration, Instant},
};

use shared::{SearchError, SearchResult};
use tracing::*;

use crate::{coordinator::hashrate, partition::Partition, predicate::sha256_proof};

const BENCH_PAYLOAD: &[u8] = b"benchmark";

#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    pub workers: usize,
    pub hashes: u64,
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn hashrate(&self) -> f64 {
        hashrate(self.hashes, self.elapsed)
    }
}

/// Hash on every worker stripe for `duration` and count the digests.
pub fn run(workers: usize, duration: Duration, pin_cores: bool) -> SearchResult<BenchReport> {
    if workers == 0 {
        return Err(SearchError::invalid("worker count must be at least 1"));
    }
    let partitions =
        (0..workers).map(|id| Partition::new(workers, id)).collect::<SearchResult<Vec<_>>>()?;
    let cores = if pin_cores { core_affinity::get_core_ids() } else { None };

    info!("hashrate test: {workers} workers, {} sec...", duration.as_secs_f64());

    let start = Instant::now();
    let handles: Vec<_> = partitions
        .into_iter()
        .enumerate()
        .map(|(id, partition)| {
            let core = cores.as_ref().filter(|ids| !ids.is_empty()).map(|ids| ids[id % ids.len()]);
            std::thread::spawn(move || {
                // Pin to core
                if let Some(core) = core {
                    let _ = core_affinity::set_for_current(core);
                }

                let timer = Instant::now();
                let mut hashes = 0u64;
                for nonce in partition.candidates() {
                    black_box(sha256_proof(BENCH_PAYLOAD, nonce));
                    hashes += 1;

                    // Exit if time has elapsed
                    if hashes % 1024 == 0 && timer.elapsed().ge(&duration) {
                        break;
                    }
                }
                hashes
            })
        })
        .collect();

    let mut total = 0;
    let mut failed = 0;
    for h in handles {
        match h.join() {
            Ok(count) => total += count,
            Err(_) => failed += 1,
        }
    }
    if failed == workers {
        return Err(SearchError::AllWorkersFailed {
            workers,
        });
    }

    Ok(BenchReport {
        workers,
        hashes: total,
        elapsed: start.elapsed(),
    })
}
