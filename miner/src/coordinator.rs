//! Spawns the workers for one search and collects the first witness.

use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use core_affinity::CoreId;
use shared::{SearchError, SearchResult, TaskDescriptor, Witness};
use tracing::*;

use crate::{
    config::SearchConfig,
    partition::Partition,
    predicate::Evaluator,
    signal::StopSignal,
    slot::{result_slot, SlotWait},
    worker::{StopReason, Worker, WorkerExit, WorkerState},
};

/// Outcome of a successful search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub witness: Witness,
    /// Index of the worker whose witness was accepted.
    pub worker: usize,
    /// Candidates evaluated across all workers.
    pub hashes: u64,
    pub elapsed: Duration,
    pub exits: Vec<WorkerExit>,
}

impl SearchReport {
    pub fn hashrate(&self) -> f64 {
        hashrate(self.hashes, self.elapsed)
    }
}

pub(crate) fn hashrate(hashes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hashes as f64 / secs
    } else {
        0.0
    }
}

pub struct Coordinator<E> {
    evaluator: Arc<E>,
    config: SearchConfig,
    external: Option<StopSignal>,
}

impl<E> Coordinator<E>
where
    E: Evaluator + 'static,
{
    pub fn new(evaluator: E, config: SearchConfig) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            config,
            external: None,
        }
    }

    /// Share the stop signal with the caller. Raising it from outside cancels
    /// the search. Without one every run gets a fresh signal.
    pub fn with_signal(mut self, signal: StopSignal) -> Self {
        self.external = Some(signal);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn run(&self, task: TaskDescriptor, worker_count: usize) -> SearchResult<SearchReport> {
        if worker_count == 0 {
            return Err(SearchError::invalid("worker count must be at least 1"));
        }
        if self.config.candidate_limit == Some(0) {
            return Err(SearchError::invalid("candidate limit must be at least 1"));
        }
        self.evaluator.validate(&task)?;

        let limit = self.config.candidate_limit.unwrap_or(u64::MAX);
        let partitions = (0..worker_count)
            .map(|id| Partition::bounded(worker_count, id, limit))
            .collect::<SearchResult<Vec<_>>>()?;

        let start = Instant::now();
        let deadline = self.config.deadline().map(|d| start + d);
        let signal = self.external.clone().unwrap_or_default();
        let (slot, receiver) = result_slot();
        let task = Arc::new(task);
        let cores = self.cores();

        info!("search starting, workers: {worker_count}, {task}");

        let mut handlers: Vec<(usize, JoinHandle<WorkerExit>)> = Vec::with_capacity(worker_count);
        for (id, partition) in partitions.into_iter().enumerate() {
            let worker = Worker {
                id,
                partition,
                task: task.clone(),
                evaluator: self.evaluator.clone(),
                signal: signal.clone(),
                slot: slot.clone(),
                core: cores.as_ref().map(|ids| ids[id % ids.len()]),
            };

            match worker.spawn() {
                Ok(handler) => handlers.push((id, handler)),
                Err(err) => error!("worker: {id}, failed to spawn: {err}"),
            }
        }

        // workers hold the only senders from here on
        drop(slot);

        let wait = receiver.wait(deadline);

        signal.raise();
        let exits = join_all(handlers);
        let hashes: u64 = exits.iter().map(|exit| exit.hashes).sum();
        let elapsed = start.elapsed();

        match wait {
            SlotWait::Published(published) => {
                info!(
                    "worker: {} won with nonce: {}, elapsed: {:.3}s, mining power: {:.2} H/s",
                    published.worker,
                    published.witness.candidate,
                    elapsed.as_secs_f64(),
                    hashrate(hashes, elapsed)
                );
                Ok(SearchReport {
                    witness: published.witness,
                    worker: published.worker,
                    hashes,
                    elapsed,
                    exits,
                })
            }
            SlotWait::Elapsed => {
                let budget = self.config.deadline().unwrap_or(elapsed);
                warn!("no witness within {budget:?}, hashes: {hashes}");
                Err(SearchError::Timeout(budget))
            }
            SlotWait::Abandoned => Err(abandoned(&exits, worker_count, limit, self.config.deadline())),
        }
    }

    fn cores(&self) -> Option<Vec<CoreId>> {
        if !self.config.pin_cores {
            return None;
        }
        core_affinity::get_core_ids().filter(|ids| !ids.is_empty())
    }
}

/// Run one search and hand back only the witness.
pub fn search<E>(
    task: TaskDescriptor,
    worker_count: usize,
    evaluator: E,
    config: &SearchConfig,
) -> SearchResult<Witness>
where
    E: Evaluator + 'static,
{
    Coordinator::new(evaluator, config.clone()).run(task, worker_count).map(|report| report.witness)
}

fn join_all(handlers: Vec<(usize, JoinHandle<WorkerExit>)>) -> Vec<WorkerExit> {
    handlers
        .into_iter()
        .map(|(id, handler)| {
            handler.join().unwrap_or_else(|_| {
                error!("worker: {id}, thread panicked");
                WorkerExit {
                    id,
                    state: WorkerState::Stopped(StopReason::Faulted),
                    hashes: 0,
                    published: false,
                }
            })
        })
        .collect()
}

/// Every worker left without publishing. Work out why.
fn abandoned(
    exits: &[WorkerExit],
    worker_count: usize,
    limit: u64,
    deadline: Option<Duration>,
) -> SearchError {
    let stopped = |reason| exits.iter().any(|exit| exit.state == WorkerState::Stopped(reason));

    if stopped(StopReason::Signalled) {
        warn!("search cancelled before a witness was found");
        return SearchError::Cancelled;
    }

    // only a full scan of every stripe proves there is nothing below the limit
    let scanned =
        exits.iter().filter(|exit| exit.state == WorkerState::Stopped(StopReason::Exhausted)).count();
    if scanned == worker_count {
        warn!("candidate space [0, {limit}) exhausted");
        return SearchError::Exhausted {
            limit,
        };
    }

    // faulted or never spawned
    let unscanned = worker_count - scanned;
    if let Some(budget) = deadline {
        warn!("{unscanned} of {worker_count} stripes left unscanned, no witness within {budget:?}");
        return SearchError::Timeout(budget);
    }

    error!("{unscanned} of {worker_count} workers failed, no witness");
    SearchError::AllWorkersFailed {
        workers: worker_count,
    }
}
