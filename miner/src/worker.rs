use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::JoinHandle,
};

use core_affinity::CoreId;
use shared::{Candidate, TaskDescriptor};
use tracing::*;

use crate::{partition::Partition, predicate::Evaluator, signal::StopSignal, slot::ResultSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop signal was observed between evaluations.
    Signalled,
    /// The stripe ran out of candidates.
    Exhausted,
    /// The evaluator failed or panicked.
    Faulted,
}

/// Terminal state of a worker. A running worker keeps evaluating until it
/// reaches one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Found,
    Stopped(StopReason),
}

/// How a worker left the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub id: usize,
    pub state: WorkerState,
    /// Candidates evaluated, including the winning one.
    pub hashes: u64,
    /// `false` when the worker found a witness but lost the publish race.
    pub published: bool,
}

pub(crate) struct Worker<E> {
    pub id: usize,
    pub partition: Partition,
    pub task: Arc<TaskDescriptor>,
    pub evaluator: Arc<E>,
    pub signal: StopSignal,
    pub slot: ResultSlot,
    pub core: Option<CoreId>,
}

impl<E> Worker<E>
where
    E: Evaluator + 'static,
{
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<WorkerExit>> {
        std::thread::Builder::new().name(format!("worker-{}", self.id)).spawn(move || self.run())
    }

    pub(crate) fn run(self) -> WorkerExit {
        // bound thread to core
        if let Some(core) = self.core {
            let _ = core_affinity::set_for_current(core);
        }

        debug!(
            "worker: {}, stride: {}, start: {}, limit: {}",
            self.id,
            self.partition.workers(),
            self.partition.index(),
            self.partition.limit()
        );

        let mut hashes = 0;
        let mut published = false;
        let mut candidates = self.partition.candidates();

        let state = loop {
            if self.signal.is_raised() {
                break WorkerState::Stopped(StopReason::Signalled);
            }

            let Some(nonce) = candidates.next() else {
                break WorkerState::Stopped(StopReason::Exhausted);
            };

            hashes += 1;
            match self.evaluate(nonce) {
                Ok(None) => {}
                Ok(Some(witness)) => {
                    trace!("worker: {}, found nonce: {}", self.id, witness.candidate);
                    published = self.slot.publish(self.id, witness);
                    self.signal.raise();
                    if !published {
                        debug!("worker: {}, nonce {nonce} discarded, result already published", self.id);
                    }
                    break WorkerState::Found;
                }
                Err(err) => {
                    error!("worker: {}, evaluator fault at nonce {nonce}: {err:#}", self.id);
                    break WorkerState::Stopped(StopReason::Faulted);
                }
            }
        };

        debug!("worker: {}, exit: {state:?}, hashes: {hashes}", self.id);

        WorkerExit {
            id: self.id,
            state,
            hashes,
            published,
        }
    }

    fn evaluate(&self, nonce: Candidate) -> anyhow::Result<Option<shared::Witness>> {
        panic::catch_unwind(AssertUnwindSafe(|| self.evaluator.evaluate(&self.task, nonce)))
            .unwrap_or_else(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(anyhow::anyhow!("evaluator panicked: {message}"))
            })
    }
}
