//! Single-slot handoff of the winning witness from workers to the coordinator.
//!
//! Any number of workers may try to publish; only the first claim goes through
//! and every later attempt is dropped without blocking.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use shared::Witness;

/// Winning witness tagged with the worker that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub worker: usize,
    pub witness: Witness,
}

/// Worker side of the slot. Cloned into every worker.
#[derive(Debug, Clone)]
pub struct ResultSlot {
    claimed: Arc<AtomicBool>,
    sender: Sender<Published>,
}

/// Coordinator side of the slot.
#[derive(Debug)]
pub struct SlotReceiver {
    receiver: Receiver<Published>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SlotWait {
    Published(Published),
    /// The deadline passed with the slot still empty.
    Elapsed,
    /// Every worker dropped its end without publishing.
    Abandoned,
}

pub fn result_slot() -> (ResultSlot, SlotReceiver) {
    let (sender, receiver) = bounded(1);
    (
        ResultSlot {
            claimed: Arc::new(AtomicBool::new(false)),
            sender,
        },
        SlotReceiver {
            receiver,
        },
    )
}

impl ResultSlot {
    /// Try to publish. Returns `false` when another worker got there first.
    pub fn publish(&self, worker: usize, witness: Witness) -> bool {
        if self.claimed.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
        {
            return false;
        }

        // the claim guarantees this is the only send, so the slot has room
        self.sender
            .try_send(Published {
                worker,
                witness,
            })
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl SlotReceiver {
    /// Block until a witness is published, the deadline passes, or all workers
    /// are gone. A published witness always wins over the other two.
    pub fn wait(&self, deadline: Option<Instant>) -> SlotWait {
        let received = match deadline {
            Some(deadline) => self.receiver.recv_deadline(deadline),
            None => self.receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(published) => SlotWait::Published(published),
            Err(RecvTimeoutError::Timeout) => SlotWait::Elapsed,
            Err(RecvTimeoutError::Disconnected) => SlotWait::Abandoned,
        }
    }
}
