//! Parallel nonce search with cooperative early termination.
//!
//! Workers scan disjoint stripes of the candidate space. The first one to find
//! a witness publishes it and raises the shared stop signal; the rest notice
//! between evaluations and exit.

pub mod bench;
pub mod config;
pub mod coordinator;
pub mod partition;
pub mod predicate;
pub mod signal;
pub mod slot;
pub mod worker;

#[cfg(test)]
mod tests;

pub use config::{load_config_file, MinerConfig, SearchConfig};
pub use coordinator::{search, Coordinator, SearchReport};
pub use partition::{Partition, Stride};
pub use predicate::{sha256_hex_predicate, sha256_proof, Evaluator, ProofPredicate};
pub use signal::StopSignal;
pub use worker::{StopReason, WorkerExit, WorkerState};
