use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Rejected before any worker was spawned.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("no witness found within {0:?}")]
    Timeout(Duration),
    #[error("all {workers} workers failed without finding a witness")]
    AllWorkersFailed { workers: usize },
    #[error("candidate space [0, {limit}) exhausted without a witness")]
    Exhausted { limit: u64 },
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SearchError::InvalidConfiguration(reason.into())
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
