//! Striped assignment of the candidate space to workers.
//!
//! Worker `i` of `n` scans `i, i + n, i + 2n, ...`. The `n` stripes are
//! disjoint and together cover every candidate below the bound exactly once.

use shared::{Candidate, SearchError, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    workers: u64,
    index: u64,
    /// Exclusive upper bound of the candidate space.
    limit: Candidate,
}

impl Partition {
    /// Stripe `index` of `workers` over the whole `u64` range.
    pub fn new(workers: usize, index: usize) -> SearchResult<Self> {
        Self::bounded(workers, index, Candidate::MAX)
    }

    /// Stripe `index` of `workers` over `[0, limit)`.
    pub fn bounded(workers: usize, index: usize, limit: Candidate) -> SearchResult<Self> {
        if workers == 0 {
            return Err(SearchError::invalid("worker count must be at least 1"));
        }
        if index >= workers {
            return Err(SearchError::invalid(format!(
                "worker index {index} out of range for {workers} workers"
            )));
        }

        Ok(Self {
            workers: workers as u64,
            index: index as u64,
            limit,
        })
    }

    pub fn workers(&self) -> u64 {
        self.workers
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn limit(&self) -> Candidate {
        self.limit
    }

    /// A fresh sequence starting from the first candidate of the stripe.
    pub fn candidates(&self) -> Stride {
        Stride {
            next: (self.index < self.limit).then_some(self.index),
            step: self.workers,
            limit: self.limit,
        }
    }
}

impl IntoIterator for Partition {
    type IntoIter = Stride;
    type Item = Candidate;

    fn into_iter(self) -> Stride {
        self.candidates()
    }
}

/// Lazy, strictly increasing sequence of candidates for one stripe.
#[derive(Debug, Clone)]
pub struct Stride {
    next: Option<Candidate>,
    step: u64,
    limit: Candidate,
}

impl Iterator for Stride {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let current = self.next?;
        // stop instead of wrapping around at the end of the space
        self.next = current.checked_add(self.step).filter(|next| next.lt(&self.limit));
        Some(current)
    }
}
