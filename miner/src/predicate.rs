use sha2::{Digest, Sha256};
use shared::{Candidate, SearchError, SearchResult, TaskDescriptor, Witness};

/// Decides whether a candidate solves a task.
///
/// Implementations are called concurrently from every worker with shared,
/// read-only access to the task, so they must be free of side effects.
pub trait Evaluator: Send + Sync {
    /// Checked once before any worker starts.
    fn validate(&self, _task: &TaskDescriptor) -> SearchResult<()> {
        Ok(())
    }

    /// `Ok(None)` means the candidate misses the target. `Err` is a fault and
    /// takes the calling worker out of the search.
    fn evaluate(&self, task: &TaskDescriptor, candidate: Candidate) -> anyhow::Result<Option<Witness>>;
}

impl<F> Evaluator for F
where
    F: Fn(&TaskDescriptor, Candidate) -> anyhow::Result<Option<Witness>> + Send + Sync,
{
    fn evaluate(&self, task: &TaskDescriptor, candidate: Candidate) -> anyhow::Result<Option<Witness>> {
        self(task, candidate)
    }
}

/// Evaluator built from an injected proof function and target check.
#[derive(Debug, Clone)]
pub struct ProofPredicate<P, C> {
    proof: P,
    check: C,
    max_difficulty: Option<u32>,
}

impl<P, C> ProofPredicate<P, C>
where
    P: Fn(&[u8], Candidate) -> Vec<u8> + Send + Sync,
    C: Fn(&[u8], u32) -> bool + Send + Sync,
{
    pub fn new(proof: P, check: C) -> Self {
        Self {
            proof,
            check,
            max_difficulty: None,
        }
    }

    /// Reject tasks whose difficulty can never be met.
    pub fn with_max_difficulty(mut self, max: u32) -> Self {
        self.max_difficulty = Some(max);
        self
    }
}

impl<P, C> Evaluator for ProofPredicate<P, C>
where
    P: Fn(&[u8], Candidate) -> Vec<u8> + Send + Sync,
    C: Fn(&[u8], u32) -> bool + Send + Sync,
{
    fn validate(&self, task: &TaskDescriptor) -> SearchResult<()> {
        match self.max_difficulty {
            Some(max) if task.difficulty().gt(&max) => Err(SearchError::invalid(format!(
                "difficulty {} exceeds the maximum of {max}",
                task.difficulty()
            ))),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, task: &TaskDescriptor, candidate: Candidate) -> anyhow::Result<Option<Witness>> {
        let proof = (self.proof)(task.payload(), candidate);
        if (self.check)(&proof, task.difficulty()) {
            return Ok(Some(Witness::new(candidate, proof)));
        }
        Ok(None)
    }
}

/// SHA-256 of the payload followed by the candidate in decimal.
pub fn sha256_proof(payload: &[u8], candidate: Candidate) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.update(candidate.to_string().as_bytes());
    hasher.finalize().to_vec()
}

/// Number of leading `'0'` characters in the lowercase hex encoding of `proof`.
pub fn leading_zero_digits(proof: &[u8]) -> u32 {
    let mut digits = 0;
    for byte in proof {
        if *byte == 0 {
            digits += 2;
            continue;
        }
        if byte >> 4 == 0 {
            digits += 1;
        }
        break;
    }
    digits
}

pub fn meets_hex_difficulty(proof: &[u8], difficulty: u32) -> bool {
    leading_zero_digits(proof).ge(&difficulty)
}

pub type Sha256HexPredicate = ProofPredicate<fn(&[u8], Candidate) -> Vec<u8>, fn(&[u8], u32) -> bool>;

/// The classic block puzzle: the hex digest must start with `difficulty` zeros.
pub fn sha256_hex_predicate() -> Sha256HexPredicate {
    let proof: fn(&[u8], Candidate) -> Vec<u8> = sha256_proof;
    let check: fn(&[u8], u32) -> bool = meets_hex_difficulty;
    // 32 digest bytes, two hex digits each
    ProofPredicate::new(proof, check).with_max_difficulty(64)
}
