use std::fmt::{Display, Formatter};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A nonce drawn from the search space.
pub type Candidate = u64;

/// Immutable description of one unit of work.
///
/// The payload is opaque to the search engine; only the evaluator knows how to
/// combine it with a candidate. Cloning is cheap, the payload buffer is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    payload: Bytes,
    difficulty: u32,
}

impl TaskDescriptor {
    pub fn new(payload: impl Into<Bytes>, difficulty: u32) -> Self {
        Self {
            payload: payload.into(),
            difficulty,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }
}

impl Display for TaskDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "payload: {} bytes, difficulty: {}", self.payload.len(), self.difficulty)
    }
}

/// A candidate together with the proof that it satisfies the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Witness {
    pub candidate: Candidate,
    #[serde(with = "hex::serde")]
    pub proof: Vec<u8>,
}

impl Witness {
    pub fn new(candidate: Candidate, proof: impl Into<Vec<u8>>) -> Self {
        Self {
            candidate,
            proof: proof.into(),
        }
    }

    pub fn proof_hex(&self) -> String {
        hex::encode(&self.proof)
    }
}

impl Display for Witness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "nonce: {}, proof: {}", self.candidate, self.proof_hex())
    }
}
