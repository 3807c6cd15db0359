use std::{fs::File, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Give up after this many milliseconds. `None` searches until a witness
    /// turns up or the space runs out.
    pub deadline_ms: Option<u64>,
    /// Exclusive upper bound of the candidate space.
    pub candidate_limit: Option<u64>,
    /// Pin each worker thread to its own core.
    pub pin_cores: bool,
}

impl SearchConfig {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        // round up so a sub-millisecond deadline never becomes zero
        self.deadline_ms = Some(deadline.as_nanos().div_ceil(1_000_000) as u64);
        self
    }

    pub fn with_candidate_limit(mut self, limit: u64) -> Self {
        self.candidate_limit = Some(limit);
        self
    }

    pub fn with_pin_cores(mut self, pin: bool) -> Self {
        self.pin_cores = pin;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

/// Settings file for the `miner` binary. Command line flags override it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MinerConfig {
    pub workers: Option<usize>,
    #[serde(flatten)]
    pub search: SearchConfig,
}

pub fn load_config_file<P>(config_file: P) -> Result<MinerConfig, io::Error>
where
    P: AsRef<Path>, {
    let file = File::open(config_file)?;
    let config = serde_json::from_reader(file)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, format!("{err}")))?;
    Ok(config)
}
