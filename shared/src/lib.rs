pub mod errors;
pub mod log;
pub mod types;

pub use errors::{SearchError, SearchResult};
pub use types::{Candidate, TaskDescriptor, Witness};

pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
