//! The six standard stages, in pipeline order

mod fetch;
mod hash;
mod probe;
mod rename;
mod retry_filter;
mod search;

pub use fetch::FetchStage;
pub use hash::HashStage;
pub use probe::ProbeStage;
pub use rename::{RenameStage, transfer};
pub use retry_filter::{RetryFilterStage, retry_decision};
pub use search::SearchStage;
