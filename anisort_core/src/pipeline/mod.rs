//! Identification and sorting pipeline
//!
//! Files flow through a fixed sequence of stages connected by bounded
//! queues. Each stage either passes an item on, drops it with a reason,
//! or reports a fatal error that stops the whole run.

mod collaborators;
mod config;
mod context;
mod item;
mod runner;
mod stage;
pub mod stages;

pub use collaborators::{MediaProber, PathBuilder};
pub use config::{PipelineConfig, StageWorkers, TransferMode};
pub use context::PipelineContext;
pub use item::{IdentificationResult, WorkItem};
pub use runner::{DropRecord, Pipeline, PipelineReport, StageDescriptor, standard_stages};
pub use stage::{DropReason, Stage, StageOutcome};
