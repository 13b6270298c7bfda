//! Glue between parsed commands and the core library

pub mod hash_orchestrator;
pub mod sort_orchestrator;
