//! Library side of the `anisort` binary, split out so it can be tested

pub mod config;
pub mod discovery;
pub mod orchestrators;
pub mod path_builder;
pub mod prober;
pub mod progress;
pub mod terminal;
