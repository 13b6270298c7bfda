//! Test utilities for the anisort workspace
//!
//! Mock transports and pipeline collaborators, builders for lookups and
//! tracked files, and canned AniDB replies.

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::{FileReplyBuilder, LocalFileBuilder, LookupBuilder, write_sample};
pub use mocks::{MockTransport, RecordingProgress, SentDatagram, StaticPathBuilder, StaticProber};
