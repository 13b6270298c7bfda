//! Core library for anisort
//!
//! Identifies local anime files against AniDB by their ED2K hash and moves
//! or copies them into a library layout. The pieces are usable on their own:
//!
//! - [`hashing`] streams files through the ED2K hasher
//! - [`protocol`] talks to the AniDB UDP API with rate limiting and session handling
//! - [`persistence`] records tracked files and everything done to them
//! - [`pipeline`] strings the above together into a staged worker pipeline

pub mod error;
pub mod hashing;
pub mod metadata;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod protocol;
pub mod security;
pub mod shutdown;

pub use error::{Error, Result};
pub use hashing::{ContentHash, ContentHasher, Ed2kHasher, HashOutput};
pub use metadata::{FileLookup, Resolution};
pub use persistence::{
    BlockingRepository, FileAction, FileActionKind, FileStatus, LocalFile, MemoryRepository,
    Repository,
};
pub use pipeline::{
    IdentificationResult, MediaProber, PathBuilder, Pipeline, PipelineConfig, PipelineContext,
    PipelineReport, TransferMode,
};
pub use progress::{NullProvider, ProgressProvider, ProgressUpdate, SharedProvider};
pub use protocol::{ProtocolClient, ProtocolConfig};
pub use security::{Credentials, SecureString};
pub use shutdown::Shutdown;
