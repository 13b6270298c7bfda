//! Records owned by the identification pipeline

use crate::error::ValidationError;
use crate::hashing::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Lifecycle of a tracked file.
///
/// `NotYetImported -> Hashed -> {NoFileFound, Error, ImportedMissingData, Imported}`.
/// Every non-terminal outcome may go back to `Hashed` when the file is searched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    NotYetImported,
    Hashed,
    NoFileFound,
    Error,
    ImportedMissingData,
    Imported,
}

impl FileStatus {
    pub const ALL: [FileStatus; 6] = [
        Self::NotYetImported,
        Self::Hashed,
        Self::NoFileFound,
        Self::Error,
        Self::ImportedMissingData,
        Self::Imported,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotYetImported => "not_yet_imported",
            Self::Hashed => "hashed",
            Self::NoFileFound => "no_file_found",
            Self::Error => "error",
            Self::ImportedMissingData => "imported_missing_data",
            Self::Imported => "imported",
        }
    }

    /// Setting the current status again is always allowed
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        use FileStatus::*;

        self == next
            || matches!(
                (self, next),
                (NotYetImported, Hashed | Error)
                    | (Hashed, NoFileFound | Error | ImportedMissingData | Imported)
                    | (NoFileFound | Error | ImportedMissingData, Hashed)
            )
    }

    /// Nothing more will happen to the file in this pipeline
    pub fn is_imported(self) -> bool {
        self == Self::Imported
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_parameter("status", &format!("unknown status {s:?}"))
            })
    }
}

/// A file on disk known to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub id: i64,
    pub path: PathBuf,
    pub hash: Option<ContentHash>,
    pub size: Option<u64>,
    pub status: FileStatus,
    /// AniDB file id once matched
    pub remote_file_id: Option<u32>,
    /// Incremented by every successful update
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalFile {
    pub fn new(id: i64, path: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id,
            path: path.into(),
            hash: None,
            size: None,
            status: FileStatus::NotYetImported,
            remote_file_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, refusing transitions outside the lifecycle
    pub fn set_status(&mut self, next: FileStatus) -> Result<(), ValidationError> {
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::illegal_transition(self.status, next));
        }
        self.status = next;
        Ok(())
    }

    pub fn is_hashed(&self) -> bool {
        self.hash.is_some() && self.size.is_some()
    }
}

/// What a [`FileAction`] records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileActionKind {
    Hash,
    Search,
    Move,
    Copy,
    /// Destination already existed, nothing was written
    Copied,
}

impl FileActionKind {
    pub const ALL: [FileActionKind; 5] = [
        Self::Hash,
        Self::Search,
        Self::Move,
        Self::Copy,
        Self::Copied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Search => "search",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Copied => "copied",
        }
    }
}

impl fmt::Display for FileActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileActionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_parameter("action kind", &format!("unknown kind {s:?}"))
            })
    }
}

/// Append-only audit record of one attempted operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAction {
    pub id: i64,
    pub local_file_id: i64,
    pub kind: FileActionKind,
    pub success: bool,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A [`FileAction`] that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileAction {
    pub local_file_id: i64,
    pub kind: FileActionKind,
    pub success: bool,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewFileAction {
    pub fn succeeded(local_file_id: i64, kind: FileActionKind) -> Self {
        Self {
            local_file_id,
            kind,
            success: true,
            info: None,
            created_at: Utc::now(),
        }
    }

    pub fn failed(local_file_id: i64, kind: FileActionKind, info: impl Into<String>) -> Self {
        Self {
            local_file_id,
            kind,
            success: false,
            info: Some(info.into()),
            created_at: Utc::now(),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Backdate the record
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub(crate) fn stored(self, id: i64) -> FileAction {
        FileAction {
            id,
            local_file_id: self.local_file_id,
            kind: self.kind,
            success: self.success,
            info: self.info,
            created_at: self.created_at,
        }
    }
}
