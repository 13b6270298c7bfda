//! I/O related error types

use std::path::PathBuf;
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// Path or file name too long for the filesystem
    PathTooLong,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a file not found error
    pub fn file_not_found(path: &std::path::Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: &std::path::Path, source: std::io::Error) -> Self {
        Self {
            kind: IoErrorKind::PermissionDenied,
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidFilename => IoErrorKind::PathTooLong,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Create an I/O error with a path
    pub fn with_path(mut self, path: &std::path::Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => {
            format!("File not found: {}", path.display())
        }
        (IoErrorKind::FileNotFound, None) => "File not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for file: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::PathTooLong, Some(path)) => {
            format!("Path too long for filesystem: {}", path.display())
        }
        (IoErrorKind::PathTooLong, None) => "Path too long for filesystem".to_string(),
        (IoErrorKind::Other, path) => {
            let detail = error
                .source
                .as_ref()
                .map(|source| source.to_string())
                .unwrap_or_default();
            match path {
                Some(path) => format!("I/O error on {}: {detail}", path.display()),
                None => format!("I/O error: {detail}"),
            }
        }
    }
}
