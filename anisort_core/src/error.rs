//! Error types for the anisort core library
//!
//! Errors are grouped by how the pipeline reacts to them. Connection errors and
//! a handful of protocol errors are fatal and stop all further network traffic;
//! everything else is caught at a stage boundary and only drops the offending item.

use thiserror::Error;

pub mod concurrency;
pub mod connection;
pub mod internal;
pub mod io;
pub mod protocol;
pub mod validation;

pub use self::concurrency::ConcurrencyError;
pub use self::connection::ConnectionError;
pub use self::io::{IoError, IoErrorKind};
pub use self::protocol::ProtocolError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the anisort core library
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// The remote service did not answer, or the socket is gone
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Status-code driven errors returned by the remote service
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Local input errors caught before anything is sent or written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence write conflicts
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// Cooperative cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Errors after which the process must stop talking to the remote service
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Connection(err) => err.is_fatal(),
            Self::Protocol(err) => err.is_fatal(),
            _ => false,
        }
    }

    /// Errors that are safe to retry on a later run
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(InternalError::persistence(format!("Database error: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_file_not_found_error_creation() {
        let path = Path::new("/non/existent/file.mkv");
        let error = Error::Io(IoError::file_not_found(path));

        match error {
            Error::Io(io_err) => {
                assert_eq!(io_err.kind, IoErrorKind::FileNotFound);
                assert_eq!(io_err.path, Some(path.to_path_buf()));
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_no_reply_is_fatal() {
        let error = Error::from(ConnectionError::no_reply(Duration::from_secs(30)));
        assert!(error.is_fatal());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("30"));
    }

    #[test]
    fn test_banned_is_fatal() {
        let error = Error::from(ProtocolError::banned("leech"));
        assert!(error.is_fatal());
        assert!(error.to_string().contains("leech"));
    }

    #[test]
    fn test_server_busy_is_transient_not_fatal() {
        let error = Error::from(ProtocolError::ServerBusy);
        assert!(error.is_transient());
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_local_errors_are_neither_fatal_nor_transient() {
        let errors = [
            Error::from(ValidationError::invalid_parameter("size", "must be positive")),
            Error::from(ConcurrencyError::stale_record("local_file", 1, 2, 3)),
            Error::from(InternalError::assertion("unreachable")),
            Error::Cancelled,
        ];

        for error in errors {
            assert!(!error.is_fatal(), "{error} should not be fatal");
            assert!(!error.is_transient(), "{error} should not be transient");
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let error: Error = io_error.into();

        match error {
            Error::Io(io_err) => assert_eq!(io_err.kind, IoErrorKind::PermissionDenied),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = io::Error::other("disk on fire");
        let error = Error::Io(IoError::from_std(io_error));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
