//! Validation related error types

use std::path::PathBuf;
use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Path too long for the configured limit
    #[error("Path too long: {path} exceeds maximum length of {max_length} characters")]
    PathTooLong { path: PathBuf, max_length: usize },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Encoded command does not fit in one datagram
    #[error("Command {command} is {size} bytes, exceeding the {max_size} byte packet limit")]
    PacketTooLarge {
        command: String,
        size: usize,
        max_size: usize,
    },

    /// A file status change that the lifecycle does not allow
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create a path too long error
    pub fn path_too_long(path: &std::path::Path, max_length: usize) -> Self {
        Self::PathTooLong {
            path: path.to_path_buf(),
            max_length,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn packet_too_large(command: &str, size: usize, max_size: usize) -> Self {
        Self::PacketTooLarge {
            command: command.to_string(),
            size,
            max_size,
        }
    }

    pub fn illegal_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_invalid_configuration_error() {
        let error = ValidationError::invalid_configuration("Bad config");
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("Bad config"));
    }

    #[test]
    fn test_path_too_long_error() {
        let path = Path::new("/very/long/path");
        let error = ValidationError::path_too_long(path, 100);
        assert!(error.to_string().contains("Path too long"));
        assert!(error.to_string().contains("/very/long/path"));
        assert!(error.to_string().contains("100"));
    }

    #[test]
    fn test_invalid_parameter_error() {
        let error = ValidationError::invalid_parameter("size", "must be positive");
        assert!(error.to_string().contains("Invalid parameter"));
        assert!(error.to_string().contains("size"));
        assert!(error.to_string().contains("must be positive"));
    }

    #[test]
    fn test_packet_too_large_error() {
        let error = ValidationError::packet_too_large("FILE", 1500, 1400);
        let message = error.to_string();
        assert!(message.contains("FILE"));
        assert!(message.contains("1500"));
        assert!(message.contains("1400"));
    }

    #[test]
    fn test_illegal_transition_error() {
        let error = ValidationError::illegal_transition("Imported", "NotYetImported");
        assert!(error.to_string().contains("from Imported to NotYetImported"));
    }
}
