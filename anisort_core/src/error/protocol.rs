//! Protocol related error types

use thiserror::Error;

/// Errors driven by AniDB status codes, plus the local session rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 555, the account or address is banned
    #[error("Banned by AniDB: {reason}")]
    Banned { reason: String },

    /// 504, this client name is banned
    #[error("Client banned by AniDB: {reason}")]
    ClientBanned { reason: String },

    /// 503, this client version is no longer accepted
    #[error("Client version outdated")]
    ClientOutdated,

    /// 505
    #[error("Illegal input or access denied")]
    IllegalInput,

    /// 502
    #[error("Access denied")]
    AccessDenied,

    /// 598
    #[error("Unknown command")]
    UnknownCommand,

    /// 501
    #[error("Login first")]
    LoginFirst,

    /// 506
    #[error("Invalid session")]
    InvalidSession,

    /// 602
    #[error("Server busy, try again later")]
    ServerBusy,

    /// 604
    #[error("Server timeout, try again later")]
    ServerTimeout,

    /// 601
    #[error("AniDB out of service, try again later")]
    OutOfService,

    /// 600
    #[error("AniDB internal server error")]
    InternalServerError,

    /// A non-whitelisted command was sent before authenticating
    #[error("Command '{command}' requires authentication")]
    AuthenticationRequired { command: String },

    /// The status is valid on the wire but not for this command
    #[error("Unexpected reply to {command}: {code} {message}")]
    UnexpectedResponse {
        command: String,
        code: u16,
        message: String,
    },

    /// The datagram could not be decoded
    #[error("Malformed reply: {reason}")]
    MalformedResponse { reason: String },
}

impl ProtocolError {
    pub fn banned(reason: impl Into<String>) -> Self {
        Self::Banned {
            reason: reason.into(),
        }
    }

    pub fn authentication_required(command: &str) -> Self {
        Self::AuthenticationRequired {
            command: command.to_string(),
        }
    }

    pub fn unexpected_response(command: &str, code: u16, message: &str) -> Self {
        Self::UnexpectedResponse {
            command: command.to_string(),
            code,
            message: message.to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Continuing after these would worsen a ban
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Banned { .. } | Self::ClientBanned { .. } | Self::ClientOutdated
        )
    }

    /// Check if this error is transient and can be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ServerBusy | Self::ServerTimeout | Self::OutOfService | Self::InternalServerError
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banned_error_carries_reason() {
        let error = ProtocolError::banned("your ban reason");
        assert_eq!(error.to_string(), "Banned by AniDB: your ban reason");
        assert!(error.is_fatal());
        assert!(!error.is_transient());
    }

    #[test]
    fn test_transient_errors() {
        for error in [
            ProtocolError::ServerBusy,
            ProtocolError::ServerTimeout,
            ProtocolError::OutOfService,
            ProtocolError::InternalServerError,
        ] {
            assert!(error.is_transient(), "{error} should be transient");
            assert!(!error.is_fatal(), "{error} should not be fatal");
        }
    }

    #[test]
    fn test_caller_bugs_are_surfaced() {
        for error in [
            ProtocolError::IllegalInput,
            ProtocolError::AccessDenied,
            ProtocolError::UnknownCommand,
            ProtocolError::LoginFirst,
            ProtocolError::InvalidSession,
        ] {
            assert!(!error.is_transient());
            assert!(!error.is_fatal());
        }
    }

    #[test]
    fn test_authentication_required_names_command() {
        let error = ProtocolError::authentication_required("LOGOUT");
        assert!(error.to_string().contains("LOGOUT"));
    }
}
