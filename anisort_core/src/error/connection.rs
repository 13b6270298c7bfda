//! Connection level errors for the UDP transport

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the socket layer rather than by a status code
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// No reply datagram arrived in time. The remote service silently drops
    /// traffic from throttled or banned clients, so this is treated as a refusal.
    #[error("No reply from AniDB within {}s, connection refused", timeout.as_secs())]
    NoReply { timeout: Duration },

    /// The client has not been connected yet
    #[error("Client is not connected")]
    NotConnected,

    /// The client was closed while a request was waiting
    #[error("Connection closed")]
    Closed,

    /// A fatal error already occurred; no further traffic is allowed
    #[error("Network activity halted after a fatal error: {reason}")]
    Halted { reason: String },

    /// Socket level failure
    #[error("Socket error during {operation}: {source}")]
    Socket {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ConnectionError {
    pub fn no_reply(timeout: Duration) -> Self {
        Self::NoReply { timeout }
    }

    pub fn socket(operation: &'static str, source: std::io::Error) -> Self {
        Self::Socket { operation, source }
    }

    /// A missing reply means the service is refusing us
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoReply { .. } | Self::Halted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reply_message() {
        let error = ConnectionError::no_reply(Duration::from_secs(30));
        assert!(error.to_string().contains("30s"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_socket_error_keeps_operation() {
        let error = ConnectionError::socket("bind", std::io::Error::other("address in use"));
        assert!(error.to_string().contains("bind"));
        assert!(error.to_string().contains("address in use"));
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_halted_stays_fatal() {
        let error = ConnectionError::Halted {
            reason: "banned".into(),
        };
        assert!(error.is_fatal());
        assert!(error.to_string().contains("banned"));
    }

    #[test]
    fn test_closed_is_not_fatal() {
        assert!(!ConnectionError::Closed.is_fatal());
        assert!(!ConnectionError::NotConnected.is_fatal());
    }
}
