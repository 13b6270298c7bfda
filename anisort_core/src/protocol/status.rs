//! Status codes that mean the same thing for every command
//!
//! Replies carrying one of these codes are turned into a [`ProtocolError`]
//! before the command-specific handling sees them.

use crate::error::ProtocolError;
use crate::protocol::messages::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalStatus {
    LoginFirst,
    AccessDenied,
    ClientOutdated,
    ClientBanned,
    IllegalInput,
    InvalidSession,
    Banned,
    UnknownCommand,
    InternalServerError,
    OutOfService,
    ServerBusy,
    ServerTimeout,
}

impl GlobalStatus {
    pub const ALL: [GlobalStatus; 12] = [
        Self::LoginFirst,
        Self::AccessDenied,
        Self::ClientOutdated,
        Self::ClientBanned,
        Self::IllegalInput,
        Self::InvalidSession,
        Self::Banned,
        Self::UnknownCommand,
        Self::InternalServerError,
        Self::OutOfService,
        Self::ServerBusy,
        Self::ServerTimeout,
    ];

    pub const fn code(self) -> u16 {
        match self {
            Self::LoginFirst => 501,
            Self::AccessDenied => 502,
            Self::ClientOutdated => 503,
            Self::ClientBanned => 504,
            Self::IllegalInput => 505,
            Self::InvalidSession => 506,
            Self::Banned => 555,
            Self::UnknownCommand => 598,
            Self::InternalServerError => 600,
            Self::OutOfService => 601,
            Self::ServerBusy => 602,
            Self::ServerTimeout => 604,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn to_error(self, response: &Response) -> ProtocolError {
        match self {
            Self::LoginFirst => ProtocolError::LoginFirst,
            Self::AccessDenied => ProtocolError::AccessDenied,
            Self::ClientOutdated => ProtocolError::ClientOutdated,
            Self::ClientBanned => ProtocolError::ClientBanned {
                reason: response.trailing_text("CLIENT BANNED"),
            },
            Self::IllegalInput => ProtocolError::IllegalInput,
            Self::InvalidSession => ProtocolError::InvalidSession,
            Self::Banned => ProtocolError::banned(response.trailing_text("BANNED")),
            Self::UnknownCommand => ProtocolError::UnknownCommand,
            Self::InternalServerError => ProtocolError::InternalServerError,
            Self::OutOfService => ProtocolError::OutOfService,
            Self::ServerBusy => ProtocolError::ServerBusy,
            Self::ServerTimeout => ProtocolError::ServerTimeout,
        }
    }
}

/// The error for a reply with a global status code, if it has one
pub fn global_error(response: &Response) -> Option<ProtocolError> {
    GlobalStatus::from_code(response.code).map(|status| status.to_error(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<u16> = GlobalStatus::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), GlobalStatus::ALL.len());
    }

    #[test]
    fn test_every_status_round_trips_through_its_code() {
        for status in GlobalStatus::ALL {
            assert_eq!(GlobalStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn test_every_status_maps_to_a_distinct_error() {
        let response = Response::new(0, "", vec![]);
        let errors: HashSet<String> = GlobalStatus::ALL
            .iter()
            .map(|status| format!("{:?}", std::mem::discriminant(&status.to_error(&response))))
            .collect();
        assert_eq!(errors.len(), GlobalStatus::ALL.len());
    }

    #[test]
    fn test_fatal_classification() {
        let response = Response::new(0, "", vec![]);
        let fatal: Vec<_> = GlobalStatus::ALL
            .into_iter()
            .filter(|status| status.to_error(&response).is_fatal())
            .collect();
        assert_eq!(
            fatal,
            vec![
                GlobalStatus::ClientOutdated,
                GlobalStatus::ClientBanned,
                GlobalStatus::Banned
            ]
        );
    }

    #[test]
    fn test_banned_reply_carries_reason() {
        let response = Response::new(555, "Banned your ban reason", vec![]);
        assert_eq!(
            global_error(&response),
            Some(ProtocolError::banned("your ban reason"))
        );
    }

    #[test]
    fn test_success_codes_are_not_global_errors() {
        for code in [200, 201, 203, 220, 300, 320, 500] {
            assert!(global_error(&Response::new(code, "", vec![])).is_none());
        }
    }
}
