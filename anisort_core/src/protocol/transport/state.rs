//! Session state of the protocol client

use std::fmt;

/// `Disconnected -> Connected -> Authenticated`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Authenticated { session: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The session token while authenticated
    pub fn session(&self) -> Option<&str> {
        match self {
            Self::Authenticated { session } => Some(session),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Authenticated { .. } => write!(f, "Authenticated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        let state = ConnectionState::default();
        assert!(!state.is_connected());
        assert!(!state.is_authenticated());
        assert_eq!(state.session(), None);

        let state = ConnectionState::Connected;
        assert!(state.is_connected());
        assert!(!state.is_authenticated());

        let state = ConnectionState::Authenticated {
            session: "abc".into(),
        };
        assert!(state.is_connected());
        assert!(state.is_authenticated());
        assert_eq!(state.session(), Some("abc"));
    }

    #[test]
    fn test_display_hides_session() {
        let state = ConnectionState::Authenticated {
            session: "secret".into(),
        };
        assert_eq!(state.to_string(), "Authenticated");
    }
}
