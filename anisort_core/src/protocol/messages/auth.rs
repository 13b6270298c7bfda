//! AUTH reply interpretation

use crate::error::ProtocolError;
use crate::protocol::messages::Response;

pub const LOGIN_ACCEPTED: u16 = 200;
pub const LOGIN_ACCEPTED_NEW_VERSION: u16 = 201;
pub const LOGGED_OUT: u16 = 203;
pub const LOGIN_FAILED: u16 = 500;

/// Outcome of an AUTH exchange that did not raise a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub success: bool,
    pub session: Option<String>,
    pub has_new_version: bool,
    pub code: u16,
    pub message: String,
}

impl AuthResult {
    /// Interpret a reply already cleared of global error codes
    pub fn from_response(response: &Response) -> Result<Self, ProtocolError> {
        match response.code {
            LOGIN_ACCEPTED | LOGIN_ACCEPTED_NEW_VERSION => {
                let session = response
                    .message
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| ProtocolError::malformed("login accepted without a session"))?;

                Ok(Self {
                    success: true,
                    session: Some(session.to_string()),
                    has_new_version: response.code == LOGIN_ACCEPTED_NEW_VERSION,
                    code: response.code,
                    message: response.message.clone(),
                })
            }
            code => Ok(Self {
                success: false,
                session: None,
                has_new_version: false,
                code,
                message: response.message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_accepted() {
        let response = Response::new(200, "abc123 newname", vec![]);
        let result = AuthResult::from_response(&response).unwrap();
        assert!(result.success);
        assert_eq!(result.session.as_deref(), Some("abc123"));
        assert!(!result.has_new_version);
    }

    #[test]
    fn test_login_accepted_new_version() {
        let response = Response::new(201, "xyz LOGIN ACCEPTED - NEW VERSION AVAILABLE", vec![]);
        let result = AuthResult::from_response(&response).unwrap();
        assert!(result.success);
        assert!(result.has_new_version);
        assert_eq!(result.session.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_login_failed_is_not_an_error() {
        let response = Response::new(LOGIN_FAILED, "LOGIN FAILED", vec![]);
        let result = AuthResult::from_response(&response).unwrap();
        assert!(!result.success);
        assert!(result.session.is_none());
        assert_eq!(result.code, 500);
    }

    #[test]
    fn test_login_accepted_without_session_is_malformed() {
        let response = Response::new(200, "", vec![]);
        assert!(matches!(
            AuthResult::from_response(&response),
            Err(ProtocolError::MalformedResponse { .. })
        ));
    }
}
