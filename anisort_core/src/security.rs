//! Credential holding with memory zeroing
//!
//! Passwords never appear in `Debug` or `Display` output and are zeroed when dropped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// A string that zeros its memory when dropped
#[derive(Clone, Default, Zeroize)]
pub struct SecureString {
    inner: Vec<u8>,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            inner: s.into().into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Constant-time comparison
    pub fn constant_time_eq(&self, other: &Self) -> bool {
        if self.inner.len() != other.inner.len() {
            return false;
        }

        let mut result = 0u8;
        for (a, b) in self.inner.iter().zip(other.inner.iter()) {
            result |= a ^ b;
        }
        result == 0
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.constant_time_eq(other)
    }
}

impl Eq for SecureString {}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Serialized masked so that dumping a config never leaks the password
impl Serialize for SecureString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.is_empty() { "" } else { "***" })
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// AniDB account credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: SecureString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_debug_and_display_hide_value() {
        let secure = SecureString::new("secret password");
        assert_eq!(format!("{secure:?}"), "SecureString(***)");
        assert_eq!(format!("{secure}"), "***");
        assert_eq!(secure.to_str().unwrap(), "secret password");
    }

    #[test]
    fn test_constant_time_comparison() {
        let secure1 = SecureString::new("password123");
        let secure2 = SecureString::new("password123");
        let secure3 = SecureString::new("different");

        assert!(secure1.constant_time_eq(&secure2));
        assert!(!secure1.constant_time_eq(&secure3));
        assert_eq!(secure1, secure2.clone());
    }

    #[test]
    fn test_credentials_debug_masks_password() {
        let credentials = Credentials::new("user", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
        assert!(credentials.is_complete());
        assert!(!Credentials::default().is_complete());
    }
}
