//! Outgoing command value object

use crate::hashing::ContentHash;
use crate::protocol::PROTOCOL_VERSION;
use crate::protocol::masks::{AnimeMask, FileMask};
use std::fmt;

/// Commands that may be sent before authenticating
pub const UNAUTHENTICATED_COMMANDS: &[&str] = &["PING", "ENCRYPT", "ENCODING", "AUTH", "VERSION"];

/// Parameter carrying the session token
pub const SESSION_PARAM: &str = "s";

/// A single parameter value
#[derive(Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Escaped before sending
    Text(String),
    /// Sent as uppercase hex
    Binary(Vec<u8>),
    /// Sent as decimal
    Number(u64),
}

impl ParamValue {
    /// Wire form of the value, escaping included
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => crate::protocol::codec::escape_value(text),
            Self::Binary(bytes) => bytes.iter().map(|byte| format!("{byte:02X}")).collect(),
            Self::Number(number) => number.to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&ContentHash> for ParamValue {
    fn from(hash: &ContentHash) -> Self {
        Self::Binary(hash.as_bytes().to_vec())
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Binary(_) => write!(f, "{}", self.encode()),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Command name with an ordered parameter list
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    params: Vec<(String, ParamValue)>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
        }
    }

    /// Append a parameter, replacing an existing one with the same key in place
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set_param(key, value);
        self
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Whether a session token must be attached
    pub fn requires_auth(&self) -> bool {
        !UNAUTHENTICATED_COMMANDS.contains(&self.name.as_str())
    }

    pub fn ping() -> Self {
        Self::new("PING")
    }

    pub fn auth(user: &str, pass: &str, client: &str, client_version: &str) -> Self {
        Self::new("AUTH")
            .param("user", user)
            .param("pass", pass)
            .param("protover", PROTOCOL_VERSION)
            .param("client", client)
            .param("clientver", client_version)
            .param("enc", "UTF8")
    }

    pub fn logout() -> Self {
        Self::new("LOGOUT")
    }

    /// `FILE` lookup by size and ED2K hash
    pub fn file_by_hash(
        size: u64,
        hash: &ContentHash,
        file_mask: FileMask,
        anime_mask: AnimeMask,
    ) -> Self {
        Self::new("FILE")
            .param("size", size)
            .param("ed2k", hash)
            .param("fmask", file_mask.to_string())
            .param("amask", anime_mask.to_string())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name)?;
        let mut params = f.debug_map();
        for (key, value) in &self.params {
            if key == "pass" {
                params.entry(key, &"***");
            } else {
                params.entry(key, value);
            }
        }
        params.finish()
    }
}
