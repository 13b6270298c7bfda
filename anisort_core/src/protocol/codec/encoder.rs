//! Command encoder

use crate::error::ValidationError;
use crate::protocol::MAX_PACKET_SIZE;
use crate::protocol::messages::Command;
use bytes::{BufMut, Bytes, BytesMut};
use log::trace;

/// Encoder for outgoing commands
#[derive(Debug, Clone)]
pub struct Encoder {
    max_packet_size: usize,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
        }
    }

    /// Encode a command, refusing anything that would not fit in one datagram
    pub fn encode(&self, command: &Command) -> Result<Bytes, ValidationError> {
        if command.name().is_empty() {
            return Err(ValidationError::invalid_parameter(
                "command",
                "command name is empty",
            ));
        }

        let mut buffer = BytesMut::with_capacity(self.max_packet_size);
        buffer.put(command.name().as_bytes());

        for (index, (key, value)) in command.params().iter().enumerate() {
            buffer.put_u8(if index == 0 { b' ' } else { b'&' });
            buffer.put(key.as_bytes());
            buffer.put_u8(b'=');
            buffer.put(value.encode().as_bytes());
        }

        if buffer.len() > self.max_packet_size {
            return Err(ValidationError::packet_too_large(
                command.name(),
                buffer.len(),
                self.max_packet_size,
            ));
        }

        trace!("Encoded {} into {} bytes", command.name(), buffer.len());
        Ok(buffer.freeze())
    }

    /// Render for logs with the password replaced
    pub fn masked(encoded: &[u8]) -> String {
        let text = String::from_utf8_lossy(encoded);
        let Some(space) = text.find(' ') else {
            return text.into_owned();
        };

        let mut masked = text[..=space].to_string();
        let mut start = space + 1;
        loop {
            let end = next_separator(&text, start).unwrap_or(text.len());
            let param = &text[start..end];
            if param.starts_with("pass=") {
                masked.push_str("pass=***");
            } else {
                masked.push_str(param);
            }
            if end == text.len() {
                return masked;
            }
            masked.push('&');
            start = end + 1;
        }
    }
}

/// A separator is an `&` followed by `key=`. Escaped values only contain
/// `&` as the start of an entity, which always reaches `;` before any `=`.
fn next_separator(text: &str, from: usize) -> Option<usize> {
    text[from..]
        .match_indices('&')
        .map(|(offset, _)| from + offset)
        .find(|&index| {
            let tail = &text[index + 1..];
            match tail.find('=') {
                Some(end) => {
                    end > 0
                        && tail[..end]
                            .bytes()
                            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
                }
                None => false,
            }
        })
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bare_command() {
        let encoded = Encoder::new().encode(&Command::ping()).unwrap();
        assert_eq!(&encoded[..], b"PING");
    }

    #[test]
    fn test_encode_params_in_order() {
        let command = Command::new("AUTH").param("user", "me").param("pass", "a&b");
        let encoded = Encoder::new().encode(&command).unwrap();
        assert_eq!(&encoded[..], b"AUTH user=me&pass=a&amp;b");
    }

    #[test]
    fn test_encode_multiline_value_has_no_newline() {
        let command = Command::new("NOTIFYADD").param("text", "one\ntwo\r\nthree");
        let encoded = Encoder::new().encode(&command).unwrap();
        assert_eq!(&encoded[..], b"NOTIFYADD text=one<br/>two<br/>three");
    }

    #[test]
    fn test_encode_oversized_command_is_rejected() {
        let command = Command::new("FILE").param("padding", "x".repeat(MAX_PACKET_SIZE));
        match Encoder::new().encode(&command) {
            Err(ValidationError::PacketTooLarge { size, max_size, .. }) => {
                assert!(size > max_size);
                assert_eq!(max_size, MAX_PACKET_SIZE);
            }
            other => panic!("expected PacketTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_exactly_max_size_is_accepted() {
        // "FILE p=" is 7 bytes
        let command = Command::new("FILE").param("p", "x".repeat(MAX_PACKET_SIZE - 7));
        let encoded = Encoder::new().encode(&command).unwrap();
        assert_eq!(encoded.len(), MAX_PACKET_SIZE);
    }

    #[test]
    fn test_encode_empty_name_is_rejected() {
        assert!(Encoder::new().encode(&Command::new("")).is_err());
    }

    #[test]
    fn test_masked_hides_password() {
        let masked = Encoder::masked(b"AUTH user=me&pass=secret&protover=3");
        assert_eq!(masked, "AUTH user=me&pass=***&protover=3");

        let masked = Encoder::masked(b"AUTH pass=secret&user=me");
        assert_eq!(masked, "AUTH pass=***&user=me");
    }

    #[test]
    fn test_masked_hides_escaped_password() {
        let command = Command::new("AUTH")
            .param("user", "me")
            .param("pass", "hunter&secret2")
            .param("protover", "3");
        let encoded = Encoder::new().encode(&command).unwrap();
        let masked = Encoder::masked(&encoded);

        assert!(!masked.contains("secret2"));
        assert!(!masked.contains("hunter"));
        assert_eq!(masked, "AUTH user=me&pass=***&protover=3");

        let command = Command::new("AUTH").param("pass", "x&y=z<q>").param("user", "me");
        let masked = Encoder::masked(&Encoder::new().encode(&command).unwrap());
        assert_eq!(masked, "AUTH pass=***&user=me");
    }

    #[test]
    fn test_masked_leaves_other_commands_alone() {
        assert_eq!(Encoder::masked(b"FILE size=1&ed2k=abc"), "FILE size=1&ed2k=abc");
        assert_eq!(Encoder::masked(b"PING"), "PING");
    }
}
