//! Reply decoder

use crate::error::ProtocolError;
use crate::protocol::messages::Response;
use log::trace;

/// Decoder for reply datagrams
#[derive(Debug, Clone, Default)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    /// Split a datagram into status code, message and body lines.
    ///
    /// The first three bytes are the code and the fourth is a separator.
    /// Blank body lines are dropped.
    pub fn decode(&self, datagram: &[u8]) -> Result<Response, ProtocolError> {
        let text = std::str::from_utf8(datagram)
            .map_err(|e| ProtocolError::malformed(format!("reply is not UTF-8: {e}")))?;

        let digits = text
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| {
                ProtocolError::malformed(format!(
                    "reply does not start with a status code: {:?}",
                    text.chars().take(16).collect::<String>()
                ))
            })?;
        let code = digits
            .parse::<u16>()
            .map_err(|e| ProtocolError::malformed(format!("bad status code: {e}")))?;

        let mut rest = &text[3..];
        if let Some(separator) = rest.chars().next()
            && separator != '\n'
            && separator != '\r'
        {
            rest = &rest[separator.len_utf8()..];
        }

        let mut lines = rest.split('\n').map(|line| line.trim_end_matches('\r'));
        let message = lines.next().unwrap_or_default().to_string();
        let body = lines
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        trace!("Decoded reply {code} {message} with {} body lines", body.len());
        Ok(Response::new(code, message, body))
    }
}
