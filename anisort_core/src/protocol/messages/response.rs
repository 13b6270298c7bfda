//! Decoded reply value object

use crate::protocol::codec::{FIELD_SEPARATOR, unescape_value};

/// Status code, message line and non-blank body lines of one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub message: String,
    pub lines: Vec<String>,
}

impl Response {
    pub fn new(code: u16, message: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            lines,
        }
    }

    /// `|`-separated, unescaped fields of a body line
    pub fn fields(&self, line: usize) -> Option<Vec<String>> {
        self.lines.get(line).map(|line| {
            line.split(FIELD_SEPARATOR)
                .map(unescape_value)
                .collect::<Vec<_>>()
        })
    }

    /// Text following a leading keyword in the message, e.g. the reason in `BANNED reason`.
    /// Falls back to the body when the message carries nothing else.
    pub fn trailing_text(&self, keyword: &str) -> String {
        let message = self.message.trim();
        let rest = if message
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        {
            &message[keyword.len()..]
        } else {
            message
        };
        let rest = rest.trim_start_matches([' ', '-']).trim();

        if rest.is_empty() {
            self.lines.join(" ")
        } else {
            rest.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_split_and_unescape() {
        let response = Response::new(
            220,
            "FILE",
            vec!["312498|4896|Tom &amp; Jerry|Ghost`s".to_string()],
        );
        assert_eq!(
            response.fields(0).unwrap(),
            vec!["312498", "4896", "Tom & Jerry", "Ghost's"]
        );
        assert!(response.fields(1).is_none());
    }

    #[test]
    fn test_trailing_text_strips_keyword() {
        let response = Response::new(555, "Banned your ban reason", vec![]);
        assert_eq!(response.trailing_text("BANNED"), "your ban reason");
    }

    #[test]
    fn test_trailing_text_uses_body_when_message_is_bare() {
        let response = Response::new(555, "BANNED", vec!["flooding".to_string()]);
        assert_eq!(response.trailing_text("BANNED"), "flooding");
    }

    #[test]
    fn test_trailing_text_strips_dash_separator() {
        let response = Response::new(504, "CLIENT BANNED - old client", vec![]);
        assert_eq!(response.trailing_text("CLIENT BANNED"), "old client");
    }
}
