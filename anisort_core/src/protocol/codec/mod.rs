//! Wire encoding and decoding
//!
//! Commands go out as `NAME key=value&key=value` in a single datagram. Values
//! are HTML-escaped and line breaks become a `<br/>` marker, so a command never
//! contains a literal newline. Replies come back as a status line followed by
//! zero or more body lines.

mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

/// Marker replacing a line break inside a parameter value
pub const ENCODED_NEWLINE: &str = "<br/>";

/// Separator between fields of a reply body line
pub const FIELD_SEPARATOR: char = '|';

/// Separator between values of a multi-valued reply field
pub const LIST_SEPARATOR: char = '\'';

/// Escape a parameter value for transmission.
///
/// `\r\n`, `\r` and `\n` each count as one line break.
pub fn escape_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 8);
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                result.push_str(ENCODED_NEWLINE);
            }
            '\n' => result.push_str(ENCODED_NEWLINE),
            _ => result.push(ch),
        }
    }

    result
}

const REPLY_ESCAPES: &[(&str, &str)] = &[
    ("<br />", "\n"),
    ("<br/>", "\n"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("`", "'"),
];

/// Decode a single reply field value
pub fn unescape_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    'outer: while !rest.is_empty() {
        for (escaped, plain) in REPLY_ESCAPES {
            if let Some(tail) = rest.strip_prefix(escaped) {
                result.push_str(plain);
                rest = tail;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            result.push(ch);
        }
        rest = chars.as_str();
    }

    result
}
