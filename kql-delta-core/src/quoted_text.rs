//! Quoted string literals for free-text command properties.
//!
//! Folders, doc strings and other free text are embedded in control commands
//! as double-quoted literals. [`QuotedText`] owns the raw text and knows how
//! to escape it; [`decode`] reads a literal back as written in a script.

use std::fmt;

/// Raw free text destined for a quoted literal.
///
/// Equality and hashing use the raw text, so two values compare equal
/// regardless of how their literals were spelled in a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuotedText {
    text: String,
}

impl QuotedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Wrap optional text, treating missing, empty and whitespace-only input
    /// as absent.
    pub fn from_text(text: Option<&str>) -> Option<Self> {
        match text {
            Some(t) if !t.trim().is_empty() => Some(Self::new(t)),
            _ => None,
        }
    }

    /// The unescaped text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render as an escaped, double-quoted literal.
    pub fn to_script(&self) -> String {
        encode(&self.text)
    }
}

impl fmt::Display for QuotedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script())
    }
}

/// Escape raw text into a double-quoted literal.
///
/// Backslashes are escaped first so the escapes introduced for quotes and
/// line breaks are not escaped a second time.
pub fn encode(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"", escaped)
}

/// Decode a string literal back into its raw text.
///
/// Accepts `"..."` and `'...'` literals with backslash escapes, and verbatim
/// `@"..."` / `@'...'` literals where a doubled quote stands for one quote.
/// Returns `None` if `literal` is not exactly one well-formed literal.
pub fn decode(literal: &str) -> Option<String> {
    let (verbatim, body) = match literal.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let mut chars = body.chars();
    let quote = chars.next().filter(|c| *c == '"' || *c == '\'')?;

    let mut out = String::with_capacity(body.len());
    let mut closed = false;
    while let Some(c) = chars.next() {
        if closed {
            // Trailing characters after the closing quote.
            return None;
        }
        if c == quote {
            if verbatim && chars.clone().next() == Some(quote) {
                chars.next();
                out.push(quote);
            } else {
                closed = true;
            }
        } else if c == '\\' && !verbatim {
            let escaped = match chars.next()? {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '0' => '\0',
                other => other,
            };
            out.push(escaped);
        } else {
            out.push(c);
        }
    }

    closed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_text() {
        assert_eq!(encode("Reports"), "\"Reports\"");
    }

    #[test]
    fn test_encode_escapes_in_order() {
        assert_eq!(encode(r#"a\"b"#), r#""a\\\"b""#);
        assert_eq!(encode("line1\r\nline2"), "\"line1\\r\\nline2\"");
    }

    #[test]
    fn test_round_trip_special_characters() {
        let samples = [
            "",
            "plain",
            "back\\slash",
            "a \"quoted\" word",
            "multi\nline",
            "carriage\rreturn",
            "mixed \\\"\n\r\\n literal",
            "trailing backslash \\",
            "unicode é ✓",
        ];
        for s in samples {
            assert_eq!(decode(&encode(s)).as_deref(), Some(s), "round trip of {:?}", s);
        }
    }

    #[test]
    fn test_decode_single_quoted() {
        assert_eq!(decode(r"'it\'s'").as_deref(), Some("it's"));
    }

    #[test]
    fn test_decode_verbatim() {
        assert_eq!(decode(r#"@"C:\temp\""x""""#).as_deref(), Some(r#"C:\temp\"x""#));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(decode("unquoted"), None);
        assert_eq!(decode("\"unterminated"), None);
        assert_eq!(decode("\"a\" trailing"), None);
        assert_eq!(decode("\"dangling\\"), None);
    }

    #[test]
    fn test_from_text_blank_is_absent() {
        assert_eq!(QuotedText::from_text(None), None);
        assert_eq!(QuotedText::from_text(Some("")), None);
        assert_eq!(QuotedText::from_text(Some("  \t\n")), None);
        assert_eq!(
            QuotedText::from_text(Some(" Folder ")),
            Some(QuotedText::new(" Folder "))
        );
    }

    #[test]
    fn test_equality_uses_raw_text() {
        let a = QuotedText::new("doc");
        let b = QuotedText::new(decode("'doc'").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "\"doc\"");
    }
}
