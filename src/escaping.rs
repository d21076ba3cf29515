//! Render raw output bytes as readable expectation text and back

use crate::newline::trim_newlines;
use crate::Error;

const ESCAPED_MARKERS: [&str; 4] = [" (escaped)", " \\(escaped\\)", " (esc)", " \\(esc\\)"];

/// Which characters of captured output are shown as escape sequences
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Escaper {
    /// Everything outside of printable ASCII is escaped
    Ascii,
    /// Only non-printable characters of valid UTF-8 are escaped
    #[default]
    Unicode,
}

impl Escaper {
    /// Render bytes with all non-printable characters escaped
    pub fn escaped_printable(&self, raw: &[u8]) -> String {
        match self {
            Self::Ascii => escaped_printable_ascii(raw),
            Self::Unicode => escaped_printable_unicode(raw),
        }
    }

    /// Render an output line as an expectation, marked ` (escaped)` when
    /// escape sequences were needed
    pub fn escaped_expectation(&self, line: &[u8]) -> String {
        let line = trim_newlines(line);
        let escaped = self.escaped_printable(line);
        if escaped == String::from_utf8_lossy(line) {
            escaped
        } else {
            format!("{escaped} (escaped)")
        }
    }
}

fn escaped_printable_ascii(bytes: &[u8]) -> String {
    if bytes.iter().all(|b| matches!(*b, b'\x20'..=b'\x7e')) {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut escaped = String::with_capacity(bytes.len());
    for byte in bytes {
        push_escaped_byte(&mut escaped, *byte);
    }
    escaped
}

fn escaped_printable_unicode(bytes: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return escaped_printable_ascii(bytes);
    };
    let mut escaped = String::with_capacity(text.len());
    let mut buf = [0; 4];
    for ch in text.chars() {
        if is_unprintable(ch) {
            for byte in ch.encode_utf8(&mut buf).as_bytes() {
                push_escaped_byte(&mut escaped, *byte);
            }
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn is_unprintable(ch: char) -> bool {
    ch.is_control()
        || matches!(
            ch,
            '\u{200b}'..='\u{200f}' | '\u{2028}'..='\u{202e}' | '\u{2060}'..='\u{2064}' | '\u{feff}'
        )
}

fn push_escaped_byte(out: &mut String, byte: u8) {
    match byte {
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b'\x07' => out.push_str("\\a"),
        b'\x08' => out.push_str("\\b"),
        b'\x0b' => out.push_str("\\v"),
        b'\x0c' => out.push_str("\\f"),
        b'\\' => out.push_str("\\\\"),
        b'\x20'..=b'\x7e' => out.push(byte as char),
        _ => out.push_str(&format!("\\x{byte:02x}")),
    }
}

/// Strip a trailing ` (escaped)` / ` (esc)` marker from an expression
pub fn strip_escaped_marker(expression: &str) -> Option<&str> {
    ESCAPED_MARKERS
        .iter()
        .find_map(|marker| expression.strip_suffix(*marker))
}

/// Resolve the escape sequences of an `(escaped)` expression into raw bytes
///
/// Supported: `\\`, `\a`, `\b`, `\e`, `\f`, `\r`, `\t`, `\v`, `\xHH` and
/// `\0OO`. Any other sequence is kept as written.
pub fn unescape(expression: &str) -> crate::Result<Vec<u8>> {
    let mut chars = expression.chars();
    let mut bytes = Vec::with_capacity(expression.len());
    let mut buf = [0; 4];
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(code) = chars.next() else {
            return Err(Error::new("unused trailing escape"));
        };
        match code {
            '\\' => bytes.push(b'\\'),
            'a' => bytes.push(b'\x07'),
            'b' => bytes.push(b'\x08'),
            'e' => bytes.push(b'\x1b'),
            'f' => bytes.push(b'\x0c'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'v' => bytes.push(b'\x0b'),
            'x' => bytes.push(take_radix(&mut chars, 16)?),
            '0' => bytes.push(take_radix(&mut chars, 8)?),
            other => {
                bytes.push(b'\\');
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    Ok(bytes)
}

fn take_radix(chars: &mut std::str::Chars<'_>, radix: u32) -> crate::Result<u8> {
    let digits: String = chars.take(2).collect();
    if digits.chars().count() != 2 {
        return Err(Error::new(format!(
            "incomplete escape sequence `{digits}`"
        )));
    }
    u8::from_str_radix(&digits, radix)
        .map_err(|err| Error::new(format!("invalid escape sequence `{digits}`: {err}")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn printable_is_unchanged() {
        assert_eq!(Escaper::Unicode.escaped_printable(b"foo bar"), "foo bar");
        assert_eq!(Escaper::Ascii.escaped_printable(b"foo bar"), "foo bar");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(
            Escaper::Unicode.escaped_printable(b"\x1b[1mbold\x1b[0m\ttab"),
            "\\x1b[1mbold\\x1b[0m\\ttab"
        );
    }

    #[test]
    fn unicode_keeps_letters() {
        let raw = "caf\u{e9}\u{7}".as_bytes();
        assert_eq!(Escaper::Unicode.escaped_printable(raw), "caf\u{e9}\\a");
        assert_eq!(Escaper::Ascii.escaped_printable(raw), "caf\\xc3\\xa9\\a");
    }

    #[test]
    fn invalid_utf8_falls_back_to_ascii() {
        assert_eq!(Escaper::Unicode.escaped_printable(b"a\xffb"), "a\\xffb");
    }

    #[test]
    fn expectation_marks_escaped_lines() {
        assert_eq!(Escaper::Unicode.escaped_expectation(b"Wrong"), "Wrong");
        assert_eq!(Escaper::Unicode.escaped_expectation(b"Hello\n"), "Hello");
        assert_eq!(
            Escaper::Unicode.escaped_expectation(b"a\tb\n"),
            "a\\tb (escaped)"
        );
    }

    #[test]
    fn escaped_marker() {
        assert_eq!(strip_escaped_marker("foo"), None);
        assert_eq!(strip_escaped_marker("foo (escaped)"), Some("foo"));
        assert_eq!(strip_escaped_marker("foo (esc)"), Some("foo"));
        assert_eq!(strip_escaped_marker("foo (escaped) not"), None);
    }

    #[test]
    fn unescape_sequences() {
        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("foo", b"foo".to_vec()),
            ("foo\\x12bar", b"foo\x12bar".to_vec()),
            ("foo\\tbar", b"foo\tbar".to_vec()),
            ("foo\\nbar", b"foo\\nbar".to_vec()),
            ("foo\\\\nbar", b"foo\\nbar".to_vec()),
            ("\\007", b"\x07".to_vec()),
            ("\\\\\\\\", b"\\\\".to_vec()),
        ];
        for (from, expected) in cases {
            assert_eq!(unescape(from).unwrap(), expected, "from `{from}`");
        }
    }

    #[test]
    fn unescape_rejects_broken_sequences() {
        assert!(unescape("foo\\").is_err());
        assert!(unescape("foo\\x1").is_err());
        assert!(unescape("foo\\xzz").is_err());
    }
}
