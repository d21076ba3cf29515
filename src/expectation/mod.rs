//! Expected output lines and the annotation syntax that encodes them
//!
//! Every output line of a test case is an expectation. A trailing annotation
//! in parentheses selects how the line is matched:
//!
//! ```text
//! <expression> (<kind><quantifier>)
//! ```
//!
//! | Kind                | Matches                                       |
//! |---------------------|-----------------------------------------------|
//! | `equal`, `eq`, none | the exact bytes followed by a newline         |
//! | `no-eol`            | the exact bytes without a trailing newline    |
//! | `escaped`, `esc`    | like `equal`, after resolving `\t`, `\xNN`, ..|
//! | `glob`, `gl`        | a wildcard pattern (`*`, `?`)                 |
//! | `regex`, `re`       | a regular expression over the whole line      |
//!
//! | Quantifier | Meaning                        |
//! |------------|--------------------------------|
//! | none       | exactly one line               |
//! | `?`        | zero or one line               |
//! | `+`        | one or more lines              |
//! | `*`        | zero or more lines             |

mod glob;
mod regex;

use std::sync::OnceLock;

use crate::escaping::strip_escaped_marker;
use crate::escaping::unescape;
use crate::escaping::Escaper;
use crate::newline::trim_newlines;

use self::glob::Glob;

/// How an [`Expectation`] is compared with a line of output
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectationKind {
    Equal,
    Glob,
    Regex,
}

impl ExpectationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Glob => "glob",
            Self::Regex => "regex",
        }
    }
}

impl std::fmt::Display for ExpectationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

/// One expected line (or run of lines) of output
#[derive(Clone, Debug)]
pub struct Expectation {
    kind: ExpectationKind,
    pattern: Vec<u8>,
    optional: bool,
    multiline: bool,
    is_regex: bool,
    no_eol: bool,
    original: String,
    matcher: Matcher,
}

#[derive(Clone, Debug)]
enum Matcher {
    Equal,
    Glob(Glob),
    Regex(::regex::bytes::Regex),
}

impl Expectation {
    /// Parse an annotated line with the default (non-cram) rules
    pub fn parse(line: &str) -> crate::Result<Self> {
        ExpectationMaker::new().parse(line)
    }

    pub fn kind(&self) -> ExpectationKind {
        self.kind
    }

    /// Expected bytes (`Equal`), wildcard pattern (`Glob`) or regex source (`Regex`)
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Whether the line must lack a trailing newline
    pub fn is_no_eol(&self) -> bool {
        self.no_eol
    }

    /// The line as it was written in the document
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Decompose into `(kind, pattern, multiline, is_regex)`
    pub fn unmake(&self) -> (ExpectationKind, Vec<u8>, bool, bool) {
        (self.kind, self.pattern.clone(), self.multiline, self.is_regex)
    }

    /// Whether one physical line of output, including its terminator, matches
    pub fn matches(&self, line: &[u8]) -> bool {
        match &self.matcher {
            Matcher::Equal if self.no_eol => self.pattern == line,
            Matcher::Equal => {
                line.len() == self.pattern.len() + 1
                    && line.ends_with(b"\n")
                    && line.starts_with(&self.pattern)
            }
            Matcher::Glob(glob) => glob.matches(trim_newlines(line)),
            Matcher::Regex(regex) => regex.is_match(trim_newlines(line)),
        }
    }

    /// Render back into the annotation syntax, escaping what is not printable
    pub fn to_expression_string(&self, escaper: &Escaper) -> String {
        let quantifier = match (self.optional, self.multiline) {
            (true, true) => "*",
            (true, false) => "?",
            (false, true) => "+",
            (false, false) => "",
        };
        let rendered = escaper.escaped_printable(&self.pattern);
        let unprintable = rendered != String::from_utf8_lossy(&self.pattern);
        match self.kind {
            ExpectationKind::Equal if unprintable => format!("{rendered} (escaped{quantifier})"),
            ExpectationKind::Equal if self.no_eol => format!("{rendered} (no-eol{quantifier})"),
            ExpectationKind::Equal if quantifier.is_empty() => rendered,
            ExpectationKind::Equal => format!("{rendered} ({quantifier})"),
            ExpectationKind::Glob if unprintable => {
                format!("{rendered} (escaped) (glob{quantifier})")
            }
            kind => format!("{rendered} ({kind}{quantifier})"),
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_expression_string(&Escaper::default()).fmt(f)
    }
}

impl PartialEq for Expectation {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.pattern == other.pattern
            && self.optional == other.optional
            && self.multiline == other.multiline
            && self.is_regex == other.is_regex
            && self.no_eol == other.no_eol
    }
}

impl Eq for Expectation {}

impl serde::Serialize for Expectation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Expectation", 6)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field(
            "pattern",
            &Escaper::Unicode.escaped_printable(&self.pattern),
        )?;
        state.serialize_field("optional", &self.optional)?;
        state.serialize_field("multiline", &self.multiline)?;
        state.serialize_field("is_regex", &self.is_regex)?;
        state.serialize_field("original", &self.original)?;
        state.end()
    }
}

/// Turns annotated lines into [`Expectation`]s
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpectationMaker {
    cram_compat: bool,
}

impl ExpectationMaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cram documents allow escaping wildcards in globs (`\*`, `\?`)
    pub fn cram() -> Self {
        Self { cram_compat: true }
    }

    pub fn is_cram_compat(&self) -> bool {
        self.cram_compat
    }

    pub fn parse(&self, line: &str) -> crate::Result<Expectation> {
        let (expression, kind, quantifier) = split_annotation(line);
        let (optional, multiline) = match quantifier {
            Some('?') => (true, false),
            Some('+') => (false, true),
            Some('*') => (true, true),
            _ => (false, false),
        };
        let mut no_eol = false;
        let (kind, pattern, matcher) = match kind {
            "" | "equal" | "eq" => (
                ExpectationKind::Equal,
                expression.as_bytes().to_vec(),
                Matcher::Equal,
            ),
            "no-eol" => {
                no_eol = true;
                (
                    ExpectationKind::Equal,
                    expression.as_bytes().to_vec(),
                    Matcher::Equal,
                )
            }
            "escaped" | "esc" => (ExpectationKind::Equal, unescape(expression)?, Matcher::Equal),
            "glob" | "gl" => {
                let pattern = match strip_escaped_marker(expression) {
                    Some(escaped) => unescape(escaped)?,
                    None => expression.as_bytes().to_vec(),
                };
                let glob = Glob::new(&pattern, self.cram_compat);
                (ExpectationKind::Glob, pattern, Matcher::Glob(glob))
            }
            _ => {
                let regex = regex::compile(expression)?;
                (
                    ExpectationKind::Regex,
                    expression.as_bytes().to_vec(),
                    Matcher::Regex(regex),
                )
            }
        };
        Ok(Expectation {
            is_regex: kind == ExpectationKind::Regex,
            kind,
            pattern,
            optional,
            multiline,
            no_eol,
            original: line.to_owned(),
            matcher,
        })
    }
}

/// Split `foo (glob+)` into `("foo", "glob", Some('+'))`
///
/// Only the last annotation counts: `foo (glob) (glob)` is the glob `foo (glob)`.
fn split_annotation(line: &str) -> (&str, &str, Option<char>) {
    static ANNOTATION: OnceLock<::regex::Regex> = OnceLock::new();
    let annotation = ANNOTATION.get_or_init(|| {
        ::regex::Regex::new(
            r"^(?s)(.*?)(?:\s\((equal|eq|no-eol|escaped|esc|glob|gl|regex|re|)([*+?])?\))?$",
        )
        .expect("annotation expression must compile")
    });
    let Some(captures) = annotation.captures(line) else {
        return (line, "", None);
    };
    let expression = captures.get(1).map_or(line, |m| m.as_str());
    let kind = captures.get(2).map_or("", |m| m.as_str());
    let quantifier = captures.get(3).and_then(|m| m.as_str().chars().next());
    (expression, kind, quantifier)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn annotations_are_split() {
        let cases = vec![
            ("foo", ("foo", "", None)),
            ("foo (glob)", ("foo", "glob", None)),
            ("foo (glob+)", ("foo", "glob", Some('+'))),
            ("foo (glob+) (glob+)", ("foo (glob+)", "glob", Some('+'))),
            ("foo (re*)", ("foo", "re", Some('*'))),
            ("foo (*)", ("foo", "", Some('*'))),
            ("foo (bar)", ("foo (bar)", "", None)),
            ("foo(glob)", ("foo(glob)", "", None)),
            ("", ("", "", None)),
        ];
        for (line, expected) in cases {
            assert_eq!(expected, split_annotation(line), "from `{line}`");
        }
    }

    #[test]
    fn make_from_annotated_strings() {
        let maker = ExpectationMaker::new();
        assert_eq!(
            (ExpectationKind::Equal, b"foo".to_vec(), false, false),
            maker.parse("foo").unwrap().unmake()
        );
        assert_eq!(
            (ExpectationKind::Glob, b"bar".to_vec(), false, false),
            maker.parse("bar (glob)").unwrap().unmake()
        );
        assert_eq!(
            (ExpectationKind::Regex, b"baz".to_vec(), true, true),
            maker.parse("baz (regex*)").unwrap().unmake()
        );
    }

    #[test]
    fn quantifiers() {
        let cases = vec![
            ("foo", false, false),
            ("foo (?)", true, false),
            ("foo (glob+)", false, true),
            ("foo (re*)", true, true),
        ];
        for (line, optional, multiline) in cases {
            let expectation = Expectation::parse(line).unwrap();
            assert_eq!(optional, expectation.is_optional(), "{line}");
            assert_eq!(multiline, expectation.is_multiline(), "{line}");
        }
    }

    #[test]
    fn equal_requires_newline() {
        let expectation = Expectation::parse("Hello").unwrap();
        assert!(expectation.matches(b"Hello\n"));
        assert!(!expectation.matches(b"Hello"));
        assert!(!expectation.matches(b"Hello\r\n"));
        assert!(!expectation.matches(b"Hello World\n"));
    }

    #[test]
    fn no_eol_requires_missing_newline() {
        let expectation = Expectation::parse("Hello (no-eol)").unwrap();
        assert_eq!(ExpectationKind::Equal, expectation.kind());
        assert!(expectation.matches(b"Hello"));
        assert!(!expectation.matches(b"Hello\n"));
    }

    #[test]
    fn escaped_resolves_to_bytes() {
        let expectation = Expectation::parse("foo\\tbar\\x1b (esc)").unwrap();
        assert_eq!(ExpectationKind::Equal, expectation.kind());
        assert_eq!(b"foo\tbar\x1b", expectation.pattern());
        assert!(expectation.matches(b"foo\tbar\x1b\n"));
    }

    #[test]
    fn escaped_glob() {
        let expectation = Expectation::parse("\\x1b[1m* (escaped) (glob)").unwrap();
        assert_eq!(ExpectationKind::Glob, expectation.kind());
        assert!(expectation.matches(b"\x1b[1mbold\n"));
    }

    #[test]
    fn glob_and_regex_ignore_newline() {
        let glob = Expectation::parse("H*o (glob)").unwrap();
        assert!(glob.matches(b"Hello\n"));
        assert!(glob.matches(b"Hello"));
        let regex = Expectation::parse("H.+o (re)").unwrap();
        assert!(regex.matches(b"Hello\n"));
        assert!(!regex.matches(b"Hello World\n"));
    }

    #[test]
    fn cram_glob_escapes() {
        let line = "foo\\* (glob)";
        assert!(ExpectationMaker::cram().parse(line).unwrap().matches(b"foo*\n"));
        assert!(!ExpectationMaker::cram().parse(line).unwrap().matches(b"foobar\n"));
        assert!(ExpectationMaker::new().parse(line).unwrap().matches(b"foo\\bar\n"));
    }

    #[test]
    fn regex_keeps_written_pattern() {
        let expectation = Expectation::parse("foo\\_bar{2} (regex)").unwrap();
        assert_eq!(b"foo\\_bar{2}", expectation.pattern());
        assert!(expectation.matches(b"foo_barr\n"));
        assert_eq!(
            (ExpectationKind::Regex, b"foo\\_bar{2}".to_vec(), false, true),
            expectation.unmake()
        );
    }

    #[test]
    fn invalid_regex_fails_to_parse() {
        assert!(Expectation::parse("foo( (regex)").is_err());
        assert!(Expectation::parse("foo\\x1 (escaped)").is_err());
    }

    #[test]
    fn rendered_expressions() {
        let cases = vec![
            ("foo", "foo"),
            ("foo (eq)", "foo"),
            ("foo (+)", "foo (+)"),
            ("foo\\tbar (esc)", "foo\\tbar (escaped)"),
            ("foo (no-eol)", "foo (no-eol)"),
            ("foo* (gl?)", "foo* (glob?)"),
            ("fo+ (re*)", "fo+ (regex*)"),
        ];
        for (line, expected) in cases {
            let expectation = Expectation::parse(line).unwrap();
            assert_eq!(expected, expectation.to_expression_string(&Escaper::Unicode));
        }
    }

    #[test]
    fn original_is_kept() {
        let expectation = Expectation::parse("foo (gl)").unwrap();
        assert_eq!("foo (gl)", expectation.original());
        assert_eq!(expectation, Expectation::parse("foo (glob)").unwrap());
    }
}
