//! Compile cram-era regular expressions with the strict `regex` crate
//!
//! Expressions written for Python's `re` often lean on leniencies that
//! `regex` rejects. They are repaired before compiling.

use regex::bytes::Regex;

use crate::Error;

/// Repair and compile `expression` so it has to match a whole line
pub(crate) fn compile(expression: &str) -> crate::Result<Regex> {
    let repaired = cleanup_unrecognized_escape_sequences(expression);
    let repaired = escape_misused_repetition_quantifier(&repaired);
    let repaired = escape_misused_character_class(&repaired);
    Regex::new(&format!("^(?:{repaired})$"))
        .map_err(|err| Error::new(format!("invalid regex `{expression}`: {err}")))
}

/// `foo\_bar` is `foo_bar`: only escapes of meta characters and letters
/// (character classes like `\d`) survive
pub(crate) fn cleanup_unrecognized_escape_sequences(expression: &str) -> String {
    let mut chars = expression.chars();
    let mut cleaned = String::with_capacity(expression.len());
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            cleaned.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) => {
                if matches!(
                    next,
                    '[' | ']'
                        | '{'
                        | '}'
                        | '('
                        | ')'
                        | '|'
                        | '?'
                        | '*'
                        | '+'
                        | '-'
                        | '.'
                        | '^'
                        | '$'
                        | '\\'
                ) || next.is_ascii_alphabetic()
                {
                    cleaned.push(ch);
                }
                cleaned.push(next);
            }
            None => cleaned.push(ch),
        }
    }
    cleaned
}

/// `foo{bar}` is `foo\{bar\}`, while `o{3}` and `o{3,5}` stay repetitions
pub(crate) fn escape_misused_repetition_quantifier(expression: &str) -> String {
    let chars = expression.chars().collect::<Vec<_>>();
    let mut escaped = String::with_capacity(expression.len());
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        idx += 1;
        match ch {
            '\\' => {
                escaped.push(ch);
                if let Some(next) = chars.get(idx) {
                    escaped.push(*next);
                    idx += 1;
                }
            }
            '{' => match repetition_len(&chars[idx..]) {
                Some(len) => {
                    escaped.push(ch);
                    escaped.extend(&chars[idx..idx + len]);
                    idx += len;
                }
                None => escaped.push_str("\\{"),
            },
            '}' => escaped.push_str("\\}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Length of `N}` or `N,M}` at the start of `chars`, including the `}`
fn repetition_len(chars: &[char]) -> Option<usize> {
    let mut idx = 0;
    let mut digits = 0;
    let mut separated = false;
    while let Some(ch) = chars.get(idx) {
        match ch {
            '0'..='9' => digits += 1,
            ',' if !separated && digits > 0 => {
                separated = true;
                digits = 0;
            }
            '}' if digits > 0 => return Some(idx + 1),
            _ => return None,
        }
        idx += 1;
    }
    None
}

/// `[[]]` is `[\[\]]`: brackets inside a character class are literal
pub(crate) fn escape_misused_character_class(expression: &str) -> String {
    let chars = expression.chars().collect::<Vec<_>>();
    let mut escaped = String::with_capacity(expression.len());
    let mut in_class = false;
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        idx += 1;
        match ch {
            '\\' => {
                escaped.push(ch);
                if let Some(next) = chars.get(idx) {
                    escaped.push(*next);
                    idx += 1;
                }
            }
            '[' => {
                if in_class {
                    escaped.push('\\');
                } else {
                    in_class = true;
                }
                escaped.push(ch);
            }
            ']' => {
                if in_class && !closed_later(&chars, idx) {
                    in_class = false;
                } else {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Whether an unescaped `]` follows before the next unescaped `[`
fn closed_later(chars: &[char], from: usize) -> bool {
    for idx in from..chars.len() {
        if chars[idx - 1] == '\\' {
            continue;
        }
        match chars[idx] {
            ']' => return true,
            '[' => return false,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whole_line_matches() {
        let cases: Vec<(bool, &str, &str)> = vec![
            (true, "foo", "foo"),
            (true, ".*foo.*", "somewhere there is foo word"),
            (true, "foo.*", "foo must be at the start"),
            (false, "foo.*", "not if foo is not at start"),
            (false, ".*foo", "foo is not at the end"),
            (true, "foO{3}", "foOOO"),
            (true, "foO{3,5}", "foOOOOO"),
            (false, "foO{3}", "foOOOOO"),
            (true, "foO{abc}", "foO{abc}"),
            (true, "foO\\{bcd\\}bar", "foO{bcd}bar"),
            (true, "{cd{ef}}", "{cd{ef}}"),
            (true, "f[oa]o", "fao"),
            (true, "f[[]]o", "f[o"),
            (true, "f[[]]o", "f]o"),
            (true, "f[x[]o", "fxo"),
            (true, "a|b", "b"),
            (false, "a|b", "ab"),
            (
                true,
                "foo/\\S+:\\d+:\\d+.*something.*",
                "foo/bar/baz:123:1\tand then something",
            ),
        ];
        for (expected, expression, line) in cases {
            let regex = compile(expression).unwrap();
            assert_eq!(
                expected,
                regex.is_match(line.as_bytes()),
                "`{expression}` vs `{line}`"
            );
        }
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let err = compile("foo(").unwrap_err();
        assert!(err.to_string().starts_with("invalid regex `foo(`"), "{err}");
    }

    #[test]
    fn repetition_quantifier() {
        let cases = vec![
            ("foo", "foo"),
            ("foo{bar}", "foo\\{bar\\}"),
            ("foo{123}", "foo{123}"),
            ("foo{12,34}", "foo{12,34}"),
            ("foo{12{34}", "foo\\{12{34}"),
            ("{foo}", "\\{foo\\}"),
            ("foo{,3}", "foo\\{,3\\}"),
        ];
        for (from, expected) in cases {
            assert_eq!(expected, escape_misused_repetition_quantifier(from), "from `{from}`");
        }
    }

    #[test]
    fn character_class() {
        let cases = vec![
            ("foo", "foo"),
            ("foo[bar]", "foo[bar]"),
            ("foo[ba[r]", "foo[ba\\[r]"),
            ("foo[[]]", "foo[\\[\\]]"),
            ("foo[[[]]]", "foo[\\[\\[\\]\\]]"),
            (
                "I[0-9]{4} [0-9][0-9]:[0-9][0-9]\\.[0-9]{6}\\s+\\d+ \\[main\\] abc\\.rs:\\d+\\] something",
                "I[0-9]{4} [0-9][0-9]:[0-9][0-9]\\.[0-9]{6}\\s+\\d+ \\[main\\] abc\\.rs:\\d+\\] something",
            ),
        ];
        for (from, expected) in cases {
            assert_eq!(expected, escape_misused_character_class(from), "from `{from}`");
        }
    }

    #[test]
    fn unrecognized_escapes() {
        let cases = vec![
            ("foo", "foo"),
            ("f\\^oo", "f\\^oo"),
            ("foo\\[bar\\]", "foo\\[bar\\]"),
            ("foo\\|bar", "foo\\|bar"),
            ("foo\\-bar", "foo\\-bar"),
            ("foo\\w\\W", "foo\\w\\W"),
            ("foo\\_bar", "foo_bar"),
            ("foo\\<bar\\>", "foo<bar>"),
        ];
        for (from, expected) in cases {
            assert_eq!(expected, cleanup_unrecognized_escape_sequences(from), "from `{from}`");
        }
    }
}
