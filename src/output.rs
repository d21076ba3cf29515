//! Captured result of executing a test case

use std::sync::OnceLock;
use std::time::Duration;

use crate::escaping::Escaper;
use crate::newline::ends_in_newline;
use crate::newline::LinesWithTerminator;

/// How the process executing a test case ended
///
/// Rendered as one of three tokens: the decimal exit code, `timeout[<ms>ms]`
/// or `unknown`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Code(i32),
    Timeout(Duration),
    Unknown,
}

impl ExitStatus {
    /// Parse an exit-status token as reported by a harness
    ///
    /// Anything that is neither a number nor a `timeout[<ms>ms]` is
    /// [`ExitStatus::Unknown`].
    pub fn from_token(token: &str) -> Self {
        static NUMERIC: OnceLock<regex::Regex> = OnceLock::new();
        static TIMEOUT: OnceLock<regex::Regex> = OnceLock::new();
        let numeric = NUMERIC.get_or_init(|| regex::Regex::new(r"^-?\d+$").unwrap());
        let timeout = TIMEOUT.get_or_init(|| regex::Regex::new(r"^timeout\[(\d+)ms\]$").unwrap());

        if numeric.is_match(token) {
            return token.parse().map_or(Self::Unknown, Self::Code);
        }
        timeout
            .captures(token)
            .and_then(|captures| captures[1].parse().ok())
            .map_or(Self::Unknown, |millis| {
                Self::Timeout(Duration::from_millis(millis))
            })
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Code(code) => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => code.fmt(f),
            Self::Timeout(timeout) => write!(f, "timeout[{}ms]", timeout.as_millis()),
            Self::Unknown => "unknown".fmt(f),
        }
    }
}

impl From<i32> for ExitStatus {
    fn from(code: i32) -> Self {
        Self::Code(code)
    }
}

impl<'s> From<&'s str> for ExitStatus {
    fn from(token: &'s str) -> Self {
        Self::from_token(token)
    }
}

impl<'s> From<&'s String> for ExitStatus {
    fn from(token: &'s String) -> Self {
        Self::from_token(token)
    }
}

impl From<String> for ExitStatus {
    fn from(token: String) -> Self {
        Self::from_token(&token)
    }
}

/// stdout, stderr and exit status of one execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit: ExitStatus,
}

impl Output {
    pub fn new(
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<Vec<u8>>,
        exit: impl Into<ExitStatus>,
    ) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit: exit.into(),
        }
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn exit_status(&self) -> ExitStatus {
        self.exit
    }

    /// Normalized exit-status token
    pub fn exit_code(&self) -> String {
        self.exit.to_string()
    }

    /// Both streams as `#>`-prefixed lines under `## STDOUT` / `## STDERR`
    pub fn to_error_string(&self, escaper: &Escaper) -> String {
        let mut rendered = String::new();
        for (name, stream) in [("STDOUT", &self.stdout), ("STDERR", &self.stderr)] {
            rendered.push_str(&format!("## {name}\n"));
            render_stream(&mut rendered, stream, escaper);
        }
        rendered
    }
}

fn render_stream(rendered: &mut String, stream: &[u8], escaper: &Escaper) {
    let lines = LinesWithTerminator::new(stream).collect::<Vec<_>>();
    let no_eol = !ends_in_newline(stream);
    for (idx, line) in lines.iter().enumerate() {
        let expectation = escaper.escaped_expectation(line);
        let is_last = idx + 1 == lines.len();
        if is_last && no_eol && !expectation.ends_with(" (escaped)") {
            rendered.push_str(&format!("#> {expectation} (no-eol)\n"));
        } else {
            rendered.push_str(&format!("#> {expectation}\n"));
        }
    }
}
