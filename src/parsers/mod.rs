//! Turn document text into [`TestCase`]s
//!
//! Both syntaxes share the body grammar: `$ ` starts a command, `> `
//! continues it, `[N]` sets the expected exit code and every other line is
//! an expectation (see [`crate::expectation`]).

mod cram;
mod line;
mod markdown;

use std::path::Path;

pub use cram::CramParser;
pub use cram::DEFAULT_CRAM_INDENTATION;
pub use markdown::MarkdownParser;
pub use markdown::DEFAULT_MARKDOWN_LANGUAGES;

use crate::config::DocumentConfig;
use crate::testcase::TestCase;

/// Turns a whole document into its configuration and test cases
pub trait Parser {
    fn parse(&self, text: &str) -> crate::Result<(DocumentConfig, Vec<TestCase>)>;
}

/// Syntax of a document
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ParserKind {
    Markdown,
    Cram,
}

impl ParserKind {
    /// Guess the syntax from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "md" | "markdown" => Some(Self::Markdown),
            "t" | "cram" => Some(Self::Cram),
            _ => None,
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Cram => "t",
        }
    }

    /// Parser with default settings, Markdown accepting `languages`
    pub fn parser<S: AsRef<str>>(&self, languages: &[S]) -> Box<dyn Parser + Send + Sync> {
        match self {
            Self::Markdown if languages.is_empty() => Box::<MarkdownParser>::default(),
            Self::Markdown => Box::new(MarkdownParser::new(languages)),
            Self::Cram => Box::<CramParser>::default(),
        }
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => "markdown".fmt(f),
            Self::Cram => "cram".fmt(f),
        }
    }
}
