//! # Transcript-style command tests
//!
//! > Write down what a command prints, check that it still does
//!
//! `cramdown` parses test documents in two syntaxes and validates captured
//! output against them:
//! - Cram transcripts, where indented `$ ` lines are commands and the indented
//!   lines after them the expected output
//! - Markdown documents, where fenced code blocks tagged `scrut` (or
//!   `cramdown`) hold the command and its output
//!
//! Running the commands is up to the caller; `cramdown` only consumes
//! stdout, stderr and the exit status.
//!
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]
//!
//! # Examples
//!
//! ````rust
//! use cramdown::parsers::{MarkdownParser, Parser};
//! use cramdown::Output;
//!
//! let document = "\
//! Say hello
//!
//! ```scrut
//! $ echo Hello
//! Hel* (glob)
//! ```
//! ";
//! let (_config, testcases) = MarkdownParser::default().parse(document).unwrap();
//!
//! let output = Output::new("Hello\n", "", 0);
//! let (ok, report) = testcases[0].validate(&output, Some("hello.md"));
//! assert!(ok);
//! assert_eq!(
//!     "Summary: 1 file(s) with 1 test(s): 1 succeeded, 0 failed and 0 skipped\n",
//!     report
//! );
//! ````
//!
//! Annotations after an expected line select how it matches:
//!
//! | Annotation | Matches |
//! |---|---|
//! | none, `(equal)` | the exact line |
//! | `(glob)` | `*` and `?` wildcards |
//! | `(regex)` | a regular expression over the whole line |
//! | `(escaped)` | the exact line, with `\t`, `\xNN` and friends decoded |
//! | `(no-eol)` | the exact last line, which has no trailing newline |
//!
//! A quantifier turns an expectation optional (`?`), into one spanning
//! multiple lines (`+`) or both (`*`): `foo* (glob+)`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]

mod error;
mod newline;

pub mod config;
pub mod diff;
pub mod escaping;
pub mod expectation;
pub mod output;
pub mod parsers;
pub mod report;
pub mod testcase;
pub mod validator;

pub use error::Error;
pub use error::Result;
pub use expectation::Expectation;
pub use expectation::ExpectationKind;
pub use output::ExitStatus;
pub use output::Output;
pub use testcase::TestCase;
pub use validator::Validator;

pub(crate) use cramdown_macros::debug;
