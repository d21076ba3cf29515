use crate::config::DocumentConfig;
use crate::config::TestCaseConfig;
use crate::debug;
use crate::expectation::ExpectationMaker;
use crate::parsers::line::is_comment;
use crate::parsers::line::LineParser;
use crate::parsers::Parser;
use crate::testcase::TestCase;

/// Indentation of command and output lines
pub const DEFAULT_CRAM_INDENTATION: usize = 2;

/// Parser of Cram transcripts
///
/// ```text
/// A title
///   $ echo hello
///   hello
///   $ false
///   [1]
/// ```
#[derive(Clone, Debug)]
pub struct CramParser {
    indentation: usize,
}

impl CramParser {
    pub fn new(indentation: usize) -> Self {
        Self { indentation }
    }
}

impl Default for CramParser {
    fn default() -> Self {
        Self::new(DEFAULT_CRAM_INDENTATION)
    }
}

impl Parser for CramParser {
    fn parse(&self, text: &str) -> crate::Result<(DocumentConfig, Vec<TestCase>)> {
        let mut engine = LineParser::new(ExpectationMaker::cram(), true);
        let indent = " ".repeat(self.indentation);
        let lines = text.lines().collect::<Vec<_>>();
        debug!("parsing {} lines of cram", lines.len());

        for (index, line) in lines.iter().enumerate() {
            if is_comment(line) {
                continue;
            }
            if line.is_empty() {
                if engine.has_body() {
                    engine.end_testcase(index)?;
                }
                continue;
            }
            if let Some(body) = line.strip_prefix(&indent) {
                engine.set_config(TestCaseConfig::default_cram());
                engine.add_body(body, index)?;
                continue;
            }
            engine.end_testcase(index)?;
            engine.set_title(line);
        }
        if engine.has_body() {
            engine.end_testcase(lines.len())?;
        }

        debug!("found {} test case(s) in cram", engine.testcases.len());
        Ok((DocumentConfig::default(), engine.testcases))
    }
}
