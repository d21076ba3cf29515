use std::sync::OnceLock;

use crate::config::TestCaseConfig;
use crate::expectation::Expectation;
use crate::expectation::ExpectationMaker;
use crate::testcase::TestCase;
use crate::Error;

/// What a line of a test case body turned out to be
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LineKind {
    CommandStart,
    CommandContinue,
    Expectation,
    ExitCode,
}

/// Assembles test cases from the body lines shared by both syntaxes
///
/// Line indices passed in are 0-based; errors and test cases report them
/// 1-based.
#[derive(Debug)]
pub(crate) struct LineParser {
    pub(crate) testcases: Vec<TestCase>,
    maker: ExpectationMaker,
    allow_multiple_commands: bool,
    title: Option<String>,
    command: Vec<String>,
    command_start: Option<usize>,
    in_command: bool,
    exit_code: Option<i32>,
    expectations: Vec<Expectation>,
    config: Option<TestCaseConfig>,
}

impl LineParser {
    /// With `allow_multiple_commands` every `$ ` line starts a new test case,
    /// otherwise later `$ ` lines are expectations
    pub(crate) fn new(maker: ExpectationMaker, allow_multiple_commands: bool) -> Self {
        Self {
            testcases: Vec::new(),
            maker,
            allow_multiple_commands,
            title: None,
            command: Vec::new(),
            command_start: None,
            in_command: false,
            exit_code: None,
            expectations: Vec::new(),
            config: None,
        }
    }

    pub(crate) fn add_body(&mut self, line: &str, index: usize) -> crate::Result<LineKind> {
        if self.allow_multiple_commands || self.command.is_empty() {
            if let Some(command) = line.strip_prefix("$ ") {
                if !self.command.is_empty() {
                    self.end_testcase(index)?;
                }
                self.in_command = true;
                self.command_start.get_or_insert(index);
                self.command.push(command.to_owned());
                return Ok(LineKind::CommandStart);
            }
        }

        if let Some(continued) = line.strip_prefix("> ") {
            if self.in_command {
                self.command.push(continued.to_owned());
                return Ok(LineKind::CommandContinue);
            }
            if self.command.is_empty() {
                return Err(Error::new(format!(
                    "line {}: command continuation '>' without preceding command start '$'",
                    index + 1
                )));
            }
        }
        self.in_command = false;

        if let Some(exit_code) = extract_exit_code(line) {
            if self.exit_code.is_some() {
                return Err(Error::new(format!(
                    "line {}: exit code provided multiple times",
                    index + 1
                )));
            }
            self.exit_code = Some(exit_code);
            return Ok(LineKind::ExitCode);
        }

        let expectation = self
            .maker
            .parse(line)
            .map_err(|err| err.context(format!("parsing line {}", index + 1)))?;
        self.expectations.push(expectation);
        Ok(LineKind::Expectation)
    }

    /// The last title set before a test case ends is its title
    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_owned());
    }

    pub(crate) fn set_config(&mut self, config: TestCaseConfig) {
        self.config = Some(config);
    }

    pub(crate) fn has_body(&self) -> bool {
        !self.command.is_empty() || !self.expectations.is_empty()
    }

    /// Turn everything collected so far into a test case
    ///
    /// Nothing collected is not an error; expectations without a command are.
    pub(crate) fn end_testcase(&mut self, index: usize) -> crate::Result<()> {
        if self.command.is_empty() {
            if !self.expectations.is_empty() {
                return Err(Error::new(format!(
                    "line {}: testcase output expectation(s) given, but no shell expression specified",
                    index + 1
                )));
            }
            return Ok(());
        }

        let testcase = TestCase {
            title: self.title.take().unwrap_or_default(),
            shell_expression: std::mem::take(&mut self.command).join("\n"),
            exit_code: self.exit_code.take(),
            expectations: std::mem::take(&mut self.expectations),
            line_number: self.command_start.take().unwrap_or(index) + 1,
            cram_compat: self.maker.is_cram_compat(),
            config: self.config.take().unwrap_or_default(),
        };
        self.testcases.push(testcase);
        self.in_command = false;
        Ok(())
    }
}

fn extract_exit_code(line: &str) -> Option<i32> {
    static EXIT_CODE: OnceLock<regex::Regex> = OnceLock::new();
    let exit_code = EXIT_CODE.get_or_init(|| regex::Regex::new(r"^\[([0-9]+)\]$").unwrap());
    exit_code
        .captures(line)
        .and_then(|captures| captures[1].parse().ok())
}

pub(crate) fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}
