use std::borrow::Cow;

use crate::config::OutputStreamControl;
use crate::config::TestCaseConfig;
use crate::diff::Diff;
use crate::diff::DiffTool;
use crate::expectation::Expectation;
use crate::expectation::ExpectationMaker;
use crate::newline::replace_crlf;
use crate::output::Output;
use crate::report::PrettyRenderer;
use crate::report::Renderer;
use crate::validator::Outcome;

/// A command, the output it is expected to print and the exit code it is
/// expected to end with
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TestCase {
    /// Free text describing the test, may span multiple lines
    pub title: String,

    /// Command lines joined with `\n`
    pub shell_expression: String,

    /// `None` means `0`
    pub exit_code: Option<i32>,

    pub expectations: Vec<Expectation>,

    /// 1-based line the command starts at
    pub line_number: usize,

    /// Parsed from a Cram document
    pub cram_compat: bool,

    #[serde(skip_serializing_if = "TestCaseConfig::is_empty")]
    pub config: TestCaseConfig,
}

/// Why captured output does not satisfy a [`TestCase`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// Normalized exit-status tokens differ
    ExitCode { expected: String, actual: String },
    /// Exit status is as expected, output lines are not
    Output(Diff),
}

impl TestCase {
    /// Build a test case from annotated expectation lines like `foo (glob)`
    pub fn from_annotated(
        title: &str,
        shell_expression: &str,
        exit_code: Option<i32>,
        expectations: &[&str],
        line_number: usize,
        cram_compat: bool,
    ) -> crate::Result<Self> {
        let maker = if cram_compat {
            ExpectationMaker::cram()
        } else {
            ExpectationMaker::new()
        };
        let expectations = expectations
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                maker
                    .parse(line)
                    .map_err(|err| err.context(format!("expectation {}", idx + 1)))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        let config = if cram_compat {
            TestCaseConfig::default_cram()
        } else {
            TestCaseConfig::default()
        };
        Ok(Self {
            title: title.to_owned(),
            shell_expression: shell_expression.to_owned(),
            exit_code,
            expectations,
            line_number,
            cram_compat,
            config,
        })
    }

    /// Compare captured output with the exit code and expectations
    pub fn check(&self, output: &Output) -> Result<(), Mismatch> {
        let expected = self.exit_code.unwrap_or(0).to_string();
        let actual = output.exit_code();
        if expected != actual {
            return Err(Mismatch::ExitCode { expected, actual });
        }

        let stream = match self.config.output_stream {
            Some(OutputStreamControl::Stderr) => output.stderr(),
            Some(OutputStreamControl::Stdout | OutputStreamControl::Combined) | None => {
                output.stdout()
            }
        };
        let stream = if self.config.keep_crlf.unwrap_or(false) {
            Cow::Borrowed(stream)
        } else {
            replace_crlf(stream)
        };

        let diff = DiffTool::new(&self.expectations).diff(&stream);
        if diff.has_differences() {
            Err(Mismatch::Output(diff))
        } else {
            Ok(())
        }
    }

    /// Check `output` and render the result
    ///
    /// On success the message is the summary line only, otherwise the full
    /// report followed by the summary line. Reports are never colored.
    pub fn validate(&self, output: &Output, location: Option<&str>) -> (bool, String) {
        let outcome = Outcome::new(self, output, location);
        let ok = !outcome.verdict.is_failed();
        (ok, PrettyRenderer::default().render(&[outcome]))
    }

    /// Number of lines the command spans in the document
    pub fn shell_expression_lines(&self) -> usize {
        self.shell_expression.lines().count().max(1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::expectation::ExpectationKind;

    fn hello() -> TestCase {
        TestCase::from_annotated("This is a test", "echo Hello", Some(0), &["Hello"], 1, false)
            .unwrap()
    }

    #[test]
    fn from_annotated() {
        let testcase = TestCase::from_annotated(
            "title",
            "cmd",
            None,
            &["foo", "bar (glob)", "baz (regex*)"],
            3,
            false,
        )
        .unwrap();
        let unmade = testcase
            .expectations
            .iter()
            .map(|expectation| expectation.unmake())
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                (ExpectationKind::Equal, b"foo".to_vec(), false, false),
                (ExpectationKind::Glob, b"bar".to_vec(), false, false),
                (ExpectationKind::Regex, b"baz".to_vec(), true, true),
            ],
            unmade
        );
    }

    #[test]
    fn from_annotated_reports_broken_expectation() {
        let err = TestCase::from_annotated("", "cmd", None, &["ok", "[ (regex)"], 1, false)
            .unwrap_err();
        assert!(err.to_string().starts_with("expectation 2: "), "{err}");
    }

    #[test]
    fn check_passes() {
        assert_eq!(Ok(()), hello().check(&Output::new("Hello\n", "", 0)));
    }

    #[test]
    fn check_exit_code_first() {
        assert_eq!(
            Err(Mismatch::ExitCode {
                expected: "0".to_owned(),
                actual: "123".to_owned()
            }),
            hello().check(&Output::new("Wrong\n", "", 123))
        );
    }

    #[test]
    fn timeout_never_matches() {
        let mismatch = hello().check(&Output::new("Hello\n", "", "timeout[10ms]"));
        assert!(matches!(mismatch, Err(Mismatch::ExitCode { .. })));
    }

    #[test]
    fn check_output() {
        let mismatch = hello().check(&Output::new("Wrong", "", 0));
        assert!(matches!(mismatch, Err(Mismatch::Output(_))));
    }

    #[test]
    fn crlf_is_normalized_unless_kept() {
        let mut testcase = hello();
        assert_eq!(Ok(()), testcase.check(&Output::new("Hello\r\n", "", 0)));

        testcase.config.keep_crlf = Some(true);
        assert!(testcase.check(&Output::new("Hello\r\n", "", 0)).is_err());
    }

    #[test]
    fn stderr_is_compared_when_configured() {
        let mut testcase = hello();
        testcase.config.output_stream = Some(OutputStreamControl::Stderr);
        assert_eq!(Ok(()), testcase.check(&Output::new("", "Hello\n", 0)));
        assert!(testcase.check(&Output::new("Hello\n", "", 0)).is_err());
    }

    #[test]
    fn validate_success() {
        let (ok, message) = hello().validate(&Output::new("Hello\n", "", 0), Some("the-location"));
        assert!(ok);
        assert_eq!(
            "Summary: 1 file(s) with 1 test(s): 1 succeeded, 0 failed and 0 skipped\n",
            message
        );
    }

    #[test]
    fn validate_is_idempotent() {
        let testcase = hello();
        let output = Output::new("Wrong", "", 0);
        assert_eq!(
            testcase.validate(&output, Some("loc")),
            testcase.validate(&output, Some("loc"))
        );
    }
}
