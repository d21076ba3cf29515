//! Validate captured output of many test cases at once

use rayon::prelude::*;

use crate::debug;
use crate::output::Output;
use crate::report::Renderer;
use crate::report::Summary;
use crate::testcase::Mismatch;
use crate::testcase::TestCase;

/// Result of checking one [`TestCase`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(Mismatch),
    /// Ended with the skip code of the test case instead of its exit code
    Skipped,
}

impl Verdict {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A test case, its captured output and where it comes from
#[derive(Clone, Debug)]
pub struct Outcome<'a> {
    pub testcase: &'a TestCase,
    pub output: &'a Output,
    /// Path of the document, when known
    pub location: Option<&'a str>,
    pub verdict: Verdict,
}

impl<'a> Outcome<'a> {
    /// Any mismatch, exit code included, is a failure
    pub fn new(testcase: &'a TestCase, output: &'a Output, location: Option<&'a str>) -> Self {
        Self::with_skip_code(testcase, output, location, false)
    }

    /// With `honor_skip_code`, ending with the `skip_document_code` of the
    /// test case is [`Verdict::Skipped`] instead of a failure
    pub fn with_skip_code(
        testcase: &'a TestCase,
        output: &'a Output,
        location: Option<&'a str>,
        honor_skip_code: bool,
    ) -> Self {
        let verdict = match testcase.check(output) {
            Ok(()) => Verdict::Passed,
            Err(_) if honor_skip_code && is_skipped(testcase, output) => Verdict::Skipped,
            Err(mismatch) => Verdict::Failed(mismatch),
        };
        debug!(
            "{}:{} => {:?}",
            location.unwrap_or("-"),
            testcase.line_number,
            verdict
        );
        Self {
            testcase,
            output,
            location,
            verdict,
        }
    }
}

fn is_skipped(testcase: &TestCase, output: &Output) -> bool {
    let Some(skip_code) = testcase.config.skip_document_code else {
        return false;
    };
    output.exit_status().code() == Some(skip_code) && testcase.exit_code != Some(skip_code)
}

/// Checks batches of test cases and renders one report for all of them
#[derive(Clone, Debug)]
pub struct Validator<R> {
    renderer: R,
    honor_skip_code: bool,
}

impl<R: Renderer + Sync> Validator<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            honor_skip_code: false,
        }
    }

    /// Report cases that end with their `skip_document_code` as skipped
    /// instead of failed; off by default
    pub fn honor_skip_code(mut self, yes: bool) -> Self {
        self.honor_skip_code = yes;
        self
    }

    /// Check all cases in parallel, keeping their order
    pub fn check_all<'a>(
        &self,
        cases: &[(&'a TestCase, &'a Output, Option<&'a str>)],
    ) -> Vec<Outcome<'a>> {
        cases
            .par_iter()
            .map(|(testcase, output, location)| {
                Outcome::with_skip_code(*testcase, *output, *location, self.honor_skip_code)
            })
            .collect()
    }

    /// Like [`TestCase::validate`] with counts accumulated over all cases
    pub fn validate_all(&self, cases: &[(&TestCase, &Output, Option<&str>)]) -> (bool, String) {
        let outcomes = self.check_all(cases);
        let summary = Summary::from_outcomes(&outcomes);
        debug!("{} of {} test(s) failed", summary.failed, summary.tests());
        (summary.is_ok(), self.renderer.render(&outcomes))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::TestCaseConfig;
    use crate::report::DiffRenderer;
    use crate::report::PrettyRenderer;

    fn hello(line_number: usize) -> TestCase {
        TestCase::from_annotated("greet", "echo Hello", None, &["Hello"], line_number, false)
            .unwrap()
    }

    #[test]
    fn skip_code() {
        let mut testcase = hello(1);
        testcase.config = TestCaseConfig::default_markdown();
        let output = Output::new("", "", 80);
        let skipped = |testcase: &TestCase| {
            Outcome::with_skip_code(testcase, &output, None, true).verdict
        };
        assert_eq!(Verdict::Skipped, skipped(&testcase));

        testcase.exit_code = Some(80);
        assert!(skipped(&testcase).is_failed());

        testcase.config = TestCaseConfig::default();
        testcase.exit_code = None;
        assert!(skipped(&testcase).is_failed());
    }

    #[test]
    fn skip_code_fails_by_default() {
        let mut testcase = hello(1);
        testcase.config = TestCaseConfig::default_markdown();
        let output = Output::new("Hello\n", "", 80);
        assert!(Outcome::new(&testcase, &output, None).verdict.is_failed());

        let (ok, rendered) =
            Validator::new(PrettyRenderer::default()).validate_all(&[(&testcase, &output, None)]);
        assert!(!ok);
        assert!(
            rendered.ends_with(
                "Summary: 0 file(s) with 1 test(s): 0 succeeded, 1 failed and 0 skipped\n"
            ),
            "{rendered}"
        );
    }

    #[test]
    fn validate_all_accumulates() {
        let first = hello(1);
        let second = hello(5);
        let mut skipped = hello(9);
        skipped.config = TestCaseConfig::default_markdown();
        let ok = Output::new("Hello\n", "", 0);
        let wrong = Output::new("Wrong\n", "", 0);
        let skip = Output::new("", "", 80);

        let validator = Validator::new(PrettyRenderer::default()).honor_skip_code(true);
        let (ok_all, rendered) = validator.validate_all(&[
            (&first, &ok, Some("a.md")),
            (&second, &wrong, Some("a.md")),
            (&skipped, &skip, Some("b.md")),
        ]);
        assert!(!ok_all);
        assert!(rendered.contains("// @ a.md:5\n"), "{rendered}");
        assert!(!rendered.contains("// @ a.md:1\n"), "{rendered}");
        assert!(
            rendered.ends_with(
                "Summary: 2 file(s) with 3 test(s): 1 succeeded, 1 failed and 1 skipped\n"
            ),
            "{rendered}"
        );
    }

    #[test]
    fn check_all_keeps_order() {
        let cases = (1..=50).map(hello).collect::<Vec<_>>();
        let output = Output::new("Hello\n", "", 0);
        let batch = cases
            .iter()
            .map(|testcase| (testcase, &output, None))
            .collect::<Vec<_>>();
        let outcomes = Validator::new(DiffRenderer::new()).check_all(&batch);
        let line_numbers = outcomes
            .iter()
            .map(|outcome| outcome.testcase.line_number)
            .collect::<Vec<_>>();
        assert_eq!((1..=50).collect::<Vec<_>>(), line_numbers);
        assert!(outcomes
            .iter()
            .all(|outcome| outcome.verdict == Verdict::Passed));
    }

    #[test]
    fn all_passing() {
        let testcase = hello(1);
        let output = Output::new("Hello\n", "", 0);
        let (ok, rendered) =
            Validator::new(DiffRenderer::new()).validate_all(&[(&testcase, &output, None)]);
        assert!(ok);
        assert_eq!("", rendered);
    }
}
