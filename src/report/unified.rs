use crate::diff::Diff;
use crate::diff::DiffLine;
use crate::newline::trim_newlines;
use crate::report::Renderer;
use crate::testcase::Mismatch;
use crate::testcase::TestCase;
use crate::validator::Outcome;
use crate::validator::Verdict;

/// Renders failures as a unified diff of the document
///
/// Each file starts with `--- <location>` / `+++ <location>.new`, each
/// failure is an `@@` hunk that replaces the expectations (or the exit code
/// line) with what was observed. Passed and skipped outcomes render nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct DiffRenderer {}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {}
    }
}

impl Renderer for DiffRenderer {
    fn render(&self, outcomes: &[Outcome<'_>]) -> String {
        let mut failures = outcomes
            .iter()
            .filter_map(|outcome| match &outcome.verdict {
                Verdict::Failed(mismatch) => Some((outcome, mismatch)),
                Verdict::Passed | Verdict::Skipped => None,
            })
            .collect::<Vec<_>>();
        failures.sort_by_key(|(outcome, _)| (outcome.location, outcome.testcase.line_number));

        let mut rendered = String::new();
        let mut last_location = None;
        for (outcome, mismatch) in failures {
            if let Some(location) = outcome.location {
                if last_location != Some(location) {
                    if last_location.is_some() {
                        rendered.push('\n');
                    }
                    last_location = Some(location);
                    rendered.push_str(&format!("--- {location}\n+++ {location}.new\n"));
                }
            }
            match mismatch {
                Mismatch::ExitCode { actual, .. } => {
                    rendered.push_str(&render_exit_code(outcome.testcase, actual));
                }
                Mismatch::Output(diff) => {
                    rendered.push_str(&Hunks::default().render(outcome.testcase, diff));
                }
            }
        }
        rendered
    }
}

/// Replaces the `[N]` line, or adds one
fn render_exit_code(testcase: &TestCase, actual: &str) -> String {
    let line_number =
        testcase.line_number + testcase.shell_expression_lines() + testcase.expectations.len();
    let prefix = line_prefix(testcase);
    let old_length = usize::from(testcase.exit_code.is_some());
    let mut rendered = HunkHeader {
        old_start: line_number + old_length - 1,
        old_length,
        new_start: line_number,
        new_length: 1,
        kind: "invalid exit code",
        title: &testcase.title,
    }
    .to_string();
    if let Some(exit_code) = testcase.exit_code {
        rendered.push_str(&format!("-{prefix}[{exit_code}]\n"));
    }
    rendered.push_str(&format!("+{prefix}[{actual}]\n"));
    rendered
}

#[derive(Default)]
struct Hunks {
    unmatched_start: Option<usize>,
    unmatched: Vec<String>,
    unexpected_start: Option<usize>,
    unexpected: Vec<String>,
    rendered: String,
}

impl Hunks {
    fn render(mut self, testcase: &TestCase, diff: &Diff) -> String {
        let first_line = testcase.line_number + testcase.shell_expression_lines();
        // where unexpected lines are inserted, relative to `first_line`
        let mut expectation_idx = 0;
        for line in &diff.lines {
            match line {
                DiffLine::MatchedExpectation { index, .. } => {
                    expectation_idx = index + 1;
                    self.flush(testcase, first_line);
                }
                DiffLine::UnmatchedExpectation { index } => {
                    expectation_idx = *index;
                    self.unmatched_start.get_or_insert(*index);
                    self.unmatched
                        .push(testcase.expectations[*index].original().to_owned());
                }
                DiffLine::UnexpectedLines { lines } => {
                    self.unexpected_start.get_or_insert(expectation_idx);
                    self.unexpected.extend(lines.iter().map(|(_, line)| {
                        String::from_utf8_lossy(trim_newlines(line)).into_owned()
                    }));
                    if self.unmatched_start.is_some() {
                        self.flush(testcase, first_line);
                    }
                }
            }
        }
        self.flush(testcase, first_line);
        self.rendered
    }

    fn flush(&mut self, testcase: &TestCase, first_line: usize) {
        // a pure insertion names the line it follows as its old start
        let (old_start, new_start) = match (self.unmatched_start, self.unexpected_start) {
            (None, None) => return,
            (Some(unmatched), unexpected) => (
                first_line + unmatched,
                first_line + unexpected.unwrap_or(unmatched),
            ),
            (None, Some(unexpected)) => (
                (first_line + unexpected).saturating_sub(1),
                first_line + unexpected,
            ),
        };
        let prefix = line_prefix(testcase);
        self.rendered.push_str(
            &HunkHeader {
                old_start,
                old_length: self.unmatched.len(),
                new_start,
                new_length: self.unexpected.len(),
                kind: "malformed output",
                title: &testcase.title,
            }
            .to_string(),
        );
        for line in self.unmatched.drain(..) {
            self.rendered.push_str(&format!("-{prefix}{line}\n"));
        }
        for line in self.unexpected.drain(..) {
            self.rendered.push_str(&format!("+{prefix}{line}\n"));
        }
        self.unmatched_start = None;
        self.unexpected_start = None;
    }
}

struct HunkHeader<'t> {
    old_start: usize,
    old_length: usize,
    new_start: usize,
    new_length: usize,
    kind: &'static str,
    title: &'t str,
}

impl std::fmt::Display for HunkHeader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "@@ -{}{} +{}{} @@ {}: {}",
            self.old_start,
            length_suffix(self.old_length),
            self.new_start,
            length_suffix(self.new_length),
            self.kind,
            self.title.lines().collect::<Vec<_>>().join(" * "),
        )
    }
}

/// A length of one is implied
fn length_suffix(length: usize) -> String {
    if length == 1 {
        String::new()
    } else {
        format!(",{length}")
    }
}

fn line_prefix(testcase: &TestCase) -> &'static str {
    if testcase.cram_compat {
        "  "
    } else {
        ""
    }
}
