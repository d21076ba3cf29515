//! Align expectations with the lines of captured output
//!
//! The alignment walks expectations and lines in lock-step. When they stop
//! matching it looks ahead, first for a later expectation matching the
//! current line, then for a later line matching the current expectation, so
//! a single extra or missing line shows up as exactly that.

use std::ops::Range;

use crate::expectation::Expectation;
use crate::newline::LinesWithTerminator;

/// Result of [`DiffTool::diff`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diff {
    pub lines: Vec<DiffLine>,
    pub count_matched: usize,
    pub count_unmatched: usize,
    pub count_output_lines: usize,
}

/// One entry of a [`Diff`]
///
/// Indices are 0-based positions in the expectations of the test case or the
/// lines of output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// An expectation and the line(s) it matched
    MatchedExpectation {
        index: usize,
        lines: Vec<(usize, Vec<u8>)>,
    },
    /// A (non-optional) expectation no line matched
    UnmatchedExpectation { index: usize },
    /// Lines of output no expectation matched
    UnexpectedLines { lines: Vec<(usize, Vec<u8>)> },
}

impl Diff {
    pub fn new(lines: Vec<DiffLine>) -> Self {
        let mut count_matched = 0;
        let mut count_unmatched = 0;
        let mut count_output_lines = 0;
        for line in &lines {
            match line {
                DiffLine::MatchedExpectation { lines, .. } => {
                    count_matched += 1;
                    count_output_lines += lines.len();
                }
                DiffLine::UnmatchedExpectation { .. } => count_unmatched += 1,
                DiffLine::UnexpectedLines { lines } => count_output_lines += lines.len(),
            }
        }
        Self {
            lines,
            count_matched,
            count_unmatched,
            count_output_lines,
        }
    }

    /// Whether anything but matched expectations is in the diff
    pub fn has_differences(&self) -> bool {
        self.lines
            .iter()
            .any(|line| !matches!(line, DiffLine::MatchedExpectation { .. }))
    }
}

enum Peek {
    Expectation(usize),
    Line(usize),
}

/// Compares output with an ordered list of expectations
pub struct DiffTool<'e> {
    expectations: &'e [Expectation],
}

impl<'e> DiffTool<'e> {
    pub fn new(expectations: &'e [Expectation]) -> Self {
        Self { expectations }
    }

    pub fn diff(&self, output: &[u8]) -> Diff {
        let lines = LinesWithTerminator::new(output).collect::<Vec<_>>();
        let collect = |range: Range<usize>| -> Vec<(usize, Vec<u8>)> {
            range.map(|idx| (idx, lines[idx].to_vec())).collect()
        };
        let mut diff = Vec::new();
        let mut exp_idx = 0;
        let mut line_idx = 0;
        let mut match_start: Option<usize> = None;

        while exp_idx < self.expectations.len() && line_idx < lines.len() {
            let expectation = &self.expectations[exp_idx];
            let line = lines[line_idx];

            if expectation.matches(line) {
                if !expectation.is_multiline() {
                    diff.push(DiffLine::MatchedExpectation {
                        index: exp_idx,
                        lines: collect(line_idx..line_idx + 1),
                    });
                    exp_idx += 1;
                    line_idx += 1;
                    continue;
                }

                // a following expectation that matches as well ends the run
                let next_matches = self
                    .expectations
                    .get(exp_idx + 1)
                    .is_some_and(|next| next.matches(line));
                if next_matches && (expectation.is_optional() || match_start.is_some()) {
                    if let Some(start) = match_start.take() {
                        diff.push(DiffLine::MatchedExpectation {
                            index: exp_idx,
                            lines: collect(start..line_idx),
                        });
                    }
                    exp_idx += 1;
                    continue;
                }

                match_start.get_or_insert(line_idx);
                line_idx += 1;
                continue;
            }

            if let Some(start) = match_start.take() {
                diff.push(DiffLine::MatchedExpectation {
                    index: exp_idx,
                    lines: collect(start..line_idx),
                });
                exp_idx += 1;
                continue;
            }

            match self.peek(exp_idx, line_idx, &lines) {
                Some(Peek::Expectation(next)) => {
                    diff.extend(self.unmatched(exp_idx..next));
                    exp_idx = next;
                }
                Some(Peek::Line(next)) => {
                    diff.push(DiffLine::UnexpectedLines {
                        lines: collect(line_idx..next),
                    });
                    line_idx = next;
                }
                None => {
                    diff.extend(self.unmatched(exp_idx..exp_idx + 1));
                    exp_idx += 1;
                }
            }
        }

        if let Some(start) = match_start {
            diff.push(DiffLine::MatchedExpectation {
                index: exp_idx,
                lines: collect(start..line_idx),
            });
            exp_idx += 1;
        }
        diff.extend(self.unmatched(exp_idx..self.expectations.len()));
        if line_idx < lines.len() {
            diff.push(DiffLine::UnexpectedLines {
                lines: collect(line_idx..lines.len()),
            });
        }

        Diff::new(diff)
    }

    fn unmatched(&self, range: Range<usize>) -> impl Iterator<Item = DiffLine> + '_ {
        range
            .filter(|idx| !self.expectations[*idx].is_optional())
            .map(|index| DiffLine::UnmatchedExpectation { index })
    }

    fn peek(&self, exp_idx: usize, line_idx: usize, lines: &[&[u8]]) -> Option<Peek> {
        let line = lines[line_idx];
        if let Some(offset) = self.expectations[exp_idx + 1..]
            .iter()
            .position(|expectation| expectation.matches(line))
        {
            return Some(Peek::Expectation(exp_idx + 1 + offset));
        }
        let expectation = &self.expectations[exp_idx];
        lines[line_idx + 1..]
            .iter()
            .position(|line| expectation.matches(line))
            .map(|offset| Peek::Line(line_idx + 1 + offset))
    }
}
