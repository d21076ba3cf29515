use crate::diff::Diff;
use crate::diff::DiffLine;
use crate::escaping::Escaper;
use crate::report::header::render_header;
use crate::report::Palette;
use crate::report::Renderer;
use crate::report::Summary;
use crate::testcase::Mismatch;
use crate::validator::Outcome;
use crate::validator::Verdict;

/// Matched rows shown before and after a difference
pub const DEFAULT_SURROUNDING_LINES: usize = 5;

/// Human-readable report: a header and a line-by-line body per failure,
/// followed by the summary line
#[derive(Copy, Clone, Debug)]
pub struct PrettyRenderer {
    pub palette: Palette,
    pub escaper: Escaper,
    /// `0` shows all matched rows
    pub max_surrounding_lines: usize,
}

impl PrettyRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            ..Default::default()
        }
    }

    fn render_exit_code(&self, outcome: &Outcome<'_>, expected: &str, actual: &str) -> String {
        let mut rendered = String::new();
        rendered.push_str("unexpected exit code\n");
        rendered.push_str(&format!("  expected: {}\n", self.palette.expected(expected)));
        rendered.push_str(&format!("  actual:   {}\n", self.palette.actual(actual)));
        rendered.push('\n');
        rendered.push_str(&outcome.output.to_error_string(&self.escaper));
        rendered
    }

    fn render_output(&self, outcome: &Outcome<'_>, diff: &Diff) -> String {
        let expectations = &outcome.testcase.expectations;
        let decorator = Decorator::new(
            diff.count_output_lines.max(expectations.len()),
            self.palette,
        );
        let next_difference = |from: usize| {
            diff.lines
                .iter()
                .skip(from)
                .position(|line| !matches!(line, DiffLine::MatchedExpectation { .. }))
                .map(|offset| offset + from)
        };

        let mut rendered = String::new();
        let mut last_difference: Option<usize> = None;
        for (diff_idx, line) in diff.lines.iter().enumerate() {
            match line {
                DiffLine::MatchedExpectation { index, lines } => {
                    let expectation = &expectations[*index];
                    let (show, gap) = self.surrounding(
                        diff_idx,
                        last_difference,
                        next_difference(diff_idx + 1),
                    );
                    if show {
                        let output_number = if expectation.is_multiline() {
                            Some(0)
                        } else {
                            lines.first().map(|(line_idx, _)| line_idx + 1)
                        };
                        rendered.push_str(&decorator.row(
                            output_number,
                            Some(index + 1),
                            expectation.is_multiline(),
                            Symbol::Matched,
                            &expectation.to_expression_string(&self.escaper),
                        ));
                    } else if gap {
                        rendered.push_str("...\n");
                    }
                }
                DiffLine::UnmatchedExpectation { index } => {
                    last_difference = Some(diff_idx);
                    let expectation = &expectations[*index];
                    rendered.push_str(&decorator.row(
                        None,
                        Some(index + 1),
                        expectation.is_multiline(),
                        Symbol::Unmatched,
                        &expectation.to_expression_string(&self.escaper),
                    ));
                }
                DiffLine::UnexpectedLines { lines } => {
                    last_difference = Some(diff_idx);
                    for (line_idx, line) in lines {
                        rendered.push_str(&decorator.row(
                            Some(line_idx + 1),
                            None,
                            false,
                            Symbol::Unexpected,
                            &self.escaper.escaped_expectation(line),
                        ));
                    }
                }
            }
        }
        rendered
    }

    /// Whether a matched row is shown and whether it starts a gap
    fn surrounding(
        &self,
        diff_idx: usize,
        last_difference: Option<usize>,
        next_difference: Option<usize>,
    ) -> (bool, bool) {
        let max = self.max_surrounding_lines;
        if max == 0 {
            return (true, false);
        }
        let mut show = false;
        let mut gap = false;
        if let Some(last) = last_difference {
            if last + max >= diff_idx {
                show = true;
            } else if last + max + 1 == diff_idx {
                gap = true;
            }
        }
        if next_difference.is_some_and(|next| diff_idx + max >= next) {
            show = true;
        }
        (show, gap)
    }
}

impl Default for PrettyRenderer {
    fn default() -> Self {
        Self {
            palette: Palette::never(),
            escaper: Escaper::default(),
            max_surrounding_lines: DEFAULT_SURROUNDING_LINES,
        }
    }
}

impl Renderer for PrettyRenderer {
    fn render(&self, outcomes: &[Outcome<'_>]) -> String {
        let mut rendered = String::new();
        for outcome in outcomes {
            let Verdict::Failed(mismatch) = &outcome.verdict else {
                continue;
            };
            rendered.push_str(&render_header(outcome, self.palette));
            match mismatch {
                Mismatch::ExitCode { expected, actual } => {
                    rendered.push_str(&self.render_exit_code(outcome, expected, actual));
                }
                Mismatch::Output(diff) => rendered.push_str(&self.render_output(outcome, diff)),
            }
            rendered.push_str("\n\n");
        }
        rendered.push_str(&Summary::from_outcomes(outcomes).render(self.palette));
        rendered
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Symbol {
    Matched,
    Unmatched,
    Unexpected,
}

impl Symbol {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => " ",
            Self::Unmatched => "-",
            Self::Unexpected => "+",
        }
    }
}

/// Renders the `{output}  {expectation} | {symbol} {content}` rows
struct Decorator {
    width: usize,
    palette: Palette,
}

impl Decorator {
    fn new(max_number: usize, palette: Palette) -> Self {
        Self {
            width: max_number.to_string().len(),
            palette,
        }
    }

    /// `Some(0)` fills the column with `+`: lines of a multiline match
    fn number(&self, number: Option<usize>) -> String {
        match number {
            None => " ".repeat(self.width),
            Some(0) => "+".repeat(self.width),
            Some(number) => format!("{number:>width$}", width = self.width),
        }
    }

    fn row(
        &self,
        output_number: Option<usize>,
        expectation_number: Option<usize>,
        multiline: bool,
        symbol: Symbol,
        content: &str,
    ) -> String {
        let sign = if multiline { "+" } else { " " };
        let output_number = self.number(output_number);
        let expectation_number = format!("{}{sign}", self.number(expectation_number));
        let (symbol, content) = match symbol {
            Symbol::Matched => (symbol.as_str().to_owned(), content.to_owned()),
            Symbol::Unmatched => (
                self.palette.expected(symbol.as_str()).to_string(),
                self.highlight(content, |text| self.palette.expected(text).to_string()),
            ),
            Symbol::Unexpected => (
                self.palette.actual(symbol.as_str()).to_string(),
                self.highlight(content, |text| self.palette.actual(text).to_string()),
            ),
        };
        format!(
            "{}  {} | {symbol} {content}\n",
            self.palette.hint(output_number),
            self.palette.hint(expectation_number),
        )
    }

    /// Make trailing whitespace visible
    fn highlight(&self, content: &str, style: impl Fn(&str) -> String) -> String {
        let trimmed = content.trim_end_matches(char::is_whitespace);
        let trailing = &content[trimmed.len()..];
        if trailing.is_empty() {
            return style(content);
        }
        let visible = trailing
            .chars()
            .map(|ch| match ch {
                ' ' => '⎵',
                '\t' => '↦',
                _ => '␰',
            })
            .collect::<String>();
        format!("{}{}", style(trimmed), self.palette.whitespace(visible))
    }
}
