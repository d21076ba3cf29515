//! Render validation outcomes for humans and for patch tools

mod color;
mod header;
mod pretty;
mod unified;

use std::collections::BTreeSet;

pub use color::Palette;
pub use color::Styled;
pub use pretty::PrettyRenderer;
pub use pretty::DEFAULT_SURROUNDING_LINES;
pub use unified::DiffRenderer;

use crate::validator::Outcome;
use crate::validator::Verdict;

/// Turns the outcomes of one validation run into a report
pub trait Renderer {
    fn render(&self, outcomes: &[Outcome<'_>]) -> String;
}

/// Accumulated counts of a validation run
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Distinct locations; outcomes without one do not count
    pub files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[Outcome<'_>]) -> Self {
        let files = outcomes
            .iter()
            .filter_map(|outcome| outcome.location)
            .collect::<BTreeSet<_>>()
            .len();
        let mut summary = Self {
            files,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.verdict {
                Verdict::Passed => summary.succeeded += 1,
                Verdict::Failed(_) => summary.failed += 1,
                Verdict::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn tests(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }

    /// One line, terminated by `\n`
    pub fn render(&self, palette: Palette) -> String {
        cramdown_macros::formatln!(
            "Summary: {} file(s) with {} test(s): {}, {} and {}",
            self.files,
            self.tests(),
            palette.info(format_args!("{} succeeded", self.succeeded)),
            palette.error(format_args!("{} failed", self.failed)),
            palette.warn(format_args!("{} skipped", self.skipped)),
        )
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.render(Palette::never()).fmt(f)
    }
}
