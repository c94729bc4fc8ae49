//! # Page Break Decisions
//!
//! Where a paragraph's lines split across pages. The flow engine asks once
//! per page segment: given the space left and the heights of the lines still
//! to place, how many go here?

use super::EPSILON;

/// What to do with the lines that remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// All remaining lines fit.
    Place,
    /// Nothing goes on this page.
    MoveToNextPage,
    /// Place the first `lines_on_current_page`, continue on the next page.
    Split { lines_on_current_page: usize },
}

/// Split rules of one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPolicy {
    /// Lines may not be split at all.
    pub keep_together: bool,
    /// Minimum lines left at the bottom of a page.
    pub orphans: usize,
    /// Minimum lines carried to the top of the next page.
    pub widows: usize,
}

impl BreakPolicy {
    /// Widow control keeps at least two lines on each side of a break.
    pub fn for_paragraph(widow_control: bool, keep_together: bool) -> Self {
        let min = if widow_control { 2 } else { 1 };
        Self {
            keep_together,
            orphans: min,
            widows: min,
        }
    }
}

/// Decide how many of `line_heights` fit into `remaining`.
pub fn decide_break(remaining: f64, line_heights: &[f64], policy: BreakPolicy) -> BreakDecision {
    let total: f64 = line_heights.iter().sum();
    if total <= remaining + EPSILON {
        return BreakDecision::Place;
    }
    if policy.keep_together {
        return BreakDecision::MoveToNextPage;
    }

    let mut used = 0.0;
    let fit = line_heights
        .iter()
        .take_while(|&&h| {
            used += h;
            used <= remaining + EPSILON
        })
        .count();

    if fit == 0 || fit < policy.orphans {
        return BreakDecision::MoveToNextPage;
    }

    let carried = line_heights.len() - fit;
    let fit = if carried < policy.widows {
        fit.saturating_sub(policy.widows - carried)
    } else {
        fit
    };

    if fit == 0 || fit < policy.orphans {
        BreakDecision::MoveToNextPage
    } else {
        BreakDecision::Split {
            lines_on_current_page: fit,
        }
    }
}
