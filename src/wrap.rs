//! Stage 5: line-wrap search (spec §4.5).
//!
//! Best-first (Dijkstra-style) search over partial break layouts for a
//! partition that does not fit the column budget after alignment. A state
//! is `(gap_index, remaining_width, accumulated_cost)`; transitions
//! consume the next gap by "space" or "newline+indent".

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Error;
use crate::partition::{BreakKind, Partition};

/// Cost-model parameters (spec §4.5 "Cost model" and §6's `FormatStyle`).
#[derive(Debug, Clone, Copy)]
pub struct WrapCostModel {
    pub column_limit: u32,
    pub penalty_wrap: u32,
    pub penalty_wrap_after_open_paren: u32,
    pub penalty_over_column: u32,
    pub wrap_spaces: u32,
    pub max_search_states: u32,
    /// When `false` (`FormatStyle::try_wrap_long_lines`), skip the search
    /// entirely: only mandatory (`BreakKind::MustWrap`) gaps break, and
    /// every optional gap stays a space even past the column limit.
    pub try_wrap_long_lines: bool,
}

impl Default for WrapCostModel {
    fn default() -> Self {
        Self {
            column_limit: 100,
            penalty_wrap: 3,
            penalty_wrap_after_open_paren: 6,
            penalty_over_column: 10,
            wrap_spaces: 4,
            max_search_states: 100_000,
            try_wrap_long_lines: true,
        }
    }
}

/// One candidate gap the search may break at, carried alongside the token
/// that follows it.
#[derive(Debug, Clone)]
struct Gap {
    /// Width of the token (plus a single separating space) that follows
    /// this gap if emitted flat.
    token_width: usize,
    may_break: bool,
    after_open_paren: bool,
    must_break: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct SearchState {
    gap_index: usize,
    remaining_width: i64,
    cost: u64,
    /// Break decisions made so far, for lexicographic tie-breaking
    /// (earliest breaks win, spec §4.5 "Equally optimal layouts").
    breaks: Vec<bool>,
}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the lowest cost first, with
        // the earliest-break layout preferred on ties.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.breaks.cmp(&other.breaks).reverse())
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn gaps_from_partition(partition: &Partition, column_limit: u32) -> Vec<Gap> {
    match partition {
        Partition::Leaf { tokens, .. } => tokens
            .iter()
            .skip(1)
            .map(|t| Gap {
                token_width: t.text.chars().count() + 1,
                may_break: matches!(t.break_before, BreakKind::AppendAligned),
                after_open_paren: false,
                must_break: matches!(t.break_before, BreakKind::MustWrap),
            })
            .collect(),
        Partition::Interior { .. } => Vec::new(),
    }
    .into_iter()
    .map(|mut g| {
        if g.token_width as u32 > column_limit {
            g.may_break = true;
        }
        g
    })
    .collect()
}

/// Search for the minimum-cost set of break decisions for `partition`'s
/// gaps. Returns the chosen decisions (`true` = break) indexed the same as
/// the gaps, or [`Error::ResourceExhausted`] if the search exceeds
/// `model.max_search_states`.
pub fn search_breaks(partition: &Partition, model: &WrapCostModel) -> Result<Vec<bool>, Error> {
    let gaps = gaps_from_partition(partition, model.column_limit);
    if gaps.is_empty() {
        return Ok(Vec::new());
    }
    if !model.try_wrap_long_lines {
        return Ok(gaps.iter().map(|g| g.must_break).collect());
    }

    let start_width = partition.indentation_spaces() as i64;
    let mut heap = BinaryHeap::new();
    heap.push(SearchState {
        gap_index: 0,
        remaining_width: model.column_limit as i64 - start_width,
        cost: 0,
        breaks: Vec::new(),
    });

    let mut expanded: u32 = 0;
    let mut best: Option<SearchState> = None;

    while let Some(state) = heap.pop() {
        expanded += 1;
        if expanded > model.max_search_states {
            return Err(Error::ResourceExhausted {
                max_search_states: model.max_search_states,
            });
        }
        if state.gap_index == gaps.len() {
            best = Some(state);
            break;
        }
        let gap = &gaps[state.gap_index];

        if !gap.must_break {
            let new_remaining = state.remaining_width - gap.token_width as i64;
            let overflow = (-new_remaining).max(0) as u64;
            let cost = state.cost + model.penalty_over_column as u64 * overflow * overflow;
            let mut breaks = state.breaks.clone();
            breaks.push(false);
            heap.push(SearchState {
                gap_index: state.gap_index + 1,
                remaining_width: new_remaining,
                cost,
                breaks,
            });
        }

        if gap.may_break || gap.must_break {
            let penalty = if gap.after_open_paren {
                model.penalty_wrap_after_open_paren
            } else {
                model.penalty_wrap
            } as u64;
            let mut breaks = state.breaks.clone();
            breaks.push(true);
            heap.push(SearchState {
                gap_index: state.gap_index + 1,
                remaining_width: model.column_limit as i64
                    - model.wrap_spaces as i64
                    - gap.token_width as i64,
                cost: state.cost + penalty,
                breaks,
            });
        }
    }

    match best {
        Some(state) => Ok(state.breaks),
        None => Err(Error::ResourceExhausted {
            max_search_states: model.max_search_states,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstRole;
    use crate::partition::{FormattedToken, PartitionOrigin, SpacingKind};
    use crate::token::TokenKind;

    fn leaf_with_breaks(indent: u32, words: &[(&str, BreakKind)]) -> Partition {
        Partition::Leaf {
            indentation_spaces: indent,
            origin: PartitionOrigin {
                role: CstRole::Statement,
                first_token_text: None,
            },
            tokens: words
                .iter()
                .map(|(w, b)| FormattedToken {
                    text: w.to_string(),
                    kind: TokenKind::Identifier,
                    leading_spaces: SpacingKind::Space(1),
                    break_before: *b,
                    wrap_penalty: 0,
                    original_spaces: 1,
                    byte_offset: 0..0,
                })
                .collect(),
            format_off: false,
            blank_lines_before: 0,
        }
    }

    #[test]
    fn short_line_needs_no_breaks() {
        let p = leaf_with_breaks(
            0,
            &[
                ("a", BreakKind::Space),
                ("b", BreakKind::AppendAligned),
                ("c", BreakKind::AppendAligned),
            ],
        );
        let model = WrapCostModel::default();
        let breaks = search_breaks(&p, &model).unwrap();
        assert!(breaks.iter().all(|b| !b));
    }

    #[test]
    fn resource_exhausted_when_budget_too_small() {
        let long_tokens: Vec<(&str, BreakKind)> = (0..50)
            .map(|_| ("xxxxxxxxxxxxxxxxxxxx", BreakKind::AppendAligned))
            .collect();
        let p = leaf_with_breaks(0, &long_tokens);
        let model = WrapCostModel {
            max_search_states: 2,
            ..Default::default()
        };
        let result = search_breaks(&p, &model);
        assert!(matches!(result, Err(Error::ResourceExhausted { .. })));
    }
}
