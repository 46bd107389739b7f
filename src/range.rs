//! Stage 8: range-selection driver (spec §4.8).
//!
//! Restricting a format call to a [`crate::interval::LineNumberSet`] does
//! not mean "only touch partitions whose tokens fall inside the set" —
//! whole constructs and alignment groups must move together or not at
//! all, or the result is a tree with some rows realigned and others left
//! on stale columns. This module marks partitions eligible/ineligible
//! before the transformer/alignment/wrap stages run, and the emitter
//! falls back to the corresponding original source text for anything
//! marked ineligible.

use crate::interval::{LineIndex, LineNumberSet};
use crate::partition::Partition;

/// Per-partition eligibility, computed from each leaf's recorded source
/// line range against the requested [`LineNumberSet`] (spec §4.8
/// "Selection propagation"). A `None` entry means "format unconditionally"
/// (no ranges were requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Format,
    Preserve,
}

/// Decide a single leaf's eligibility given its 1-based `[start, end]`
/// source line span.
pub fn leaf_eligibility(ranges: Option<&LineNumberSet>, start_line: usize, end_line: usize) -> Eligibility {
    match ranges {
        None => Eligibility::Format,
        Some(set) => {
            let span = crate::interval::LineInterval::new(start_line, end_line + 1);
            if set.intersects(&span) {
                Eligibility::Format
            } else {
                Eligibility::Preserve
            }
        }
    }
}

/// Expand a requested selection to whole alignment groups (spec §9 "Open
/// questions": *"if any row of a group is selected, re-align the whole
/// group; otherwise preserve it"*). Given each group's line span, returns
/// the enlarged [`LineNumberSet`] that must be treated as selected so the
/// alignment stage either rewrites every row in a touched group or none.
pub fn expand_to_whole_groups(requested: &LineNumberSet, groups: &[(usize, usize)]) -> LineNumberSet {
    let mut intervals: Vec<crate::interval::LineInterval> = requested.intervals().to_vec();
    for &(start, end) in groups {
        let span = crate::interval::LineInterval::new(start, end + 1);
        if requested.intersects(&span) {
            intervals.push(span);
        }
    }
    LineNumberSet::new(intervals)
}

/// Mark every leaf outside `ranges` (after expanding to whole alignment
/// groups) as preserved, so the emitter falls back to the leaf's recorded
/// source spacing verbatim instead of running it through the
/// annotator/alignment/wrap decisions (spec §4.8). Reuses the same
/// `format_off` verbatim-emission path the transformer's format-off
/// passthrough uses (spec §4.3 item 1), since "preserve this leaf
/// byte-identically" is the same contract either way.
pub fn apply_range_restriction(root: &mut Partition, ranges: &LineNumberSet, index: &LineIndex) {
    let groups: Vec<(usize, usize)> = crate::align::alignment_group_spans(root)
        .into_iter()
        .map(|span| (index.line_at(span.start), index.line_at(span.end.saturating_sub(1).max(span.start))))
        .collect();
    let expanded = expand_to_whole_groups(ranges, &groups);
    mark_ineligible(root, &expanded, index);
}

fn mark_ineligible(node: &mut Partition, ranges: &LineNumberSet, index: &LineIndex) {
    if let Partition::Interior { children, .. } = node {
        for child in children.iter_mut() {
            mark_ineligible(child, ranges, index);
        }
        return;
    }
    let span = match node.byte_span() {
        Some(s) => s,
        None => return,
    };
    let start_line = index.line_at(span.start);
    let end_line = index.line_at(span.end.saturating_sub(1).max(span.start));
    if leaf_eligibility(Some(ranges), start_line, end_line) == Eligibility::Preserve {
        if let Partition::Leaf { format_off, .. } = node {
            *format_off = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::LineInterval;

    #[test]
    fn line_outside_every_requested_range_is_preserved() {
        let set = LineNumberSet::new(vec![LineInterval::new(10, 20)]);
        assert_eq!(leaf_eligibility(Some(&set), 5, 5), Eligibility::Preserve);
        assert_eq!(leaf_eligibility(Some(&set), 12, 12), Eligibility::Format);
    }

    #[test]
    fn no_ranges_means_format_everything() {
        assert_eq!(leaf_eligibility(None, 1, 1), Eligibility::Format);
    }

    #[test]
    fn touching_one_row_expands_to_the_whole_group() {
        let requested = LineNumberSet::new(vec![LineInterval::new(5, 6)]);
        let groups = vec![(4, 7)];
        let expanded = expand_to_whole_groups(&requested, &groups);
        assert_eq!(leaf_eligibility(Some(&expanded), 4, 4), Eligibility::Format);
        assert_eq!(leaf_eligibility(Some(&expanded), 7, 7), Eligibility::Format);
    }

    #[test]
    fn untouched_group_is_not_expanded() {
        let requested = LineNumberSet::new(vec![LineInterval::new(100, 101)]);
        let groups = vec![(4, 7)];
        let expanded = expand_to_whole_groups(&requested, &groups);
        assert_eq!(leaf_eligibility(Some(&expanded), 5, 5), Eligibility::Preserve);
    }

    fn leaf_at(text: &str, line: usize) -> Partition {
        use crate::cst::CstRole;
        use crate::partition::{BreakKind, FormattedToken, PartitionOrigin, SpacingKind};
        use crate::token::TokenKind;
        // One token per line, offset `line` bytes into a one-char-per-line
        // source ("a\nb\nc\n..."), so `LineIndex::line_at` maps it straight
        // back to `line`.
        let start = line.saturating_sub(1) * 2;
        Partition::Leaf {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::Statement,
                first_token_text: Some(text.to_string()),
            },
            tokens: vec![FormattedToken {
                text: text.to_string(),
                kind: TokenKind::Identifier,
                leading_spaces: SpacingKind::NoSpace,
                break_before: BreakKind::Space,
                wrap_penalty: 0,
                original_spaces: 0,
                byte_offset: start..start + 1,
            }],
            format_off: false,
            blank_lines_before: 0,
        }
    }

    #[test]
    fn apply_range_restriction_preserves_leaves_outside_the_selection() {
        use crate::cst::CstRole;
        use crate::partition::{PartitionOrigin, PartitionPolicy};

        let mut root = Partition::Interior {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::ModuleDeclaration,
                first_token_text: None,
            },
            policy: PartitionPolicy::AlwaysExpand,
            children: vec![leaf_at("a", 1), leaf_at("b", 2), leaf_at("c", 3)],
            blank_lines_before: 0,
        };
        let source = "a\nb\nc\n";
        let index = LineIndex::new(source);
        let ranges = LineNumberSet::new(vec![LineInterval::new(2, 3)]);
        apply_range_restriction(&mut root, &ranges, &index);

        let children = root.children();
        assert!(matches!(&children[0], Partition::Leaf { format_off: true, .. }));
        assert!(matches!(&children[1], Partition::Leaf { format_off: false, .. }));
        assert!(matches!(&children[2], Partition::Leaf { format_off: true, .. }));
    }
}
