//! Stage 4: the alignment engine (spec §4.4).
//!
//! For each interior partition whose policy is `TabularAlignment`, groups
//! consecutive alignable children into alignment groups and assigns
//! per-cell column positions so that the *n*-th cell in every row of a
//! group begins at the same column.

mod cell;
mod policy;

pub use cell::{split_row, Cell, Row};
pub use policy::{infer_policy, AlignmentPolicy, IntentThresholds};

use crate::cst::CstRole;
use crate::partition::Partition;

/// Per-construct alignment configuration the caller (ultimately
/// `FormatStyle`) supplies to the engine.
#[derive(Debug, Clone, Copy)]
pub struct AlignConfig {
    pub policy: AlignmentPolicy,
    pub right_align_packed: bool,
    pub right_align_unpacked: bool,
    pub column_limit: u32,
    pub thresholds: IntentThresholds,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            policy: AlignmentPolicy::InferUserIntent,
            right_align_packed: true,
            right_align_unpacked: false,
            column_limit: 100,
            thresholds: IntentThresholds::default(),
        }
    }
}

/// A maximal consecutive run of alignable sibling rows (spec's
/// "Alignment group").
pub struct AlignmentGroup<'a> {
    pub rows: Vec<&'a mut Partition>,
}

/// Walk `root`'s children; every `TabularAlignment` interior partition has
/// its children grouped and column-aligned in place.
pub fn align_tree(root: &mut Partition, config: &AlignConfig) {
    if let Partition::Interior {
        policy, children, ..
    } = root
    {
        if *policy == crate::partition::PartitionPolicy::TabularAlignment {
            align_children(children, config);
        }
        for child in children.iter_mut() {
            align_tree(child, config);
        }
    }
}

/// Split `children` into groups at blank lines / non-tabular siblings /
/// directive boundaries, then align each group independently (spec §4.4
/// "Group boundaries").
fn align_children(children: &mut [Partition], config: &AlignConfig) {
    let mut start = 0;
    while start < children.len() {
        let mut end = start + 1;
        while end < children.len() && !is_group_boundary(&children[end]) {
            end += 1;
        }
        align_group(&mut children[start..end], config);
        // A directive partition that itself is a boundary still belongs to
        // neither group but consumes one slot; skip past it.
        start = if end < children.len() && is_directive(&children[end]) {
            end + 1
        } else {
            end
        };
    }
}

fn is_directive(p: &Partition) -> bool {
    p.origin().role == CstRole::PreprocessorDirective
}

/// The byte span of every `TabularAlignment` group `align_tree` will form
/// under `root`, computed with the same grouping rule `align_children`
/// uses. Exposed for the range-selection driver (spec §4.8 "expand to
/// whole alignment groups"), which must know a group's extent before the
/// alignment stage itself runs.
pub fn alignment_group_spans(root: &Partition) -> Vec<std::ops::Range<usize>> {
    let mut spans = Vec::new();
    collect_group_spans(root, &mut spans);
    spans
}

fn collect_group_spans(node: &Partition, spans: &mut Vec<std::ops::Range<usize>>) {
    if let Partition::Interior { policy, children, .. } = node {
        if *policy == crate::partition::PartitionPolicy::TabularAlignment {
            let mut start = 0;
            while start < children.len() {
                let mut end = start + 1;
                while end < children.len() && !is_group_boundary(&children[end]) {
                    end += 1;
                }
                if let Some(span) = group_span(&children[start..end]) {
                    spans.push(span);
                }
                start = if end < children.len() && is_directive(&children[end]) {
                    end + 1
                } else {
                    end
                };
            }
        }
        for child in children {
            collect_group_spans(child, spans);
        }
    }
}

fn group_span(rows: &[Partition]) -> Option<std::ops::Range<usize>> {
    let mut iter = rows.iter().filter_map(Partition::byte_span);
    let first = iter.next()?;
    let (start, mut end) = (first.start, first.end);
    for s in iter {
        end = end.max(s.end);
    }
    Some(start..end)
}

/// A row that itself had to wrap (multi-line) terminates its group and is
/// emitted as-is (spec §4.4 "Group boundaries" item iv). We approximate
/// "had to wrap" with "does not fit the column limit flat", since the wrap
/// decision proper is made later by stage 5; a row flagged here is simply
/// excluded from the aligned columns and left for the wrap search.
///
/// A blank source line before `p` also ends the group (spec §4.4 "Group
/// boundaries" item ii): the row that follows the blank line starts a
/// fresh group rather than being column-aligned with what preceded it.
fn is_group_boundary(p: &Partition) -> bool {
    is_directive(p)
        || p.blank_lines_before() > 0
        || !matches!(p, Partition::Leaf { .. } | Partition::Interior { .. })
}

fn align_group(rows: &mut [Partition], config: &AlignConfig) {
    if rows.is_empty() {
        return;
    }
    let split_rows: Vec<Row> = rows.iter().map(split_row).collect();
    let policy = match config.policy {
        AlignmentPolicy::InferUserIntent => infer_policy(&split_rows, config.thresholds),
        other => other,
    };

    match policy {
        AlignmentPolicy::Preserve => {}
        AlignmentPolicy::FlushLeft => apply_flush_left(rows, &split_rows),
        AlignmentPolicy::Align | AlignmentPolicy::InferUserIntent => {
            if !apply_aligned(rows, &split_rows, config) {
                // Falls back to FlushLeft if any aligned row would exceed
                // the column limit (spec §4.4 "Failure").
                apply_flush_left(rows, &split_rows);
            }
        }
    }
}

fn column_widths(rows: &[Row]) -> Vec<usize> {
    let ncols = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; ncols];
    for row in rows {
        for (i, cell) in row.cells.iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }
    widths
}

fn apply_flush_left(rows: &mut [Partition], split: &[Row]) {
    for (row, split_row) in rows.iter_mut().zip(split) {
        let pads: Vec<usize> = (0..split_row.cells.len())
            .map(|i| if i == 0 { 0 } else { 1 })
            .collect();
        rewrite_row_spacing(row, &pads);
    }
}

fn apply_aligned(rows: &mut [Partition], split: &[Row], config: &AlignConfig) -> bool {
    let widths = column_widths(split);
    // Check the feasibility constraint before committing any rewrite.
    for row in split {
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        if row.leading_width + total > config.column_limit as usize {
            return false;
        }
    }
    for (row, split_row) in rows.iter_mut().zip(split) {
        let mut separator_pads = Vec::with_capacity(split_row.cells.len());
        let mut right_pads = Vec::with_capacity(split_row.cells.len());
        for (i, cell) in split_row.cells.iter().enumerate() {
            let pad_to = widths.get(i).copied().unwrap_or(cell.text.chars().count());
            let slack = pad_to.saturating_sub(cell.text.chars().count());
            if cell.right_justify {
                separator_pads.push(if i == 0 { 0 } else { 1 });
                right_pads.push(slack);
            } else {
                separator_pads.push(slack + if i == 0 { 0 } else { 1 });
                right_pads.push(0);
            }
        }
        rewrite_row_spacing_justified(row, &separator_pads, &right_pads);
    }
    true
}

/// Rewrite a leaf row's per-token leading-space counts so that the *i*-th
/// cell's boundary token carries `pads[i]` leading spaces. Non-leaf rows
/// (already multi-line) are left untouched, matching the group-boundary
/// rule that multi-line rows terminate the group rather than get aligned.
fn rewrite_row_spacing(row: &mut Partition, pads: &[usize]) {
    if let Partition::Leaf { tokens, .. } = row {
        for (tok, pad) in tokens.iter_mut().skip(1).zip(pads.iter().skip(1)) {
            tok.leading_spaces = crate::partition::SpacingKind::Space((*pad).min(255) as u8);
        }
    }
}

/// Like [`rewrite_row_spacing`], but for cells flagged `right_justify` the
/// slack is baked into the token text as leading spaces (right-justifying
/// the field) rather than appended as an inter-column gap (spec §4.4
/// "Right alignment of dimensions").
fn rewrite_row_spacing_justified(row: &mut Partition, separator_pads: &[usize], right_pads: &[usize]) {
    if let Partition::Leaf { tokens, .. } = row {
        for ((tok, sep), right_pad) in tokens
            .iter_mut()
            .skip(1)
            .zip(separator_pads.iter().skip(1))
            .zip(right_pads.iter().skip(1))
        {
            tok.leading_spaces = crate::partition::SpacingKind::Space((*sep).min(255) as u8);
            if *right_pad > 0 {
                tok.text = format!("{}{}", " ".repeat(*right_pad), tok.text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{BreakKind, FormattedToken, PartitionOrigin, SpacingKind};
    use crate::token::TokenKind;

    fn row(indent: u32, texts: &[&str]) -> Partition {
        Partition::Leaf {
            indentation_spaces: indent,
            origin: PartitionOrigin {
                role: CstRole::ContinuousAssignment,
                first_token_text: texts.first().map(|s| s.to_string()),
            },
            tokens: texts
                .iter()
                .enumerate()
                .map(|(i, t)| FormattedToken {
                    text: t.to_string(),
                    kind: TokenKind::Identifier,
                    leading_spaces: if i == 0 {
                        SpacingKind::NoSpace
                    } else {
                        SpacingKind::Space(1)
                    },
                    break_before: BreakKind::Space,
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
    fn aligns_assignment_equals_column() {
        let mut rows = vec![
            row(2, &["assign", "a", "=", "b", ";"]),
            row(2, &["assign", "ccc", "=", "d", ";"]),
        ];
        let config = AlignConfig {
            policy: AlignmentPolicy::Align,
            ..Default::default()
        };
        align_group(&mut rows, &config);
        for r in &rows {
            if let Partition::Leaf { tokens, .. } = r {
                let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
                assert!(texts.contains(&"="));
            }
        }
        // Column 0 width across rows is max("assign".len()) = 6; column 1
        // width is max("a".len(), "ccc".len()) = 3, so row 1's `=` must
        // carry 2 extra leading spaces versus row 0's 1 space.
        let widths = column_widths(&rows.iter().map(split_row).collect::<Vec<_>>());
        assert_eq!(widths[1], 3);
    }

    #[test]
    fn flush_left_uses_single_space_everywhere() {
        let mut rows = vec![row(2, &["assign", "a", "=", "b", ";"])];
        let config = AlignConfig {
            policy: AlignmentPolicy::FlushLeft,
            ..Default::default()
        };
        align_group(&mut rows, &config);
        if let Partition::Leaf { tokens, .. } = &rows[0] {
            assert!(tokens
                .iter()
                .skip(1)
                .all(|t| matches!(t.leading_spaces, SpacingKind::Space(1))));
        }
    }

    fn row_at(texts: &[&str], start: usize) -> Partition {
        let mut offset = start;
        Partition::Leaf {
            indentation_spaces: 2,
            origin: PartitionOrigin {
                role: CstRole::ContinuousAssignment,
                first_token_text: texts.first().map(|s| s.to_string()),
            },
            tokens: texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let span = offset..offset + t.len();
                    offset += t.len() + 1;
                    FormattedToken {
                        text: t.to_string(),
                        kind: TokenKind::Identifier,
                        leading_spaces: if i == 0 {
                            SpacingKind::NoSpace
                        } else {
                            SpacingKind::Space(1)
                        },
                        break_before: BreakKind::Space,
                        wrap_penalty: 0,
                        original_spaces: 1,
                        byte_offset: span,
                    }
                })
                .collect(),
            format_off: false,
            blank_lines_before: 0,
        }
    }

    #[test]
    fn alignment_group_spans_covers_consecutive_rows() {
        let root = Partition::Interior {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::PortDeclarationList,
                first_token_text: None,
            },
            policy: crate::partition::PartitionPolicy::TabularAlignment,
            children: vec![row_at(&["assign", "a", "=", "b", ";"], 0), row_at(&["assign", "ccc", "=", "d", ";"], 30)],
            blank_lines_before: 0,
        };
        let spans = alignment_group_spans(&root);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
        assert!(spans[0].end > 30);
    }

    #[test]
    fn blank_source_line_splits_one_group_into_two() {
        let mut second = row(2, &["assign", "ccc", "=", "d", ";"]);
        if let Partition::Leaf {
            blank_lines_before, ..
        } = &mut second
        {
            *blank_lines_before = 1;
        }
        let mut rows = vec![row(2, &["assign", "a", "=", "b", ";"]), second];
        let config = AlignConfig {
            policy: AlignmentPolicy::Align,
            ..Default::default()
        };
        align_children(&mut rows, &config);
        // Each row is its own one-row group, so the `=` column is sized
        // only to that row's own cells rather than aligned across both.
        if let Partition::Leaf { tokens, .. } = &rows[1] {
            let eq = tokens.iter().find(|t| t.text == "=").unwrap();
            assert_eq!(eq.leading_spaces, SpacingKind::Space(1));
        }
    }
}
