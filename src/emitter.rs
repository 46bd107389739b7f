//! Stage 6: the emitter (spec §4.6).
//!
//! Depth-first traversal of the final partition tree, writing
//! `indentation_spaces` spaces then each token with its decided leading
//! spacing, and a trailing newline unless the leaf is folded into its
//! successor by `BreakKind::MustAppend`.

use crate::partition::{BreakKind, Partition, PartitionPolicy};
use crate::wrap::{search_breaks, WrapCostModel};

pub fn emit(root: &Partition, model: &WrapCostModel) -> Result<String, crate::error::Error> {
    let mut out = String::new();
    emit_node(root, model, &mut out, true)?;
    Ok(out)
}

fn emit_blank_lines(node: &Partition, is_line_start: bool, out: &mut String) {
    // A partition fused onto its predecessor by `MustAppend` never starts
    // a fresh line, so the blank-line count recorded for it is moot.
    if is_line_start {
        for _ in 0..node.blank_lines_before().min(1) {
            out.push('\n');
        }
    }
}

fn emit_node(
    node: &Partition,
    model: &WrapCostModel,
    out: &mut String,
    is_line_start: bool,
) -> Result<bool, crate::error::Error> {
    match node {
        Partition::Leaf {
            indentation_spaces,
            tokens,
            format_off,
            ..
        } => {
            emit_blank_lines(node, is_line_start, out);
            if is_line_start {
                out.push_str(&" ".repeat(*indentation_spaces as usize));
            }
            if *format_off || tokens.is_empty() {
                // Byte-identical passthrough (spec §8 property 4): use the
                // literal source gap recorded at build time rather than
                // any stage's spacing decision, since a format-off leaf's
                // `leading_spaces` may still carry whatever the annotator
                // guessed before the transformer marked it opaque.
                for (i, tok) in tokens.iter().enumerate() {
                    if i > 0 {
                        out.push_str(&" ".repeat(tok.original_spaces as usize));
                    }
                    out.push_str(&tok.text);
                }
                out.push('\n');
                return Ok(true);
            }

            let breaks = search_breaks(node, model)?;
            for (i, tok) in tokens.iter().enumerate() {
                if i == 0 {
                    out.push_str(&tok.text);
                    continue;
                }
                let broke = breaks.get(i - 1).copied().unwrap_or(false);
                if broke {
                    out.push('\n');
                    out.push_str(&" ".repeat((*indentation_spaces + model.wrap_spaces) as usize));
                } else {
                    out.push_str(&" ".repeat(tok.leading_spaces.resolve(tok.original_spaces) as usize));
                }
                out.push_str(&tok.text);
            }
            out.push('\n');
            Ok(true)
        }
        Partition::Interior {
            indentation_spaces,
            policy,
            children,
            ..
        } => {
            emit_blank_lines(node, is_line_start, out);
            match policy {
                PartitionPolicy::AlwaysExpand | PartitionPolicy::TabularAlignment => {
                    emit_children_each_own_line(children, model, out, is_line_start)
                }
                PartitionPolicy::FitElseExpand => {
                    match try_join_flat(node, model, *indentation_spaces) {
                        Some(flat) => {
                            if is_line_start {
                                out.push_str(&" ".repeat(*indentation_spaces as usize));
                            }
                            out.push_str(&flat);
                            out.push('\n');
                            Ok(true)
                        }
                        None => emit_children_each_own_line(children, model, out, is_line_start),
                    }
                }
                PartitionPolicy::AppendFittingSubPartitions => {
                    emit_append_fitting(children, model, out, is_line_start, *indentation_spaces)
                }
                PartitionPolicy::Uninitialized => {
                    tracing::warn!(
                        "emitting partition with Uninitialized policy; falling back to AlwaysExpand"
                    );
                    emit_children_each_own_line(children, model, out, is_line_start)
                }
            }
        }
    }
}

/// Emit each child on its own line, except where `ends_with_must_append`
/// says the previous child's last token must fuse directly onto its
/// successor (spec §3 `BreakKind::MustAppend`) rather than starting a new
/// line — e.g. a stitched `end else` pair.
fn emit_children_each_own_line(
    children: &[Partition],
    model: &WrapCostModel,
    out: &mut String,
    is_line_start: bool,
) -> Result<bool, crate::error::Error> {
    let mut next_is_line_start = is_line_start;
    let mut fuse_next = false;
    for child in children {
        let mut buf = String::new();
        let start_of_line = next_is_line_start && !fuse_next;
        let completed_line = emit_node(child, model, &mut buf, start_of_line)?;
        if fuse_next {
            if out.ends_with('\n') {
                out.pop();
            }
            out.push(' ');
        }
        out.push_str(&buf);
        fuse_next = ends_with_must_append(child);
        next_is_line_start = completed_line;
    }
    Ok(true)
}

/// Greedily pack children onto as few lines as the column budget allows,
/// wrapping to a fresh line once the next child would overflow it (spec
/// §3 `PartitionPolicy::AppendFittingSubPartitions`). A child too wide to
/// fit even alone on a fresh line is emitted via its own recursive
/// wrap/expand instead of being force-fit.
fn emit_append_fitting(
    children: &[Partition],
    model: &WrapCostModel,
    out: &mut String,
    is_line_start: bool,
    indentation_spaces: u32,
) -> Result<bool, crate::error::Error> {
    let mut line = String::new();
    let mut first_flush = true;

    macro_rules! flush {
        () => {
            if !line.is_empty() {
                if !(first_flush && !is_line_start) {
                    out.push_str(&" ".repeat(indentation_spaces as usize));
                }
                out.push_str(&line);
                out.push('\n');
                line.clear();
                first_flush = false;
            }
        };
    }

    for child in children {
        let flat = collect_flat(child);
        let sep = if line.is_empty() { 0 } else { 1 };
        let candidate_width = indentation_spaces as usize + line.chars().count() + sep + flat.chars().count();
        if !line.is_empty() && candidate_width > model.column_limit as usize {
            flush!();
        }
        let fits_alone = indentation_spaces as usize + flat.chars().count() <= model.column_limit as usize;
        if fits_alone {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&flat);
        } else {
            flush!();
            emit_node(child, model, out, true)?;
        }
    }
    flush!();
    Ok(true)
}

/// Render `node` as if it occupied a single line, using each leaf's
/// already-decided spacing but no wrap search. Used by `FitElseExpand`'s
/// feasibility check and `AppendFittingSubPartitions`'s packing.
fn collect_flat(node: &Partition) -> String {
    match node {
        Partition::Leaf { tokens, .. } => {
            let mut s = String::new();
            for (i, tok) in tokens.iter().enumerate() {
                if i > 0 {
                    s.push_str(&" ".repeat(tok.leading_spaces.resolve(tok.original_spaces) as usize));
                }
                s.push_str(&tok.text);
            }
            s
        }
        Partition::Interior { children, .. } => {
            let mut s = String::new();
            let mut fuse_next = false;
            for child in children {
                let part = collect_flat(child);
                if !fuse_next && !s.is_empty() {
                    s.push(' ');
                }
                s.push_str(&part);
                fuse_next = ends_with_must_append(child);
            }
            s
        }
    }
}

fn try_join_flat(node: &Partition, model: &WrapCostModel, indentation_spaces: u32) -> Option<String> {
    let flat = collect_flat(node);
    if indentation_spaces as usize + flat.chars().count() <= model.column_limit as usize {
        Some(flat)
    } else {
        None
    }
}

/// Whether the final token of `node` ends the line (i.e. is not folded by
/// `BreakKind::MustAppend` into its successor). Exposed for the
/// transformer/alignment stages that need to decide group boundaries
/// without re-walking the whole emitter.
pub fn ends_with_must_append(node: &Partition) -> bool {
    match node {
        Partition::Leaf { tokens, .. } => tokens
            .last()
            .map(|t| t.break_before == BreakKind::MustAppend)
            .unwrap_or(false),
        Partition::Interior { children, .. } => {
            children.last().map(ends_with_must_append).unwrap_or(false)
        }
    }
}
