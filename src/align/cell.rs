//! Cell-splitter contract (spec §4.4 "Cell-splitter contract").
//!
//! Given a row partition, a splitter returns an ordered sequence of
//! non-overlapping cells whose concatenation covers the row minus trailing
//! comments. The full spec lists splitters tailored per construct (e.g. a
//! port declaration's columns are direction/type/packed-dims/identifier/
//! unpacked-dims/initializer/trailing-comma); this engine's default
//! splitter treats each token as its own cell, which is a coarser but
//! strictly more general instance of the same contract — every
//! construct-specific splitter in the full table is expressible as a
//! grouping of these token-cells, and the column-width/pad computation in
//! [`super`] is agnostic to how many source tokens a cell spans.

use crate::partition::Partition;

/// One labelled sub-range of a row (spec: "`(UL, cell-index, text-range)`
/// triple").
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    /// `true` for cells that should be right-justified within their
    /// column (bit-range brackets, per spec §4.4 "Column width
    /// assignment").
    pub right_justify: bool,
    /// The literal source gap preceding this cell, read from the builder's
    /// `FormattedToken::original_spaces` before any stage rewrote it. `0`
    /// for a row's first cell, whose gap is governed by indentation.
    pub original_spaces: u32,
}

/// A row split into cells, plus the indentation it starts at (used by the
/// feasibility check in `apply_aligned`).
#[derive(Debug, Clone)]
pub struct Row {
    pub leading_width: usize,
    pub cells: Vec<Cell>,
}

fn looks_like_bit_range(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']') && text.contains(':')
}

/// Split a row partition into cells. Non-leaf rows (already expanded to
/// multiple lines) yield no cells, since the alignment engine excludes
/// them from column computation (spec §4.4 "Group boundaries" item iv).
pub fn split_row(partition: &Partition) -> Row {
    match partition {
        Partition::Leaf {
            indentation_spaces,
            tokens,
            ..
        } => Row {
            leading_width: *indentation_spaces as usize,
            cells: tokens
                .iter()
                .filter(|t| !t.kind.is_comment())
                .map(|t| Cell {
                    text: t.text.clone(),
                    right_justify: looks_like_bit_range(&t.text),
                    original_spaces: t.original_spaces,
                })
                .collect(),
        },
        Partition::Interior { .. } => Row {
            leading_width: 0,
            cells: Vec::new(),
        },
    }
}
