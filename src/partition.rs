//! The partition tree: the implementation substrate for formatting
//! (spec §3).
//!
//! A leaf [`Partition`] carries a contiguous run of non-whitespace tokens
//! plus per-token spacing/break decisions; an interior [`Partition`] groups
//! child partitions under a [`PartitionPolicy`]. The tree is built by
//! [`crate::builder`], mutated in place by [`crate::transformer`] and
//! [`crate::align`], and consumed by [`crate::emitter`]. No partition-tree
//! node escapes the formatter (spec §3 "Lifecycles").

use crate::cst::CstRole;

/// How an interior partition's children combine into output (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionPolicy {
    /// Each child starts on its own line.
    AlwaysExpand,
    /// Join children on one line if the result fits; otherwise expand.
    FitElseExpand,
    /// Greedily append children until the column budget is exhausted,
    /// then wrap.
    AppendFittingSubPartitions,
    /// Run the alignment engine on children before wrapping.
    TabularAlignment,
    /// Invariant: must be resolved before emission.
    Uninitialized,
}

/// Inter-token break contract (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Space,
    Preserve,
    MustWrap,
    MustAppend,
    AppendAligned,
}

/// Inter-token spacing contract (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacingKind {
    Undecided,
    PreserveOriginal,
    Space(u8),
    NoSpace,
}

impl SpacingKind {
    /// Resolve to a concrete space count, given the original source
    /// spacing for `PreserveOriginal`.
    pub fn resolve(self, original_spaces: u32) -> u32 {
        match self {
            SpacingKind::Undecided => 1,
            SpacingKind::PreserveOriginal => original_spaces,
            SpacingKind::Space(n) => n as u32,
            SpacingKind::NoSpace => 0,
        }
    }
}

/// A single token plus the spacing/break decision that precedes it within
/// its leaf partition.
#[derive(Debug, Clone)]
pub struct FormattedToken {
    pub text: String,
    pub kind: crate::token::TokenKind,
    pub leading_spaces: SpacingKind,
    pub break_before: BreakKind,
    /// Penalty charged by the wrap search if `break_before` is
    /// `BreakKind::AppendAligned`'s "may-break" sibling decision is chosen
    /// over a space (spec §4.5). `0` for decisions that carry no search
    /// choice (`MustWrap`/`MustAppend`/`Preserve`).
    pub wrap_penalty: u32,
    /// Literal space-character count between this token and its
    /// predecessor in the source, before any stage overwrites
    /// `leading_spaces` (spec §4.2 "Bit-range symmetrisation", §3
    /// `SpacingKind::PreserveOriginal`). `0` for a leaf's first token,
    /// since that gap is governed by the partition's indentation instead.
    pub original_spaces: u32,
    /// Byte offset of this token in the source buffer the partition tree
    /// was built from. Used by the range-selection driver (spec §4.8) to
    /// map a leaf back onto its original source lines.
    pub byte_offset: std::ops::Range<usize>,
}

/// Where a leaf partition's tokens came from, kept for diagnostics and for
/// cell-splitters that need to recognise the construct without re-deriving
/// it from tokens (spec §3 "origin").
#[derive(Debug, Clone)]
pub struct PartitionOrigin {
    pub role: CstRole,
    pub first_token_text: Option<String>,
}

/// A node of the partition tree (spec §3 "Unwrapped line").
#[derive(Debug, Clone)]
pub enum Partition {
    Leaf {
        indentation_spaces: u32,
        origin: PartitionOrigin,
        tokens: Vec<FormattedToken>,
        /// `true` inside a `verilog_format: off` span; such leaves are
        /// emitted byte-identically and skipped by the wrap search and
        /// alignment engine (spec §4.3 item 1, §8 property 4).
        format_off: bool,
        /// Count of fully blank source lines between the end of the
        /// previous sibling and this partition's first token, as recorded
        /// by the builder from the raw trivia run (spec §4.4 "Group
        /// boundaries", §4.6 "Blank-line preservation"). `0` for the first
        /// child of its parent.
        blank_lines_before: u32,
    },
    Interior {
        indentation_spaces: u32,
        origin: PartitionOrigin,
        policy: PartitionPolicy,
        children: Vec<Partition>,
        blank_lines_before: u32,
    },
}

impl Partition {
    pub fn indentation_spaces(&self) -> u32 {
        match self {
            Partition::Leaf {
                indentation_spaces, ..
            }
            | Partition::Interior {
                indentation_spaces, ..
            } => *indentation_spaces,
        }
    }

    pub fn origin(&self) -> &PartitionOrigin {
        match self {
            Partition::Leaf { origin, .. } | Partition::Interior { origin, .. } => origin,
        }
    }

    pub fn blank_lines_before(&self) -> u32 {
        match self {
            Partition::Leaf {
                blank_lines_before, ..
            }
            | Partition::Interior {
                blank_lines_before, ..
            } => *blank_lines_before,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Partition::Leaf { .. })
    }

    pub fn children(&self) -> &[Partition] {
        match self {
            Partition::Leaf { .. } => &[],
            Partition::Interior { children, .. } => children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<Partition> {
        match self {
            Partition::Leaf { .. } => panic!("leaf partitions have no children"),
            Partition::Interior { children, .. } => children,
        }
    }

    pub fn policy(&self) -> Option<PartitionPolicy> {
        match self {
            Partition::Leaf { .. } => None,
            Partition::Interior { policy, .. } => Some(*policy),
        }
    }

    /// Invariant 3 (spec §3): every non-leaf partition's indentation is
    /// <= that of any descendant leaf.
    pub fn check_indentation_invariant(&self) -> bool {
        fn walk(node: &Partition, floor: u32) -> bool {
            if node.indentation_spaces() < floor {
                return false;
            }
            match node {
                Partition::Leaf { .. } => true,
                Partition::Interior { children, .. } => children
                    .iter()
                    .all(|c| walk(c, node.indentation_spaces())),
            }
        }
        walk(self, 0)
    }

    /// The byte range in the source buffer this partition's tokens span.
    /// `None` for a leaf with no tokens (possible after the transformer's
    /// empty-block compaction). Used by the range-selection driver (spec
    /// §4.8) to map a partition back onto source lines.
    pub fn byte_span(&self) -> Option<std::ops::Range<usize>> {
        match self {
            Partition::Leaf { tokens, .. } => {
                let first = tokens.first()?.byte_offset.start;
                let last = tokens.last()?.byte_offset.end;
                Some(first..last)
            }
            Partition::Interior { children, .. } => {
                let mut spans = children.iter().filter_map(Partition::byte_span);
                let first = spans.next()?;
                let (start, mut end) = (first.start, first.end);
                for s in spans {
                    end = end.max(s.end);
                }
                Some(start..end)
            }
        }
    }

    /// The unformatted width this leaf would occupy if every gap were a
    /// single space, used by `FitElseExpand`/`AppendFittingSubPartitions`
    /// to test "does this fit" (spec §4.1, §4.3).
    pub fn flat_width(&self) -> usize {
        match self {
            Partition::Leaf {
                indentation_spaces,
                tokens,
                ..
            } => {
                let mut width = *indentation_spaces as usize;
                for (i, t) in tokens.iter().enumerate() {
                    if i > 0 {
                        width += t.leading_spaces.resolve(1).max(0) as usize;
                    }
                    width += t.text.chars().count();
                }
                width
            }
            Partition::Interior { children, .. } => {
                children.iter().map(Partition::flat_width).sum::<usize>()
                    + children.len().saturating_sub(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn leaf(indent: u32, texts: &[&str]) -> Partition {
        Partition::Leaf {
            indentation_spaces: indent,
            origin: PartitionOrigin {
                role: CstRole::Statement,
                first_token_text: texts.first().map(|s| s.to_string()),
            },
            tokens: texts
                .iter()
                .map(|t| FormattedToken {
                    text: t.to_string(),
                    kind: TokenKind::Identifier,
                    leading_spaces: SpacingKind::Space(1),
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
    fn indentation_invariant_holds_for_well_formed_tree() {
        let tree = Partition::Interior {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::ModuleDeclaration,
                first_token_text: None,
            },
            policy: PartitionPolicy::AlwaysExpand,
            children: vec![leaf(2, &["wire", "w", ";"])],
            blank_lines_before: 0,
        };
        assert!(tree.check_indentation_invariant());
    }

    #[test]
    fn indentation_invariant_detects_violation() {
        let tree = Partition::Interior {
            indentation_spaces: 4,
            origin: PartitionOrigin {
                role: CstRole::ModuleDeclaration,
                first_token_text: None,
            },
            policy: PartitionPolicy::AlwaysExpand,
            children: vec![leaf(2, &["wire", "w", ";"])],
            blank_lines_before: 0,
        };
        assert!(!tree.check_indentation_invariant());
    }

    #[test]
    fn byte_span_covers_first_to_last_token() {
        let tree = Partition::Interior {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::ModuleDeclaration,
                first_token_text: None,
            },
            policy: PartitionPolicy::AlwaysExpand,
            children: vec![Partition::Leaf {
                indentation_spaces: 0,
                origin: PartitionOrigin {
                    role: CstRole::Statement,
                    first_token_text: Some("wire".to_string()),
                },
                tokens: vec![
                    FormattedToken {
                        text: "wire".to_string(),
                        kind: TokenKind::Keyword,
                        leading_spaces: SpacingKind::NoSpace,
                        break_before: BreakKind::Space,
                        wrap_penalty: 0,
                        original_spaces: 0,
                        byte_offset: 10..14,
                    },
                    FormattedToken {
                        text: ";".to_string(),
                        kind: TokenKind::Semicolon,
                        leading_spaces: SpacingKind::NoSpace,
                        break_before: BreakKind::Space,
                        wrap_penalty: 0,
                        original_spaces: 0,
                        byte_offset: 15..16,
                    },
                ],
                format_off: false,
                blank_lines_before: 0,
            }],
            blank_lines_before: 0,
        };
        assert_eq!(tree.byte_span(), Some(10..16));
    }

    #[test]
    fn byte_span_is_none_for_empty_leaf() {
        let empty = Partition::Leaf {
            indentation_spaces: 0,
            origin: PartitionOrigin {
                role: CstRole::Statement,
                first_token_text: None,
            },
            tokens: vec![],
            format_off: false,
            blank_lines_before: 0,
        };
        assert_eq!(empty.byte_span(), None);
    }
}
