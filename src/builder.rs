//! Stage 1: the unwrapped-line builder (spec §4.1).
//!
//! Converts `(Cst, TokenStream)` into a root [`Partition`]. Walks the CST
//! top-down, consulting [`dispatch_policy`] for each interior node to
//! choose a [`PartitionPolicy`], and splitting out a child partition for
//! every role that [`CstRole::always_own_partition`] names.

use crate::cst::{CstNode, CstRole};
use crate::error::{Error, InvariantViolation};
use crate::partition::{
    BreakKind, FormattedToken, Partition, PartitionOrigin, PartitionPolicy, SpacingKind,
};
use crate::token::{Token, TokenKind, TokenStream};

/// Per-node-kind indentation step, in spaces. The caller's `FormatStyle`
/// ultimately controls this; the builder takes it as a parameter so it has
/// no hidden dependency on style internals.
pub struct BuilderConfig {
    pub indentation_spaces: u32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            indentation_spaces: 2,
        }
    }
}

/// Choose the partition policy for an interior CST role (spec §4.1's
/// "dispatch table keyed on the node's NodeEnum").
pub fn dispatch_policy(role: CstRole) -> PartitionPolicy {
    match role {
        CstRole::PortDeclarationList
        | CstRole::FormalParameterList
        | CstRole::DataDeclaration
        | CstRole::NetDeclaration
        | CstRole::ClassMemberVariable
        | CstRole::StructUnionMember
        | CstRole::ContinuousAssignment
        | CstRole::BlockingAssignment
        | CstRole::NonblockingAssignment
        | CstRole::CaseStatement
        | CstRole::EnumValueAssignment
        | CstRole::DistributionItem
        | CstRole::NamedParameterArgument
        | CstRole::NamedPortConnection => PartitionPolicy::TabularAlignment,
        CstRole::ModuleDeclaration
        | CstRole::InterfaceDeclaration
        | CstRole::ClassDeclaration
        | CstRole::TaskDeclaration
        | CstRole::FunctionDeclaration
        | CstRole::BeginEndBlock
        | CstRole::CaseItem => PartitionPolicy::AlwaysExpand,
        CstRole::ModuleHeader
        | CstRole::IfStatement
        | CstRole::ConditionalGenerateIf
        | CstRole::MacroCall => PartitionPolicy::FitElseExpand,
        CstRole::Statement | CstRole::ParameterItem | CstRole::PortDeclaration => {
            PartitionPolicy::AppendFittingSubPartitions
        }
        _ => PartitionPolicy::FitElseExpand,
    }
}

/// Walk `cst` against `stream`, producing the root partition of the tree.
pub fn build<'src>(
    cst: &CstNode,
    stream: &TokenStream<'src>,
    config: &BuilderConfig,
) -> Result<Partition, Error> {
    build_node(cst, stream, config, 0)
}

fn build_node<'src>(
    node: &CstNode,
    stream: &TokenStream<'src>,
    config: &BuilderConfig,
    depth: u32,
) -> Result<Partition, Error> {
    let role = node.role();
    let indentation_spaces = if role == CstRole::PreprocessorDirective {
        // Preprocessor directives are always flushed to column zero inside
        // a surrounding module/interface/class, regardless of sibling
        // indentation (spec §4.1).
        0
    } else {
        depth * config.indentation_spaces
    };

    match node {
        CstNode::Leaf { token_range, .. } => {
            let tokens = stream.as_slice().get(token_range.clone()).ok_or_else(|| {
                Error::InternalInvariantViolated(InvariantViolation {
                    message: format!(
                        "CST leaf token range {:?} out of bounds for a stream of length {}",
                        token_range,
                        stream.len()
                    ),
                    partition_tree_dump: None,
                })
            })?;
            let blank_lines_before = count_leading_blank_lines(tokens);
            let formatted = build_leaf_tokens(tokens)?;
            Ok(Partition::Leaf {
                indentation_spaces,
                origin: PartitionOrigin {
                    role,
                    first_token_text: formatted.first().map(|t| t.text.clone()),
                },
                tokens: formatted,
                format_off: false,
                blank_lines_before,
            })
        }
        CstNode::Interior { children, .. } => {
            if children.is_empty() {
                return Err(Error::InternalInvariantViolated(InvariantViolation {
                    message: format!("interior CST node of role {role:?} has no children"),
                    partition_tree_dump: None,
                }));
            }
            let child_depth = if role.always_own_partition() { depth + 1 } else { depth };
            let mut built = Vec::with_capacity(children.len());
            for child in children {
                built.push(build_node(child, stream, config, child_depth)?);
            }
            attach_trailing_comments(&mut built, children, stream);
            let blank_lines_before = built.first().map(Partition::blank_lines_before).unwrap_or(0);
            Ok(Partition::Interior {
                indentation_spaces,
                origin: PartitionOrigin {
                    role,
                    first_token_text: None,
                },
                policy: dispatch_policy(role),
                children: built,
                blank_lines_before,
            })
        }
    }
}

/// Convert a contiguous run of non-whitespace tokens (trivia already
/// filtered out, attached by the caller separately) into `FormattedToken`s
/// with provisional spacing/break decisions. The annotator (stage 2)
/// overwrites `leading_spaces` once it has full context; the builder's
/// defaults keep every downstream invariant satisfiable even if the
/// annotator is skipped in a unit test.
///
/// `original_spaces` is recovered here, before `Space`/`Newline` trivia is
/// discarded, because it is the only point in the pipeline that still sees
/// every byte of the gap between two code tokens. Losing it at this stage
/// would make `SpacingKind::PreserveOriginal` and format-off passthrough
/// (spec §4.3 item 1, §8 property 4) unable to reproduce the source's
/// actual spacing.
/// Count blank source lines in the trivia run preceding this node's first
/// code token. One newline just ends the previous line; a second
/// (consecutive, with no intervening code) marks a blank line (spec §4.4
/// "Group boundaries", §4.6 "Blank-line preservation").
fn count_leading_blank_lines(tokens: &[Token<'_>]) -> u32 {
    let mut newlines = 0u32;
    for tok in tokens {
        match tok.kind {
            TokenKind::Newline => newlines += 1,
            TokenKind::Space => {}
            _ => break,
        }
    }
    newlines.saturating_sub(1)
}

fn build_leaf_tokens(tokens: &[Token<'_>]) -> Result<Vec<FormattedToken>, Error> {
    let mut out = Vec::new();
    let mut pending_spaces: u32 = 0;
    for tok in tokens {
        match tok.kind {
            TokenKind::Space => {
                pending_spaces += tok.text.chars().count() as u32;
                continue;
            }
            TokenKind::Newline => {
                // A leaf's token run does not span source lines in
                // practice (each statement/row is its own leaf), so a
                // stray newline inside one just resets the running count
                // rather than attempting to represent it as spaces.
                pending_spaces = 0;
                continue;
            }
            TokenKind::Eof => continue,
            _ => {}
        }
        out.push(FormattedToken {
            text: tok.text.to_string(),
            kind: tok.kind,
            leading_spaces: if out.is_empty() {
                SpacingKind::NoSpace
            } else {
                SpacingKind::Undecided
            },
            break_before: BreakKind::Space,
            wrap_penalty: 0,
            original_spaces: if out.is_empty() { 0 } else { pending_spaces },
            byte_offset: tok.offset.clone(),
        });
        pending_spaces = 0;
    }
    Ok(out)
}

/// A line comment abutting the end of a code line is folded onto that
/// line's partition; a comment occupying its own source line stays a
/// sibling UL with the surrounding block's indentation (spec §4.1
/// "Comment attachment"). `cst_children`/`stream` are the original CST
/// siblings this `built` list was produced from, parallel by index, since
/// "shares the predecessor's source line" can only be answered from the
/// comment node's own leading trivia, already discarded by the time its
/// tokens became a `FormattedToken` list.
fn attach_trailing_comments(built: &mut Vec<Partition>, cst_children: &[CstNode], stream: &TokenStream<'_>) {
    let mut i = 0;
    while i + 1 < built.len() {
        let is_comment_leaf = matches!(
            &built[i + 1],
            Partition::Leaf { origin, tokens, .. }
                if origin.role == CstRole::Comment && tokens.len() == 1
        );
        let shares_line = is_comment_leaf
            && cst_children
                .get(i + 1)
                .and_then(CstNode::token_range)
                .and_then(|range| stream.as_slice().get(range))
                .map(comment_shares_line_with_predecessor)
                .unwrap_or(false);
        if shares_line {
            let comment = built.remove(i + 1);
            if let (
                Partition::Leaf { tokens: dst, .. },
                Partition::Leaf { tokens: mut src, .. },
            ) = (&mut built[i], comment)
            {
                dst.append(&mut src);
            }
        }
        i += 1;
    }
}

/// `true` iff `comment_tokens` (the comment CST node's own token-range
/// slice, leading trivia included per the `token_range` convention
/// documented on `count_leading_blank_lines`) has no `Newline` before the
/// comment token itself, i.e. the comment sits on the same source line as
/// whatever precedes it rather than starting a new one (spec §4.1).
fn comment_shares_line_with_predecessor(comment_tokens: &[Token<'_>]) -> bool {
    for tok in comment_tokens {
        match tok.kind {
            TokenKind::Newline => return false,
            TokenKind::Space => continue,
            _ => return true,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(kind: TokenKind, text: &str, start: usize) -> Token<'_> {
        Token::new(kind, text, start..start + text.len())
    }

    #[test]
    fn builds_leaf_from_token_range() {
        let stream = TokenStream::new(vec![
            tok(TokenKind::Keyword, "wire", 0),
            tok(TokenKind::Space, " ", 4),
            tok(TokenKind::Identifier, "w", 5),
            tok(TokenKind::Semicolon, ";", 6),
        ]);
        let cst = CstNode::Leaf {
            role: CstRole::Statement,
            token_range: 0..4,
        };
        let partition = build(&cst, &stream, &BuilderConfig::default()).unwrap();
        match partition {
            Partition::Leaf { tokens, .. } => {
                let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
                assert_eq!(texts, vec!["wire", "w", ";"]);
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn preprocessor_directive_is_flushed_to_column_zero() {
        let stream = TokenStream::new(vec![tok(TokenKind::PreprocessorDirective, "`ifdef X", 0)]);
        let cst = CstNode::Interior {
            role: CstRole::ModuleDeclaration,
            children: vec![CstNode::Leaf {
                role: CstRole::PreprocessorDirective,
                token_range: 0..1,
            }],
        };
        let partition = build(&cst, &stream, &BuilderConfig::default()).unwrap();
        assert_eq!(partition.children()[0].indentation_spaces(), 0);
    }

    #[test]
    fn empty_interior_node_is_an_invariant_violation() {
        let stream = TokenStream::new(vec![]);
        let cst = CstNode::Interior {
            role: CstRole::ModuleDeclaration,
            children: vec![],
        };
        let err = build(&cst, &stream, &BuilderConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InternalInvariantViolated(_)));
    }

    #[test]
    fn trailing_comment_is_attached_to_predecessor() {
        let stream = TokenStream::new(vec![
            tok(TokenKind::Semicolon, ";", 0),
            tok(TokenKind::LineComment, "// note", 1),
        ]);
        let cst = CstNode::Interior {
            role: CstRole::BeginEndBlock,
            children: vec![
                CstNode::Leaf {
                    role: CstRole::Statement,
                    token_range: 0..1,
                },
                CstNode::Leaf {
                    role: CstRole::Comment,
                    token_range: 1..2,
                },
            ],
        };
        let partition = build(&cst, &stream, &BuilderConfig::default()).unwrap();
        assert_eq!(partition.children().len(), 1);
        match &partition.children()[0] {
            Partition::Leaf { tokens, .. } => {
                assert_eq!(tokens.len(), 2);
                assert_eq!(tokens[1].text, "// note");
            }
            _ => panic!("expected a leaf"),
        }
    }

    #[test]
    fn own_line_comment_stays_its_own_partition() {
        let stream = TokenStream::new(vec![
            tok(TokenKind::Semicolon, ";", 0),
            tok(TokenKind::Newline, "\n", 1),
            tok(TokenKind::LineComment, "// note", 2),
        ]);
        let cst = CstNode::Interior {
            role: CstRole::BeginEndBlock,
            children: vec![
                CstNode::Leaf {
                    role: CstRole::Statement,
                    token_range: 0..1,
                },
                CstNode::Leaf {
                    role: CstRole::Comment,
                    token_range: 1..3,
                },
            ],
        };
        let partition = build(&cst, &stream, &BuilderConfig::default()).unwrap();
        assert_eq!(partition.children().len(), 2);
        match &partition.children()[0] {
            Partition::Leaf { tokens, .. } => assert_eq!(tokens.len(), 1),
            _ => panic!("expected a leaf"),
        }
        match &partition.children()[1] {
            Partition::Leaf { tokens, .. } => assert_eq!(tokens[0].text, "// note"),
            _ => panic!("expected a leaf"),
        }
    }
}
