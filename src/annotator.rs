//! Stage 2: the inter-token annotator (spec §4.2).
//!
//! For every adjacent token pair inside a leaf partition, decides the
//! spacing and break contract. The rule table is data — a constant slice
//! keyed on `(TokenKind, TokenKind, Option<CstRole>)` — with a single
//! fallback default for pairs it doesn't name, matching spec §4.2's
//! "rule-table miss is a recoverable warning: the gap defaults to one
//! space."

use once_cell::sync::Lazy;

use crate::cst::CstRole;
use crate::error::UnsupportedToken;
use crate::partition::{BreakKind, FormattedToken, SpacingKind};
use crate::token::TokenKind;

/// Per-run knobs the annotator needs beyond the static rule table (spec
/// §6's `FormatStyle`): the penalty charged on a gap it marks breakable,
/// handed to the line-wrap search via `FormattedToken::wrap_penalty`.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatorConfig {
    pub wrap_penalty: u32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self { wrap_penalty: 3 }
    }
}

/// A rule table entry. `role` of `None` matches any enclosing role; a
/// `Some` entry is preferred when both match the same token-kind pair.
struct Rule {
    left: TokenKind,
    right: TokenKind,
    role: Option<CstRole>,
    spacing: SpacingKind,
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use TokenKind::*;
    vec![
        // Keyword introducing a parenthesised head: one space, except `@(`.
        Rule {
            left: Keyword,
            right: OpenParen,
            role: None,
            spacing: SpacingKind::Space(1),
        },
        Rule {
            left: At,
            right: OpenParen,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        // `::` and `.`: zero spaces on both sides, encoded as the pair
        // rules for the punctuator itself.
        Rule {
            left: Identifier,
            right: Punctuator,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        // `#(` parameter specialisation: zero spaces before and after `#`.
        Rule {
            left: Hash,
            right: OpenParen,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: Identifier,
            right: Hash,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        // After `,` and `;`: one space (unless followed by a newline,
        // handled by the caller before falling back to this table).
        Rule {
            left: Comma,
            right: Identifier,
            role: None,
            spacing: SpacingKind::Space(1),
        },
        Rule {
            left: Semicolon,
            right: Identifier,
            role: None,
            spacing: SpacingKind::Space(1),
        },
        // Before `,`, `;`, `)`, `]`, `}`: zero spaces.
        Rule {
            left: Identifier,
            right: Comma,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: Identifier,
            right: Semicolon,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: Identifier,
            right: CloseParen,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: Identifier,
            right: CloseBracket,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: Identifier,
            right: CloseBrace,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        Rule {
            left: OpenParen,
            right: Identifier,
            role: None,
            spacing: SpacingKind::NoSpace,
        },
        // Binary operators: one space, except inside a subscript where
        // original spacing is preserved (handled by role-qualified rule).
        Rule {
            left: Identifier,
            right: Operator,
            role: None,
            spacing: SpacingKind::Space(1),
        },
        Rule {
            left: Operator,
            right: Identifier,
            role: None,
            spacing: SpacingKind::Space(1),
        },
    ]
});

/// Enclosing roles whose `[lo:hi]`-shaped bracket contents keep the
/// original (0-or-1) spacing rather than the binary-operator default of
/// one space (spec §4.2 "except inside a subscript").
fn is_subscript_role(role: CstRole) -> bool {
    matches!(
        role,
        CstRole::PortDeclaration | CstRole::DataDeclaration | CstRole::NetDeclaration
    )
}

/// Resolve the spacing decision for an adjacent token pair. `original_spaces`
/// is the number of space characters literally present between the two
/// tokens in the source, used both by `PreserveOriginal` decisions and by
/// the bit-range symmetrisation rule. Returns the decision and, if the
/// table had no match, the [`UnsupportedToken`] that was recovered from by
/// falling back to one space (spec §4.2 "Failures").
pub fn spacing_decision(
    left: TokenKind,
    right: TokenKind,
    role: CstRole,
    original_spaces: u32,
) -> (SpacingKind, Option<UnsupportedToken>) {
    if is_subscript_role(role) && matches!(left, TokenKind::OpenBracket) {
        return (SpacingKind::PreserveOriginal, None);
    }

    let role_match = RULES
        .iter()
        .find(|r| r.left == left && r.right == right && r.role == Some(role));
    if let Some(rule) = role_match {
        return (rule.spacing, None);
    }

    let generic_match = RULES
        .iter()
        .find(|r| r.left == left && r.right == right && r.role.is_none());
    if let Some(rule) = generic_match {
        return (rule.spacing, None);
    }

    tracing::warn!(?left, ?right, ?role, "no spacing rule for token pair; defaulting to one space");
    (
        SpacingKind::Space(1),
        Some(UnsupportedToken { left, right }),
    )
}

/// `[lo : hi]` symmetrisation (spec §4.2 "Bit-range symmetrisation"):
/// `[a:b]` if both original sides had zero spaces, `[a : b]` if either
/// side had >= 1.
pub fn symmetrize_bit_range(left_spaces: u32, right_spaces: u32) -> (u32, u32) {
    if left_spaces == 0 && right_spaces == 0 {
        (0, 0)
    } else {
        (1, 1)
    }
}

/// Between a code token and a trailing line comment on the same source
/// line: at least two spaces (spec §4.2 "Trailing EOL comment").
pub fn trailing_comment_spacing() -> SpacingKind {
    SpacingKind::Space(2)
}

/// Apply bit-range symmetrisation to every `:` found inside a subscript
/// role's tokens (spec §4.2 "Bit-range symmetrisation"). Overrides the
/// generic per-pair decision the main loop already made for the colon and
/// its right neighbour, since symmetrisation is a joint decision over both
/// sides of the colon rather than a single left/right pair.
fn apply_bit_range_symmetrisation(role: CstRole, tokens: &mut [crate::partition::FormattedToken]) {
    if !is_subscript_role(role) {
        return;
    }
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Colon {
            continue;
        }
        let left_spaces = tokens[i].original_spaces;
        if i + 1 >= tokens.len() {
            continue;
        }
        let right_spaces = tokens[i + 1].original_spaces;
        let (left, right) = symmetrize_bit_range(left_spaces, right_spaces);
        tokens[i].leading_spaces = SpacingKind::Space(left as u8);
        tokens[i + 1].leading_spaces = SpacingKind::Space(right as u8);
    }
}

/// Walk a freshly built partition tree and resolve every leaf's
/// `leading_spaces`/`break_before` decisions in place (spec §4.2 runs
/// after the builder and before the transformer). The builder does not
/// retain each gap's original space count once trivia tokens are dropped,
/// so `PreserveOriginal` decisions here resolve against a single space;
/// the one rule that actually depends on more than 0-vs-nonzero
/// (bit-range symmetrisation) is applied by its caller in the builder
/// where the original count is still in scope.
pub fn annotate_tree(node: &mut crate::partition::Partition, config: &AnnotatorConfig) {
    match node {
        crate::partition::Partition::Leaf { origin, tokens, .. } => {
            let role = origin.role;
            for i in 1..tokens.len() {
                let left_kind = tokens[i - 1].kind;
                let right_kind = tokens[i].kind;
                if right_kind.is_comment() {
                    tokens[i].leading_spaces = trailing_comment_spacing();
                    continue;
                }
                let original = tokens[i].original_spaces;
                let (spacing, _warning) = spacing_decision(left_kind, right_kind, role, original);
                tokens[i].leading_spaces = spacing;
            }
            apply_bit_range_symmetrisation(role, tokens);
            mark_breakable_gaps(tokens, config);
        }
        crate::partition::Partition::Interior { children, .. } => {
            for child in children.iter_mut() {
                annotate_tree(child, config);
            }
        }
    }
}

/// Attach a may-break-with-penalty decision (spec §4.2 "break decision
/// ... may-break-with-penalty P") to the gaps the §4.5 line-wrap search is
/// allowed to act on: immediately after a `,`, and around a binary
/// operator. A gap immediately before a closing `)`/`]`/`}` or a `;` is
/// never marked, matching the "before `,`, `;`, `)`, `]`, `}`: zero
/// spaces" rule — breaking there would only relocate the punctuator, not
/// actually shorten the line. Leaves `break_before` at the builder's
/// `BreakKind::Space` default everywhere else; the search (`wrap.rs`)
/// only spends the penalty when the row doesn't fit, so marking every
/// comma/operator gap unconditionally is safe even on short rows.
fn mark_breakable_gaps(tokens: &mut [FormattedToken], config: &AnnotatorConfig) {
    for i in 1..tokens.len() {
        let left_kind = tokens[i - 1].kind;
        let right_kind = tokens[i].kind;
        if right_kind.is_comment() {
            continue;
        }
        let breakable = matches!(left_kind, TokenKind::Comma | TokenKind::Operator)
            && !matches!(
                right_kind,
                TokenKind::CloseParen
                    | TokenKind::CloseBracket
                    | TokenKind::CloseBrace
                    | TokenKind::Semicolon
            );
        if breakable {
            tokens[i].break_before = BreakKind::AppendAligned;
            tokens[i].wrap_penalty = config.wrap_penalty;
        }
    }
}
