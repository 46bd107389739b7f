//! Error taxonomy for the format engine (spec §7).
//!
//! Mirrors the teacher's style: plain enums with a hand-written `Display`
//! and `std::error::Error` impl rather than a derive-macro crate. Fatal
//! kinds abort a format call with no output written; `UnsupportedToken` is
//! recovered internally (logged via `tracing::warn!`) and never surfaces
//! to the caller as an `Err`.

use std::fmt;

use crate::token::TokenKind;

/// Errors that can abort a format call.
#[derive(Debug, Clone)]
pub enum Error {
    /// The collaborator lexer rejected the (re-)lexed input.
    LexError(String),
    /// The collaborator parser rejected the (re-)parsed input.
    ParseError(String),
    /// A core invariant was broken; indicates a bug in this crate.
    InternalInvariantViolated(InvariantViolation),
    /// The wrap-search stage exceeded `ExecutionControl::max_search_states`.
    ResourceExhausted { max_search_states: u32 },
    /// The verifier detected a token-level divergence between input and
    /// output.
    DataLoss(DataLossReason),
}

/// Detail carried by [`Error::InternalInvariantViolated`].
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub message: String,
    /// Present only when `ExecutionControl::debug` requested a partition
    /// tree dump.
    pub partition_tree_dump: Option<String>,
}

/// Detail carried by [`Error::DataLoss`].
#[derive(Debug, Clone)]
pub enum DataLossReason {
    LexErrorInOutput(String),
    ParseErrorInOutput(String),
    LexicalDifference {
        position: usize,
        expected: (TokenKind, String),
        found: Option<(TokenKind, String)>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LexError(msg) => write!(f, "lex error: {msg}"),
            Error::ParseError(msg) => write!(f, "parse error: {msg}"),
            Error::InternalInvariantViolated(v) => {
                write!(f, "internal invariant violated: {}", v.message)
            }
            Error::ResourceExhausted { max_search_states } => write!(
                f,
                "line-wrap search exceeded the {max_search_states}-state budget"
            ),
            Error::DataLoss(reason) => write!(f, "data loss detected: {reason}"),
        }
    }
}

impl fmt::Display for DataLossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLossReason::LexErrorInOutput(msg) => {
                write!(f, "lex error in formatted output: {msg}")
            }
            DataLossReason::ParseErrorInOutput(msg) => {
                write!(f, "parse error in formatted output: {msg}")
            }
            DataLossReason::LexicalDifference {
                position,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "lexical difference at token {position}: expected {:?} {:?}, found {:?} {:?}",
                    expected.0, expected.1, found.0, found.1
                ),
                None => write!(
                    f,
                    "lexical difference at token {position}: expected {:?} {:?}, found end of stream",
                    expected.0, expected.1
                ),
            },
        }
    }
}

impl std::error::Error for Error {}

/// Non-fatal table miss, recovered by defaulting to one space and logged
/// at `warn` level by the caller of [`crate::annotator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedToken {
    pub left: TokenKind,
    pub right: TokenKind,
}

impl fmt::Display for UnsupportedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no spacing rule for token pair ({:?}, {:?}); defaulting to one space",
            self.left, self.right
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
