//! The external lexer/parser boundary (spec §5 "External interfaces").
//!
//! This crate owns the partition tree and every formatting decision over
//! it, but it does not own lexical analysis or grammar recognition for the
//! source language: both are supplied by a collaborator so this crate can
//! be exercised against any SystemVerilog front end that implements these
//! two traits. The verifier (`crate::verifier`) calls back through them to
//! re-derive a token stream from formatted output without re-running the
//! formatter itself.

use crate::token::{Token, TokenStream};

/// Turns source text into a flat token stream, including trivia. Spec
/// §5 requires this boundary to preserve exact source bytes in
/// `Token::text` and to never merge or split a token across a single call.
pub trait Lexer {
    /// Lex `source` in full. Implementations should return
    /// [`crate::error::Error::LexError`] rather than panicking on malformed
    /// input, since `verifier::verify` treats a lex failure as a data-loss
    /// diagnostic, not a crash.
    fn lex<'src>(&self, source: &'src str) -> crate::error::Result<TokenStream<'src>>;
}

/// Builds a concrete syntax tree from a code-token stream (trivia already
/// filtered, spec §3 "CST"). The formatter never constructs CST nodes
/// itself; it only walks a tree a `Parser` implementation hands it.
pub trait Parser {
    fn parse(&self, tokens: &[Token<'_>]) -> crate::error::Result<crate::cst::CstNode>;
}

/// A `Lexer`/`Parser` pair bundled for convenience, matching the shape
/// callers typically hold (one front end instance per language dialect).
pub struct Frontend<L, P> {
    pub lexer: L,
    pub parser: P,
}

impl<L: Lexer, P: Parser> Frontend<L, P> {
    pub fn new(lexer: L, parser: P) -> Self {
        Self { lexer, parser }
    }
}
