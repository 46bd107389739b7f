//! Stage 7: the verifier (spec §4.7).
//!
//! After emission, re-lexes the formatted output through the caller's
//! [`crate::external::Lexer`] and compares its code-token stream against
//! the original's. A mismatch means the formatter changed program meaning,
//! which is always a bug, never a style choice — the caller gets back a
//! [`crate::error::DataLossReason`] pinpointing the first divergence
//! rather than a silently wrong reformat.

use crate::error::{DataLossReason, Error};
use crate::external::{Lexer, Parser};
use crate::token::TokenStream;

/// Compare `original` and `formatted` source text's code-token streams
/// (spec §4.7 "Token preservation"). Returns `Ok(())` if they match
/// token-for-token (kind and text; not byte offset, since reformatting
/// moves everything), or the first [`DataLossReason`] found otherwise.
pub fn verify(lexer: &dyn Lexer, original: &str, formatted: &str) -> Result<(), Error> {
    let original_stream = lexer
        .lex(original)
        .map_err(|e| Error::DataLoss(DataLossReason::LexErrorInOutput(e.to_string())))?;
    let formatted_stream = lexer
        .lex(formatted)
        .map_err(|e| Error::DataLoss(DataLossReason::LexErrorInOutput(e.to_string())))?;

    compare_code_tokens(&original_stream, &formatted_stream)
}

/// `verify`, plus step 2 of spec §4.7: re-parse the formatted output as the
/// same top-level rule the input was parsed with, failing with
/// [`DataLossReason::ParseErrorInOutput`] if the collaborator parser
/// rejects it. Used when `VerificationLevel::LexAndParse` is requested;
/// `verify` alone is what `VerificationLevel::Lex` runs.
pub fn verify_with_parse(
    lexer: &dyn Lexer,
    parser: &dyn Parser,
    original: &str,
    formatted: &str,
) -> Result<(), Error> {
    verify(lexer, original, formatted)?;

    let formatted_stream = lexer
        .lex(formatted)
        .map_err(|e| Error::DataLoss(DataLossReason::LexErrorInOutput(e.to_string())))?;
    let code_tokens: Vec<_> = formatted_stream.code_tokens().cloned().collect();
    parser
        .parse(&code_tokens)
        .map_err(|e| Error::DataLoss(DataLossReason::ParseErrorInOutput(e.to_string())))?;
    Ok(())
}

fn compare_code_tokens(original: &TokenStream<'_>, formatted: &TokenStream<'_>) -> Result<(), Error> {
    let mut orig_iter = original.code_tokens();
    let mut fmt_iter = formatted.code_tokens();
    let mut position = 0usize;

    loop {
        let expected = orig_iter.next();
        let found = fmt_iter.next();
        match (expected, found) {
            (None, None) => return Ok(()),
            (Some(e), Some(f)) => {
                if e.kind != f.kind || e.text != f.text {
                    return Err(Error::DataLoss(DataLossReason::LexicalDifference {
                        position,
                        expected: (e.kind, e.text.to_string()),
                        found: Some((f.kind, f.text.to_string())),
                    }));
                }
            }
            (Some(e), None) => {
                return Err(Error::DataLoss(DataLossReason::LexicalDifference {
                    position,
                    expected: (e.kind, e.text.to_string()),
                    found: None,
                }))
            }
            (None, Some(f)) => {
                return Err(Error::DataLoss(DataLossReason::LexicalDifference {
                    position,
                    expected: (f.kind, String::new()),
                    found: Some((f.kind, f.text.to_string())),
                }))
            }
        }
        position += 1;
    }
}
