//! Top-level entry points (spec §6 "External interfaces").
//!
//! Wires every stage together in spec order: lex → parse → build (§4.1) →
//! annotate (§4.2) → transform (§4.3) → align (§4.4) → wrap-emit (§4.5,
//! §4.6) → verify (§4.7). Range-restricted calls additionally run the
//! range driver (§4.8) between transform and align.

use crate::align::align_tree;
use crate::annotator::annotate_tree;
use crate::builder::build;
use crate::error::Result;
use crate::external::{Lexer, Parser};
use crate::interval::{LineIndex, LineNumberSet};
use crate::range::apply_range_restriction;
use crate::style::{ExecutionControl, FormatStyle, VerificationLevel};
use crate::transformer::transform;

/// Format `source` in full, using `lexer`/`parser` as the language front
/// end (spec §6 `format()`).
pub fn format_str(
    source: &str,
    lexer: &dyn Lexer,
    parser: &dyn Parser,
    style: &FormatStyle,
    control: &ExecutionControl,
) -> Result<String> {
    run(source, lexer, parser, style, control)
}

/// Format only the lines in `ranges` within `source`, preserving
/// everything else byte-for-byte except whole alignment groups any
/// selected row belongs to (spec §6 `format_range()`, §9 "Open
/// questions").
pub fn format_range_str(
    source: &str,
    ranges: &LineNumberSet,
    lexer: &dyn Lexer,
    parser: &dyn Parser,
    style: &FormatStyle,
    control: &ExecutionControl,
) -> Result<String> {
    let mut control = control.clone();
    control.line_ranges = Some(ranges.clone());
    run(source, lexer, parser, style, &control)
}

fn run(
    source: &str,
    lexer: &dyn Lexer,
    parser: &dyn Parser,
    style: &FormatStyle,
    control: &ExecutionControl,
) -> Result<String> {
    let stream = lexer.lex(source)?;
    // `token_range`s recorded on the CST index into this full stream
    // (trivia included), matching how `crate::builder` resolves them.
    let cst = parser.parse(stream.as_slice())?;

    let mut root = build(&cst, &stream, &style.builder_config())?;
    annotate_tree(&mut root, &style.annotate_config());
    transform(&mut root, &style.transform_config());

    if let Some(ranges) = &control.line_ranges {
        let index = LineIndex::new(source);
        apply_range_restriction(&mut root, ranges, &index);
    }

    align_tree(&mut root, &style.align_config());

    let mut model = style.wrap_cost_model();
    model.max_search_states = control.max_search_states;
    let output = crate::emitter::emit(&root, &model)?;

    match control.verification {
        VerificationLevel::None => {}
        VerificationLevel::Lex => {
            crate::verifier::verify(lexer, source, &output)?;
        }
        VerificationLevel::LexAndParse => {
            crate::verifier::verify_with_parse(lexer, parser, source, &output)?;
        }
    }

    Ok(output)
}
