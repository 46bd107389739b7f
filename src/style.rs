//! `FormatStyle` and `ExecutionControl` (spec §6 "External interfaces").
//!
//! `FormatStyle` holds the formatting-policy knobs a user would put in a
//! style config file; `ExecutionControl` holds the resource/behavior knobs
//! that govern one `format()` call (search budget, verification level,
//! debug dumps). Both derive `serde::Deserialize` so a caller can load
//! them from JSON, following the teacher's config-struct shape in
//! `lex-config` minus its file-watching machinery, which this crate has
//! no use for.

use serde::Deserialize;

use crate::align::{AlignmentPolicy, IntentThresholds};

/// How aggressively the verifier checks its own output (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationLevel {
    /// Skip verification entirely.
    None,
    /// Re-lex the output and compare code-token streams (spec §4.7
    /// "Token preservation").
    Lex,
    /// Re-lex and re-parse the output, additionally diffing CST shape.
    LexAndParse,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        VerificationLevel::LexAndParse
    }
}

/// Formatting-policy knobs (spec §6).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FormatStyle {
    pub column_limit: u32,
    pub indentation_spaces: u32,
    pub wrap_spaces: u32,
    pub alignment_policy: AlignmentPolicy,
    pub right_align_packed_dimensions: bool,
    pub right_align_unpacked_dimensions: bool,
    pub penalty_wrap: u32,
    pub penalty_wrap_after_open_paren: u32,
    pub penalty_over_column: u32,
    pub intent_thresholds: IntentThresholds,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            column_limit: 100,
            indentation_spaces: 2,
            wrap_spaces: 4,
            alignment_policy: AlignmentPolicy::InferUserIntent,
            right_align_packed_dimensions: true,
            right_align_unpacked_dimensions: false,
            penalty_wrap: 3,
            penalty_wrap_after_open_paren: 6,
            penalty_over_column: 10,
            intent_thresholds: IntentThresholds::default(),
        }
    }
}

impl FormatStyle {
    pub fn wrap_cost_model(&self) -> crate::wrap::WrapCostModel {
        crate::wrap::WrapCostModel {
            column_limit: self.column_limit,
            penalty_wrap: self.penalty_wrap,
            penalty_wrap_after_open_paren: self.penalty_wrap_after_open_paren,
            penalty_over_column: self.penalty_over_column,
            wrap_spaces: self.wrap_spaces,
            max_search_states: 100_000,
        }
    }

    pub fn align_config(&self) -> crate::align::AlignConfig {
        crate::align::AlignConfig {
            policy: self.alignment_policy,
            right_align_packed: self.right_align_packed_dimensions,
            right_align_unpacked: self.right_align_unpacked_dimensions,
            column_limit: self.column_limit,
            thresholds: self.intent_thresholds,
        }
    }

    pub fn builder_config(&self) -> crate::builder::BuilderConfig {
        crate::builder::BuilderConfig {
            indentation_spaces: self.indentation_spaces,
        }
    }

    pub fn transform_config(&self) -> crate::transformer::TransformConfig {
        crate::transformer::TransformConfig {
            column_limit: self.column_limit,
        }
    }

    pub fn annotate_config(&self) -> crate::annotator::AnnotatorConfig {
        crate::annotator::AnnotatorConfig {
            wrap_penalty: self.penalty_wrap,
        }
    }
}

/// Resource/behavior knobs for one `format()` call (spec §6, §4.5
/// "Resource model").
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExecutionControl {
    pub max_search_states: u32,
    pub verification: VerificationLevel,
    /// When `true`, an `InternalInvariantViolated` error carries a dump of
    /// the partition tree at the point of failure (spec §4.7 "Diagnostics").
    pub debug: bool,
    /// Only the lines in this set are eligible for reformatting (spec
    /// §4.8); `None` formats the whole file.
    pub line_ranges: Option<crate::interval::LineNumberSet>,
}

impl Default for ExecutionControl {
    fn default() -> Self {
        Self {
            max_search_states: 100_000,
            verification: VerificationLevel::default(),
            debug: false,
            line_ranges: None,
        }
    }
}
