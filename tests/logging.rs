//! Exercises the one place the engine emits a `tracing::warn!`: the
//! rule-table-miss fallback in `annotator::spacing_decision` (spec §4.2
//! "Failures"). Captures emitted events through a custom `Layer` scoped
//! with `tracing::subscriber::with_default`, the same technique
//! `core-actions`' translator tests use to assert on dispatched events
//! without installing a process-global subscriber.

use std::sync::{Arc, Mutex};

use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

use sv_format_core::annotator::spacing_decision;
use sv_format_core::cst::CstRole;
use sv_format_core::partition::SpacingKind;
use sv_format_core::token::TokenKind;

#[derive(Clone, Default)]
struct LevelCapture {
    levels: Arc<Mutex<Vec<tracing::Level>>>,
}

impl LevelCapture {
    fn levels(&self) -> Vec<tracing::Level> {
        self.levels.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for LevelCapture {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> tracing::subscriber::Interest {
        tracing::subscriber::Interest::always()
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.levels.lock().unwrap().push(*event.metadata().level());
    }
}

#[test]
fn unmatched_token_pair_warns_exactly_once() {
    let capture = LevelCapture::default();
    let subscriber = Registry::default().with(capture.clone());

    let (spacing, unsupported) = tracing::subscriber::with_default(subscriber, || {
        // No rule in the table keys on an Identifier/Identifier pair; this
        // is the fallback path, not a construct the rules ever special-case.
        spacing_decision(TokenKind::Identifier, TokenKind::Identifier, CstRole::Generic, 0)
    });

    assert_eq!(spacing, SpacingKind::Space(1));
    assert!(unsupported.is_some());
    assert_eq!(capture.levels(), vec![tracing::Level::WARN]);
}

#[test]
fn matched_token_pair_does_not_warn() {
    let capture = LevelCapture::default();
    let subscriber = Registry::default().with(capture.clone());

    let (_, unsupported) = tracing::subscriber::with_default(subscriber, || {
        // `,` followed by an identifier is covered by an explicit rule
        // (one space after a list comma), so no fallback and no warning.
        spacing_decision(TokenKind::Comma, TokenKind::Identifier, CstRole::Generic, 0)
    });

    assert!(unsupported.is_none());
    assert!(capture.levels().is_empty());
}
