//! Bridge from `tracing` spans to Micromegas thread-local scopes.
//!
//! Bevy's `trace` feature opens a `tracing` span for every schedule run. The
//! layer here picks out spans by name and replays their enter/exit as
//! Micromegas named scopes, labelled with the span's `name` field when it has
//! one, so a tick shows up as `Update` → `update_enemies` → `find_path` in a
//! single timeline.

use micromegas_tracing::dispatch::{on_begin_named_scope, on_end_named_scope};
use micromegas_tracing::intern_string::intern_string;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

micromegas_tracing::static_span_location!(BRIDGE_LOCATION);

/// Span names forwarded by [`SpanBridgeLayer::default`].
pub const DEFAULT_BRIDGED_SPANS: &[&str] = &["schedule"];

/// Label attached to a bridged span.
struct BridgedScope {
    label: &'static str,
}

#[derive(Default)]
struct LabelVisitor {
    label: Option<String>,
}

impl Visit for LabelVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "name" {
            self.label = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "name" && self.label.is_none() {
            self.label = Some(format!("{:?}", value));
        }
    }
}

/// Forwards the named `tracing` spans into Micromegas.
pub struct SpanBridgeLayer {
    span_names: &'static [&'static str],
}

impl SpanBridgeLayer {
    pub fn new(span_names: &'static [&'static str]) -> Self {
        Self { span_names }
    }

    pub fn bridges(&self, span_name: &str) -> bool {
        self.span_names.contains(&span_name)
    }
}

impl Default for SpanBridgeLayer {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGED_SPANS)
    }
}

impl<S> Layer<S> for SpanBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let span_name = attrs.metadata().name();
        if !self.bridges(span_name) {
            return;
        }

        let mut visitor = LabelVisitor::default();
        attrs.record(&mut visitor);
        let label = intern_string(visitor.label.as_deref().unwrap_or(span_name));

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(BridgedScope { label });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(scope) = span.extensions().get::<BridgedScope>()
        {
            on_begin_named_scope(&BRIDGE_LOCATION, scope.label);
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id)
            && let Some(scope) = span.extensions().get::<BridgedScope>()
        {
            on_end_named_scope(&BRIDGE_LOCATION, scope.label);
        }
    }
}
