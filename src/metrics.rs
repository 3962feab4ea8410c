//! Best-effort metrics seam. Hosts plug in whatever sink they like; the
//! default forwards to `tracing` and the no-op sink drops everything.

use std::time::Duration;

/// How a single per-file visit ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitOutcome {
    Changed,
    Unchanged,
    Deleted,
    Skipped,
    Timeout,
    Error,
}

impl VisitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitOutcome::Changed => "changed",
            VisitOutcome::Unchanged => "unchanged",
            VisitOutcome::Deleted => "deleted",
            VisitOutcome::Skipped => "skipped",
            VisitOutcome::Timeout => "timeout",
            VisitOutcome::Error => "error",
        }
    }
}

/// Receives the engine's measurement stream. All methods default to
/// no-ops, so sinks implement only what they record.
pub trait MetricsSink: Send + Sync {
    /// One recipe run and the size of the batch given to it.
    fn recipe_run(&self, _recipe: &str, _batch_size: usize) {}

    /// One per-file visit, tagged by recipe and outcome.
    fn recipe_visit(&self, _recipe: &str, _outcome: VisitOutcome, _elapsed: Duration) {}

    /// One parsed input, tagged by file type and success.
    fn parse(&self, _file_type: &str, _ok: bool, _elapsed: Duration) {}
}

/// Drops every measurement.
#[derive(Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {}

/// Emits measurements as `tracing` debug events.
#[derive(Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn recipe_run(&self, recipe: &str, batch_size: usize) {
        tracing::debug!(recipe, batch_size, "recipe.run");
    }

    fn recipe_visit(&self, recipe: &str, outcome: VisitOutcome, elapsed: Duration) {
        tracing::debug!(
            recipe,
            outcome = outcome.as_str(),
            elapsed_us = elapsed.as_micros() as u64,
            "recipe.visit"
        );
    }

    fn parse(&self, file_type: &str, ok: bool, elapsed: Duration) {
        tracing::debug!(
            file_type,
            ok,
            elapsed_us = elapsed.as_micros() as u64,
            "parse"
        );
    }
}
