//! One collection pass: run every enabled metric, keep every outcome.

use std::time::Instant;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::metric::MetricsSnapshot;
use crate::registry::MetricRegistry;
use crate::source::QuerySource;

/// Collect a snapshot stamped with the current local time.
pub fn collect(
    config: &Config,
    registry: &MetricRegistry,
    source: &mut dyn QuerySource,
) -> MetricsSnapshot {
    collect_at(config, registry, source, Local::now())
}

/// Collect a snapshot stamped with `now`.
///
/// Only metrics that are both registered and enabled are evaluated. A failing
/// metric is recorded as an error entry and the pass moves on; even when the
/// source is unusable every enabled metric is attempted, so the snapshot
/// always has one entry per enabled metric.
pub fn collect_at(
    config: &Config,
    registry: &MetricRegistry,
    source: &mut dyn QuerySource,
    now: DateTime<Local>,
) -> MetricsSnapshot {
    let started = Instant::now();
    let mut snapshot = MetricsSnapshot::new(now);

    for id in registry.ids() {
        if !config.is_enabled(id) {
            continue;
        }
        let outcome = registry.evaluate(id, source);
        if let Err(err) = &outcome {
            tracing::warn!(metric = %id, error = %err, "metric collection failed");
        }
        snapshot.values.insert(id, outcome);
    }

    tracing::debug!(
        collected = snapshot.values.len(),
        failed = snapshot.failure_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "collection pass finished"
    );

    snapshot
}
