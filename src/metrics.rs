// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for reconciliation outcomes.
//!
//! This module provides the metrics a controller records around
//! `summarize_and_patch`, with the namespace prefix `reckon_`.
//!
//! The crate never serves the metrics itself; [`render_metrics`] returns
//! the text exposition for a caller-owned `/metrics` endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use reckon::metrics;
//! use std::time::Instant;
//!
//! let start = Instant::now();
//! // ... reconcile and summarize ...
//! metrics::record_reconciliation("Widget", metrics::OUTCOME_SUCCESS);
//! metrics::record_duration("Widget", start);
//! ```

use crate::conditions::{self, ConditionStatus, Conditioned};
use crate::constants::READY_CONDITION;
use kube::Resource;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::warn;

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "reckon";

/// Outcome label value for a successful reconciliation.
pub const OUTCOME_SUCCESS: &str = "success";

/// Outcome label value for a failed reconciliation.
pub const OUTCOME_ERROR: &str = "error";

/// Outcome label value for an immediate requeue.
pub const OUTCOME_REQUEUE: &str = "requeue";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry; expose them via
/// [`render_metrics`].
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total number of reconciliations by resource kind and outcome
///
/// Labels:
/// - `kind`: Kind of resource (e.g., `Widget`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource kind and outcome",
    );
    let counter = CounterVec::new(opts, &["kind", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `kind`: Kind of resource (e.g., `Widget`)
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource kind",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Current condition status per object and condition type
///
/// Values: 1 = `True`, 0 = `False`, -1 = `Unknown` or absent.
///
/// Labels:
/// - `kind`: Kind of resource
/// - `namespace` / `name`: Object identity
/// - `type`: Condition type (e.g., `Ready`)
pub static CONDITION_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_condition_status"),
        "Current condition status per object and condition type",
    );
    let gauge = GaugeVec::new(opts, &["kind", "namespace", "name", "type"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Record a completed reconciliation with the given outcome label.
pub fn record_reconciliation(kind: &str, outcome: &str) {
    RECONCILIATION_TOTAL.with_label_values(&[kind, outcome]).inc();
}

/// Record the duration of a reconciliation that started at `start`.
pub fn record_duration(kind: &str, start: Instant) {
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(start.elapsed().as_secs_f64());
}

/// Record the current status of one condition on an object.
pub fn record_condition<K: Conditioned + Resource>(obj: &K, kind: &str, condition_type: &str) {
    let value = match conditions::get(obj, condition_type).map(|c| c.status) {
        Some(ConditionStatus::True) => 1.0,
        Some(ConditionStatus::False) => 0.0,
        Some(ConditionStatus::Unknown) | None => -1.0,
    };
    let namespace = obj.meta().namespace.clone().unwrap_or_default();
    let name = obj.meta().name.clone().unwrap_or_default();
    CONDITION_STATUS
        .with_label_values(&[kind, &namespace, &name, condition_type])
        .set(value);
}

/// Record the object's `Ready` condition status.
pub fn record_readiness<K: Conditioned + Resource>(obj: &K, kind: &str) {
    record_condition(obj, kind, READY_CONDITION);
}

/// Render all registered metrics in the Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(err) = encoder.encode(&METRICS_REGISTRY.gather(), &mut buffer) {
        warn!(error = %err, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
