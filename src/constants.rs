// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the reckon engine.
//!
//! This module contains all string and numeric constants used throughout the
//! codebase. Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// Condition Types
// ============================================================================

/// The condition type that summarizes the overall state of an object.
///
/// `Ready` is special: it is the only condition the engine second-guesses
/// after summarization. A reconciliation that looks successful but leaves
/// `Ready` not-`True` is converted into an error so the runtime retries
/// instead of going quiet on an unhealthy object.
pub const READY_CONDITION: &str = "Ready";

/// The condition type that records a terminal-until-spec-change failure.
///
/// A stalled object has had its current generation fully processed but
/// cannot make further progress without an external change (for example an
/// invalid spec). The engine sets and clears this condition itself.
pub const STALLED_CONDITION: &str = "Stalled";

/// The condition type that records an in-progress reconciliation.
///
/// Reconcilers set this at the start of work on a new generation; the
/// engine deletes it when a reconciliation completes successfully.
pub const RECONCILING_CONDITION: &str = "Reconciling";

// ============================================================================
// Annotations
// ============================================================================

/// Annotation users set to request an out-of-band reconciliation.
///
/// The annotation value (typically a timestamp) is echoed into
/// `status.lastHandledReconcileAt` once the request has been observed,
/// giving at-least-once manual-trigger detection.
pub const RECONCILE_REQUEST_ANNOTATION: &str = "reckon.dev/requestedAt";

// ============================================================================
// Status Fields
// ============================================================================

/// Status field recording the last fully reconciled spec generation.
pub const OBSERVED_GENERATION_FIELD: &str = "observedGeneration";

/// Status field echoing the reconcile-request annotation value.
pub const LAST_HANDLED_RECONCILE_AT_FIELD: &str = "lastHandledReconcileAt";

/// Spec field holding the reconciliation interval as a duration string.
pub const INTERVAL_FIELD: &str = "interval";

// ============================================================================
// Defaults
// ============================================================================

/// Fallback requeue interval when `spec.interval` is absent.
pub const DEFAULT_REQUEUE_INTERVAL: Duration = Duration::from_secs(1);
