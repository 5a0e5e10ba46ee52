// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for reconciled resources.
//!
//! This module defines constants for condition reasons following Kubernetes
//! conventions. Reasons are programmatic identifiers in CamelCase that explain
//! why a condition has a particular status.
//!
//! Reconcilers are free to use their own domain-specific reasons; the
//! constants here cover the states the engine itself produces or that nearly
//! every controller needs.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "True"
//!       reason: Succeeded
//!       message: "stored artifact for revision 1a2b3c"
//!     - type: Stalled
//!       status: "True"
//!       reason: InvalidSpec
//!       message: "spec.url is not a valid URL"
//! ```

/// Reconciliation of the current generation completed successfully.
pub const REASON_SUCCEEDED: &str = "Succeeded";

/// Reconciliation of the current generation failed.
pub const REASON_FAILED: &str = "Failed";

/// Reconciliation of a new generation is underway.
pub const REASON_PROGRESSING: &str = "Progressing";

/// The object's spec is invalid and cannot be acted on until it changes.
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";

/// A dependency is not yet available; the reconciler is waiting.
pub const REASON_DEPENDENCY_NOT_READY: &str = "DependencyNotReady";

/// An out-of-band reconcile request was handled.
pub const REASON_RECONCILE_REQUESTED: &str = "ReconcileRequested";
