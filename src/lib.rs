// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Reckon - Reconciliation result summarization for Kubernetes operators
//!
//! Reckon is the policy layer between a reconciler's domain logic and its
//! controller runtime. A reconciler reports what happened (success, retry,
//! wait, stall, or an error) and reckon turns that into:
//!
//! - a persisted object status with standardized conditions,
//! - a concrete requeue decision for the runtime scheduler,
//! - recorded operator-facing Kubernetes Events.
//!
//! ## Modules
//!
//! - [`conditions`] - Condition type and status condition state helpers
//! - [`reconcile`] - Result computation, result builders, failure recovery
//! - [`reconcile::summarize`] - The summarize-and-patch orchestrator
//! - [`reconcile::processors`] - Result processor middlewares
//! - [`reconcile_errors`] - Structured reconcile error taxonomy
//! - [`object`] - Generic spec/status field accessors
//! - [`patch`] - Status patching with owned-condition scoping
//! - [`events`] - Kubernetes Event recording
//! - [`metrics`] - Prometheus reconciliation metrics
//!
//! ## Example
//!
//! ```rust,ignore
//! use reckon::reconcile::summarize::{Conditions, Helper, SummarizeOpts};
//! use reckon::reconcile::processors::{RecordContextualError, RecordReconcileReq};
//! use reckon::reconcile::{AlwaysRequeueResultBuilder, ReconcileResult};
//! use reckon::{constants, events::KubeEventRecorder, patch::KubePatcher};
//!
//! async fn reconcile(client: kube::Client, mut obj: MyResource) -> anyhow::Result<()> {
//!     // ... domain logic producing (result, error) ...
//!     let interval = reckon::object::get_requeue_interval(&obj)
//!         .unwrap_or(constants::DEFAULT_REQUEUE_INTERVAL);
//!
//!     let helper = Helper::new(
//!         KubeEventRecorder::new(client.clone(), "my-controller"),
//!         KubePatcher::new(client),
//!     );
//!     let opts = SummarizeOpts::new()
//!         .with_conditions([Conditions {
//!             target: constants::READY_CONDITION.to_string(),
//!             owned: vec![constants::READY_CONDITION.to_string()],
//!             summarize: vec![constants::READY_CONDITION.to_string()],
//!             negative_polarity: vec![],
//!         }])
//!         .with_processors([
//!             Box::new(RecordContextualError) as Box<_>,
//!             Box::new(RecordReconcileReq) as Box<_>,
//!         ])
//!         .with_reconcile_result(ReconcileResult::Success)
//!         .with_result_builder(AlwaysRequeueResultBuilder { requeue_after: interval })
//!         .with_patch_field_owner("my-controller");
//!     let (result, error) = helper.summarize_and_patch(&mut obj, opts).await;
//!     // ... return result.to_action() / error to the runtime ...
//!     Ok(())
//! }
//! ```

pub mod conditions;
pub mod constants;
pub mod events;
pub mod metrics;
pub mod object;
pub mod patch;
pub mod reconcile;
pub mod reconcile_errors;
pub mod status_reasons;

#[cfg(test)]
mod testutil;
