// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Result processors: middlewares run before result computation.
//!
//! Processors observe the unmodified `(result, error)` pair of a
//! reconciliation and produce side effects only: log lines, events, or
//! status echoes. They never alter the scheduling decision or the final
//! error. This is how errors that [`compute_reconcile_result`] swallows
//! (`Stalling`, `Waiting`) still become operator-visible.
//!
//! [`compute_reconcile_result`]: crate::reconcile::compute_reconcile_result

use crate::constants::RECONCILE_REQUEST_ANNOTATION;
use crate::events::EventRecorder;
use crate::object;
use crate::reconcile::ReconcileResult;
use crate::reconcile_errors::ReconcileError;
use async_trait::async_trait;
use kube::runtime::events::EventType;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info, warn};

/// A middleware observing the outcome of a reconciliation.
///
/// Processors run strictly before result computation, in list order, each
/// seeing the same unmodified inputs.
#[async_trait]
pub trait ResultProcessor<K, R>: Send + Sync {
    /// Observe the reconcile outcome, producing side effects only.
    async fn process(
        &self,
        recorder: &R,
        obj: &mut K,
        res: ReconcileResult,
        err: Option<&ReconcileError>,
    );
}

/// Records structured reconcile errors as logs and Kubernetes Events.
///
/// - `Event` errors become warning events;
/// - `Waiting` errors are logged at info level and become normal events;
/// - `Stalling` errors are logged at error level and become warning events;
/// - unclassified errors (and no error) are left to the runtime's own
///   error logging.
pub struct RecordContextualError;

#[async_trait]
impl<K, R> ResultProcessor<K, R> for RecordContextualError
where
    K: Resource + Send + Sync,
    R: EventRecorder<K>,
{
    async fn process(
        &self,
        recorder: &R,
        obj: &mut K,
        _res: ReconcileResult,
        err: Option<&ReconcileError>,
    ) {
        match err {
            Some(ReconcileError::Event { reason, source }) => {
                recorder
                    .event(obj, EventType::Warning, reason, &source.to_string())
                    .await;
            }
            Some(ReconcileError::Waiting {
                requeue_after,
                reason,
                source,
            }) => {
                info!(
                    reason = %reason,
                    requeue_after = ?requeue_after,
                    error = %source,
                    "Reconciliation is waiting"
                );
                recorder
                    .event(obj, EventType::Normal, reason, &source.to_string())
                    .await;
            }
            Some(ReconcileError::Stalling { reason, source }) => {
                error!(reason = %reason, error = %source, "Reconciliation has stalled");
                recorder
                    .event(obj, EventType::Warning, reason, &source.to_string())
                    .await;
            }
            Some(ReconcileError::Other(_) | ReconcileError::Aggregate(_)) | None => {}
        }
    }
}

/// Echoes a pending reconcile request into the object's status.
///
/// If the object carries the reconcile-request annotation
/// (`reckon.dev/requestedAt`), its value is copied into
/// `status.lastHandledReconcileAt`, marking the manual trigger as handled.
/// Re-applying the same annotation value is a no-op mutation.
pub struct RecordReconcileReq;

#[async_trait]
impl<K, R> ResultProcessor<K, R> for RecordReconcileReq
where
    K: Resource + Serialize + DeserializeOwned + Send + Sync,
    R: Send + Sync,
{
    async fn process(
        &self,
        _recorder: &R,
        obj: &mut K,
        _res: ReconcileResult,
        _err: Option<&ReconcileError>,
    ) {
        let Some(requested_at) = obj
            .meta()
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(RECONCILE_REQUEST_ANNOTATION))
            .cloned()
        else {
            return;
        };

        if let Err(err) = object::set_status_last_handled_reconcile_at(obj, &requested_at) {
            warn!(error = %err, "Failed to record reconcile request in status");
        }
    }
}

#[cfg(test)]
#[path = "processors_tests.rs"]
mod processors_tests;
