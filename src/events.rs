// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes Event recording for reconcilers.
//!
//! Provides a trait-based abstraction over `kube::runtime::events::Recorder`
//! so the engine can emit standard Kubernetes Events visible via
//! `kubectl describe` and `kubectl get events`, while staying testable with
//! in-memory fakes.
//!
//! Events are **fire-and-forget**: failures are logged as warnings and never
//! propagate errors. A failed event must never break reconciliation.

use async_trait::async_trait;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use tracing::warn;

/// Trait for recording Kubernetes Events on reconciled objects.
///
/// Implementations are expected to be fire-and-forget: `event()` logs a
/// warning on failure but never returns an error.
#[async_trait]
pub trait EventRecorder<K>: Send + Sync {
    /// Record an event on the given object.
    ///
    /// # Arguments
    ///
    /// * `obj` - The object the event is about
    /// * `event_type` - Normal or Warning
    /// * `reason` - Machine-readable reason string (e.g. "FetchFailed")
    /// * `message` - Human-readable message
    async fn event(&self, obj: &K, event_type: EventType, reason: &str, message: &str);
}

/// Production implementation wrapping `kube::runtime::events::Recorder`.
pub struct KubeEventRecorder {
    recorder: Recorder,
}

impl KubeEventRecorder {
    /// Create a new recorder for the given controller name.
    ///
    /// The controller name appears as the "reportingComponent" on Events.
    #[must_use]
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl<K> EventRecorder<K> for KubeEventRecorder
where
    K: Resource<DynamicType = ()> + Send + Sync,
{
    async fn event(&self, obj: &K, event_type: EventType, reason: &str, message: &str) {
        let reference = obj.object_ref(&());
        let event = Event {
            type_: event_type,
            reason: reason.to_string(),
            note: Some(message.to_string()),
            action: "Reconcile".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &reference).await {
            warn!(
                reason,
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}

/// No-op implementation for tests and event-less callers.
pub struct NoopEventRecorder;

#[async_trait]
impl<K: Send + Sync> EventRecorder<K> for NoopEventRecorder {
    async fn event(&self, _obj: &K, _event_type: EventType, _reason: &str, _message: &str) {
        // intentionally empty
    }
}
