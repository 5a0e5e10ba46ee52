// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests for the summarize-and-patch engine.
//!
//! These drive a full reconciliation pass the way a controller would: domain
//! logic produces an abstract result, the helper computes the runtime
//! result, summarizes conditions, and persists status, here against
//! in-memory fakes instead of an API server.

use async_trait::async_trait;
use kube::runtime::events::EventType;
use kube::CustomResource;
use reckon::conditions::{self, Condition, Conditioned};
use reckon::constants::{
    DEFAULT_REQUEUE_INTERVAL, READY_CONDITION, RECONCILE_REQUEST_ANNOTATION, STALLED_CONDITION,
};
use reckon::events::EventRecorder;
use reckon::object;
use reckon::patch::{PatchError, PatchOpts, Patcher};
use reckon::reconcile::processors::{RecordContextualError, RecordReconcileReq, ResultProcessor};
use reckon::reconcile::summarize::{Conditions, Helper, SummarizeOpts};
use reckon::reconcile::{failure_recovery, AlwaysRequeueResultBuilder, ReconcileResult, RuntimeResult};
use reckon::reconcile_errors::ReconcileError;
use reckon::status_reasons::{REASON_DEPENDENCY_NOT_READY, REASON_INVALID_SPEC, REASON_SUCCEEDED};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Test Resource
// ============================================================================

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "testing.reckon.dev",
    version = "v1alpha1",
    kind = "Widget",
    namespaced,
    status = "WidgetStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_handled_reconcile_at: Option<String>,
}

impl Conditioned for Widget {
    fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map_or(&[], |status| status.conditions.as_slice())
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.status.get_or_insert_with(WidgetStatus::default).conditions
    }
}

fn widget(name: &str, generation: i64) -> Widget {
    let mut obj = Widget::new(
        name,
        WidgetSpec {
            interval: Some("30s".to_string()),
        },
    );
    obj.metadata.namespace = Some("default".to_string());
    obj.metadata.generation = Some(generation);
    obj
}

// ============================================================================
// In-Memory Collaborators
// ============================================================================

#[derive(Clone, Default)]
struct MemoryRecorder {
    events: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl<K: Send + Sync> EventRecorder<K> for MemoryRecorder {
    async fn event(&self, _obj: &K, event_type: EventType, reason: &str, _message: &str) {
        let severity = match event_type {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        };
        self.events
            .lock()
            .unwrap()
            .push((severity.to_string(), reason.to_string()));
    }
}

/// Applies patches to a stored copy of the object, like an API server would.
#[derive(Clone, Default)]
struct MemoryPatcher {
    stored: Arc<Mutex<Option<Widget>>>,
    calls: Arc<Mutex<Vec<PatchOpts>>>,
}

#[async_trait]
impl Patcher<Widget> for MemoryPatcher {
    async fn patch(&self, obj: &Widget, opts: &PatchOpts) -> Result<(), PatchError> {
        self.calls.lock().unwrap().push(opts.clone());

        let mut stored = self.stored.lock().unwrap();
        let mut updated = obj.clone();
        if opts.with_observed_generation {
            updated
                .status
                .get_or_insert_with(WidgetStatus::default)
                .observed_generation = obj.metadata.generation;
        }
        *stored = Some(updated);
        Ok(())
    }
}

fn engine() -> (Helper<MemoryRecorder, MemoryPatcher>, MemoryRecorder, MemoryPatcher) {
    let recorder = MemoryRecorder::default();
    let patcher = MemoryPatcher::default();
    (
        Helper::new(recorder.clone(), patcher.clone()),
        recorder,
        patcher,
    )
}

fn ready_group() -> Conditions {
    Conditions {
        target: READY_CONDITION.to_string(),
        owned: vec![READY_CONDITION.to_string(), STALLED_CONDITION.to_string()],
        summarize: vec![STALLED_CONDITION.to_string(), READY_CONDITION.to_string()],
        negative_polarity: vec![STALLED_CONDITION.to_string()],
    }
}

fn default_processors() -> Vec<Box<dyn ResultProcessor<Widget, MemoryRecorder>>> {
    vec![Box::new(RecordContextualError), Box::new(RecordReconcileReq)]
}

/// One full reconciliation pass with the given outcome.
async fn run_pass(
    helper: &Helper<MemoryRecorder, MemoryPatcher>,
    obj: &mut Widget,
    result: ReconcileResult,
    error: Option<ReconcileError>,
) -> (RuntimeResult, Option<ReconcileError>) {
    let interval = object::get_requeue_interval(obj).unwrap_or(DEFAULT_REQUEUE_INTERVAL);
    let mut opts = SummarizeOpts::new()
        .with_conditions([ready_group()])
        .with_processors(default_processors())
        .with_reconcile_result(result)
        .with_result_builder(AlwaysRequeueResultBuilder {
            requeue_after: interval,
        })
        .with_patch_field_owner("widget-controller");
    if let Some(error) = error {
        opts = opts.with_reconcile_error(error);
    }
    helper.summarize_and_patch(obj, opts).await
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn successful_reconciliation_requeues_at_interval() {
    let (helper, _recorder, patcher) = engine();
    let mut obj = widget("success", 1);
    conditions::set_true(&mut obj, READY_CONDITION, REASON_SUCCEEDED, "stored artifact");

    let (result, err) = run_pass(&helper, &mut obj, ReconcileResult::Success, None).await;

    assert!(err.is_none());
    assert_eq!(result, RuntimeResult::after(Duration::from_secs(30)));

    let calls = patcher.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1, "patch called exactly once");
    assert!(calls[0].with_observed_generation);

    let stored = patcher.stored.lock().unwrap().clone().unwrap();
    assert_eq!(object::get_status_observed_generation(&stored).unwrap(), 1);
    assert!(conditions::is_ready(&stored));
}

#[tokio::test]
async fn stalled_object_stops_requeuing_until_spec_change() {
    let (helper, recorder, patcher) = engine();
    let mut obj = widget("stalls", 3);

    let (result, err) = run_pass(
        &helper,
        &mut obj,
        ReconcileResult::Empty,
        Some(ReconcileError::stalling(
            REASON_INVALID_SPEC,
            anyhow::anyhow!("spec.url is not a valid URL"),
        )),
    )
    .await;

    // Swallowed error, no requeue: the object goes quiet.
    assert!(err.is_none());
    assert!(result.is_empty());

    // Status carries the whole story.
    assert!(conditions::is_stalled(&obj));
    let ready = conditions::get(&obj, READY_CONDITION).unwrap();
    assert_eq!(ready.message.as_deref(), Some("spec.url is not a valid URL"));

    // The generation still counts as handled.
    assert!(patcher.calls.lock().unwrap()[0].with_observed_generation);

    // And the operator can see why.
    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![("Warning".to_string(), "InvalidSpec".to_string())]
    );
}

#[tokio::test]
async fn waiting_reconciliation_defers_by_the_requested_duration() {
    let (helper, recorder, _patcher) = engine();
    let mut obj = widget("waits", 1);

    let (result, err) = run_pass(
        &helper,
        &mut obj,
        ReconcileResult::Empty,
        Some(ReconcileError::waiting(
            Duration::from_secs(90),
            REASON_DEPENDENCY_NOT_READY,
            anyhow::anyhow!("referenced secret not found"),
        )),
    )
    .await;

    assert!(err.is_none());
    assert_eq!(result, RuntimeResult::after(Duration::from_secs(90)));
    assert!(!conditions::is_stalled(&obj));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![("Normal".to_string(), "DependencyNotReady".to_string())]
    );
}

#[tokio::test]
async fn manual_reconcile_request_is_acknowledged_once() {
    let (helper, _recorder, _patcher) = engine();
    let mut obj = widget("manual", 1);
    obj.metadata.annotations = Some(BTreeMap::from([(
        RECONCILE_REQUEST_ANNOTATION.to_string(),
        "2025-06-01T12:00:00Z".to_string(),
    )]));
    conditions::set_true(&mut obj, READY_CONDITION, REASON_SUCCEEDED, "all good");

    let (_result, err) = run_pass(&helper, &mut obj, ReconcileResult::Success, None).await;
    assert!(err.is_none());
    assert_eq!(
        object::get_status_last_handled_reconcile_at(&obj).unwrap(),
        "2025-06-01T12:00:00Z"
    );

    // A second pass with the same annotation value changes nothing.
    let before = obj.status.clone();
    let (_result, err) = run_pass(&helper, &mut obj, ReconcileResult::Success, None).await;
    assert!(err.is_none());
    assert_eq!(
        obj.status.as_ref().unwrap().last_handled_reconcile_at,
        before.unwrap().last_handled_reconcile_at
    );
}

#[tokio::test]
async fn unready_object_is_never_reported_error_free() {
    let (helper, _recorder, _patcher) = engine();
    let mut obj = widget("unready", 1);
    conditions::set_false(&mut obj, READY_CONDITION, "ArtifactMissing", "artifact not in storage");

    let (result, err) = run_pass(&helper, &mut obj, ReconcileResult::Success, None).await;

    assert_eq!(result, RuntimeResult::after(Duration::from_secs(30)));
    assert_eq!(
        err.expect("unready object yields an error").to_string(),
        "artifact not in storage"
    );
}

#[tokio::test]
async fn recovery_from_stalled_state_is_detectable() {
    let (helper, _recorder, _patcher) = engine();
    let mut obj = widget("recovers", 1);

    // First pass stalls.
    let (_result, _err) = run_pass(
        &helper,
        &mut obj,
        ReconcileResult::Empty,
        Some(ReconcileError::stalling(
            REASON_INVALID_SPEC,
            anyhow::anyhow!("bad spec"),
        )),
    )
    .await;
    assert!(conditions::is_stalled(&obj));
    let old_obj = obj.clone();

    // Spec is fixed; the next pass succeeds.
    obj.metadata.generation = Some(2);
    conditions::set_true(&mut obj, READY_CONDITION, REASON_SUCCEEDED, "all good");
    let (_result, err) = run_pass(&helper, &mut obj, ReconcileResult::Success, None).await;

    assert!(err.is_none());
    assert!(!conditions::is_stalled(&obj));
    assert!(
        failure_recovery(&old_obj, &obj, &[STALLED_CONDITION]),
        "stalled-to-clear transition counts as a recovery"
    );
}
