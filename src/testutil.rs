// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared test fixtures: a minimal custom resource and in-memory fakes for
//! the collaborator traits.

use crate::conditions::{Condition, Conditioned};
use crate::events::EventRecorder;
use crate::patch::{PatchError, PatchOpts, Patcher};
use async_trait::async_trait;
use kube::core::Status;
use kube::runtime::events::EventType;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Minimal reconciled resource for engine tests.
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

/// A namespaced widget with the given generation and a 30s interval.
pub fn widget(name: &str, generation: i64) -> Widget {
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

/// A recorded event: severity, reason, message.
pub type RecordedEvent = (String, String, String);

/// Event recorder that captures events in memory.
#[derive(Clone, Default)]
pub struct FakeRecorder {
    pub events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl FakeRecorder {
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl<K: Send + Sync> EventRecorder<K> for FakeRecorder {
    async fn event(&self, _obj: &K, event_type: EventType, reason: &str, message: &str) {
        let severity = match event_type {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        };
        self.events.lock().unwrap().push((
            severity.to_string(),
            reason.to_string(),
            message.to_string(),
        ));
    }
}

/// Patcher that records calls in memory, optionally failing with a given
/// HTTP status code.
#[derive(Clone, Default)]
pub struct FakePatcher {
    pub calls: Arc<Mutex<Vec<PatchOpts>>>,
    pub fail_code: Option<u16>,
}

impl FakePatcher {
    pub fn failing(code: u16) -> Self {
        Self {
            fail_code: Some(code),
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<PatchOpts> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<K: Send + Sync> Patcher<K> for FakePatcher {
    async fn patch(&self, _obj: &K, opts: &PatchOpts) -> Result<(), PatchError> {
        self.calls.lock().unwrap().push(opts.clone());
        match self.fail_code {
            Some(code) => Err(api_error(code)),
            None => Ok(()),
        }
    }
}

/// A `PatchError` carrying an API error response with the given code.
pub fn api_error(code: u16) -> PatchError {
    let reason = if code == 404 { "NotFound" } else { "InternalError" };
    PatchError::Api(kube::Error::Api(Box::new(
        Status::failure(&format!("fake api error ({code})"), reason).with_code(code),
    )))
}
