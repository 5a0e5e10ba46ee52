// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition state for Kubernetes resources.
//!
//! This module provides the `Condition` type and the helpers the
//! reconciliation engine uses to read and mutate `status.conditions`
//! following the standard Kubernetes conventions.
//!
//! # Condition Format
//!
//! - `type`: The aspect of the resource being reported (e.g., "Ready")
//! - `status`: `True`, `False`, or `Unknown`
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `observedGeneration`: The spec generation the condition is based on
//! - `lastTransitionTime`: RFC3339 timestamp of the last status change
//!
//! All mutations go through [`set`], which preserves `lastTransitionTime`
//! when the status value does not change, so conditions never flap their
//! transition timestamps on no-op updates.
//!
//! # Polarity
//!
//! Most conditions are positive polarity (`True` is good, e.g. `Ready`).
//! Some are negative polarity (`True` is bad, e.g. `FetchFailed` or
//! `Stalled`); [`set_summary`] inverts those before aggregating them into a
//! positive-polarity summary condition.

use crate::constants::{READY_CONDITION, RECONCILING_CONDITION, STALLED_CONDITION};
use chrono::Utc;
use kube::Resource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status value of a condition.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The state of the condition cannot be determined.
    Unknown,
}

/// A named status condition attached to a reconciled object.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// The aspect of the resource this condition reports (e.g., "Ready").
    pub r#type: String,

    /// Current status: `True`, `False`, or `Unknown`.
    pub status: ConditionStatus,

    /// Programmatic identifier explaining the status, in CamelCase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable explanation of the status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The `metadata.generation` the condition was based on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// RFC3339 timestamp of the last change to `status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Objects that carry a mutable `status.conditions` list.
///
/// This is the only structural knowledge the engine requires of a resource
/// type; everything else (generation, annotations, deletion timestamp) is
/// read through [`kube::Resource`].
pub trait Conditioned {
    /// The object's current conditions.
    fn conditions(&self) -> &[Condition];

    /// Mutable access to the object's conditions.
    ///
    /// Implementations backed by an `Option<Status>` are expected to
    /// initialize an empty status on first access.
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;
}

/// Find a condition by type.
#[must_use]
pub fn get<'a, K: Conditioned>(obj: &'a K, condition_type: &str) -> Option<&'a Condition> {
    obj.conditions().iter().find(|c| c.r#type == condition_type)
}

/// Check whether a condition of the given type is present.
#[must_use]
pub fn has<K: Conditioned>(obj: &K, condition_type: &str) -> bool {
    get(obj, condition_type).is_some()
}

/// Check whether a condition is present with status `True`.
#[must_use]
pub fn is_true<K: Conditioned>(obj: &K, condition_type: &str) -> bool {
    get(obj, condition_type).is_some_and(|c| c.status == ConditionStatus::True)
}

/// Check whether the object's `Ready` condition is `True`.
#[must_use]
pub fn is_ready<K: Conditioned>(obj: &K) -> bool {
    is_true(obj, READY_CONDITION)
}

/// Check whether the object's `Stalled` condition is `True`.
#[must_use]
pub fn is_stalled<K: Conditioned>(obj: &K) -> bool {
    is_true(obj, STALLED_CONDITION)
}

/// Get the message of a condition, or an empty string if absent.
#[must_use]
pub fn get_message<K: Conditioned>(obj: &K, condition_type: &str) -> String {
    get(obj, condition_type)
        .and_then(|c| c.message.clone())
        .unwrap_or_default()
}

/// Get the reason of a condition, or an empty string if absent.
#[must_use]
pub fn get_reason<K: Conditioned>(obj: &K, condition_type: &str) -> String {
    get(obj, condition_type)
        .and_then(|c| c.reason.clone())
        .unwrap_or_default()
}

/// Remove a condition by type. Removing an absent condition is a no-op.
pub fn delete<K: Conditioned>(obj: &mut K, condition_type: &str) {
    obj.conditions_mut().retain(|c| c.r#type != condition_type);
}

/// Set a condition, updating in place if one of the same type exists.
///
/// The condition's `observedGeneration` is stamped from the object's
/// `metadata.generation`. `lastTransitionTime` is preserved when the status
/// value is unchanged and reset to the current time when it flips.
///
/// # Arguments
///
/// * `obj` - The object whose conditions are updated
/// * `condition_type` - The type of condition (e.g., "Ready")
/// * `status` - The new status value
/// * `reason` - A programmatic identifier in CamelCase
/// * `message` - A human-readable explanation
///
/// # Example
///
/// ```rust,ignore
/// use reckon::conditions::{self, ConditionStatus};
///
/// conditions::set(&mut obj, "Ready", ConditionStatus::True, "Succeeded", "all good");
/// ```
pub fn set<K: Conditioned + Resource>(
    obj: &mut K,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) {
    let generation = obj.meta().generation;
    let conditions = obj.conditions_mut();

    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status;
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.observed_generation = generation;
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(Condition {
            r#type: condition_type.to_string(),
            status,
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            observed_generation: generation,
            last_transition_time: Some(Utc::now().to_rfc3339()),
        });
    }
}

/// Set a condition to `True`.
pub fn set_true<K: Conditioned + Resource>(
    obj: &mut K,
    condition_type: &str,
    reason: &str,
    message: &str,
) {
    set(obj, condition_type, ConditionStatus::True, reason, message);
}

/// Set a condition to `False`.
pub fn set_false<K: Conditioned + Resource>(
    obj: &mut K,
    condition_type: &str,
    reason: &str,
    message: &str,
) {
    set(obj, condition_type, ConditionStatus::False, reason, message);
}

/// Set a condition to `Unknown`.
pub fn set_unknown<K: Conditioned + Resource>(
    obj: &mut K,
    condition_type: &str,
    reason: &str,
    message: &str,
) {
    set(obj, condition_type, ConditionStatus::Unknown, reason, message);
}

/// Mark the object as stalled: `Stalled=True` with the given reason.
///
/// A stalled object has had its current generation fully processed but
/// cannot make further progress until its spec changes.
pub fn mark_stalled<K: Conditioned + Resource>(obj: &mut K, reason: &str, message: &str) {
    set_true(obj, STALLED_CONDITION, reason, message);
}

/// Mark the object as reconciling: `Reconciling=True` with the given reason.
pub fn mark_reconciling<K: Conditioned + Resource>(obj: &mut K, reason: &str, message: &str) {
    set_true(obj, RECONCILING_CONDITION, reason, message);
}

/// Compute a summary condition from a set of member conditions.
///
/// Walks `summarize` in declared order over the conditions present on the
/// object. Each member's status is first normalized by polarity: a type
/// listed in `negative_polarity` has its status inverted, so a present
/// `FetchFailed=True` counts as "bad" for the summary. The target then
/// takes the status of the highest-priority bucket:
///
/// 1. any normalized `False` (first match in list order wins),
/// 2. else any `Unknown`,
/// 3. else any normalized `True`.
///
/// The winning member's reason and message are copied onto the target. If
/// no member condition is present, the target condition is removed.
///
/// # Arguments
///
/// * `obj` - The object whose target condition is recomputed
/// * `target` - The summary condition type (e.g., "Ready")
/// * `summarize` - Member condition types, in priority order
/// * `negative_polarity` - The subset of `summarize` whose `True` is bad
pub fn set_summary<K: Conditioned + Resource>(
    obj: &mut K,
    target: &str,
    summarize: &[String],
    negative_polarity: &[String],
) {
    let mut bad: Option<(ConditionStatus, String, String)> = None;
    let mut unknown: Option<(ConditionStatus, String, String)> = None;
    let mut good: Option<(ConditionStatus, String, String)> = None;

    for condition_type in summarize {
        let Some(condition) = get(obj, condition_type) else {
            continue;
        };

        let negative = negative_polarity.contains(condition_type);
        let normalized = match (condition.status, negative) {
            (ConditionStatus::True, true) | (ConditionStatus::False, false) => {
                ConditionStatus::False
            }
            (ConditionStatus::True, false) | (ConditionStatus::False, true) => {
                ConditionStatus::True
            }
            (ConditionStatus::Unknown, _) => ConditionStatus::Unknown,
        };

        let entry = (
            normalized,
            condition.reason.clone().unwrap_or_default(),
            condition.message.clone().unwrap_or_default(),
        );
        let bucket = match normalized {
            ConditionStatus::False => &mut bad,
            ConditionStatus::Unknown => &mut unknown,
            ConditionStatus::True => &mut good,
        };
        if bucket.is_none() {
            *bucket = Some(entry);
        }
    }

    match bad.or(unknown).or(good) {
        Some((status, reason, message)) => set(obj, target, status, &reason, &message),
        None => delete(obj, target),
    }
}
