// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic accessors for well-known spec and status fields.
//!
//! Controllers often need a handful of fields (`status.observedGeneration`,
//! `status.lastHandledReconcileAt`, `spec.interval`) on resource types the
//! engine knows nothing about. These accessors work on any serde-serializable
//! object by round-tripping through `serde_json::Value`, the Rust analogue of
//! an unstructured-object conversion.
//!
//! Note that [`set_status_last_handled_reconcile_at`] can only persist a
//! value the object's status type actually declares: serde drops unknown
//! fields on the way back into the typed object.

use crate::constants::{
    INTERVAL_FIELD, LAST_HANDLED_RECONCILE_AT_FIELD, OBSERVED_GENERATION_FIELD,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors from the generic field accessors.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The requested field is not present on the object.
    #[error("field '{0}' not found")]
    NotFound(&'static str),

    /// The field is present but cannot be interpreted.
    #[error("invalid format for field '{field}': {reason}")]
    InvalidFormat {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The object could not be converted to or from JSON.
    #[error(transparent)]
    Conversion(#[from] serde_json::Error),
}

/// Read `status.observedGeneration`.
///
/// # Errors
///
/// [`ObjectError::NotFound`] if the object has no status or the field is
/// absent.
pub fn get_status_observed_generation<K: Serialize>(obj: &K) -> Result<i64, ObjectError> {
    serde_json::to_value(obj)?
        .pointer(&format!("/status/{OBSERVED_GENERATION_FIELD}"))
        .and_then(Value::as_i64)
        .ok_or(ObjectError::NotFound("status.observedGeneration"))
}

/// Read `status.lastHandledReconcileAt`.
///
/// # Errors
///
/// [`ObjectError::NotFound`] if the object has no status or the field is
/// absent.
pub fn get_status_last_handled_reconcile_at<K: Serialize>(obj: &K) -> Result<String, ObjectError> {
    serde_json::to_value(obj)?
        .pointer(&format!("/status/{LAST_HANDLED_RECONCILE_AT_FIELD}"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(ObjectError::NotFound("status.lastHandledReconcileAt"))
}

/// Write `status.lastHandledReconcileAt`, creating the status if missing.
///
/// # Errors
///
/// [`ObjectError::Conversion`] if the object cannot round-trip through
/// JSON, [`ObjectError::InvalidFormat`] if it does not serialize to a JSON
/// object.
pub fn set_status_last_handled_reconcile_at<K>(obj: &mut K, value: &str) -> Result<(), ObjectError>
where
    K: Serialize + DeserializeOwned,
{
    let mut repr = serde_json::to_value(&*obj)?;
    let root = repr.as_object_mut().ok_or(ObjectError::InvalidFormat {
        field: "status",
        reason: "object does not serialize to a JSON object".to_string(),
    })?;

    let status = root.entry("status").or_insert_with(|| json!({}));
    if !status.is_object() {
        *status = json!({});
    }
    status[LAST_HANDLED_RECONCILE_AT_FIELD] = json!(value);

    *obj = serde_json::from_value(repr)?;
    Ok(())
}

/// Read `spec.interval` as a requeue interval.
///
/// Callers wanting a default on absence fall back explicitly:
///
/// ```rust,ignore
/// let interval = object::get_requeue_interval(&obj)
///     .unwrap_or(constants::DEFAULT_REQUEUE_INTERVAL);
/// ```
///
/// # Errors
///
/// [`ObjectError::NotFound`] if `spec.interval` is absent,
/// [`ObjectError::InvalidFormat`] if it is not a parsable duration string.
pub fn get_requeue_interval<K: Serialize>(obj: &K) -> Result<Duration, ObjectError> {
    let repr = serde_json::to_value(obj)?;
    let raw = repr
        .pointer(&format!("/spec/{INTERVAL_FIELD}"))
        .and_then(Value::as_str)
        .ok_or(ObjectError::NotFound("spec.interval"))?;
    parse_interval(raw)
}

/// Parse a Go-style duration string into a `Duration`.
///
/// Supports one or more `<value><unit>` segments, e.g. `"30s"`, `"5m"`,
/// `"1h30m"`, `"1500ms"`. Supported units: `ms`, `s`, `m`, `h`.
///
/// # Errors
///
/// [`ObjectError::InvalidFormat`] for an empty string, a missing or unknown
/// unit, a non-numeric value, or overflow.
pub fn parse_interval(interval: &str) -> Result<Duration, ObjectError> {
    let invalid = |reason: String| ObjectError::InvalidFormat {
        field: "spec.interval",
        reason,
    };

    if interval.is_empty() {
        return Err(invalid("duration string is empty".to_string()));
    }

    let mut total = Duration::ZERO;
    let mut rest = interval;
    while !rest.is_empty() {
        let digits_end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(rest.len(), |(i, _)| i);
        if digits_end == 0 {
            return Err(invalid(format!("expected a number at '{rest}'")));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| invalid(format!("value too large in '{interval}'")))?;

        rest = &rest[digits_end..];
        let unit_end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map_or(rest.len(), |(i, _)| i);
        let (unit, remainder) = rest.split_at(unit_end);
        rest = remainder;

        let segment = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(|| {
                invalid(format!("value too large in '{interval}'"))
            })?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(|| {
                invalid(format!("value too large in '{interval}'"))
            })?),
            "" => {
                return Err(invalid(format!(
                    "missing unit after '{value}' (use ms, s, m, or h)"
                )))
            }
            other => {
                return Err(invalid(format!(
                    "unsupported unit '{other}' (use ms, s, m, or h)"
                )))
            }
        };
        total = total
            .checked_add(segment)
            .ok_or_else(|| invalid(format!("value too large in '{interval}'")))?;
    }

    Ok(total)
}
