// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation result computation.
//!
//! This module turns the abstract outcome of a reconciler, a
//! [`ReconcileResult`] plus an optional [`ReconcileError`], into the
//! concrete values a controller returns to its runtime:
//!
//! 1. a [`RuntimeResult`] scheduling directive (requeue now / after a
//!    duration / not at all), built by a [`ResultBuilder`];
//! 2. condition adjustments and patch directives on the object
//!    (`Stalled`, `Reconciling`, observed-generation advancement), made by
//!    [`compute_reconcile_result`];
//! 3. the final error, which may be swallowed when the structured error
//!    kind says the outcome is already fully expressed in status.
//!
//! See [`summarize`] for the orchestrator that drives this module at the
//! end of a reconciliation and persists the outcome.

pub mod processors;
pub mod summarize;

use crate::conditions::{self, Conditioned};
use crate::constants::{RECONCILING_CONDITION, STALLED_CONDITION};
use crate::patch::PatchOpts;
use crate::reconcile_errors::ReconcileError;
use kube::runtime::controller::Action;
use kube::Resource;
use std::time::Duration;
use tracing::warn;

/// Abstraction over the outcome of a reconciler, independent of the
/// runtime's scheduling vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcileResult {
    /// No requeue. Also used when returning an error, since the error
    /// overshadows the result.
    #[default]
    Empty,
    /// Requeue immediately. The current generation has not been fully
    /// reconciled.
    Requeue,
    /// Reconcile success. For a reconciler that requeues regularly at a
    /// fixed interval, a runtime result with that fixed `requeue_after` is
    /// the success result. Usually returned at the end of a
    /// reconciler/sub-reconciler.
    Success,
}

/// Concrete scheduling directive returned to the controller runtime.
///
/// The zero value means "no requeue". Convert to a kube-rs
/// [`Action`] with [`RuntimeResult::to_action`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeResult {
    /// Requeue immediately.
    pub requeue: bool,
    /// Requeue after this duration. Zero means no timed requeue.
    pub requeue_after: Duration,
}

impl RuntimeResult {
    /// No requeue at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Immediate requeue.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            requeue: true,
            requeue_after: Duration::ZERO,
        }
    }

    /// Timed requeue after `duration`.
    #[must_use]
    pub fn after(duration: Duration) -> Self {
        Self {
            requeue: false,
            requeue_after: duration,
        }
    }

    /// Whether this is the zero directive (no requeue of any kind).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.requeue && self.requeue_after.is_zero()
    }

    /// Convert into the kube-rs controller [`Action`].
    #[must_use]
    pub fn to_action(self) -> Action {
        if !self.requeue_after.is_zero() {
            Action::requeue(self.requeue_after)
        } else if self.requeue {
            Action::requeue(Duration::ZERO)
        } else {
            Action::await_change()
        }
    }
}

/// Strategy for converting a `(ReconcileResult, error)` pair into a
/// [`RuntimeResult`].
///
/// Implementations can build custom results based on the context of the
/// reconciler; [`AlwaysRequeueResultBuilder`] is the canonical one.
pub trait ResultBuilder: Send + Sync {
    /// Analyze the result and error to produce a runtime result.
    fn build_runtime_result(
        &self,
        rr: ReconcileResult,
        err: Option<&ReconcileError>,
    ) -> RuntimeResult;

    /// Whether a given runtime result counts as success for this builder.
    fn is_success(&self, result: RuntimeResult) -> bool;
}

/// [`ResultBuilder`] for always-requeuing reconcilers.
///
/// A successful reconciliation result for such reconcilers carries the
/// fixed `requeue_after` interval.
#[derive(Clone, Copy, Debug)]
pub struct AlwaysRequeueResultBuilder {
    /// The fixed period at which the reconciler requeues on successful
    /// execution.
    pub requeue_after: Duration,
}

impl ResultBuilder for AlwaysRequeueResultBuilder {
    fn build_runtime_result(
        &self,
        rr: ReconcileResult,
        err: Option<&ReconcileError>,
    ) -> RuntimeResult {
        // A waiting error determines the timing entirely, regardless of the
        // result value passed alongside it.
        if let Some(ReconcileError::Waiting { requeue_after, .. }) = err {
            return RuntimeResult::after(*requeue_after);
        }

        match rr {
            ReconcileResult::Requeue => RuntimeResult::immediate(),
            ReconcileResult::Success => RuntimeResult::after(self.requeue_after),
            ReconcileResult::Empty => RuntimeResult::empty(),
        }
    }

    /// True iff the result's `requeue_after` equals the configured
    /// interval, compared exactly.
    fn is_success(&self, result: RuntimeResult) -> bool {
        result.requeue_after == self.requeue_after
    }
}

/// Analyze the reconcile outcome, adjust the object's conditions, and
/// decide what the controller returns to its runtime.
///
/// Returns the patch directives to apply while persisting the object, the
/// runtime scheduling directive, and the final error (`None` when the
/// structured error kind is swallowed). The caller is responsible for using
/// the patch directives when patching the object.
///
/// # Behavior by error kind
///
/// - `Stalling` with an `Empty` result: the generation is considered
///   reconciled; `Stalled=True` is set and the error is swallowed so the
///   runtime stops requeuing. With a non-`Empty` result the combination
///   indicates the returned result is incorrect; a warning is logged and
///   the error is surfaced untouched.
/// - `Waiting`: the `Stalled` condition is removed and the error is
///   swallowed; the deferred timing is already in the runtime result.
/// - no error: the generation is considered reconciled unless the result
///   is `Requeue`; `Stalled` is removed.
/// - anything else: `Stalled` is removed and the error propagates
///   unchanged.
pub fn compute_reconcile_result<K>(
    obj: &mut K,
    res: ReconcileResult,
    rec_err: Option<ReconcileError>,
    rb: Option<&dyn ResultBuilder>,
) -> (PatchOpts, RuntimeResult, Option<ReconcileError>)
where
    K: Conditioned + Resource,
{
    let result = rb.map_or_else(RuntimeResult::default, |b| {
        b.build_runtime_result(res, rec_err.as_ref())
    });
    let mut patch_opts = PatchOpts::default();

    // Remove the reconciling condition on successful reconciliation.
    if rec_err.is_none() && res == ReconcileResult::Success {
        conditions::delete(obj, RECONCILING_CONDITION);
    }

    match rec_err {
        Some(ReconcileError::Stalling { reason, source }) => {
            if res == ReconcileResult::Empty {
                // The current generation has been reconciled and has ended
                // in a stalled state. Return no error to stop further
                // requeuing.
                patch_opts.with_observed_generation = true;
                let message = source.to_string();
                conditions::mark_stalled(obj, &reason, &message);
                (patch_opts, result, None)
            } else {
                // A stalling error with a non-empty result indicates the
                // returned result is incorrect.
                warn!(
                    reason = %reason,
                    result = ?res,
                    "Stalling error accompanied by a non-empty result"
                );
                (
                    patch_opts,
                    result,
                    Some(ReconcileError::Stalling { reason, source }),
                )
            }
        }
        Some(ReconcileError::Waiting { .. }) => {
            // The reconciler needs to wait and retry; the object is not
            // stalled. Return no error.
            conditions::delete(obj, STALLED_CONDITION);
            (patch_opts, result, None)
        }
        None => {
            // No error and not stalled. If a requeue is requested, the
            // current generation has not been fully reconciled.
            if res != ReconcileResult::Requeue {
                patch_opts.with_observed_generation = true;
            }
            conditions::delete(obj, STALLED_CONDITION);
            (patch_opts, result, None)
        }
        Some(
            err @ (ReconcileError::Event { .. }
            | ReconcileError::Other(_)
            | ReconcileError::Aggregate(_)),
        ) => {
            // Some other error; not a stalled state.
            conditions::delete(obj, STALLED_CONDITION);
            (patch_opts, result, Some(err))
        }
    }
}

/// Combine two results, returning the one with the lowest requeue period.
///
/// Weightage: `Requeue` (immediate) < `Success` (interval) < `Empty`
/// (no requeue). Used when multiple sub-reconcilers each produce a result.
#[must_use]
pub fn lowest_requeuing_result(i: ReconcileResult, j: ReconcileResult) -> ReconcileResult {
    match (i, j) {
        (ReconcileResult::Empty, _) => j,
        (_, ReconcileResult::Empty) | (ReconcileResult::Requeue, _) => i,
        (_, ReconcileResult::Requeue) => j,
        _ => j,
    }
}

/// Detect a recovery from failure between two snapshots of an object.
///
/// Counts how many of `fail_conditions` are present on `old_obj`; presence
/// alone counts, regardless of status value, since these are expected to be
/// abnormal-true conditions that are only attached while failing. Any of
/// them still present on `new_obj` short-circuits to `false`. Otherwise
/// returns `true` iff at least one was present before.
///
/// Pure; callers use it for before/after event-emission decisions.
#[must_use]
pub fn failure_recovery<K, S>(old_obj: &K, new_obj: &K, fail_conditions: &[S]) -> bool
where
    K: Conditioned,
    S: AsRef<str>,
{
    let mut failures_before = 0;
    for fail_condition in fail_conditions {
        if conditions::get(old_obj, fail_condition.as_ref()).is_some() {
            failures_before += 1;
        }
        if conditions::get(new_obj, fail_condition.as_ref()).is_some() {
            // Short-circuit, there is failure now, can't be a recovery.
            return false;
        }
    }
    failures_before > 0
}
