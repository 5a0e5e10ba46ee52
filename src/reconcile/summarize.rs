// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Summarize-and-patch: the terminal step of a reconciliation.
//!
//! [`Helper::summarize_and_patch`] is what a controller calls at the end
//! (or middle) of reconciling one object. It runs the configured
//! [`ResultProcessor`] chain, computes the runtime result and final error,
//! recomputes each declared summary condition from its members, and
//! persists the object's status through the [`Patcher`], returning the
//! `(RuntimeResult, Option<ReconcileError>)` pair the controller hands back
//! to its runtime.
//!
//! When used at the very end of a reconciliation, set a result builder with
//! [`SummarizeOpts::with_result_builder`]. When used mid-reconciliation as
//! a checkpoint, set none: only condition summarization and patching
//! happen, the returned result is the zero value, and the returned error is
//! `None`.

use crate::conditions::{self, Conditioned};
use crate::constants::READY_CONDITION;
use crate::events::EventRecorder;
use crate::patch::{PatchOpts, Patcher};
use crate::reconcile::processors::ResultProcessor;
use crate::reconcile::{compute_reconcile_result, ReconcileResult, ResultBuilder, RuntimeResult};
use crate::reconcile_errors::ReconcileError;
use anyhow::anyhow;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};

/// Declares how one summary condition is computed and owned.
#[derive(Clone, Debug, Default)]
pub struct Conditions {
    /// The target condition, e.g. `Ready`.
    pub target: String,
    /// All condition types the reconciler owns for this target, used to
    /// scope the status patch.
    pub owned: Vec<String>,
    /// The condition types the target is aggregated from, in priority
    /// order.
    pub summarize: Vec<String>,
    /// The subset of `summarize` with negative polarity (`True` is bad).
    pub negative_polarity: Vec<String>,
}

/// Per-call configuration for [`Helper::summarize_and_patch`].
///
/// Built with chained `with_*` methods; the conditions and processors
/// lists accumulate across repeated calls.
pub struct SummarizeOpts<K, R> {
    conditions: Vec<Conditions>,
    processors: Vec<Box<dyn ResultProcessor<K, R>>>,
    ignore_not_found: bool,
    reconcile_result: ReconcileResult,
    reconcile_error: Option<ReconcileError>,
    result_builder: Option<Box<dyn ResultBuilder>>,
    patch_field_owner: Option<String>,
}

impl<K, R> Default for SummarizeOpts<K, R> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            processors: Vec::new(),
            ignore_not_found: false,
            reconcile_result: ReconcileResult::default(),
            reconcile_error: None,
            result_builder: None,
            patch_field_owner: None,
        }
    }
}

impl<K, R> SummarizeOpts<K, R> {
    /// Empty options: no conditions, no processors, checkpoint mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append condition groups to summarize and persist.
    #[must_use]
    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Conditions>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Append result processors, executed in order before the result
    /// calculation and patching.
    #[must_use]
    pub fn with_processors(
        mut self,
        processors: impl IntoIterator<Item = Box<dyn ResultProcessor<K, R>>>,
    ) -> Self {
        self.processors.extend(processors);
        self
    }

    /// Ignore a "not found" error while patching an object that is being
    /// deleted.
    #[must_use]
    pub fn with_ignore_not_found(mut self) -> Self {
        self.ignore_not_found = true;
        self
    }

    /// Set the abstract result of the reconciliation.
    #[must_use]
    pub fn with_reconcile_result(mut self, result: ReconcileResult) -> Self {
        self.reconcile_result = result;
        self
    }

    /// Set the reconciliation error, if any.
    #[must_use]
    pub fn with_reconcile_error(mut self, error: ReconcileError) -> Self {
        self.reconcile_error = Some(error);
        self
    }

    /// Set the strategy for runtime result computation. Providing a builder
    /// makes this a terminal call rather than a checkpoint.
    #[must_use]
    pub fn with_result_builder(mut self, builder: impl ResultBuilder + 'static) -> Self {
        self.result_builder = Some(Box::new(builder));
        self
    }

    /// Set the field owner for the patch operation.
    #[must_use]
    pub fn with_patch_field_owner(mut self, owner: impl Into<String>) -> Self {
        self.patch_field_owner = Some(owner.into());
        self
    }
}

/// Orchestrates result processing, condition summarization, and status
/// patching for one object.
pub struct Helper<R, P> {
    recorder: R,
    patcher: P,
}

impl<R, P> Helper<R, P> {
    /// Create a helper from the event recorder and patcher collaborators.
    pub fn new(recorder: R, patcher: P) -> Self {
        Self { recorder, patcher }
    }

    /// Summarize the declared conditions and patch the object's status.
    ///
    /// Returns the runtime scheduling result and the final error; with a
    /// result builder configured these are exactly the values the
    /// controller should return to its runtime.
    ///
    /// A patch failure never displaces an earlier error: both are combined
    /// with [`ReconcileError::aggregate`] so the caller sees the worse of
    /// the two outcomes.
    pub async fn summarize_and_patch<K>(
        &self,
        obj: &mut K,
        opts: SummarizeOpts<K, R>,
    ) -> (RuntimeResult, Option<ReconcileError>)
    where
        K: Conditioned + Resource + Serialize + DeserializeOwned + Send + Sync,
        R: EventRecorder<K>,
        P: Patcher<K>,
    {
        let SummarizeOpts {
            conditions: condition_groups,
            processors,
            ignore_not_found,
            reconcile_result,
            reconcile_error,
            result_builder,
            patch_field_owner,
        } = opts;

        // Combine the owned conditions of all the groups for the patcher,
        // so the patch only claims conditions this reconciler declares.
        let mut patch_opts = PatchOpts {
            owned_conditions: condition_groups
                .iter()
                .flat_map(|c| c.owned.iter().cloned())
                .collect(),
            field_owner: patch_field_owner,
            ..PatchOpts::default()
        };

        // Process the results of reconciliation.
        for processor in &processors {
            processor
                .process(&self.recorder, obj, reconcile_result, reconcile_error.as_ref())
                .await;
        }

        let mut result = RuntimeResult::default();
        let mut rec_err = None;
        if let Some(builder) = result_builder.as_deref() {
            // Compute the reconcile result, obtaining extra patch options
            // and the final reconcile error.
            let (extra, computed_result, computed_err) =
                compute_reconcile_result(obj, reconcile_result, reconcile_error, Some(builder));
            patch_opts.merge(extra);
            result = computed_result;
            rec_err = computed_err;
        }

        // Summarize conditions only after computing the reconcile result,
        // since the object status is adjusted based on the result and error.
        for group in &condition_groups {
            conditions::set_summary(obj, &group.target, &group.summarize, &group.negative_polarity);
        }

        // If the object is not stalled, the result is success and the final
        // error is nil, the Ready condition is expected to be True. If it is
        // not, use its failure message as the final error so that the
        // reconciliation is retried; the object isn't ready. This applies to
        // the Ready condition only, as the overall state of the object.
        if is_non_stalled_success(obj, result_builder.as_deref(), result, rec_err.as_ref())
            && !conditions::is_ready(obj)
        {
            rec_err = Some(ReconcileError::Other(anyhow!(
                "{}",
                conditions::get_message(obj, READY_CONDITION)
            )));
        }

        // Finally, patch the resource.
        if let Err(patch_err) = self.patcher.patch(obj, &patch_opts).await {
            // Ignore the patch error "not found" when the object is being
            // deleted.
            let patch_err = if ignore_not_found
                && obj.meta().deletion_timestamp.is_some()
                && patch_err.is_not_found()
            {
                None
            } else {
                Some(ReconcileError::Other(anyhow::Error::new(patch_err)))
            };
            rec_err = ReconcileError::aggregate(rec_err, patch_err);
        }

        (result, rec_err)
    }
}

/// Whether the reconciliation was successful and has not stalled.
fn is_non_stalled_success<K: Conditioned>(
    obj: &K,
    builder: Option<&dyn ResultBuilder>,
    result: RuntimeResult,
    rec_err: Option<&ReconcileError>,
) -> bool {
    if !conditions::is_stalled(obj) && rec_err.is_none() {
        // Without a result builder, it can't be determined whether the
        // result is success.
        if let Some(builder) = builder {
            return builder.is_success(result);
        }
    }
    false
}

#[cfg(test)]
#[path = "summarize_tests.rs"]
mod summarize_tests;
