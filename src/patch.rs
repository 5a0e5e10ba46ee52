// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status patching with owned-condition scoping.
//!
//! The engine persists its status mutations through the [`Patcher`] trait.
//! A patch is scoped by [`PatchOpts::owned_conditions`]: only condition
//! types the reconciler has declared ownership of are written, so two
//! controllers reconciling the same object for different concerns never
//! clobber each other's conditions. This is a logical field-level locking
//! discipline, not a mutex.
//!
//! [`KubePatcher`] is the production implementation: a read-modify-write of
//! the status subresource via a merge patch, carrying the configured field
//! manager.

use crate::conditions::{Condition, Conditioned};
use crate::constants::OBSERVED_GENERATION_FIELD;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::fmt::Debug;
use thiserror::Error;
use tracing::debug;

/// Options accumulated by the engine for a single status patch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchOpts {
    /// Condition types this reconciler owns. Empty means unscoped: every
    /// condition on the local object is written as-is.
    pub owned_conditions: Vec<String>,

    /// Advance `status.observedGeneration` to `metadata.generation` as part
    /// of the patch.
    pub with_observed_generation: bool,

    /// Field manager identity for the patch operation.
    pub field_owner: Option<String>,
}

impl PatchOpts {
    /// Fold another set of options into this one.
    ///
    /// List fields append, flags or, and a later field owner wins.
    pub fn merge(&mut self, other: PatchOpts) {
        self.owned_conditions.extend(other.owned_conditions);
        self.with_observed_generation |= other.with_observed_generation;
        if other.field_owner.is_some() {
            self.field_owner = other.field_owner;
        }
    }
}

/// Errors from a status patch.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The Kubernetes API rejected the request.
    #[error(transparent)]
    Api(#[from] kube::Error),

    /// The object could not be converted to a patch body.
    #[error(transparent)]
    Conversion(#[from] serde_json::Error),

    /// The object is missing a metadata field required to address it.
    #[error("object has no metadata.{0}")]
    MissingMetadata(&'static str),
}

impl PatchError {
    /// Whether this error is a "not found" response from the API server.
    ///
    /// Used by the orchestrator to discard patch failures against objects
    /// that are concurrently being deleted.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(kube::Error::Api(response)) if response.code == 404)
    }
}

/// Trait for persisting an object's status.
#[async_trait]
pub trait Patcher<K>: Send + Sync {
    /// Persist the object's status according to `opts`.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] if the status could not be written.
    async fn patch(&self, obj: &K, opts: &PatchOpts) -> Result<(), PatchError>;
}

/// Merge a desired condition set into the current one, scoped to `owned`.
///
/// Non-owned conditions are carried over from `current` untouched. Owned
/// conditions are taken from `desired`; an owned type absent from `desired`
/// is thereby deleted.
#[must_use]
pub fn merge_owned_conditions(
    current: &[Condition],
    desired: &[Condition],
    owned: &[String],
) -> Vec<Condition> {
    if owned.is_empty() {
        return desired.to_vec();
    }

    let mut merged: Vec<Condition> = current
        .iter()
        .filter(|c| !owned.contains(&c.r#type))
        .cloned()
        .collect();
    merged.extend(
        desired
            .iter()
            .filter(|c| owned.contains(&c.r#type))
            .cloned(),
    );
    merged
}

/// Production [`Patcher`] backed by the Kubernetes API.
///
/// Fetches the live object, merges the owned conditions into its current
/// condition set, and merge-patches the status subresource in a single
/// atomic API call.
pub struct KubePatcher {
    client: Client,
}

impl KubePatcher {
    /// Create a patcher using the given client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<K> Patcher<K> for KubePatcher
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Conditioned
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug
        + Send
        + Sync,
{
    async fn patch(&self, obj: &K, opts: &PatchOpts) -> Result<(), PatchError> {
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or(PatchError::MissingMetadata("name"))?;
        let namespace = obj
            .meta()
            .namespace
            .clone()
            .ok_or(PatchError::MissingMetadata("namespace"))?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        let current = api.get_status(&name).await?;
        let conditions =
            merge_owned_conditions(current.conditions(), obj.conditions(), &opts.owned_conditions);

        let mut status = serde_json::to_value(obj)?
            .get("status")
            .cloned()
            .unwrap_or_else(|| json!({}));
        if !status.is_object() {
            status = json!({});
        }
        status["conditions"] = serde_json::to_value(conditions)?;
        if opts.with_observed_generation {
            if let Some(generation) = obj.meta().generation {
                status[OBSERVED_GENERATION_FIELD] = json!(generation);
            }
        }

        let params = PatchParams {
            field_manager: opts.field_owner.clone(),
            ..PatchParams::default()
        };
        api.patch_status(&name, &params, &Patch::Merge(&json!({ "status": status })))
            .await?;

        debug!(
            name = %name,
            namespace = %namespace,
            owned = opts.owned_conditions.len(),
            observed_generation = opts.with_observed_generation,
            "Patched object status"
        );

        Ok(())
    }
}
