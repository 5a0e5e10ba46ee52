// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Structured reconciliation error types.
//!
//! A reconciler signals a non-default outcome by returning one of the
//! variants of [`ReconcileError`]. The engine classifies the variant to
//! decide whether the error is swallowed (reported via conditions and
//! events only) or propagated to the runtime scheduler:
//!
//! - [`ReconcileError::Stalling`] - the current generation is fully
//!   processed but cannot progress until the spec changes. Swallowed;
//!   surfaces as `Stalled=True` plus a warning event.
//! - [`ReconcileError::Waiting`] - a transient condition requiring a
//!   deferred retry. Swallowed; the retry timing is carried in the variant.
//! - [`ReconcileError::Event`] - worth recording as an operator-visible
//!   event, but still propagated as an ordinary error.
//! - [`ReconcileError::Other`] - any unclassified error, propagated
//!   unchanged.
//! - [`ReconcileError::Aggregate`] - produced only by
//!   [`ReconcileError::aggregate`] when a status-patch failure must be
//!   combined with an earlier error; never returned by reconcilers.
//!
//! Each wrapping variant displays exactly as its wrapped cause, and exposes
//! the cause through `std::error::Error::source` for standard error-chain
//! inspection.

use std::time::Duration;
use thiserror::Error;

/// A structured error returned by a reconciler or by the engine itself.
///
/// The taxonomy is a closed sum type so that result computation and event
/// recording handle every kind exhaustively.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The current generation cannot make further progress without an
    /// external change. Terminal until the spec changes.
    #[error("{source}")]
    Stalling {
        /// Programmatic reason, used for the `Stalled` condition and event.
        reason: String,
        /// The underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// A transient condition requiring a deferred retry. Not a failure of
    /// the current generation.
    #[error("{source}")]
    Waiting {
        /// How long to wait before the retry.
        requeue_after: Duration,
        /// Programmatic reason, used for the recorded event.
        reason: String,
        /// The underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// An error worth recording as an operator-visible event, otherwise
    /// returned to the scheduler normally.
    #[error("{source}")]
    Event {
        /// Programmatic reason, used for the recorded event.
        reason: String,
        /// The underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// Any other error, passed through untouched.
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Two or more errors combined by [`ReconcileError::aggregate`].
    #[error("{}", join_messages(.0))]
    Aggregate(Vec<ReconcileError>),
}

impl ReconcileError {
    /// Construct a [`ReconcileError::Stalling`].
    pub fn stalling(reason: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Stalling {
            reason: reason.into(),
            source: source.into(),
        }
    }

    /// Construct a [`ReconcileError::Waiting`].
    pub fn waiting(
        requeue_after: Duration,
        reason: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Waiting {
            requeue_after,
            reason: reason.into(),
            source: source.into(),
        }
    }

    /// Construct a [`ReconcileError::Event`].
    pub fn event(reason: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Event {
            reason: reason.into(),
            source: source.into(),
        }
    }

    /// The structured reason, where the variant carries one.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Stalling { reason, .. }
            | Self::Waiting { reason, .. }
            | Self::Event { reason, .. } => Some(reason),
            Self::Other(_) | Self::Aggregate(_) => None,
        }
    }

    /// Combine two optional errors into at most one.
    ///
    /// Both absent yields `None`; exactly one present passes it through
    /// unchanged; both present yields an [`ReconcileError::Aggregate`] whose
    /// message preserves both (existing aggregates are flattened rather than
    /// nested). The engine uses this so that a status-patch failure never
    /// silently drops an earlier reconciliation error, and vice versa.
    #[must_use]
    pub fn aggregate(first: Option<Self>, second: Option<Self>) -> Option<Self> {
        match (first, second) {
            (None, None) => None,
            (Some(e), None) | (None, Some(e)) => Some(e),
            (Some(a), Some(b)) => {
                let mut members = Vec::new();
                for e in [a, b] {
                    match e {
                        Self::Aggregate(inner) => members.extend(inner),
                        other => members.push(other),
                    }
                }
                Some(Self::Aggregate(members))
            }
        }
    }
}

/// Join aggregate member messages for display.
fn join_messages(errors: &[ReconcileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
