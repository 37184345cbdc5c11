// crates/gateway-workspace-core/src/runtime/error.rs
// ============================================================================
// Module: Gateway Workspace Errors
// Description: Typed failures for workspace operations.
// Purpose: Give every failure a stable kind label and an HTTP-style status.
// Dependencies: thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`WorkspaceError`] is the single error type returned by the cascade engine
//! and the workspace facade. `NotFound` maps to status 404, consistency
//! refusals to 400, and store failures (including partially applied
//! cascades) to 500. Callers branch on [`WorkspaceError::error_kind`] rather
//! than on message text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::model::EntityKind;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Conflict Reasons
// ============================================================================

/// Why a request conflicts with current workspace state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The target is still referenced and `force` was not set.
    InUse {
        /// Names of the referencing records.
        references: Vec<String>,
    },
    /// Another record of the same kind already owns the name.
    NameTaken,
    /// The link being added already exists.
    AlreadyLinked {
        /// Name of the already-linked record.
        target: String,
    },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InUse {
                references,
            } => write!(f, "in use by {}", references.join(", ")),
            Self::NameTaken => f.write_str("name already taken"),
            Self::AlreadyLinked {
                target,
            } => write!(f, "already linked to {target}"),
        }
    }
}

// ============================================================================
// SECTION: Workspace Error
// ============================================================================

/// Workspace operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    /// The named entity does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// Requested name.
        name: String,
    },
    /// The request conflicts with current workspace state.
    #[error("{kind} {name} conflict: {reason}")]
    Conflict {
        /// Kind of the addressed entity.
        kind: EntityKind,
        /// Name of the addressed entity.
        name: String,
        /// Conflict detail.
        reason: ConflictReason,
    },
    /// A record points at an entity that does not exist.
    #[error("{kind} {name} references missing {target_kind} {target}")]
    DanglingReference {
        /// Kind of the referencing record.
        kind: EntityKind,
        /// Name of the referencing record.
        name: String,
        /// Kind of the missing target.
        target_kind: EntityKind,
        /// Missing target id.
        target: String,
    },
    /// Underlying store failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A cascade applied some reference updates and then failed.
    ///
    /// Applied updates are not rolled back; the store may hold a mix of old
    /// and new references until the operation is re-run or reconciled.
    #[error("{kind} {name} cascade applied {applied} of {attempted} updates: {source}")]
    PartialCascade {
        /// Kind of the cascade target.
        kind: EntityKind,
        /// Name of the cascade target.
        name: String,
        /// Reference updates that succeeded.
        applied: usize,
        /// Reference updates attempted.
        attempted: usize,
        /// First failure in item order.
        source: StoreError,
    },
    /// Input failed validation.
    #[error("invalid workspace input: {0}")]
    Invalid(String),
}

impl WorkspaceError {
    /// Returns the HTTP-style status code for the error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound {
                ..
            } => 404,
            Self::Conflict {
                ..
            }
            | Self::DanglingReference {
                ..
            }
            | Self::Invalid(_) => 400,
            Self::Store(_)
            | Self::PartialCascade {
                ..
            } => 500,
        }
    }

    /// Returns a stable, machine-readable error label.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound {
                ..
            } => "not_found",
            Self::Conflict {
                ..
            } => "conflict",
            Self::DanglingReference {
                ..
            } => "dangling_reference",
            Self::Store(_) => "store",
            Self::PartialCascade {
                ..
            } => "partial_cascade",
            Self::Invalid(_) => "invalid",
        }
    }

    /// Builds a [`WorkspaceError::NotFound`].
    pub(crate) fn not_found(kind: EntityKind, name: &str) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    /// Builds a [`WorkspaceError::Conflict`].
    pub(crate) fn conflict(kind: EntityKind, name: &str, reason: ConflictReason) -> Self {
        Self::Conflict {
            kind,
            name: name.to_string(),
            reason,
        }
    }
}
