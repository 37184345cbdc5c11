// crates/gateway-workspace-core/src/runtime/cascade.rs
// ============================================================================
// Module: Gateway Workspace Cascade Engine
// Description: Reference resolution plus cascading rename and delete.
// Purpose: Keep holders consistent when a referenced entity changes identity.
// Dependencies: crate::{core, interfaces, runtime::{error, fanout}}
// ============================================================================

//! ## Overview
//! [`CascadeEngine`] is written once over a target entity type and a holder
//! entity type that references it through a [`ReferenceHolder`] slot. The
//! workspace instantiates it twice:
//! - policy targets held by pipelines (`policyIds` list entries);
//! - pipeline targets held by mappings (`pipelineId` scalar keys).
//!
//! Rename writes the target first and then rewrites every holder; delete
//! refuses while holders exist unless forced, in which case holders are
//! detached before the target is destroyed. Holder updates fan out through
//! [`FanOut`] and are not rolled back on failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::model::Entity;
use crate::core::model::EntityKind;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;
use crate::core::references::ReferenceHolder;
use crate::interfaces::EntityStore;
use crate::runtime::error::ConflictReason;
use crate::runtime::error::WorkspaceError;
use crate::runtime::fanout::CascadeFailure;
use crate::runtime::fanout::FanOut;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Target entity together with every holder referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct References<T, H> {
    /// Resolved target.
    pub target: T,
    /// Holders referencing the target, in store order.
    pub holders: Vec<H>,
}

impl<T, H> References<T, H> {
    /// Returns true when nothing references the target.
    #[must_use]
    pub fn is_unreferenced(&self) -> bool {
        self.holders.is_empty()
    }
}

impl<T, H: Entity> References<T, H> {
    /// Returns the holder names in store order.
    #[must_use]
    pub fn holder_names(&self) -> Vec<String> {
        self.holders.iter().map(|holder| holder.name().to_string()).collect()
    }
}

/// A policy and the pipelines listing it.
pub type PolicyReferences = References<Policy, Pipeline>;

/// A pipeline and the mappings bound to it.
pub type PipelineReferences = References<Pipeline, Mapping>;

/// Rename result distinguishing a no-op from a real change.
#[derive(Debug, Clone, PartialEq)]
pub enum RenameOutcome<E> {
    /// Old and new names were equal; nothing was read or written.
    Unchanged,
    /// The entity was renamed; carries the updated record.
    Renamed(E),
}

impl<E> RenameOutcome<E> {
    /// Returns true when the store changed.
    #[must_use]
    pub const fn is_renamed(&self) -> bool {
        matches!(self, Self::Renamed(_))
    }

    /// Returns the renamed record, if any.
    #[must_use]
    pub fn renamed(self) -> Option<E> {
        match self {
            Self::Unchanged => None,
            Self::Renamed(entity) => Some(entity),
        }
    }
}

/// Operation value plus the number of holder records it rewrote.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeReport<V> {
    /// Operation result.
    pub value: V,
    /// Holder records rewritten or detached.
    pub references_updated: usize,
}

impl<V> CascadeReport<V> {
    /// Report for an operation that touched no holders.
    pub(crate) const fn untouched(value: V) -> Self {
        Self {
            value,
            references_updated: 0,
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Rename/delete cascade over one target/holder relationship.
pub struct CascadeEngine<'a, T: Entity, H: ReferenceHolder<T>> {
    /// Store holding the targets.
    targets: &'a dyn EntityStore<T>,
    /// Store holding the referencing records.
    holders: &'a dyn EntityStore<H>,
    /// Fan-out used for holder updates.
    fan_out: FanOut,
}

impl<'a, T, H> CascadeEngine<'a, T, H>
where
    T: Entity,
    H: ReferenceHolder<T>,
{
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        targets: &'a dyn EntityStore<T>,
        holders: &'a dyn EntityStore<H>,
        fan_out: FanOut,
    ) -> Self {
        Self {
            targets,
            holders,
            fan_out,
        }
    }

    /// Resolves the named target and every holder referencing it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when the target does not exist,
    /// or [`WorkspaceError::Store`] when a read fails.
    pub fn find_references(&self, name: &str) -> Result<References<T, H>, WorkspaceError> {
        let target = self
            .targets
            .find_by_name(name)?
            .ok_or_else(|| WorkspaceError::not_found(T::KIND, name))?;
        let target_id = target.id().clone();
        let holders = self.holders.find_where(&|holder: &H| holder.references(&target_id))?;
        Ok(References {
            target,
            holders,
        })
    }

    /// Renames the target and propagates its new id into every holder.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] for a missing target,
    /// [`WorkspaceError::Conflict`] when another record owns `new_name`,
    /// [`WorkspaceError::Invalid`] for an empty name, and
    /// [`WorkspaceError::PartialCascade`] when some holder updates failed.
    pub fn rename(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> Result<CascadeReport<RenameOutcome<T>>, WorkspaceError> {
        if current_name == new_name {
            return Ok(CascadeReport::untouched(RenameOutcome::Unchanged));
        }
        let references = self.find_references(current_name)?;
        let renamed = rename_record(self.targets, &references.target, new_name)?;
        let old_id = references.target.id().clone();
        let new_id = renamed.id().clone();
        if old_id == new_id {
            return Ok(CascadeReport::untouched(RenameOutcome::Renamed(renamed)));
        }
        let references_updated = self
            .fan_out
            .apply_all(references.holders, |mut holder: H| {
                let holder_id = holder.id().clone();
                if holder.retarget(&old_id, &new_id) {
                    self.holders.update(&holder_id, holder)?;
                }
                Ok(())
            })
            .map_err(|failure| partial(T::KIND, current_name, failure))?;
        Ok(CascadeReport {
            value: RenameOutcome::Renamed(renamed),
            references_updated,
        })
    }

    /// Deletes the named target.
    ///
    /// Without `force`, any holder reference refuses the delete. With
    /// `force`, holders are detached first; the target is destroyed only when
    /// every detach succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] for a missing target,
    /// [`WorkspaceError::Conflict`] when in use without `force`, and
    /// [`WorkspaceError::PartialCascade`] when some detaches failed.
    pub fn delete(&self, name: &str, force: bool) -> Result<CascadeReport<bool>, WorkspaceError> {
        let references = self.find_references(name)?;
        if !force && !references.is_unreferenced() {
            return Err(WorkspaceError::conflict(T::KIND, name, ConflictReason::InUse {
                references: references.holder_names(),
            }));
        }
        let target_id = references.target.id().clone();
        let references_updated = self
            .fan_out
            .apply_all(references.holders, |mut holder: H| {
                let holder_id = holder.id().clone();
                if holder.detach(&target_id) {
                    self.holders.update(&holder_id, holder)?;
                }
                Ok(())
            })
            .map_err(|failure| partial(T::KIND, name, failure))?;
        self.targets.destroy(&target_id)?;
        Ok(CascadeReport {
            value: true,
            references_updated,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renames one record in place after checking the new name is free.
///
/// # Errors
///
/// Returns [`WorkspaceError::Invalid`] for an empty name,
/// [`WorkspaceError::Conflict`] when another record owns the name or id, or
/// [`WorkspaceError::Store`] when the write fails.
pub(crate) fn rename_record<E: Entity>(
    store: &dyn EntityStore<E>,
    current: &E,
    new_name: &str,
) -> Result<E, WorkspaceError> {
    if new_name.is_empty() {
        return Err(WorkspaceError::Invalid(format!("{} name must not be empty", E::KIND)));
    }
    let mut renamed = current.clone();
    renamed.rename(new_name);
    let owner_by_name = store.find_by_name(new_name)?;
    let owner_by_id = store.find_by_id(renamed.id())?;
    let taken = owner_by_name
        .iter()
        .chain(owner_by_id.iter())
        .any(|owner| owner.id() != current.id());
    if taken {
        return Err(WorkspaceError::conflict(E::KIND, new_name, ConflictReason::NameTaken));
    }
    Ok(store.update(current.id(), renamed)?)
}

/// Converts a fan-out failure into a workspace error.
pub(crate) fn partial(kind: EntityKind, name: &str, failure: CascadeFailure) -> WorkspaceError {
    WorkspaceError::PartialCascade {
        kind,
        name: name.to_string(),
        applied: failure.applied,
        attempted: failure.attempted,
        source: failure.first_error,
    }
}
