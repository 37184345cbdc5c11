// crates/gateway-workspace-core/src/interfaces/mod.rs
// ============================================================================
// Module: Gateway Workspace Interfaces
// Description: Backend-agnostic entity store contract and store context.
// Purpose: Define the storage surface used by the cascade and scope engines.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The workspace engines never touch a storage backend directly. They talk to
//! one [`EntityStore`] per entity type, bundled into an explicit
//! [`WorkspaceStores`] context that is passed into every operation.
//! Implementations must keep creation order stable across updates, because
//! scope aggregation output follows store iteration order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::model::Entity;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Entity store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("entity store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("entity store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("entity store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("entity store invalid data: {0}")]
    Invalid(String),
    /// A record with the same id or name already exists.
    #[error("entity store duplicate record: {0}")]
    Duplicate(String),
    /// The addressed record does not exist.
    #[error("entity store missing record: {0}")]
    Missing(String),
    /// Store reported an error.
    #[error("entity store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Entity Store
// ============================================================================

/// CRUD store for one entity type.
///
/// # Invariants
/// - [`EntityStore::list`] returns records in creation order, and
///   [`EntityStore::update`] keeps a record at its original position even when
///   its id changes.
/// - Ids and names are unique within one store.
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Finds a record by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn find_by_name(&self, name: &str) -> Result<Option<E>, StoreError>;

    /// Finds a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// Lists every record in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list(&self) -> Result<Vec<E>, StoreError>;

    /// Lists records matching `predicate`, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn find_where(&self, predicate: &dyn Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        Ok(self.list()?.into_iter().filter(|entity| predicate(entity)).collect())
    }

    /// Creates a record after applying the `name || id` identity rule.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the id or name is taken, or
    /// another [`StoreError`] when the write fails.
    fn create(&self, entity: E) -> Result<E, StoreError>;

    /// Replaces the record stored under `current_id`; the id may change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] when no record has `current_id`,
    /// [`StoreError::Duplicate`] when the new id or name belongs to another
    /// record, or another [`StoreError`] when the write fails.
    fn update(&self, current_id: &E::Id, entity: E) -> Result<E, StoreError>;

    /// Deletes the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] when no record has `id`, or another
    /// [`StoreError`] when the write fails.
    fn destroy(&self, id: &E::Id) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Store Context
// ============================================================================

/// Explicit context bundling the three entity stores of one workspace.
#[derive(Clone)]
pub struct WorkspaceStores {
    /// Policy store.
    policies: Arc<dyn EntityStore<Policy>>,
    /// Pipeline store.
    pipelines: Arc<dyn EntityStore<Pipeline>>,
    /// Mapping store.
    mappings: Arc<dyn EntityStore<Mapping>>,
}

impl WorkspaceStores {
    /// Bundles existing store handles.
    #[must_use]
    pub fn new(
        policies: Arc<dyn EntityStore<Policy>>,
        pipelines: Arc<dyn EntityStore<Pipeline>>,
        mappings: Arc<dyn EntityStore<Mapping>>,
    ) -> Self {
        Self {
            policies,
            pipelines,
            mappings,
        }
    }

    /// Returns the policy store.
    #[must_use]
    pub fn policies(&self) -> &dyn EntityStore<Policy> {
        self.policies.as_ref()
    }

    /// Returns the pipeline store.
    #[must_use]
    pub fn pipelines(&self) -> &dyn EntityStore<Pipeline> {
        self.pipelines.as_ref()
    }

    /// Returns the mapping store.
    #[must_use]
    pub fn mappings(&self) -> &dyn EntityStore<Mapping> {
        self.mappings.as_ref()
    }
}
