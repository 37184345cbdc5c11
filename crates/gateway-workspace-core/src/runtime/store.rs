// crates/gateway-workspace-core/src/runtime/store.rs
// ============================================================================
// Module: Gateway Workspace In-Memory Store
// Description: Simple in-memory entity store for tests and embedded use.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`EntityStore`]. Records
//! live in a vector guarded by a mutex, so creation order is the iteration
//! order and updates happen in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::model::Entity;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;
use crate::interfaces::EntityStore;
use crate::interfaces::StoreError;
use crate::interfaces::WorkspaceStores;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory entity store.
#[derive(Debug, Clone)]
pub struct InMemoryEntityStore<E: Entity> {
    /// Records in creation order, protected by a mutex.
    records: Arc<Mutex<Vec<E>>>,
}

impl<E: Entity> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryEntityStore<E> {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Locks the record vector.
    fn lock(&self) -> Result<MutexGuard<'_, Vec<E>>, StoreError> {
        self.records.lock().map_err(|_| {
            StoreError::Store(format!("{} store mutex poisoned", E::KIND.as_str()))
        })
    }
}

impl<E: Entity> EntityStore<E> for InMemoryEntityStore<E> {
    fn find_by_name(&self, name: &str) -> Result<Option<E>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.iter().find(|record| record.name() == name).cloned())
    }

    fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.iter().find(|record| record.id() == id).cloned())
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn create(&self, mut entity: E) -> Result<E, StoreError> {
        entity.assign_identity();
        if entity.id().as_ref().is_empty() {
            return Err(StoreError::Invalid(format!(
                "{} requires a name or id",
                E::KIND.as_str()
            )));
        }
        let mut guard = self.lock()?;
        if let Some(existing) = guard.iter().find(|record| collides(*record, &entity)) {
            return Err(StoreError::Duplicate(format!(
                "{} {} already exists",
                E::KIND.as_str(),
                existing.id()
            )));
        }
        guard.push(entity.clone());
        drop(guard);
        Ok(entity)
    }

    fn update(&self, current_id: &E::Id, mut entity: E) -> Result<E, StoreError> {
        entity.assign_identity();
        let mut guard = self.lock()?;
        let Some(index) = guard.iter().position(|record| record.id() == current_id) else {
            return Err(StoreError::Missing(format!("{} {current_id}", E::KIND.as_str())));
        };
        let clash = guard
            .iter()
            .enumerate()
            .any(|(other, record)| other != index && collides(record, &entity));
        if clash {
            return Err(StoreError::Duplicate(format!(
                "{} {} already exists",
                E::KIND.as_str(),
                entity.id()
            )));
        }
        guard[index] = entity.clone();
        drop(guard);
        Ok(entity)
    }

    fn destroy(&self, id: &E::Id) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let Some(index) = guard.iter().position(|record| record.id() == id) else {
            return Err(StoreError::Missing(format!("{} {id}", E::KIND.as_str())));
        };
        guard.remove(index);
        drop(guard);
        Ok(())
    }
}

/// Returns true when two records share an id or a non-empty name.
fn collides<E: Entity>(existing: &E, candidate: &E) -> bool {
    existing.id() == candidate.id()
        || (!candidate.name().is_empty() && existing.name() == candidate.name())
}

// ============================================================================
// SECTION: Context Constructor
// ============================================================================

impl WorkspaceStores {
    /// Creates a context backed by three fresh in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryEntityStore::<Policy>::new()),
            Arc::new(InMemoryEntityStore::<Pipeline>::new()),
            Arc::new(InMemoryEntityStore::<Mapping>::new()),
        )
    }
}
