// crates/gateway-workspace-core/src/core/document.rs
// ============================================================================
// Module: Policy Config Document
// Description: Plain-data projection of a workspace (policy-config.json shape).
// Purpose: Carry policies, pipelines, and mappings between stores and files.
// Dependencies: serde, crate::core::{hashing, model}, crate::runtime::scopes
// ============================================================================

//! ## Overview
//! A [`PolicyConfigDocument`] is the `{ policies, pipelines, mappings }`
//! artifact a workspace is exported to and imported from. Older artifacts
//! named the mapping array `maps`; that key is still accepted on read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::model::Entity;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;
use crate::core::scopes::AuthScopes;
use crate::runtime::scopes::build_scopes;

// ============================================================================
// SECTION: Document
// ============================================================================

/// Serializable workspace snapshot in `policy-config.json` form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfigDocument {
    /// Policy records.
    #[serde(default)]
    pub policies: Vec<Policy>,
    /// Pipeline records.
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
    /// Mapping records.
    #[serde(default, alias = "maps")]
    pub mappings: Vec<Mapping>,
}

impl PolicyConfigDocument {
    /// Returns true when the document holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.pipelines.is_empty() && self.mappings.is_empty()
    }

    /// Applies the `name || id` identity rule to every record.
    pub fn normalize_identity(&mut self) {
        self.policies.iter_mut().for_each(Entity::assign_identity);
        self.pipelines.iter_mut().for_each(Entity::assign_identity);
        self.mappings.iter_mut().for_each(Entity::assign_identity);
    }

    /// Computes the scope index directly from the document.
    #[must_use]
    pub fn auth_scopes(&self) -> AuthScopes {
        build_scopes(&self.mappings, &self.pipelines, &self.policies)
    }

    /// Returns the canonical content digest of the document.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn canonical_hash(&self) -> Result<HashDigest, HashError> {
        hash_canonical_json(DEFAULT_HASH_ALGORITHM, self)
    }
}
