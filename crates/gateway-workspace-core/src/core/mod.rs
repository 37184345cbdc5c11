// crates/gateway-workspace-core/src/core/mod.rs
// ============================================================================
// Module: Gateway Workspace Core Types
// Description: Canonical entity model, references, and derived index types.
// Purpose: Provide stable, serializable types for workspace records.
// Dependencies: serde, serde_json, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Core types define policies, pipelines, and mappings, the reference shapes
//! linking them, the scope index derived from them, and the plain-data config
//! document. These types are the source of truth for every store backend and
//! for the `policy-config.json` artifact.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod document;
pub mod hashing;
pub mod identifiers;
pub mod model;
pub mod references;
pub mod scopes;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::PolicyConfigDocument;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::MappingId;
pub use identifiers::PipelineId;
pub use identifiers::PolicyId;
pub use model::Entity;
pub use model::EntityKind;
pub use model::HttpVerb;
pub use model::Mapping;
pub use model::Pipeline;
pub use model::Policy;
pub use model::PolicyType;
pub use model::UnknownHttpVerb;
pub use references::ReferenceHolder;
pub use references::ReferenceKind;
pub use references::ReferenceSlot;
pub use references::ReferenceView;
pub use scopes::AuthScopes;
pub use scopes::Route;
