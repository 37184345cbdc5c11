// crates/gateway-workspace-core/src/lib.rs
// ============================================================================
// Module: Gateway Workspace Core Library
// Description: Public API surface for the gateway workspace core.
// Purpose: Expose entity types, store interfaces, and cascade/scope engines.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Gateway workspace core keeps policies, pipelines, and mappings
//! referentially consistent. Renames propagate new identifiers into every
//! referencing record, deletes either refuse or detach dependents, and the
//! scope aggregator derives the `scope -> routes` index used by
//! authorization layers. Storage is reached only through the
//! [`EntityStore`] interface, so backends stay interchangeable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::WorkspaceAuditEvent;
pub use audit::WorkspaceAuditSink;
pub use audit::WorkspaceFileAuditSink;
pub use audit::WorkspaceNoopAuditSink;
pub use audit::WorkspaceStderrAuditSink;
pub use interfaces::EntityStore;
pub use interfaces::StoreError;
pub use interfaces::WorkspaceStores;
pub use runtime::CascadeEngine;
pub use runtime::CascadeFailure;
pub use runtime::CascadeReport;
pub use runtime::ConflictReason;
pub use runtime::DEFAULT_MAX_PARALLELISM;
pub use runtime::DanglingReference;
pub use runtime::FanOut;
pub use runtime::GatewayWorkspace;
pub use runtime::ImportSummary;
pub use runtime::InMemoryEntityStore;
pub use runtime::MAX_PARALLELISM_LIMIT;
pub use runtime::PipelineReferences;
pub use runtime::PolicyReferences;
pub use runtime::ReconcileReport;
pub use runtime::References;
pub use runtime::RenameOutcome;
pub use runtime::WorkspaceError;
pub use runtime::WorkspaceOptions;
pub use runtime::build_scopes;
pub use runtime::compute_auth_scopes;
