// crates/gateway-workspace-core/src/runtime/mod.rs
// ============================================================================
// Module: Gateway Workspace Runtime
// Description: Cascade engine, fan-out combinator, scope aggregator, facade.
// Purpose: Execute workspace operations against the entity store interface.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement reference resolution, cascading rename/delete,
//! scope aggregation, and the [`GatewayWorkspace`] facade that ties them to an
//! explicit [`crate::interfaces::WorkspaceStores`] context. Every caller-facing
//! operation goes through the facade so audit events stay complete.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cascade;
pub mod error;
pub mod fanout;
pub mod scopes;
pub mod store;
pub mod workspace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cascade::CascadeEngine;
pub use cascade::CascadeReport;
pub use cascade::PipelineReferences;
pub use cascade::PolicyReferences;
pub use cascade::References;
pub use cascade::RenameOutcome;
pub use error::ConflictReason;
pub use error::WorkspaceError;
pub use fanout::CascadeFailure;
pub use fanout::DEFAULT_MAX_PARALLELISM;
pub use fanout::FanOut;
pub use fanout::MAX_PARALLELISM_LIMIT;
pub use scopes::build_scopes;
pub use scopes::compute_auth_scopes;
pub use store::InMemoryEntityStore;
pub use workspace::DanglingReference;
pub use workspace::GatewayWorkspace;
pub use workspace::ImportSummary;
pub use workspace::ReconcileReport;
pub use workspace::WorkspaceOptions;
