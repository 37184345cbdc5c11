// crates/gateway-workspace-config/src/lib.rs
// ============================================================================
// Module: Gateway Workspace Config Library
// Description: Canonical config model, validation, and artifact I/O.
// Purpose: Single source of truth for gateway-workspace.toml semantics.
// Dependencies: gateway-workspace-core, gateway-workspace-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `gateway-workspace-config` defines the configuration model for a gateway
//! workspace. It provides strict, fail-closed validation, assembles a
//! [`gateway_workspace_core::GatewayWorkspace`] from a validated config, and
//! reads and writes the persisted policy-config artifact.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifact;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifact::ArtifactError;
pub use artifact::MAX_ARTIFACT_BYTES;
pub use artifact::read_policy_config;
pub use artifact::write_policy_config;
pub use config::*;
