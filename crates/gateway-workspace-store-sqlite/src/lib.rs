// crates/gateway-workspace-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Entity Store
// Description: Durable EntityStore backend using SQLite WAL.
// Purpose: Persist workspace policies, pipelines, and mappings.
// Dependencies: gateway-workspace-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`gateway_workspace_core::EntityStore`]
//! implementation. Every record is stored as canonical JSON next to its
//! SHA-256 digest; loads verify the digest and fail closed on corruption.
//! All three entity kinds share one database and one connection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_ENTITY_BYTES;
pub use store::SqliteEntityStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteWorkspaceDatabase;
