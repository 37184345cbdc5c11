// crates/gateway-workspace-store-sqlite/tests/sqlite_entity_store.rs
// ============================================================================
// Module: SQLite Entity Store Tests
// Description: Validate SQLite EntityStore behavior.
// Purpose: Ensure durable persistence, ordering, and integrity checks.
// Dependencies: gateway-workspace-store-sqlite, gateway-workspace-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed entity store, including tampered
//! rows and full workspace cascades running over a file database.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gateway_workspace_core::ConflictReason;
use gateway_workspace_core::EntityStore;
use gateway_workspace_core::GatewayWorkspace;
use gateway_workspace_core::HttpVerb;
use gateway_workspace_core::Mapping;
use gateway_workspace_core::Pipeline;
use gateway_workspace_core::PipelineId;
use gateway_workspace_core::Policy;
use gateway_workspace_core::PolicyConfigDocument;
use gateway_workspace_core::PolicyId;
use gateway_workspace_core::Route;
use gateway_workspace_core::StoreError;
use gateway_workspace_core::WorkspaceError;
use gateway_workspace_store_sqlite::MAX_ENTITY_BYTES;
use gateway_workspace_store_sqlite::SqliteEntityStore;
use gateway_workspace_store_sqlite::SqliteStoreConfig;
use gateway_workspace_store_sqlite::SqliteStoreError;
use gateway_workspace_store_sqlite::SqliteStoreMode;
use gateway_workspace_store_sqlite::SqliteSyncMode;
use gateway_workspace_store_sqlite::SqliteWorkspaceDatabase;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config_for(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn database_for(path: &Path) -> SqliteWorkspaceDatabase {
    SqliteWorkspaceDatabase::open(&config_for(path)).expect("store init")
}

fn policy_store(path: &Path) -> SqliteEntityStore<Policy> {
    database_for(path).store::<Policy>()
}

fn document() -> PolicyConfigDocument {
    PolicyConfigDocument {
        policies: vec![
            Policy::auth("auth-catalog", ["catalog", "shopping"]),
            Policy::new("rate-limiter-per-minute", "rateLimiting").with_setting("limit", 60),
            Policy::new("proxy-to-catalog", "reverseProxy")
                .with_setting("targetUrl", "http://catalog.internal"),
        ],
        pipelines: vec![
            Pipeline::new("default-pipeline").with_policies([
                "auth-catalog",
                "rate-limiter-per-minute",
                "proxy-to-catalog",
            ]),
            Pipeline::new("other-pipeline").with_policies(["rate-limiter-per-minute"]),
        ],
        mappings: vec![
            Mapping::new(
                "catalog",
                HttpVerb::Get,
                "/api/catalog",
                Some(PipelineId::new("default-pipeline")),
            ),
            Mapping::new(
                "invoice",
                HttpVerb::All,
                "/api/invoices",
                Some(PipelineId::new("default-pipeline")),
            ),
            Mapping::new(
                "order",
                HttpVerb::All,
                "/api/orders",
                Some(PipelineId::new("other-pipeline")),
            ),
        ],
    }
}

fn seeded_workspace(path: &Path) -> GatewayWorkspace {
    let workspace = GatewayWorkspace::new(database_for(path).workspace_stores());
    workspace.import_document(document()).expect("seed fixture");
    workspace
}

fn names<E: gateway_workspace_core::Entity>(records: &[E]) -> Vec<String> {
    records.iter().map(|record| record.name().to_string()).collect()
}

// ============================================================================
// SECTION: Store Tests
// ============================================================================

#[test]
fn sqlite_store_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    let created = store.create(Policy::auth("auth-catalog", ["catalog"])).unwrap();
    assert_eq!(created.id, PolicyId::new("auth-catalog"));
    let loaded = store.find_by_name("auth-catalog").unwrap();
    assert_eq!(loaded, Some(created.clone()));
    let by_id = store.find_by_id(&PolicyId::new("auth-catalog")).unwrap();
    assert_eq!(by_id, Some(created));
    assert!(store.find_by_name("missing").unwrap().is_none());
}

#[test]
fn sqlite_store_lists_in_creation_order() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    for name in ["zeta", "alpha", "mid"] {
        store.create(Policy::new(name, "rateLimiting")).unwrap();
    }
    assert_eq!(names(&store.list().unwrap()), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn sqlite_store_rename_keeps_position() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    for name in ["first", "second", "third"] {
        store.create(Policy::new(name, "rateLimiting")).unwrap();
    }
    let mut renamed = store.find_by_name("second").unwrap().unwrap();
    renamed.name = "renamed".to_string();
    let updated = store.update(&PolicyId::new("second"), renamed).unwrap();
    assert_eq!(updated.id, PolicyId::new("renamed"));
    assert_eq!(names(&store.list().unwrap()), vec!["first", "renamed", "third"]);
    assert!(store.find_by_id(&PolicyId::new("second")).unwrap().is_none());
}

#[test]
fn sqlite_store_rejects_duplicate_names() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    store.create(Policy::new("first", "rateLimiting")).unwrap();
    store.create(Policy::new("second", "rateLimiting")).unwrap();
    let duplicate = store.create(Policy::new("first", "cors"));
    assert!(matches!(duplicate, Err(StoreError::Duplicate(_))));

    let mut clash = store.find_by_name("second").unwrap().unwrap();
    clash.name = "first".to_string();
    let result = store.update(&PolicyId::new("second"), clash);
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

#[test]
fn sqlite_store_reports_missing_records() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    let update = store.update(&PolicyId::new("ghost"), Policy::new("ghost", "cors"));
    assert!(matches!(update, Err(StoreError::Missing(_))));
    let destroy = store.destroy(&PolicyId::new("ghost"));
    assert!(matches!(destroy, Err(StoreError::Missing(_))));
}

#[test]
fn sqlite_store_destroy_removes_record() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    store.create(Policy::new("first", "rateLimiting")).unwrap();
    store.destroy(&PolicyId::new("first")).unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn sqlite_store_keeps_kinds_apart() {
    let temp = TempDir::new().unwrap();
    let database = database_for(&temp.path().join("workspace.sqlite"));
    database.store::<Policy>().create(Policy::new("shared", "cors")).unwrap();
    database.store::<Pipeline>().create(Pipeline::new("shared")).unwrap();
    assert_eq!(database.store::<Policy>().list().unwrap().len(), 1);
    assert_eq!(database.store::<Pipeline>().list().unwrap().len(), 1);
    assert!(database.store::<Mapping>().list().unwrap().is_empty());
}

#[test]
fn sqlite_store_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    {
        let store = policy_store(&path);
        store.create(Policy::auth("auth-catalog", ["catalog"])).unwrap();
    }
    let store = policy_store(&path);
    let loaded = store.find_by_name("auth-catalog").unwrap().unwrap();
    assert_eq!(loaded.auth_scopes(), ["catalog".to_string()]);
}

#[test]
fn sqlite_store_detects_corrupt_hash() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    let store = policy_store(&path);
    store.create(Policy::new("first", "rateLimiting")).unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute(
                "UPDATE entities SET entity_hash = 'bad' WHERE entity_id = ?1",
                rusqlite::params!["first"],
            )
            .unwrap();
    }
    let result = store.find_by_name("first");
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn sqlite_store_rejects_id_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    let store = policy_store(&path);
    store.create(Policy::new("first", "rateLimiting")).unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute(
                "UPDATE entities SET entity_id = 'other' WHERE entity_id = ?1",
                rusqlite::params!["first"],
            )
            .unwrap();
    }
    let result = store.list();
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_unknown_hash_algorithm() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    let store = policy_store(&path);
    store.create(Policy::new("first", "rateLimiting")).unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute("UPDATE entities SET hash_algorithm = 'md5'", rusqlite::params![])
            .unwrap();
    }
    assert!(matches!(store.list(), Err(StoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_oversized_payload() {
    let temp = TempDir::new().unwrap();
    let store = policy_store(&temp.path().join("workspace.sqlite"));
    let policy =
        Policy::new("huge", "requestTransformer").with_setting("body", "x".repeat(MAX_ENTITY_BYTES));
    let result = store.create(policy);
    assert!(matches!(result, Err(StoreError::Invalid(_))));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn sqlite_store_rejects_version_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    let _database = database_for(&path);

    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", rusqlite::params![]).unwrap();

    let result = SqliteWorkspaceDatabase::open(&config_for(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteWorkspaceDatabase::open(&config_for(temp.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_overlong_path_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300));
    let result = SqliteWorkspaceDatabase::open(&config_for(&path));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("workspace.sqlite");
    let database = database_for(&path);
    database.check_integrity().unwrap();
    assert!(path.exists());
}

// ============================================================================
// SECTION: Workspace Tests
// ============================================================================

#[test]
fn workspace_rename_cascades_over_sqlite() {
    let temp = TempDir::new().unwrap();
    let workspace = seeded_workspace(&temp.path().join("workspace.sqlite"));

    workspace.rename_policy("rate-limiter-per-minute", "rate-limiter-per-second").unwrap();

    let pipelines = workspace.stores().pipelines().list().unwrap();
    for pipeline in &pipelines {
        assert!(pipeline.contains_policy(&PolicyId::new("rate-limiter-per-second")));
        assert!(!pipeline.contains_policy(&PolicyId::new("rate-limiter-per-minute")));
    }
    let default = workspace.stores().pipelines().find_by_name("default-pipeline").unwrap().unwrap();
    assert_eq!(
        default.policy_ids,
        vec![
            PolicyId::new("auth-catalog"),
            PolicyId::new("rate-limiter-per-second"),
            PolicyId::new("proxy-to-catalog"),
        ]
    );
    let policies = workspace.stores().policies().list().unwrap();
    assert_eq!(
        names(&policies),
        vec!["auth-catalog", "rate-limiter-per-second", "proxy-to-catalog"]
    );
}

#[test]
fn workspace_pipeline_rename_rebinds_mappings_over_sqlite() {
    let temp = TempDir::new().unwrap();
    let workspace = seeded_workspace(&temp.path().join("workspace.sqlite"));

    workspace.rename_pipeline("default-pipeline", "catalog-pipeline").unwrap();

    let mappings = workspace.stores().mappings().list().unwrap();
    let bound: Vec<Option<PipelineId>> =
        mappings.iter().map(|mapping| mapping.pipeline_id.clone()).collect();
    assert_eq!(
        bound,
        vec![
            Some(PipelineId::new("catalog-pipeline")),
            Some(PipelineId::new("catalog-pipeline")),
            Some(PipelineId::new("other-pipeline")),
        ]
    );
}

#[test]
fn workspace_delete_guards_and_forces_over_sqlite() {
    let temp = TempDir::new().unwrap();
    let workspace = seeded_workspace(&temp.path().join("workspace.sqlite"));

    let err = workspace.delete_pipeline_by_name("default-pipeline", false).unwrap_err();
    let WorkspaceError::Conflict {
        reason,
        ..
    } = err.clone()
    else {
        panic!("expected conflict, got {err:?}");
    };
    assert_eq!(
        reason,
        ConflictReason::InUse {
            references: vec!["catalog".to_string(), "invoice".to_string()],
        }
    );

    assert!(workspace.delete_pipeline_by_name("default-pipeline", true).unwrap());
    let detached = workspace.stores().mappings().find_by_name("catalog").unwrap().unwrap();
    assert_eq!(detached.pipeline_id, None);
    assert!(workspace.find_dangling_references().unwrap().is_empty());
}

#[test]
fn workspace_scopes_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("workspace.sqlite");
    {
        let workspace = seeded_workspace(&path);
        workspace.rename_policy("auth-catalog", "auth-store").unwrap();
    }
    let workspace = GatewayWorkspace::new(database_for(&path).workspace_stores());
    let scopes = workspace.get_auth_scopes().unwrap();
    let expected = vec![
        Route::new(HttpVerb::Get, "/api/catalog"),
        Route::new(HttpVerb::All, "/api/invoices"),
    ];
    assert_eq!(scopes.len(), 2);
    assert_eq!(scopes.routes("catalog"), Some(expected.as_slice()));
    assert_eq!(scopes.routes("shopping"), Some(expected.as_slice()));
}
