// crates/gateway-workspace-core/tests/common/mod.rs
// ============================================================================
// Module: Workspace Test Helpers
// Description: Shared fixtures for gateway workspace integration tests.
// Purpose: Build the catalog/invoice/order workspace and instrumented stores.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;

use gateway_workspace_core::Entity;
use gateway_workspace_core::EntityStore;
use gateway_workspace_core::GatewayWorkspace;
use gateway_workspace_core::HttpVerb;
use gateway_workspace_core::InMemoryEntityStore;
use gateway_workspace_core::Mapping;
use gateway_workspace_core::Pipeline;
use gateway_workspace_core::PipelineId;
use gateway_workspace_core::Policy;
use gateway_workspace_core::PolicyConfigDocument;
use gateway_workspace_core::StoreError;
use gateway_workspace_core::WorkspaceAuditEvent;
use gateway_workspace_core::WorkspaceAuditSink;
use gateway_workspace_core::WorkspaceOptions;
use gateway_workspace_core::WorkspaceStores;

// ============================================================================
// SECTION: Fixture Data
// ============================================================================

/// Auth policy granting `catalog` and `shopping`.
pub const AUTH_POLICY: &str = "auth-catalog";
/// Rate limiting policy shared by both pipelines.
pub const RATE_POLICY: &str = "rate-limiter-per-minute";
/// Reverse proxy policy.
pub const PROXY_POLICY: &str = "proxy-to-catalog";
/// Pipeline carrying the auth policy.
pub const DEFAULT_PIPELINE: &str = "default-pipeline";
/// Pipeline without auth.
pub const OTHER_PIPELINE: &str = "other-pipeline";

/// Returns the fixture policies.
pub fn policies() -> Vec<Policy> {
    vec![
        Policy::auth(AUTH_POLICY, ["catalog", "shopping"]),
        Policy::new(RATE_POLICY, "rateLimiting")
            .with_setting("phase", "request")
            .with_setting("limit", 60),
        Policy::new(PROXY_POLICY, "reverseProxy")
            .with_setting("phase", "request")
            .with_setting("targetUrl", "http://catalog.internal"),
    ]
}

/// Returns the fixture pipelines.
pub fn pipelines() -> Vec<Pipeline> {
    vec![
        Pipeline::new(DEFAULT_PIPELINE).with_policies([AUTH_POLICY, RATE_POLICY, PROXY_POLICY]),
        Pipeline::new(OTHER_PIPELINE).with_policies([RATE_POLICY]),
    ]
}

/// Returns the fixture mappings.
pub fn mappings() -> Vec<Mapping> {
    vec![
        mapping("catalog", HttpVerb::Get, "/api/catalog", DEFAULT_PIPELINE),
        mapping("invoice", HttpVerb::All, "/api/invoices", DEFAULT_PIPELINE),
        mapping("order", HttpVerb::All, "/api/orders", OTHER_PIPELINE),
    ]
}

/// Builds a mapping bound to `pipeline`.
pub fn mapping(name: &str, verb: HttpVerb, endpoint: &str, pipeline: &str) -> Mapping {
    Mapping::new(name, verb, endpoint, Some(PipelineId::new(pipeline)))
}

/// Returns the fixture as a config document.
pub fn document() -> PolicyConfigDocument {
    PolicyConfigDocument {
        policies: policies(),
        pipelines: pipelines(),
        mappings: mappings(),
    }
}

/// Loads the fixture into the given workspace.
pub fn seed(workspace: &GatewayWorkspace) {
    workspace.import_document(document()).expect("seed fixture");
}

/// Returns an in-memory workspace loaded with the fixture.
pub fn seeded_workspace() -> GatewayWorkspace {
    let workspace = GatewayWorkspace::in_memory();
    seed(&workspace);
    workspace
}

// ============================================================================
// SECTION: Audit Capture
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Captured events.
    events: Mutex<Vec<WorkspaceAuditEvent>>,
}

impl RecordingAuditSink {
    /// Returns a copy of the captured events.
    pub fn events(&self) -> Vec<WorkspaceAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl WorkspaceAuditSink for RecordingAuditSink {
    fn record(&self, event: &WorkspaceAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Returns a seeded in-memory workspace plus its audit capture.
pub fn audited_workspace() -> (GatewayWorkspace, Arc<RecordingAuditSink>) {
    let sink = Arc::new(RecordingAuditSink::default());
    let workspace = GatewayWorkspace::with_options(
        WorkspaceStores::in_memory(),
        WorkspaceOptions::default(),
        sink.clone(),
    );
    seed(&workspace);
    (workspace, sink)
}

// ============================================================================
// SECTION: Failure Injection
// ============================================================================

/// Store that fails updates addressed to chosen ids.
pub struct FailingStore<E: Entity> {
    /// Backing store.
    inner: InMemoryEntityStore<E>,
    /// Ids whose updates fail.
    fail_updates_for: Vec<E::Id>,
}

impl<E: Entity> FailingStore<E> {
    /// Wraps a fresh in-memory store.
    pub fn new(fail_updates_for: &[&str]) -> Self {
        Self {
            inner: InMemoryEntityStore::new(),
            fail_updates_for: fail_updates_for
                .iter()
                .map(|id| E::Id::from((*id).to_string()))
                .collect(),
        }
    }
}

impl<E: Entity> EntityStore<E> for FailingStore<E> {
    fn find_by_name(&self, name: &str) -> Result<Option<E>, StoreError> {
        self.inner.find_by_name(name)
    }

    fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        self.inner.list()
    }

    fn create(&self, entity: E) -> Result<E, StoreError> {
        self.inner.create(entity)
    }

    fn update(&self, current_id: &E::Id, entity: E) -> Result<E, StoreError> {
        if self.fail_updates_for.contains(current_id) {
            return Err(StoreError::Io(format!("injected failure for {current_id}")));
        }
        self.inner.update(current_id, entity)
    }

    fn destroy(&self, id: &E::Id) -> Result<(), StoreError> {
        self.inner.destroy(id)
    }
}

/// Returns a seeded workspace whose pipeline updates fail for `failing` ids.
pub fn workspace_with_failing_pipelines(failing: &[&str]) -> GatewayWorkspace {
    let stores = WorkspaceStores::new(
        Arc::new(InMemoryEntityStore::<Policy>::new()),
        Arc::new(FailingStore::<Pipeline>::new(failing)),
        Arc::new(InMemoryEntityStore::<Mapping>::new()),
    );
    let workspace = GatewayWorkspace::new(stores);
    seed(&workspace);
    workspace
}

/// Returns a seeded workspace whose mapping updates fail for `failing` ids.
pub fn workspace_with_failing_mappings(failing: &[&str]) -> GatewayWorkspace {
    let stores = WorkspaceStores::new(
        Arc::new(InMemoryEntityStore::<Policy>::new()),
        Arc::new(InMemoryEntityStore::<Pipeline>::new()),
        Arc::new(FailingStore::<Mapping>::new(failing)),
    );
    let workspace = GatewayWorkspace::new(stores);
    seed(&workspace);
    workspace
}
