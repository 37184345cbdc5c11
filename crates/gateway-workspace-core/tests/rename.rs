// crates/gateway-workspace-core/tests/rename.rs
// ============================================================================
// Module: Rename Cascade Tests
// Description: Tests for policy, pipeline, and mapping renames.
// ============================================================================
//! ## Overview
//! Validates no-op detection, reference propagation, conflicts, and partial
//! cascade reporting for renames.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use gateway_workspace_core::ConflictReason;
use gateway_workspace_core::EntityKind;
use gateway_workspace_core::PipelineId;
use gateway_workspace_core::PolicyId;
use gateway_workspace_core::RenameOutcome;
use gateway_workspace_core::StoreError;
use gateway_workspace_core::WorkspaceError;

// ============================================================================
// SECTION: No-Op Renames
// ============================================================================

#[test]
fn rename_to_same_name_is_unchanged_and_writes_nothing() {
    let workspace = common::seeded_workspace();
    let before = workspace.export_document().unwrap();

    let outcome = workspace.rename_policy(common::AUTH_POLICY, common::AUTH_POLICY).unwrap();
    assert_eq!(outcome, RenameOutcome::Unchanged);
    let outcome =
        workspace.rename_pipeline(common::DEFAULT_PIPELINE, common::DEFAULT_PIPELINE).unwrap();
    assert_eq!(outcome, RenameOutcome::Unchanged);
    let outcome = workspace.rename_mapping("catalog", "catalog").unwrap();
    assert_eq!(outcome, RenameOutcome::Unchanged);

    assert_eq!(workspace.export_document().unwrap(), before);
}

#[test]
fn rename_to_same_name_does_not_require_existence() {
    let workspace = common::seeded_workspace();
    let outcome = workspace.rename_policy("missing", "missing").unwrap();
    assert!(!outcome.is_renamed());
}

// ============================================================================
// SECTION: Propagation
// ============================================================================

#[test]
fn policy_rename_rewrites_pipeline_entries_in_place() {
    let workspace = common::seeded_workspace();

    let renamed = workspace
        .rename_policy(common::RATE_POLICY, "rate-limiter-per-second")
        .unwrap()
        .renamed()
        .expect("renamed policy");
    assert_eq!(renamed.name, "rate-limiter-per-second");
    assert_eq!(renamed.id, PolicyId::new("rate-limiter-per-second"));

    let default = workspace
        .stores()
        .pipelines()
        .find_by_name(common::DEFAULT_PIPELINE)
        .unwrap()
        .unwrap();
    assert_eq!(default.policy_ids, vec![
        PolicyId::new(common::AUTH_POLICY),
        PolicyId::new("rate-limiter-per-second"),
        PolicyId::new(common::PROXY_POLICY),
    ]);
    let other =
        workspace.stores().pipelines().find_by_name(common::OTHER_PIPELINE).unwrap().unwrap();
    assert_eq!(other.policy_ids, vec![PolicyId::new("rate-limiter-per-second")]);

    let stale = PolicyId::new(common::RATE_POLICY);
    let pipelines = workspace.stores().pipelines().list().unwrap();
    assert!(pipelines.iter().all(|pipeline| !pipeline.policy_ids.contains(&stale)));
    assert!(workspace.stores().policies().find_by_name(common::RATE_POLICY).unwrap().is_none());
}

#[test]
fn pipeline_rename_rewrites_mapping_foreign_keys() {
    let workspace = common::seeded_workspace();

    let outcome = workspace.rename_pipeline(common::DEFAULT_PIPELINE, "storefront").unwrap();
    assert!(outcome.is_renamed());

    let mappings = workspace.stores().mappings().list().unwrap();
    let bound: Vec<(&str, Option<&PipelineId>)> = mappings
        .iter()
        .map(|mapping| (mapping.name.as_str(), mapping.pipeline_id.as_ref()))
        .collect();
    assert_eq!(bound, vec![
        ("catalog", Some(&PipelineId::new("storefront"))),
        ("invoice", Some(&PipelineId::new("storefront"))),
        ("order", Some(&PipelineId::new(common::OTHER_PIPELINE))),
    ]);
}

#[test]
fn rename_keeps_creation_order() {
    let workspace = common::seeded_workspace();
    workspace.rename_policy(common::AUTH_POLICY, "auth-storefront").unwrap();
    let policies = workspace.stores().policies().list().unwrap();
    let names: Vec<&str> = policies.iter().map(|policy| policy.name.as_str()).collect();
    assert_eq!(names, vec!["auth-storefront", common::RATE_POLICY, common::PROXY_POLICY]);
}

#[test]
fn mapping_rename_updates_identity_only() {
    let workspace = common::seeded_workspace();
    let renamed = workspace.rename_mapping("order", "orders").unwrap().renamed().unwrap();
    assert_eq!(renamed.id.as_str(), "orders");
    assert_eq!(renamed.pipeline_id, Some(PipelineId::new(common::OTHER_PIPELINE)));
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[test]
fn rename_missing_entity_is_not_found() {
    let workspace = common::seeded_workspace();
    let before = workspace.export_document().unwrap();

    let err = workspace.rename_policy("missing", "other").unwrap_err();
    assert_eq!(err, WorkspaceError::NotFound {
        kind: EntityKind::Policy,
        name: "missing".to_string(),
    });
    assert_eq!(err.status_code(), 404);
    let err = workspace.rename_pipeline("missing", "other").unwrap_err();
    assert_eq!(err.status_code(), 404);

    assert_eq!(workspace.export_document().unwrap(), before);
}

#[test]
fn rename_onto_existing_name_conflicts() {
    let workspace = common::seeded_workspace();
    let err = workspace.rename_policy(common::AUTH_POLICY, common::PROXY_POLICY).unwrap_err();
    assert_eq!(err, WorkspaceError::Conflict {
        kind: EntityKind::Policy,
        name: common::PROXY_POLICY.to_string(),
        reason: ConflictReason::NameTaken,
    });
    assert_eq!(err.status_code(), 400);
    assert!(workspace.stores().policies().find_by_name(common::AUTH_POLICY).unwrap().is_some());
}

#[test]
fn rename_to_empty_name_is_invalid() {
    let workspace = common::seeded_workspace();
    let err = workspace.rename_pipeline(common::OTHER_PIPELINE, "").unwrap_err();
    assert_eq!(err.error_kind(), "invalid");
}

#[test]
fn failed_holder_update_reports_partial_cascade_without_rollback() {
    let workspace = common::workspace_with_failing_pipelines(&[common::OTHER_PIPELINE]);

    let err = workspace.rename_policy(common::RATE_POLICY, "rate-limiter-per-second").unwrap_err();
    let WorkspaceError::PartialCascade {
        kind,
        applied,
        attempted,
        source,
        ..
    } = err.clone()
    else {
        panic!("expected partial cascade, got {err:?}");
    };
    assert_eq!(kind, EntityKind::Policy);
    assert_eq!(applied, 1);
    assert_eq!(attempted, 2);
    assert!(matches!(source, StoreError::Io(_)));

    let policies = workspace.stores().policies();
    assert!(policies.find_by_name("rate-limiter-per-second").unwrap().is_some());
    let other =
        workspace.stores().pipelines().find_by_name(common::OTHER_PIPELINE).unwrap().unwrap();
    assert_eq!(other.policy_ids, vec![PolicyId::new(common::RATE_POLICY)]);
    let dangling = workspace.find_dangling_references().unwrap();
    assert_eq!(dangling.len(), 1);
}

#[test]
fn failed_mapping_update_leaves_old_pipeline_id_dangling() {
    let workspace = common::workspace_with_failing_mappings(&["catalog"]);

    let err = workspace.rename_pipeline(common::DEFAULT_PIPELINE, "storefront-pipeline").unwrap_err();
    assert_eq!(err.error_kind(), "partial_cascade");
    assert_eq!(err.status_code(), 500);

    let mappings = workspace.stores().mappings();
    assert_eq!(
        mappings.find_by_name("invoice").unwrap().unwrap().pipeline_id,
        Some(PipelineId::new("storefront-pipeline"))
    );
    assert_eq!(
        mappings.find_by_name("catalog").unwrap().unwrap().pipeline_id,
        Some(PipelineId::new(common::DEFAULT_PIPELINE))
    );
    let dangling = workspace.find_dangling_references().unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].holder_kind, EntityKind::Mapping);
    assert_eq!(dangling[0].target, common::DEFAULT_PIPELINE);
}
