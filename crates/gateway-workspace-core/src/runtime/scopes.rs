// crates/gateway-workspace-core/src/runtime/scopes.rs
// ============================================================================
// Module: Gateway Workspace Scope Aggregator
// Description: Derives the scope -> routes index from mappings and policies.
// Purpose: Tell authorization layers which routes require which scopes.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Scope aggregation is a three-way join: mapping -> pipeline -> auth
//! policies. Two entry points share one accumulator:
//! - [`compute_auth_scopes`] reads live stores, loading each referenced
//!   pipeline and policy once;
//! - [`build_scopes`] joins in-memory slices via id indexes.
//!
//! Given equivalent data both return identical indexes. Routes are appended
//! in mapping order, then in the pipeline's `policyIds` order. A policy id
//! listed twice in one pipeline contributes once; distinct policies granting
//! the same scope each contribute, so duplicate routes are preserved.
//! Missing pipelines and policies are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use crate::core::identifiers::PipelineId;
use crate::core::identifiers::PolicyId;
use crate::core::model::Entity;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;
use crate::core::scopes::AuthScopes;
use crate::interfaces::StoreError;
use crate::interfaces::WorkspaceStores;

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Computes the scope index from live stores.
///
/// # Errors
///
/// Returns [`StoreError`] unchanged when any read fails.
pub fn compute_auth_scopes(stores: &WorkspaceStores) -> Result<AuthScopes, StoreError> {
    let mappings = stores.mappings().list()?;

    let mut pipelines: HashMap<PipelineId, Pipeline> = HashMap::new();
    for pipeline_id in mappings.iter().filter_map(|mapping| mapping.pipeline_id.as_ref()) {
        if pipelines.contains_key(pipeline_id) {
            continue;
        }
        if let Some(pipeline) = stores.pipelines().find_by_id(pipeline_id)? {
            pipelines.insert(pipeline_id.clone(), pipeline);
        }
    }

    let mut policies: HashMap<PolicyId, Policy> = HashMap::new();
    for policy_id in pipelines.values().flat_map(|pipeline| pipeline.policy_ids.iter()) {
        if policies.contains_key(policy_id) {
            continue;
        }
        if let Some(policy) = stores.policies().find_by_id(policy_id)? {
            policies.insert(policy_id.clone(), policy);
        }
    }

    let pipeline_index: HashMap<&PipelineId, &Pipeline> = pipelines.iter().collect();
    let policy_index: HashMap<&PolicyId, &Policy> = policies.iter().collect();
    Ok(accumulate(&mappings, &pipeline_index, &policy_index))
}

/// Builds the scope index from in-memory records.
///
/// When several records share an id, the first one wins.
#[must_use]
pub fn build_scopes(mappings: &[Mapping], pipelines: &[Pipeline], policies: &[Policy]) -> AuthScopes {
    let pipeline_index = index_by_id(pipelines);
    let policy_index = index_by_id(policies);
    accumulate(mappings, &pipeline_index, &policy_index)
}

// ============================================================================
// SECTION: Accumulator
// ============================================================================

/// Joins mappings to auth policies through the given indexes.
fn accumulate(
    mappings: &[Mapping],
    pipelines: &HashMap<&PipelineId, &Pipeline>,
    policies: &HashMap<&PolicyId, &Policy>,
) -> AuthScopes {
    let mut scopes = AuthScopes::new();
    for mapping in mappings {
        let Some(pipeline) = mapping.pipeline_id.as_ref().and_then(|id| pipelines.get(id)) else {
            continue;
        };
        let mut seen = HashSet::new();
        for policy_id in &pipeline.policy_ids {
            if !seen.insert(policy_id) {
                continue;
            }
            if let Some(policy) = policies.get(policy_id) {
                scopes.record(policy, mapping);
            }
        }
    }
    scopes
}

/// Indexes records by id, keeping the first record for each id.
fn index_by_id<E: Entity>(records: &[E]) -> HashMap<&E::Id, &E> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(record.id()).or_insert(record);
    }
    index
}
