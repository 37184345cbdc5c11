// crates/gateway-workspace-core/src/runtime/workspace.rs
// ============================================================================
// Module: Gateway Workspace Facade
// Description: Caller-facing workspace operations over an explicit store context.
// Purpose: Wire cascades, scope aggregation, import/export, and audit together.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`GatewayWorkspace`] is the single entry point for callers. It owns a
//! [`WorkspaceStores`] context, a [`FanOut`] bound for cascades, and an audit
//! sink. Every operation returns one success value or one
//! [`WorkspaceError`]; rename, delete, import, and reconcile also record one
//! audit event each, whatever the outcome.
//!
//! The facade is request-scoped: it assumes a single writer per operation
//! and performs no locking of its own beyond what each store needs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::audit::WorkspaceAuditEvent;
use crate::audit::WorkspaceAuditEventParams;
use crate::audit::WorkspaceAuditSink;
use crate::audit::WorkspaceNoopAuditSink;
use crate::audit::WorkspaceOperation;
use crate::audit::WorkspaceOutcome;
use crate::core::document::PolicyConfigDocument;
use crate::core::model::Entity;
use crate::core::model::EntityKind;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;
use crate::core::references::ReferenceHolder;
use crate::core::scopes::AuthScopes;
use crate::interfaces::EntityStore;
use crate::interfaces::WorkspaceStores;
use crate::runtime::cascade::CascadeEngine;
use crate::runtime::cascade::CascadeReport;
use crate::runtime::cascade::PipelineReferences;
use crate::runtime::cascade::PolicyReferences;
use crate::runtime::cascade::RenameOutcome;
use crate::runtime::cascade::partial;
use crate::runtime::cascade::rename_record;
use crate::runtime::error::ConflictReason;
use crate::runtime::error::WorkspaceError;
use crate::runtime::fanout::DEFAULT_MAX_PARALLELISM;
use crate::runtime::fanout::FanOut;
use crate::runtime::scopes::compute_auth_scopes;

// ============================================================================
// SECTION: Options and Reports
// ============================================================================

/// Tunables for a workspace facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceOptions {
    /// Worker bound for cascade fan-out.
    pub max_parallelism: usize,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            max_parallelism: DEFAULT_MAX_PARALLELISM,
        }
    }
}

/// Reference from an existing record to a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    /// Kind of the referencing record.
    pub holder_kind: EntityKind,
    /// Id of the referencing record.
    pub holder: String,
    /// Kind of the missing record.
    pub target_kind: EntityKind,
    /// Missing target id.
    pub target: String,
}

impl From<DanglingReference> for WorkspaceError {
    fn from(reference: DanglingReference) -> Self {
        Self::DanglingReference {
            kind: reference.holder_kind,
            name: reference.holder,
            target_kind: reference.target_kind,
            target: reference.target,
        }
    }
}

/// Counts reported by [`GatewayWorkspace::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Pipelines rewritten to drop missing policy ids.
    pub pipelines_updated: usize,
    /// Mappings detached from missing pipelines.
    pub mappings_updated: usize,
    /// Individual reference entries removed.
    pub references_detached: usize,
}

/// Counts reported by [`GatewayWorkspace::import_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Policies created.
    pub policies: usize,
    /// Pipelines created.
    pub pipelines: usize,
    /// Mappings created.
    pub mappings: usize,
}

/// Identifying fields of one audited call.
struct AuditContext<'a> {
    /// Operation performed.
    operation: WorkspaceOperation,
    /// Entity kind targeted.
    entity_kind: Option<EntityKind>,
    /// Target name.
    name: Option<&'a str>,
    /// New name for renames.
    new_name: Option<&'a str>,
    /// Force flag for deletes.
    force: Option<bool>,
}

// ============================================================================
// SECTION: Facade
// ============================================================================

/// Caller-facing workspace over an explicit store context.
#[derive(Clone)]
pub struct GatewayWorkspace {
    /// Entity stores.
    stores: WorkspaceStores,
    /// Cascade fan-out bound.
    fan_out: FanOut,
    /// Audit sink for mutations.
    audit: Arc<dyn WorkspaceAuditSink>,
}

impl GatewayWorkspace {
    /// Creates a workspace with default options and no audit output.
    #[must_use]
    pub fn new(stores: WorkspaceStores) -> Self {
        Self::with_options(stores, WorkspaceOptions::default(), Arc::new(WorkspaceNoopAuditSink))
    }

    /// Creates a workspace over fresh in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(WorkspaceStores::in_memory())
    }

    /// Creates a workspace with explicit options and audit sink.
    #[must_use]
    pub fn with_options(
        stores: WorkspaceStores,
        options: WorkspaceOptions,
        audit: Arc<dyn WorkspaceAuditSink>,
    ) -> Self {
        Self {
            stores,
            fan_out: FanOut::new(options.max_parallelism),
            audit,
        }
    }

    /// Returns the store context.
    #[must_use]
    pub const fn stores(&self) -> &WorkspaceStores {
        &self.stores
    }

    /// Returns the cascade fan-out bound.
    #[must_use]
    pub const fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    /// Returns the named policy and every pipeline listing it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when the policy does not exist.
    pub fn find_pipelines_referencing_policy(
        &self,
        policy_name: &str,
    ) -> Result<PolicyReferences, WorkspaceError> {
        self.policy_cascade().find_references(policy_name)
    }

    /// Returns the named pipeline and every mapping bound to it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when the pipeline does not exist.
    pub fn find_mappings_referencing_pipeline(
        &self,
        pipeline_name: &str,
    ) -> Result<PipelineReferences, WorkspaceError> {
        self.pipeline_cascade().find_references(pipeline_name)
    }

    /// Renames a policy and rewrites its id inside every referencing pipeline.
    ///
    /// # Errors
    ///
    /// See [`CascadeEngine::rename`].
    pub fn rename_policy(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> Result<RenameOutcome<Policy>, WorkspaceError> {
        let result = self.policy_cascade().rename(current_name, new_name);
        self.record(rename_context(EntityKind::Policy, current_name, new_name), &result, |outcome| {
            outcome.is_renamed()
        });
        result.map(|report| report.value)
    }

    /// Renames a pipeline and rewrites every mapping bound to it.
    ///
    /// # Errors
    ///
    /// See [`CascadeEngine::rename`].
    pub fn rename_pipeline(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> Result<RenameOutcome<Pipeline>, WorkspaceError> {
        let result = self.pipeline_cascade().rename(current_name, new_name);
        self.record(
            rename_context(EntityKind::Pipeline, current_name, new_name),
            &result,
            |outcome| outcome.is_renamed(),
        );
        result.map(|report| report.value)
    }

    /// Renames a mapping. Nothing references mappings, so nothing cascades.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`], [`WorkspaceError::Conflict`] or
    /// [`WorkspaceError::Invalid`] as for policy renames.
    pub fn rename_mapping(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> Result<RenameOutcome<Mapping>, WorkspaceError> {
        let result = self.rename_leaf(current_name, new_name);
        self.record(
            rename_context(EntityKind::Mapping, current_name, new_name),
            &result,
            |outcome| outcome.is_renamed(),
        );
        result.map(|report| report.value)
    }

    /// Deletes a policy, detaching it from pipelines when `force` is set.
    ///
    /// # Errors
    ///
    /// See [`CascadeEngine::delete`].
    pub fn delete_policy_by_name(&self, name: &str, force: bool) -> Result<bool, WorkspaceError> {
        let result = self.policy_cascade().delete(name, force);
        self.record(delete_context(EntityKind::Policy, name, Some(force)), &result, |deleted| {
            *deleted
        });
        result.map(|report| report.value)
    }

    /// Deletes a pipeline, nulling mapping references when `force` is set.
    ///
    /// # Errors
    ///
    /// See [`CascadeEngine::delete`].
    pub fn delete_pipeline_by_name(&self, name: &str, force: bool) -> Result<bool, WorkspaceError> {
        let result = self.pipeline_cascade().delete(name, force);
        self.record(delete_context(EntityKind::Pipeline, name, Some(force)), &result, |deleted| {
            *deleted
        });
        result.map(|report| report.value)
    }

    /// Deletes a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when the mapping does not exist.
    pub fn delete_mapping_by_name(&self, name: &str) -> Result<bool, WorkspaceError> {
        let result = self.delete_leaf(name);
        self.record(delete_context(EntityKind::Mapping, name, None), &result, |deleted| *deleted);
        result.map(|report| report.value)
    }

    /// Computes the `scope -> routes` index from the live stores.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Store`] when a read fails.
    pub fn get_auth_scopes(&self) -> Result<AuthScopes, WorkspaceError> {
        Ok(compute_auth_scopes(&self.stores)?)
    }

    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Invalid`] without a name or id and
    /// [`WorkspaceError::Conflict`] when the name is taken.
    pub fn create_policy(&self, mut policy: Policy) -> Result<Policy, WorkspaceError> {
        policy.assign_identity();
        ensure_available(self.stores.policies(), &policy)?;
        Ok(self.stores.policies().create(policy)?)
    }

    /// Creates a pipeline whose policy ids must all exist.
    ///
    /// # Errors
    ///
    /// As for [`Self::create_policy`], plus
    /// [`WorkspaceError::DanglingReference`] for an unknown policy id.
    pub fn create_pipeline(&self, mut pipeline: Pipeline) -> Result<Pipeline, WorkspaceError> {
        pipeline.assign_identity();
        ensure_available(self.stores.pipelines(), &pipeline)?;
        ensure_targets_exist::<Policy, Pipeline>(self.stores.policies(), &pipeline)?;
        Ok(self.stores.pipelines().create(pipeline)?)
    }

    /// Creates a mapping whose pipeline, when set, must exist.
    ///
    /// # Errors
    ///
    /// As for [`Self::create_policy`], plus
    /// [`WorkspaceError::DanglingReference`] for an unknown pipeline id.
    pub fn create_mapping(&self, mut mapping: Mapping) -> Result<Mapping, WorkspaceError> {
        mapping.assign_identity();
        ensure_available(self.stores.mappings(), &mapping)?;
        ensure_targets_exist::<Pipeline, Mapping>(self.stores.pipelines(), &mapping)?;
        Ok(self.stores.mappings().create(mapping)?)
    }

    /// Appends a policy to the end of a pipeline's chain.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when either record is missing and
    /// [`WorkspaceError::Conflict`] when the policy is already listed.
    pub fn add_policy_to_pipeline(
        &self,
        pipeline_name: &str,
        policy_name: &str,
    ) -> Result<Pipeline, WorkspaceError> {
        let (mut pipeline, policy) = self.pipeline_and_policy(pipeline_name, policy_name)?;
        if pipeline.contains_policy(&policy.id) {
            return Err(WorkspaceError::conflict(
                EntityKind::Pipeline,
                pipeline_name,
                ConflictReason::AlreadyLinked {
                    target: policy.name,
                },
            ));
        }
        let pipeline_id = pipeline.id.clone();
        pipeline.policy_ids.push(policy.id);
        Ok(self.stores.pipelines().update(&pipeline_id, pipeline)?)
    }

    /// Removes a policy from a pipeline's chain.
    ///
    /// Returns `false` when the pipeline did not list the policy.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotFound`] when either record is missing.
    pub fn remove_policy_from_pipeline(
        &self,
        pipeline_name: &str,
        policy_name: &str,
    ) -> Result<bool, WorkspaceError> {
        let (mut pipeline, policy) = self.pipeline_and_policy(pipeline_name, policy_name)?;
        if !ReferenceHolder::<Policy>::detach(&mut pipeline, &policy.id) {
            return Ok(false);
        }
        let pipeline_id = pipeline.id.clone();
        self.stores.pipelines().update(&pipeline_id, pipeline)?;
        Ok(true)
    }

    /// Loads every collection, in creation order, into a config document.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Store`] when a read fails.
    pub fn export_document(&self) -> Result<PolicyConfigDocument, WorkspaceError> {
        Ok(PolicyConfigDocument {
            policies: self.stores.policies().list()?,
            pipelines: self.stores.pipelines().list()?,
            mappings: self.stores.mappings().list()?,
        })
    }

    /// Loads a config document into the stores.
    ///
    /// The whole document is validated before anything is written: every
    /// record needs a name or id, names must be free, and references must
    /// resolve against existing records or records in the document.
    /// Policies load first, then pipelines, then mappings.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Invalid`], [`WorkspaceError::Conflict`] or
    /// [`WorkspaceError::DanglingReference`] for a rejected document, and
    /// [`WorkspaceError::Store`] when a write fails mid-import.
    pub fn import_document(
        &self,
        document: PolicyConfigDocument,
    ) -> Result<ImportSummary, WorkspaceError> {
        let result = self.import_records(document).map(CascadeReport::untouched);
        let context = AuditContext {
            operation: WorkspaceOperation::Import,
            entity_kind: None,
            name: None,
            new_name: None,
            force: None,
        };
        self.record(context, &result, |summary| *summary != ImportSummary::default());
        result.map(|report| report.value)
    }

    /// Lists references to records that no longer exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Store`] when a read fails.
    pub fn find_dangling_references(&self) -> Result<Vec<DanglingReference>, WorkspaceError> {
        let document = self.export_document()?;
        let policy_ids = id_set(&document.policies);
        let pipeline_ids = id_set(&document.pipelines);
        let mut dangling = dangling_in::<Policy, Pipeline>(&policy_ids, &document.pipelines);
        dangling.extend(dangling_in::<Pipeline, Mapping>(&pipeline_ids, &document.mappings));
        Ok(dangling)
    }

    /// Detaches every dangling reference, as a forced delete would have.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Store`] when a read fails and
    /// [`WorkspaceError::PartialCascade`] when some repairs failed.
    pub fn reconcile(&self) -> Result<ReconcileReport, WorkspaceError> {
        let result = self.reconcile_records();
        let context = AuditContext {
            operation: WorkspaceOperation::Reconcile,
            entity_kind: None,
            name: None,
            new_name: None,
            force: None,
        };
        self.record(context, &result, |report| report.references_detached > 0);
        result.map(|report| report.value)
    }

    /// Cascade engine for policies held by pipelines.
    fn policy_cascade(&self) -> CascadeEngine<'_, Policy, Pipeline> {
        CascadeEngine::new(self.stores.policies(), self.stores.pipelines(), self.fan_out)
    }

    /// Cascade engine for pipelines held by mappings.
    fn pipeline_cascade(&self) -> CascadeEngine<'_, Pipeline, Mapping> {
        CascadeEngine::new(self.stores.pipelines(), self.stores.mappings(), self.fan_out)
    }

    /// Renames a mapping without any cascade.
    fn rename_leaf(
        &self,
        current_name: &str,
        new_name: &str,
    ) -> Result<CascadeReport<RenameOutcome<Mapping>>, WorkspaceError> {
        if current_name == new_name {
            return Ok(CascadeReport::untouched(RenameOutcome::Unchanged));
        }
        let store = self.stores.mappings();
        let mapping = store
            .find_by_name(current_name)?
            .ok_or_else(|| WorkspaceError::not_found(EntityKind::Mapping, current_name))?;
        let renamed = rename_record(store, &mapping, new_name)?;
        Ok(CascadeReport::untouched(RenameOutcome::Renamed(renamed)))
    }

    /// Deletes a mapping without any cascade.
    fn delete_leaf(&self, name: &str) -> Result<CascadeReport<bool>, WorkspaceError> {
        let store = self.stores.mappings();
        let mapping = store
            .find_by_name(name)?
            .ok_or_else(|| WorkspaceError::not_found(EntityKind::Mapping, name))?;
        store.destroy(&mapping.id)?;
        Ok(CascadeReport::untouched(true))
    }

    /// Resolves a pipeline and a policy by name.
    fn pipeline_and_policy(
        &self,
        pipeline_name: &str,
        policy_name: &str,
    ) -> Result<(Pipeline, Policy), WorkspaceError> {
        let pipeline = self
            .stores
            .pipelines()
            .find_by_name(pipeline_name)?
            .ok_or_else(|| WorkspaceError::not_found(EntityKind::Pipeline, pipeline_name))?;
        let policy = self
            .stores
            .policies()
            .find_by_name(policy_name)?
            .ok_or_else(|| WorkspaceError::not_found(EntityKind::Policy, policy_name))?;
        Ok((pipeline, policy))
    }

    /// Validates and writes an imported document.
    fn import_records(
        &self,
        mut document: PolicyConfigDocument,
    ) -> Result<ImportSummary, WorkspaceError> {
        document.normalize_identity();
        let existing = self.export_document()?;
        ensure_new_records(&existing.policies, &document.policies)?;
        ensure_new_records(&existing.pipelines, &document.pipelines)?;
        ensure_new_records(&existing.mappings, &document.mappings)?;

        let mut policy_ids = id_set(&existing.policies);
        policy_ids.extend(id_set(&document.policies));
        let mut pipeline_ids = id_set(&existing.pipelines);
        pipeline_ids.extend(id_set(&document.pipelines));
        let first_dangling = dangling_in::<Policy, Pipeline>(&policy_ids, &document.pipelines)
            .into_iter()
            .chain(dangling_in::<Pipeline, Mapping>(&pipeline_ids, &document.mappings))
            .next();
        if let Some(reference) = first_dangling {
            return Err(reference.into());
        }

        let summary = ImportSummary {
            policies: document.policies.len(),
            pipelines: document.pipelines.len(),
            mappings: document.mappings.len(),
        };
        for policy in document.policies {
            self.stores.policies().create(policy)?;
        }
        for pipeline in document.pipelines {
            self.stores.pipelines().create(pipeline)?;
        }
        for mapping in document.mappings {
            self.stores.mappings().create(mapping)?;
        }
        Ok(summary)
    }

    /// Detaches dangling references in pipelines, then in mappings.
    fn reconcile_records(&self) -> Result<CascadeReport<ReconcileReport>, WorkspaceError> {
        let document = self.export_document()?;
        let policy_ids = id_set(&document.policies);
        let pipeline_ids = id_set(&document.pipelines);
        let (pipelines_updated, pipeline_entries) = self.detach_missing::<Policy, Pipeline>(
            self.stores.pipelines(),
            &policy_ids,
            document.pipelines.clone(),
        )?;
        let (mappings_updated, mapping_entries) = self.detach_missing::<Pipeline, Mapping>(
            self.stores.mappings(),
            &pipeline_ids,
            document.mappings,
        )?;
        let report = ReconcileReport {
            pipelines_updated,
            mappings_updated,
            references_detached: pipeline_entries + mapping_entries,
        };
        Ok(CascadeReport {
            value: report,
            references_updated: pipelines_updated + mappings_updated,
        })
    }

    /// Drops references to unknown targets and writes back changed holders.
    ///
    /// Returns `(holders updated, reference entries removed)`.
    fn detach_missing<T, H>(
        &self,
        store: &dyn EntityStore<H>,
        known: &HashSet<&str>,
        holders: Vec<H>,
    ) -> Result<(usize, usize), WorkspaceError>
    where
        T: Entity,
        H: ReferenceHolder<T>,
    {
        let mut removed = 0;
        let repaired: Vec<(H::Id, H)> = holders
            .into_iter()
            .filter_map(|mut holder| {
                let missing: Vec<T::Id> = holder
                    .referenced_ids()
                    .into_iter()
                    .filter(|id| !known.contains(id.as_ref()))
                    .collect();
                if missing.is_empty() {
                    return None;
                }
                removed += missing.len();
                for id in &missing {
                    holder.detach(id);
                }
                Some((holder.id().clone(), holder))
            })
            .collect();
        let updated = self
            .fan_out
            .apply_all(repaired, |(id, holder)| store.update(&id, holder).map(|_| ()))
            .map_err(|failure| partial(H::KIND, "dangling references", failure))?;
        Ok((updated, removed))
    }

    /// Records one audit event for a finished operation.
    fn record<V>(
        &self,
        context: AuditContext<'_>,
        result: &Result<CascadeReport<V>, WorkspaceError>,
        changed: impl Fn(&V) -> bool,
    ) {
        let (outcome, references_updated, error_kind) = match result {
            Ok(report) if changed(&report.value) => {
                (WorkspaceOutcome::Ok, report.references_updated, None)
            }
            Ok(report) => (WorkspaceOutcome::Unchanged, report.references_updated, None),
            Err(err) => (WorkspaceOutcome::Error, 0, Some(err.error_kind())),
        };
        let event = WorkspaceAuditEvent::new(WorkspaceAuditEventParams {
            operation: context.operation,
            entity_kind: context.entity_kind,
            name: context.name.map(str::to_string),
            new_name: context.new_name.map(str::to_string),
            force: context.force,
            outcome,
            references_updated,
            error_kind,
        });
        self.audit.record(&event);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Audit context for a rename.
const fn rename_context<'a>(kind: EntityKind, name: &'a str, new_name: &'a str) -> AuditContext<'a> {
    AuditContext {
        operation: WorkspaceOperation::Rename,
        entity_kind: Some(kind),
        name: Some(name),
        new_name: Some(new_name),
        force: None,
    }
}

/// Audit context for a delete.
const fn delete_context(kind: EntityKind, name: &str, force: Option<bool>) -> AuditContext<'_> {
    AuditContext {
        operation: WorkspaceOperation::Delete,
        entity_kind: Some(kind),
        name: Some(name),
        new_name: None,
        force,
    }
}

/// Rejects a record without identity or whose id or name is already stored.
fn ensure_available<E: Entity>(store: &dyn EntityStore<E>, record: &E) -> Result<(), WorkspaceError> {
    if record.id().as_ref().is_empty() {
        return Err(WorkspaceError::Invalid(format!("{} requires a name or id", E::KIND)));
    }
    let by_name = if record.name().is_empty() { None } else { store.find_by_name(record.name())? };
    if by_name.is_some() || store.find_by_id(record.id())?.is_some() {
        return Err(WorkspaceError::conflict(E::KIND, record.id().as_ref(), ConflictReason::NameTaken));
    }
    Ok(())
}

/// Rejects a holder that references a target missing from `targets`.
fn ensure_targets_exist<T, H>(targets: &dyn EntityStore<T>, holder: &H) -> Result<(), WorkspaceError>
where
    T: Entity,
    H: ReferenceHolder<T>,
{
    for target in holder.referenced_ids() {
        if targets.find_by_id(&target)?.is_none() {
            return Err(DanglingReference {
                holder_kind: H::KIND,
                holder: holder.id().to_string(),
                target_kind: T::KIND,
                target: target.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Rejects incoming records lacking identity or clashing with stored or
/// earlier incoming records.
fn ensure_new_records<E: Entity>(existing: &[E], incoming: &[E]) -> Result<(), WorkspaceError> {
    let mut ids = id_set(existing);
    let mut names: HashSet<&str> =
        existing.iter().map(Entity::name).filter(|name| !name.is_empty()).collect();
    for record in incoming {
        let id = record.id().as_ref();
        if id.is_empty() {
            return Err(WorkspaceError::Invalid(format!("{} requires a name or id", E::KIND)));
        }
        let name = record.name();
        let name_clash = !name.is_empty() && !names.insert(name);
        if !ids.insert(id) || name_clash {
            return Err(WorkspaceError::conflict(E::KIND, id, ConflictReason::NameTaken));
        }
    }
    Ok(())
}

/// Collects record ids as string slices.
fn id_set<E: Entity>(records: &[E]) -> HashSet<&str> {
    records.iter().map(|record| record.id().as_ref()).collect()
}

/// Lists references from `holders` to ids outside `known`.
fn dangling_in<T, H>(known: &HashSet<&str>, holders: &[H]) -> Vec<DanglingReference>
where
    T: Entity,
    H: ReferenceHolder<T>,
{
    let mut dangling = Vec::new();
    for holder in holders {
        for target in holder.referenced_ids() {
            if !known.contains(target.as_ref()) {
                dangling.push(DanglingReference {
                    holder_kind: H::KIND,
                    holder: holder.id().to_string(),
                    target_kind: T::KIND,
                    target: target.to_string(),
                });
            }
        }
    }
    dangling
}
