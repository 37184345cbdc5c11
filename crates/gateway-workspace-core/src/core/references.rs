// crates/gateway-workspace-core/src/core/references.rs
// ============================================================================
// Module: Gateway Workspace References
// Description: Reference strategies linking holder entities to their targets.
// Purpose: Let one cascade engine rewrite list and scalar references alike.
// Dependencies: crate::core::model
// ============================================================================

//! ## Overview
//! Two reference shapes exist in the workspace:
//! - list entries: a pipeline lists policy ids in `policyIds`;
//! - scalar foreign keys: a mapping points at one pipeline via `pipelineId`.
//!
//! [`ReferenceHolder`] exposes the reference field of a holder through
//! [`ReferenceView`] / [`ReferenceSlot`], so rename and delete cascades are
//! written once and parameterized by the slot shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::identifiers::PipelineId;
use crate::core::identifiers::PolicyId;
use crate::core::model::Entity;
use crate::core::model::Mapping;
use crate::core::model::Pipeline;
use crate::core::model::Policy;

// ============================================================================
// SECTION: Reference Shapes
// ============================================================================

/// How a holder stores its reference to a target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// One id inside an ordered sequence.
    ListEntry,
    /// A single nullable id field.
    ScalarForeignKey,
}

/// Read-only view of a holder's reference field.
#[derive(Debug)]
pub enum ReferenceView<'a, Id> {
    /// Ordered id sequence.
    List(&'a [Id]),
    /// Nullable scalar id.
    Scalar(Option<&'a Id>),
}

/// Mutable access to a holder's reference field.
#[derive(Debug)]
pub enum ReferenceSlot<'a, Id> {
    /// Ordered id sequence.
    List(&'a mut Vec<Id>),
    /// Nullable scalar id.
    Scalar(&'a mut Option<Id>),
}

impl<Id> ReferenceSlot<'_, Id> {
    /// Returns the storage strategy of the slot.
    #[must_use]
    pub const fn kind(&self) -> ReferenceKind {
        match self {
            Self::List(_) => ReferenceKind::ListEntry,
            Self::Scalar(_) => ReferenceKind::ScalarForeignKey,
        }
    }
}

// ============================================================================
// SECTION: Holder Contract
// ============================================================================

/// Entity that references another entity type by id.
pub trait ReferenceHolder<Target: Entity>: Entity {
    /// Returns a read-only view of the reference field.
    fn reference_view(&self) -> ReferenceView<'_, Target::Id>;

    /// Returns mutable access to the reference field.
    fn reference_slot(&mut self) -> ReferenceSlot<'_, Target::Id>;

    /// Returns true when the holder references the target id.
    fn references(&self, target: &Target::Id) -> bool {
        match self.reference_view() {
            ReferenceView::List(ids) => ids.contains(target),
            ReferenceView::Scalar(id) => id == Some(target),
        }
    }

    /// Returns every target id referenced by the holder, in stored order.
    fn referenced_ids(&self) -> Vec<Target::Id> {
        match self.reference_view() {
            ReferenceView::List(ids) => ids.to_vec(),
            ReferenceView::Scalar(id) => id.into_iter().cloned().collect(),
        }
    }

    /// Replaces every occurrence of `from` with `to`, preserving position.
    ///
    /// Returns true when the field changed.
    fn retarget(&mut self, from: &Target::Id, to: &Target::Id) -> bool {
        match self.reference_slot() {
            ReferenceSlot::List(ids) => {
                let mut changed = false;
                for id in ids.iter_mut().filter(|id| **id == *from) {
                    id.clone_from(to);
                    changed = true;
                }
                changed
            }
            ReferenceSlot::Scalar(slot) => {
                if slot.as_ref() == Some(from) {
                    *slot = Some(to.clone());
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Removes the reference to `target` (list entry dropped, scalar nulled).
    ///
    /// Returns true when the field changed.
    fn detach(&mut self, target: &Target::Id) -> bool {
        match self.reference_slot() {
            ReferenceSlot::List(ids) => {
                let before = ids.len();
                ids.retain(|id| id != target);
                ids.len() != before
            }
            ReferenceSlot::Scalar(slot) => {
                if slot.as_ref() == Some(target) {
                    *slot = None;
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl ReferenceHolder<Policy> for Pipeline {
    fn reference_view(&self) -> ReferenceView<'_, PolicyId> {
        ReferenceView::List(&self.policy_ids)
    }

    fn reference_slot(&mut self) -> ReferenceSlot<'_, PolicyId> {
        ReferenceSlot::List(&mut self.policy_ids)
    }
}

impl ReferenceHolder<Pipeline> for Mapping {
    fn reference_view(&self) -> ReferenceView<'_, PipelineId> {
        ReferenceView::Scalar(self.pipeline_id.as_ref())
    }

    fn reference_slot(&mut self) -> ReferenceSlot<'_, PipelineId> {
        ReferenceSlot::Scalar(&mut self.pipeline_id)
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceHolder;
    use super::ReferenceKind;
    use crate::core::identifiers::PipelineId;
    use crate::core::identifiers::PolicyId;
    use crate::core::model::HttpVerb;
    use crate::core::model::Mapping;
    use crate::core::model::Pipeline;
    use crate::core::model::Policy;

    #[test]
    fn list_retarget_keeps_position() {
        let mut pipeline = Pipeline::new("default").with_policies(["a", "b", "c"]);
        let changed = ReferenceHolder::<Policy>::retarget(
            &mut pipeline,
            &PolicyId::new("b"),
            &PolicyId::new("z"),
        );
        assert!(changed);
        assert_eq!(pipeline.policy_ids, vec![
            PolicyId::new("a"),
            PolicyId::new("z"),
            PolicyId::new("c")
        ]);
    }

    #[test]
    fn scalar_detach_clears_only_matching_reference() {
        let mut mapping =
            Mapping::new("catalog", HttpVerb::Get, "/api/catalog", Some(PipelineId::new("p1")));
        assert!(!mapping.detach(&PipelineId::new("other")));
        assert!(mapping.detach(&PipelineId::new("p1")));
        assert_eq!(mapping.pipeline_id, None);
        assert_eq!(mapping.reference_slot().kind(), ReferenceKind::ScalarForeignKey);
    }
}
