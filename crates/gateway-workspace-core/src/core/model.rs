// crates/gateway-workspace-core/src/core/model.rs
// ============================================================================
// Module: Gateway Workspace Entity Model
// Description: Policy, pipeline, and mapping records plus the entity contract.
// Purpose: Define the three linked entity types and their identity rule.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The workspace model has three entity types:
//! - [`Policy`]: a named rule; `auth` policies carry OAuth-style scopes.
//! - [`Pipeline`]: an ordered chain of policy ids (order is execution order).
//! - [`Mapping`]: an HTTP verb + endpoint bound to a pipeline id.
//!
//! Identity follows `name || id`: a non-empty name is always the id. Renaming
//! therefore changes both fields at once. The wire form matches the
//! `policy-config.json` artifact (camelCase keys, `type` for the policy type).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::MappingId;
use crate::core::identifiers::PipelineId;
use crate::core::identifiers::PolicyId;

// ============================================================================
// SECTION: Entity Contract
// ============================================================================

/// Entity type discriminator used in errors, audit events, and storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Policy records.
    Policy,
    /// Pipeline records.
    Pipeline,
    /// Mapping records.
    Mapping,
}

impl EntityKind {
    /// Returns a stable label for the entity kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Pipeline => "pipeline",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common contract for workspace entities held in an entity store.
///
/// # Invariants
/// - After [`Entity::assign_identity`], a non-empty name equals the id.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Identifier type for the entity.
    type Id: Clone
        + fmt::Debug
        + fmt::Display
        + Eq
        + std::hash::Hash
        + AsRef<str>
        + From<String>
        + Send
        + Sync
        + 'static;

    /// Entity kind discriminator.
    const KIND: EntityKind;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the entity name.
    fn name(&self) -> &str;

    /// Overwrites the entity identifier.
    fn set_id(&mut self, id: Self::Id);

    /// Overwrites the entity name without touching the identifier.
    fn set_name(&mut self, name: &str);

    /// Applies the `name || id` identity rule.
    fn assign_identity(&mut self) {
        if !self.name().is_empty() {
            let id = Self::Id::from(self.name().to_string());
            self.set_id(id);
        }
    }

    /// Renames the entity and recomputes its identifier.
    fn rename(&mut self, new_name: &str) {
        self.set_name(new_name);
        self.assign_identity();
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Policy type label (for example `auth`, `rateLimiting`, `reverseProxy`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyType(String);

impl PolicyType {
    /// Policy type whose instances carry authorization scopes.
    pub const AUTH: &'static str = "auth";

    /// Creates a new policy type label.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the auth policy type.
    #[must_use]
    pub fn auth() -> Self {
        Self::new(Self::AUTH)
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the auth policy type.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.0 == Self::AUTH
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PolicyType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PolicyType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Named rule applied within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Policy identifier (equal to the name once identity is assigned).
    #[serde(default)]
    pub id: PolicyId,
    /// Policy name.
    pub name: String,
    /// Policy type label.
    #[serde(rename = "type", default)]
    pub policy_type: PolicyType,
    /// Authorization scopes; only meaningful for `auth` policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Type-specific settings (phase, limits, target URLs, ...).
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Policy {
    /// Creates a policy with identity assigned from the name.
    #[must_use]
    pub fn new(name: impl Into<String>, policy_type: impl Into<PolicyType>) -> Self {
        let name = name.into();
        Self {
            id: PolicyId::new(name.clone()),
            name,
            policy_type: policy_type.into(),
            scopes: None,
            settings: Map::new(),
        }
    }

    /// Creates an `auth` policy carrying the given scopes.
    #[must_use]
    pub fn auth<I, S>(name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::new(name, PolicyType::auth());
        policy.scopes = Some(scopes.into_iter().map(Into::into).collect());
        policy
    }

    /// Adds a type-specific setting.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Returns true for `auth` policies.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.policy_type.is_auth()
    }

    /// Returns the scopes this policy contributes to the scope index.
    ///
    /// Non-auth policies and auth policies without scopes contribute nothing.
    #[must_use]
    pub fn auth_scopes(&self) -> &[String] {
        if !self.is_auth() {
            return &[];
        }
        self.scopes.as_deref().unwrap_or_default()
    }
}

impl Entity for Policy {
    type Id = PolicyId;

    const KIND: EntityKind = EntityKind::Policy;

    fn id(&self) -> &PolicyId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_id(&mut self, id: PolicyId) {
        self.id = id;
    }

    fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Ordered chain of policy references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Pipeline identifier (equal to the name once identity is assigned).
    #[serde(default)]
    pub id: PipelineId,
    /// Pipeline name.
    pub name: String,
    /// Policy ids in execution order.
    #[serde(default)]
    pub policy_ids: Vec<PolicyId>,
}

impl Pipeline {
    /// Creates an empty pipeline with identity assigned from the name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: PipelineId::new(name.clone()),
            name,
            policy_ids: Vec::new(),
        }
    }

    /// Appends policy ids in order.
    #[must_use]
    pub fn with_policies<I, S>(mut self, policy_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PolicyId>,
    {
        self.policy_ids.extend(policy_ids.into_iter().map(Into::into));
        self
    }

    /// Returns true when the pipeline lists the policy id.
    #[must_use]
    pub fn contains_policy(&self, policy_id: &PolicyId) -> bool {
        self.policy_ids.contains(policy_id)
    }
}

impl Entity for Pipeline {
    type Id = PipelineId;

    const KIND: EntityKind = EntityKind::Pipeline;

    fn id(&self) -> &PipelineId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_id(&mut self, id: PipelineId) {
        self.id = id;
    }

    fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// HTTP verb of a mapping; `ALL` matches every verb.
///
/// Deserialization is case-insensitive; serialization always emits the
/// uppercase label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpVerb {
    /// GET requests.
    Get,
    /// POST requests.
    Post,
    /// PUT requests.
    Put,
    /// PATCH requests.
    Patch,
    /// DELETE requests.
    Delete,
    /// HEAD requests.
    Head,
    /// OPTIONS requests.
    Options,
    /// TRACE requests.
    Trace,
    /// CONNECT requests.
    Connect,
    /// Any verb.
    All,
}

impl HttpVerb {
    /// Returns the canonical uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown HTTP verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown http verb: {0}")]
pub struct UnknownHttpVerb(pub String);

impl FromStr for HttpVerb {
    type Err = UnknownHttpVerb;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            "CONNECT" => Ok(Self::Connect),
            "ALL" => Ok(Self::All),
            _ => Err(UnknownHttpVerb(value.to_string())),
        }
    }
}

impl TryFrom<String> for HttpVerb {
    type Error = UnknownHttpVerb;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Route definition bound to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    /// Mapping identifier (equal to the name once identity is assigned).
    #[serde(default)]
    pub id: MappingId,
    /// Mapping name.
    pub name: String,
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Endpoint path.
    pub endpoint: String,
    /// Referenced pipeline id; `None` once detached.
    #[serde(default)]
    pub pipeline_id: Option<PipelineId>,
}

impl Mapping {
    /// Creates a mapping with identity assigned from the name.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        verb: HttpVerb,
        endpoint: impl Into<String>,
        pipeline_id: Option<PipelineId>,
    ) -> Self {
        let name = name.into();
        Self {
            id: MappingId::new(name.clone()),
            name,
            verb,
            endpoint: endpoint.into(),
            pipeline_id,
        }
    }
}

impl Entity for Mapping {
    type Id = MappingId;

    const KIND: EntityKind = EntityKind::Mapping;

    fn id(&self) -> &MappingId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_id(&mut self, id: MappingId) {
        self.id = id;
    }

    fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }
}
