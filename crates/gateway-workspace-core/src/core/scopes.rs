// crates/gateway-workspace-core/src/core/scopes.rs
// ============================================================================
// Module: Gateway Workspace Scope Index Types
// Description: Route and scope index types produced by scope aggregation.
// Purpose: Provide a deterministic, serializable scope -> routes index.
// Dependencies: serde, crate::core::model
// ============================================================================

//! ## Overview
//! [`AuthScopes`] maps an authorization scope to the routes that require it.
//! Keys are ordered; each route list keeps accumulation order and may hold
//! duplicates when several auth policies grant the same scope to one route.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::model::HttpVerb;
use crate::core::model::Mapping;
use crate::core::model::Policy;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Verb/endpoint pair that requires a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// HTTP verb of the mapping.
    pub verb: HttpVerb,
    /// Endpoint path of the mapping.
    pub endpoint: String,
}

impl Route {
    /// Creates a route.
    #[must_use]
    pub fn new(verb: HttpVerb, endpoint: impl Into<String>) -> Self {
        Self {
            verb,
            endpoint: endpoint.into(),
        }
    }
}

impl From<&Mapping> for Route {
    fn from(mapping: &Mapping) -> Self {
        Self::new(mapping.verb, mapping.endpoint.clone())
    }
}

/// Scope name -> routes requiring that scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthScopes(BTreeMap<String, Vec<Route>>);

impl AuthScopes {
    /// Creates an empty scope index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the routes requiring `scope`, if any.
    #[must_use]
    pub fn routes(&self, scope: &str) -> Option<&[Route]> {
        self.0.get(scope).map(Vec::as_slice)
    }

    /// Returns the number of distinct scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no scope is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates scopes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Route])> {
        self.0.iter().map(|(scope, routes)| (scope.as_str(), routes.as_slice()))
    }

    /// Returns the underlying ordered map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<Route>> {
        self.0
    }

    /// Appends the mapping's route under every scope the policy grants.
    pub(crate) fn record(&mut self, policy: &Policy, mapping: &Mapping) {
        for scope in policy.auth_scopes() {
            self.0.entry(scope.clone()).or_default().push(Route::from(mapping));
        }
    }
}

impl FromIterator<(String, Vec<Route>)> for AuthScopes {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Route>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
