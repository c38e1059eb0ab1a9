//! Per-endpoint protection metadata.
//!
//! Policies are keyed by `(Method, route template)` where the template is the
//! string the route was registered with, i.e. what axum exposes as `MatchedPath`.

use std::collections::HashMap;

use axum::http::Method;

use crate::services::auth::ResourceKind;

/// Which path parameter names the resource, and what kind of resource it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipRequirement {
    pub param: &'static str,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPolicy {
    public: bool,
    auth_required: bool,
    ownership: Option<OwnershipRequirement>,
}

impl EndpointPolicy {
    /// No declaration at all.
    pub const fn open() -> Self {
        Self {
            public: false,
            auth_required: false,
            ownership: None,
        }
    }

    pub const fn public() -> Self {
        Self {
            public: true,
            auth_required: false,
            ownership: None,
        }
    }

    pub const fn secured() -> Self {
        Self {
            public: false,
            auth_required: true,
            ownership: None,
        }
    }

    /// Ownership-checked; always requires authentication as well.
    pub const fn owned(kind: ResourceKind, param: &'static str) -> Self {
        Self {
            public: false,
            auth_required: true,
            ownership: Some(OwnershipRequirement { param, kind }),
        }
    }

    pub fn requires_authentication(&self) -> bool {
        !self.public && self.auth_required
    }

    pub fn ownership(&self) -> Option<OwnershipRequirement> {
        self.ownership
    }
}

/// Startup-built, read-only map of route policies.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<&'static str, HashMap<Method, EndpointPolicy>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: Method, path: &'static str, policy: EndpointPolicy) -> Self {
        self.entries.entry(path).or_default().insert(method, policy);
        self
    }

    /// The declared policy, if any.
    pub fn get(&self, method: &Method, path: &str) -> Option<EndpointPolicy> {
        self.entries
            .get(path)
            .and_then(|by_method| by_method.get(method))
            .copied()
    }

    /// Unregistered routes are open.
    pub fn policy_for(&self, method: &Method, path: &str) -> EndpointPolicy {
        self.get(method, path).unwrap_or(EndpointPolicy::open())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Method, &'static str)> + '_ {
        self.entries
            .iter()
            .flat_map(|(path, by_method)| by_method.keys().map(move |method| (method, *path)))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }
}
