use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EFFECT_ALLOW: &str = "allow";
pub const EFFECT_DENY: &str = "deny";

/// The smallest unit of policy: an effect plus action patterns plus
/// resource patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// "allow" or "deny"
    pub effect: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// A named, ordered list of statements, attachable to groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub org: String,
    pub path: String,
    pub urn: String,
    pub statements: Vec<Statement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named collection of users carrying a set of attached policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub org: String,
    pub path: String,
    pub urn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An org-less principal. `external_id` is the caller-supplied identity
/// verified by the upstream authenticator; `id` is internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub path: String,
    pub urn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Downstream endpoint a proxy resource routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub method: String,
}

/// A routed downstream endpoint plus the IAM action/resource that must be
/// authorized before invoking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyResource {
    pub id: String,
    pub name: String,
    pub org: String,
    pub path: String,
    pub urn: String,
    pub endpoint: ProxyEndpoint,
    pub required_action: String,
    pub required_resource: String,
    pub urn_pattern: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything addressable by a URN; what the resolver's filtering form
/// evaluates candidates through.
pub trait Resource {
    fn urn(&self) -> &str;
}

impl Resource for User {
    fn urn(&self) -> &str {
        &self.urn
    }
}

impl Resource for Group {
    fn urn(&self) -> &str {
        &self.urn
    }
}

impl Resource for Policy {
    fn urn(&self) -> &str {
        &self.urn
    }
}

impl Resource for ProxyResource {
    fn urn(&self) -> &str {
        &self.urn
    }
}

/// Per-request caller identity, as attested by the upstream authenticator.
///
/// `admin` is set only for the bootstrap administrator; the core never
/// derives it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    pub identifier: String,
    pub admin: bool,
    pub request_id: String,
}

impl RequestInfo {
    pub fn new(identifier: impl Into<String>, admin: bool) -> Self {
        Self {
            identifier: identifier.into(),
            admin,
            request_id: String::new(),
        }
    }
}

/// Server-side query envelope for list operations.
///
/// `limit == 0` means the default page size; validation caps explicit
/// limits at [`crate::validation::MAX_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub org: Option<String>,
    pub path_prefix: Option<String>,
    pub policy_name: Option<String>,
    pub group_name: Option<String>,
    pub external_user_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub order_by: Option<String>,
}
