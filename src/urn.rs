use serde::{Deserialize, Serialize};

/// Resource types addressable by a URN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    User,
    Group,
    Policy,
    Proxy,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::User => "user",
            ResourceType::Group => "group",
            ResourceType::Policy => "policy",
            ResourceType::Proxy => "proxy",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical URN of a named resource: `urn:iws:iam:<org>:<type><path><name>`.
///
/// Org-less resources (users) leave the org segment empty. The path always
/// begins and ends with `/`, so the name lands directly after it.
pub fn create_urn(org: &str, resource_type: ResourceType, path: &str, name: &str) -> String {
    format!("urn:iws:iam:{}:{}{}{}", org, resource_type.as_str(), path, name)
}

/// Subtree pattern rooted at `path`: `urn:iws:iam:<org>:<type><path>*`.
///
/// The trailing `*` makes this a pattern usable in statement resources; it
/// matches every URN strictly below the path.
pub fn urn_prefix(org: &str, resource_type: ResourceType, path: &str) -> String {
    format!("urn:iws:iam:{}:{}{}*", org, resource_type.as_str(), path)
}

/// Anchored glob match over URNs and action strings.
///
/// A pattern is either a concrete string (exact equality) or ends with a
/// single `*`, which matches any non-empty run of characters, path
/// separators included. Validation guarantees no interior stars, so the
/// match is a prefix check.
pub fn matches(pattern: &str, subject: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => subject.len() > prefix.len() && subject.starts_with(prefix),
        None => pattern == subject,
    }
}
