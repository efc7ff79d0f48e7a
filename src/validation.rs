//! Input validation for every caller-supplied field.
//!
//! Each entity service validates all of its inputs before touching the
//! repository; violations produce `INVALID_PARAMETER_ERROR` with a message
//! naming the offending field and value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ApiError, ErrorCode};
use crate::types::{Filter, ProxyEndpoint, Statement, EFFECT_ALLOW, EFFECT_DENY};

/// Hard cap on list page sizes.
pub const MAX_LIMIT: usize = 1000;
/// Page size applied when a filter leaves `limit` at 0.
pub const DEFAULT_LIMIT: usize = 1000;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("name pattern"));
static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([A-Za-z0-9_-]+/)*$").expect("path pattern"));
static PATH_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([A-Za-z0-9_-]+/)*[A-Za-z0-9_-]*$").expect("prefix pattern"));
static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[A-Za-z0-9_-]+(:[A-Za-z0-9_-]+)*(:?\*)?)$").expect("action pattern")
});
static ENDPOINT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[A-Za-z0-9_/{}-]*$").expect("endpoint path pattern"));

/// Methods a proxy endpoint may route.
pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Names and orgs share a character class: 1-128 word characters or dashes.
pub fn is_valid_name(s: &str) -> bool {
    NAME_RE.is_match(s)
}

pub fn is_valid_org(s: &str) -> bool {
    NAME_RE.is_match(s)
}

/// A path begins and ends with `/`, with word-character segments between.
pub fn is_valid_path(s: &str) -> bool {
    PATH_RE.is_match(s)
}

/// A path prefix is a path optionally ending in a partial segment without
/// the trailing slash (`/a/b` and `/a/b/` both denote the `/a/b/` subtree).
pub fn is_valid_path_prefix(s: &str) -> bool {
    PATH_PREFIX_RE.is_match(s)
}

/// Action patterns are colon-segmented identifiers with at most one `*`,
/// which must be last: `iam:user:get`, `iam:*`, `iam:user:list*`, `*`.
pub fn is_valid_action_pattern(s: &str) -> bool {
    ACTION_RE.is_match(s)
}

/// Resource patterns are `*` or a `urn:`-rooted string with at most one
/// `*`, which must be last.
pub fn is_valid_resource_pattern(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    let body = s.strip_suffix('*').unwrap_or(s);
    if !body.starts_with("urn:") || body.contains('*') {
        return false;
    }
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '_' | '-'))
}

pub fn check_name(field: &str, value: &str) -> Result<(), ApiError> {
    if is_valid_name(value) {
        Ok(())
    } else {
        Err(ApiError::invalid_parameter(field, value))
    }
}

pub fn check_org(value: &str) -> Result<(), ApiError> {
    if is_valid_org(value) {
        Ok(())
    } else {
        Err(ApiError::invalid_parameter("org", value))
    }
}

pub fn check_path(field: &str, value: &str) -> Result<(), ApiError> {
    if is_valid_path(value) {
        Ok(())
    } else {
        Err(ApiError::invalid_parameter(field, value))
    }
}

/// Validate a full statement list: effects, non-empty action and resource
/// sets, and the shape of every pattern.
pub fn check_statements(statements: &[Statement]) -> Result<(), ApiError> {
    if statements.is_empty() {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterError,
            "Empty statements",
        ));
    }
    for statement in statements {
        if statement.effect != EFFECT_ALLOW && statement.effect != EFFECT_DENY {
            return Err(ApiError::new(
                ErrorCode::InvalidParameterError,
                format!(
                    "Invalid effect: {} - Only 'allow' and 'deny' accepted",
                    statement.effect
                ),
            ));
        }
        if statement.actions.is_empty() {
            return Err(ApiError::new(
                ErrorCode::InvalidParameterError,
                "Empty actions",
            ));
        }
        for action in &statement.actions {
            if !is_valid_action_pattern(action) {
                return Err(ApiError::invalid_parameter("action", action));
            }
        }
        if statement.resources.is_empty() {
            return Err(ApiError::new(
                ErrorCode::InvalidParameterError,
                "Empty resources",
            ));
        }
        for resource in &statement.resources {
            if !is_valid_resource_pattern(resource) {
                return Err(ApiError::invalid_parameter("resource", resource));
            }
        }
    }
    Ok(())
}

/// A concrete action string: no wildcard allowed, since this names the
/// single action authorized when a proxied request comes through.
pub fn check_action(field: &str, value: &str) -> Result<(), ApiError> {
    if is_valid_action_pattern(value) && !value.contains('*') {
        Ok(())
    } else {
        Err(ApiError::invalid_parameter(field, value))
    }
}

pub fn check_resource_pattern(field: &str, value: &str) -> Result<(), ApiError> {
    if is_valid_resource_pattern(value) {
        Ok(())
    } else {
        Err(ApiError::invalid_parameter(field, value))
    }
}

/// Validate the routed endpoint of a proxy resource.
pub fn check_proxy_endpoint(endpoint: &ProxyEndpoint) -> Result<(), ApiError> {
    if endpoint.host.is_empty() || endpoint.host.chars().any(char::is_whitespace) {
        return Err(ApiError::invalid_parameter("host", &endpoint.host));
    }
    if endpoint.port == 0 {
        return Err(ApiError::invalid_parameter(
            "port",
            &endpoint.port.to_string(),
        ));
    }
    if !ENDPOINT_PATH_RE.is_match(&endpoint.path) {
        return Err(ApiError::invalid_parameter("path", &endpoint.path));
    }
    if !ALLOWED_METHODS.contains(&endpoint.method.as_str()) {
        return Err(ApiError::invalid_parameter("method", &endpoint.method));
    }
    Ok(())
}

/// Validate a list filter. `order_by_fields` is the whitelist of sortable
/// fields for the entity being listed; an `-desc` suffix selects descending
/// order.
pub fn check_filter(filter: &Filter, order_by_fields: &[&str]) -> Result<(), ApiError> {
    if filter.limit > MAX_LIMIT {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterError,
            format!(
                "Invalid parameter: limit {}, max limit allowed: {}",
                filter.limit, MAX_LIMIT
            ),
        ));
    }
    if let Some(org) = &filter.org {
        check_org(org)?;
    }
    if let Some(prefix) = &filter.path_prefix {
        if !is_valid_path_prefix(prefix) {
            return Err(ApiError::invalid_parameter("pathPrefix", prefix));
        }
    }
    if let Some(name) = &filter.policy_name {
        if !is_valid_name(name) {
            return Err(ApiError::invalid_parameter("policy", name));
        }
    }
    if let Some(name) = &filter.group_name {
        if !is_valid_name(name) {
            return Err(ApiError::invalid_parameter("group", name));
        }
    }
    if let Some(id) = &filter.external_user_id {
        if !is_valid_name(id) {
            return Err(ApiError::invalid_parameter("user", id));
        }
    }
    if let Some(order_by) = &filter.order_by {
        let field = order_by.strip_suffix("-desc").unwrap_or(order_by);
        if !order_by_fields.contains(&field) {
            return Err(ApiError::invalid_parameter("orderBy", order_by));
        }
    }
    Ok(())
}
