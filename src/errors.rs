use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error kinds returned to upper layers.
///
/// The set is exhaustive; repository failures that do not map to one of the
/// specific kinds collapse to `UnknownApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidParameterError,
    UnauthorizedResourcesError,
    UserByExternalIdNotFound,
    GroupByOrgAndNameNotFound,
    PolicyByOrgAndNameNotFound,
    ProxyResourceByOrgAndNameNotFound,
    UserAlreadyExist,
    GroupAlreadyExist,
    PolicyAlreadyExist,
    ProxyResourceAlreadyExist,
    UserIsAlreadyAMemberOfGroup,
    UserIsNotAMemberOfGroup,
    PolicyIsAlreadyAttachedToGroup,
    PolicyIsNotAttachedToGroup,
    UnknownApiError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidParameterError => "INVALID_PARAMETER_ERROR",
            ErrorCode::UnauthorizedResourcesError => "UNAUTHORIZED_RESOURCES_ERROR",
            ErrorCode::UserByExternalIdNotFound => "USER_BY_EXTERNAL_ID_NOT_FOUND",
            ErrorCode::GroupByOrgAndNameNotFound => "GROUP_BY_ORG_AND_NAME_NOT_FOUND",
            ErrorCode::PolicyByOrgAndNameNotFound => "POLICY_BY_ORG_AND_NAME_NOT_FOUND",
            ErrorCode::ProxyResourceByOrgAndNameNotFound => {
                "PROXY_RESOURCE_BY_ORG_AND_NAME_NOT_FOUND"
            }
            ErrorCode::UserAlreadyExist => "USER_ALREADY_EXIST",
            ErrorCode::GroupAlreadyExist => "GROUP_ALREADY_EXIST",
            ErrorCode::PolicyAlreadyExist => "POLICY_ALREADY_EXIST",
            ErrorCode::ProxyResourceAlreadyExist => "PROXY_RESOURCE_ALREADY_EXIST",
            ErrorCode::UserIsAlreadyAMemberOfGroup => "USER_IS_ALREADY_A_MEMBER_OF_GROUP",
            ErrorCode::UserIsNotAMemberOfGroup => "USER_IS_NOT_A_MEMBER_OF_GROUP",
            ErrorCode::PolicyIsAlreadyAttachedToGroup => "POLICY_IS_ALREADY_ATTACHED_TO_GROUP",
            ErrorCode::PolicyIsNotAttachedToGroup => "POLICY_IS_NOT_ATTACHED_TO_GROUP",
            ErrorCode::UnknownApiError => "UNKNOWN_API_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error envelope returned by every API operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic, Serialize, Deserialize)]
#[error("{code}: {message}")]
#[diagnostic(code(warden::api))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Validation failure naming the offending field and value.
    pub fn invalid_parameter(field: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidParameterError,
            format!("Invalid parameter: {} {}", field, value),
        )
    }

    pub fn unauthorized(external_id: &str, urn: &str) -> Self {
        Self::new(
            ErrorCode::UnauthorizedResourcesError,
            format!(
                "User with externalId {} is not allowed to access to resource {}",
                external_id, urn
            ),
        )
    }

    /// The authenticated principal has no user record, so no permissions can
    /// be resolved for it.
    pub fn caller_not_found(external_id: &str) -> Self {
        Self::new(
            ErrorCode::UnauthorizedResourcesError,
            format!(
                "Authenticated user with externalId {} not found. Unable to retrieve permissions.",
                external_id
            ),
        )
    }

    /// Catch-all for repository failures outside the enumerated kinds.
    pub fn unknown(err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::UnknownApiError, err.to_string())
    }
}
