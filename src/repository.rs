//! The single persistence contract the core requires from outside.
//!
//! Backends are expected to provide read-committed-or-stronger consistency
//! per call, enforce the uniqueness constraints (`external_id` for users,
//! `(org, name)` for everything else), and cascade relationship rows when
//! an entity is removed.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Filter, Group, Policy, ProxyResource, User};

/// Typed error codes a repository may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepoErrorCode {
    UserNotFound,
    GroupNotFound,
    PolicyNotFound,
    ProxyResourceNotFound,
    UserAlreadyExist,
    GroupAlreadyExist,
    PolicyAlreadyExist,
    ProxyResourceAlreadyExist,
    UserIsAlreadyAMemberOfGroup,
    UserIsNotAMemberOfGroup,
    PolicyIsAlreadyAttachedToGroup,
    PolicyIsNotAttachedToGroup,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{code:?}: {message}")]
#[diagnostic(code(warden::repository))]
pub struct RepoError {
    pub code: RepoErrorCode,
    pub message: String,
}

impl RepoError {
    pub fn new(code: RepoErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RepoErrorCode::InternalError, message)
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Narrow repository interface the entity services and the authorization
/// resolver depend on. Update calls receive the fully-recomputed entity;
/// URN derivation stays in the service layer.
#[async_trait]
pub trait Repository: Send + Sync {
    // users
    async fn add_user(&self, user: User) -> RepoResult<User>;
    async fn get_user_by_external_id(&self, external_id: &str) -> RepoResult<User>;
    async fn update_user(&self, user: User) -> RepoResult<User>;
    async fn remove_user(&self, id: &str) -> RepoResult<()>;
    async fn get_users_filtered(&self, filter: &Filter) -> RepoResult<(Vec<User>, usize)>;
    async fn get_groups_by_user_id(
        &self,
        user_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)>;

    // groups
    async fn add_group(&self, group: Group) -> RepoResult<Group>;
    async fn get_group_by_name(&self, org: &str, name: &str) -> RepoResult<Group>;
    async fn update_group(&self, group: Group) -> RepoResult<Group>;
    async fn remove_group(&self, id: &str) -> RepoResult<()>;
    async fn get_groups_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Group>, usize)>;
    async fn is_member_of_group(&self, user_id: &str, group_id: &str) -> RepoResult<bool>;
    async fn add_member(&self, user_id: &str, group_id: &str) -> RepoResult<()>;
    async fn remove_member(&self, user_id: &str, group_id: &str) -> RepoResult<()>;
    async fn get_group_members(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<User>, usize)>;
    async fn is_attached_to_group(&self, group_id: &str, policy_id: &str) -> RepoResult<bool>;
    async fn attach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()>;
    async fn detach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()>;
    async fn get_attached_policies(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Policy>, usize)>;

    // policies
    async fn add_policy(&self, policy: Policy) -> RepoResult<Policy>;
    async fn get_policy_by_name(&self, org: &str, name: &str) -> RepoResult<Policy>;
    async fn update_policy(&self, policy: Policy) -> RepoResult<Policy>;
    async fn remove_policy(&self, id: &str) -> RepoResult<()>;
    async fn get_policies_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Policy>, usize)>;
    async fn get_attached_groups(
        &self,
        policy_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)>;

    // proxy resources
    async fn add_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource>;
    async fn get_proxy_resource_by_name(&self, org: &str, name: &str)
        -> RepoResult<ProxyResource>;
    async fn update_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource>;
    async fn remove_proxy_resource(&self, id: &str) -> RepoResult<()>;
    async fn get_proxy_resources(
        &self,
        filter: &Filter,
    ) -> RepoResult<(Vec<ProxyResource>, usize)>;
}
