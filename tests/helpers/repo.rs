use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use warden::memory::MemoryRepository;
use warden::repository::{RepoError, RepoResult, Repository};
use warden::types::{Filter, Group, Policy, ProxyResource, User};

/// Repository double for error-path tests: delegates to an in-memory
/// backend, records every method invocation, and returns a scripted error
/// instead when one is registered for the method.
#[derive(Default)]
pub struct ScriptedRepo {
    inner: MemoryRepository,
    failures: Mutex<HashMap<&'static str, RepoError>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed state directly through the in-memory backend.
    pub fn inner(&self) -> &MemoryRepository {
        &self.inner
    }

    /// Make `method` fail with `err` on every subsequent call.
    pub fn fail(&self, method: &'static str, err: RepoError) {
        self.failures.lock().insert(method, err);
    }

    /// Method names invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn intercept(&self, method: &'static str) -> Result<(), RepoError> {
        self.calls.lock().push(method);
        match self.failures.lock().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Repository for ScriptedRepo {
    async fn add_user(&self, user: User) -> RepoResult<User> {
        self.intercept("add_user")?;
        self.inner.add_user(user).await
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> RepoResult<User> {
        self.intercept("get_user_by_external_id")?;
        self.inner.get_user_by_external_id(external_id).await
    }

    async fn update_user(&self, user: User) -> RepoResult<User> {
        self.intercept("update_user")?;
        self.inner.update_user(user).await
    }

    async fn remove_user(&self, id: &str) -> RepoResult<()> {
        self.intercept("remove_user")?;
        self.inner.remove_user(id).await
    }

    async fn get_users_filtered(&self, filter: &Filter) -> RepoResult<(Vec<User>, usize)> {
        self.intercept("get_users_filtered")?;
        self.inner.get_users_filtered(filter).await
    }

    async fn get_groups_by_user_id(
        &self,
        user_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)> {
        self.intercept("get_groups_by_user_id")?;
        self.inner.get_groups_by_user_id(user_id, filter).await
    }

    async fn add_group(&self, group: Group) -> RepoResult<Group> {
        self.intercept("add_group")?;
        self.inner.add_group(group).await
    }

    async fn get_group_by_name(&self, org: &str, name: &str) -> RepoResult<Group> {
        self.intercept("get_group_by_name")?;
        self.inner.get_group_by_name(org, name).await
    }

    async fn update_group(&self, group: Group) -> RepoResult<Group> {
        self.intercept("update_group")?;
        self.inner.update_group(group).await
    }

    async fn remove_group(&self, id: &str) -> RepoResult<()> {
        self.intercept("remove_group")?;
        self.inner.remove_group(id).await
    }

    async fn get_groups_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Group>, usize)> {
        self.intercept("get_groups_filtered")?;
        self.inner.get_groups_filtered(filter).await
    }

    async fn is_member_of_group(&self, user_id: &str, group_id: &str) -> RepoResult<bool> {
        self.intercept("is_member_of_group")?;
        self.inner.is_member_of_group(user_id, group_id).await
    }

    async fn add_member(&self, user_id: &str, group_id: &str) -> RepoResult<()> {
        self.intercept("add_member")?;
        self.inner.add_member(user_id, group_id).await
    }

    async fn remove_member(&self, user_id: &str, group_id: &str) -> RepoResult<()> {
        self.intercept("remove_member")?;
        self.inner.remove_member(user_id, group_id).await
    }

    async fn get_group_members(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<User>, usize)> {
        self.intercept("get_group_members")?;
        self.inner.get_group_members(group_id, filter).await
    }

    async fn is_attached_to_group(&self, group_id: &str, policy_id: &str) -> RepoResult<bool> {
        self.intercept("is_attached_to_group")?;
        self.inner.is_attached_to_group(group_id, policy_id).await
    }

    async fn attach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()> {
        self.intercept("attach_policy")?;
        self.inner.attach_policy(group_id, policy_id).await
    }

    async fn detach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()> {
        self.intercept("detach_policy")?;
        self.inner.detach_policy(group_id, policy_id).await
    }

    async fn get_attached_policies(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Policy>, usize)> {
        self.intercept("get_attached_policies")?;
        self.inner.get_attached_policies(group_id, filter).await
    }

    async fn add_policy(&self, policy: Policy) -> RepoResult<Policy> {
        self.intercept("add_policy")?;
        self.inner.add_policy(policy).await
    }

    async fn get_policy_by_name(&self, org: &str, name: &str) -> RepoResult<Policy> {
        self.intercept("get_policy_by_name")?;
        self.inner.get_policy_by_name(org, name).await
    }

    async fn update_policy(&self, policy: Policy) -> RepoResult<Policy> {
        self.intercept("update_policy")?;
        self.inner.update_policy(policy).await
    }

    async fn remove_policy(&self, id: &str) -> RepoResult<()> {
        self.intercept("remove_policy")?;
        self.inner.remove_policy(id).await
    }

    async fn get_policies_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Policy>, usize)> {
        self.intercept("get_policies_filtered")?;
        self.inner.get_policies_filtered(filter).await
    }

    async fn get_attached_groups(
        &self,
        policy_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)> {
        self.intercept("get_attached_groups")?;
        self.inner.get_attached_groups(policy_id, filter).await
    }

    async fn add_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource> {
        self.intercept("add_proxy_resource")?;
        self.inner.add_proxy_resource(proxy).await
    }

    async fn get_proxy_resource_by_name(
        &self,
        org: &str,
        name: &str,
    ) -> RepoResult<ProxyResource> {
        self.intercept("get_proxy_resource_by_name")?;
        self.inner.get_proxy_resource_by_name(org, name).await
    }

    async fn update_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource> {
        self.intercept("update_proxy_resource")?;
        self.inner.update_proxy_resource(proxy).await
    }

    async fn remove_proxy_resource(&self, id: &str) -> RepoResult<()> {
        self.intercept("remove_proxy_resource")?;
        self.inner.remove_proxy_resource(id).await
    }

    async fn get_proxy_resources(
        &self,
        filter: &Filter,
    ) -> RepoResult<(Vec<ProxyResource>, usize)> {
        self.intercept("get_proxy_resources")?;
        self.inner.get_proxy_resources(filter).await
    }
}
