//! Thread-safe, in-memory implementation of the repository contract.
//!
//! Serves as the default embedded backend and as the test backend. It
//! enforces the uniqueness constraints and performs the relationship
//! cascades the contract requires, so the check-then-act races of the
//! service envelope resolve here exactly as they would against SQL.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::repository::{RepoError, RepoErrorCode, RepoResult, Repository};
use crate::types::{Filter, Group, Policy, ProxyResource, User};
use crate::validation::DEFAULT_LIMIT;

#[derive(Default)]
struct State {
    users: Vec<User>,
    groups: Vec<Group>,
    policies: Vec<Policy>,
    proxies: Vec<ProxyResource>,
    /// (group_id, user_id)
    members: Vec<(String, String)>,
    /// (group_id, policy_id)
    attachments: Vec<(String, String)>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort, count, then page. The returned total is the match count before
/// offset/limit so callers can paginate.
fn paginate<T>(mut items: Vec<T>, filter: &Filter, key: fn(&T, &str) -> String) -> (Vec<T>, usize) {
    if let Some(order_by) = filter.order_by.as_deref() {
        let (field, descending) = match order_by.strip_suffix("-desc") {
            Some(field) => (field.to_string(), true),
            None => (order_by.to_string(), false),
        };
        items.sort_by(|a, b| {
            let ordering = key(a, &field).cmp(&key(b, &field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    let total = items.len();
    let limit = if filter.limit == 0 {
        DEFAULT_LIMIT
    } else {
        filter.limit
    };
    let page = items
        .into_iter()
        .skip(filter.offset)
        .take(limit)
        .collect();
    (page, total)
}

fn user_key(user: &User, field: &str) -> String {
    match field {
        "external_id" => user.external_id.clone(),
        "path" => user.path.clone(),
        "created_at" => user.created_at.to_rfc3339(),
        "updated_at" => user.updated_at.to_rfc3339(),
        _ => String::new(),
    }
}

fn group_key(group: &Group, field: &str) -> String {
    match field {
        "name" => group.name.clone(),
        "path" => group.path.clone(),
        "created_at" => group.created_at.to_rfc3339(),
        "updated_at" => group.updated_at.to_rfc3339(),
        _ => String::new(),
    }
}

fn policy_key(policy: &Policy, field: &str) -> String {
    match field {
        "name" => policy.name.clone(),
        "path" => policy.path.clone(),
        "created_at" => policy.created_at.to_rfc3339(),
        "updated_at" => policy.updated_at.to_rfc3339(),
        _ => String::new(),
    }
}

fn proxy_key(proxy: &ProxyResource, field: &str) -> String {
    match field {
        "name" => proxy.name.clone(),
        "path" => proxy.path.clone(),
        "created_at" => proxy.created_at.to_rfc3339(),
        "updated_at" => proxy.updated_at.to_rfc3339(),
        _ => String::new(),
    }
}

fn matches_org(entity_org: &str, filter: &Filter) -> bool {
    filter.org.as_deref().map_or(true, |org| org == entity_org)
}

fn matches_path_prefix(entity_path: &str, filter: &Filter) -> bool {
    filter
        .path_prefix
        .as_deref()
        .map_or(true, |prefix| entity_path.starts_with(prefix))
}

fn not_found(code: RepoErrorCode, what: impl Into<String>) -> RepoError {
    RepoError::new(code, what)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn add_user(&self, user: User) -> RepoResult<User> {
        let mut state = self.state.write();
        if state
            .users
            .iter()
            .any(|u| u.external_id == user.external_id)
        {
            return Err(RepoError::new(
                RepoErrorCode::UserAlreadyExist,
                format!("user with externalId {} already exists", user.external_id),
            ));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> RepoResult<User> {
        let state = self.state.read();
        state
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned()
            .ok_or_else(|| {
                not_found(
                    RepoErrorCode::UserNotFound,
                    format!("user with externalId {} not found", external_id),
                )
            })
    }

    async fn update_user(&self, user: User) -> RepoResult<User> {
        let mut state = self.state.write();
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(not_found(
                RepoErrorCode::UserNotFound,
                format!("user {} not found", user.id),
            )),
        }
    }

    async fn remove_user(&self, id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(not_found(
                RepoErrorCode::UserNotFound,
                format!("user {} not found", id),
            ));
        }
        state.members.retain(|(_, user_id)| user_id != id);
        Ok(())
    }

    async fn get_users_filtered(&self, filter: &Filter) -> RepoResult<(Vec<User>, usize)> {
        let state = self.state.read();
        let matches: Vec<User> = state
            .users
            .iter()
            .filter(|u| {
                matches_path_prefix(&u.path, filter)
                    && filter
                        .external_user_id
                        .as_deref()
                        .map_or(true, |id| id == u.external_id)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, user_key))
    }

    async fn get_groups_by_user_id(
        &self,
        user_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)> {
        let state = self.state.read();
        let matches: Vec<Group> = state
            .groups
            .iter()
            .filter(|g| {
                state
                    .members
                    .iter()
                    .any(|(group_id, member_id)| group_id == &g.id && member_id == user_id)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, group_key))
    }

    async fn add_group(&self, group: Group) -> RepoResult<Group> {
        let mut state = self.state.write();
        if state
            .groups
            .iter()
            .any(|g| g.org == group.org && g.name == group.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::GroupAlreadyExist,
                format!(
                    "group with org {} and name {} already exists",
                    group.org, group.name
                ),
            ));
        }
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group_by_name(&self, org: &str, name: &str) -> RepoResult<Group> {
        let state = self.state.read();
        state
            .groups
            .iter()
            .find(|g| g.org == org && g.name == name)
            .cloned()
            .ok_or_else(|| {
                not_found(
                    RepoErrorCode::GroupNotFound,
                    format!("group with org {} and name {} not found", org, name),
                )
            })
    }

    async fn update_group(&self, group: Group) -> RepoResult<Group> {
        let mut state = self.state.write();
        if state
            .groups
            .iter()
            .any(|g| g.id != group.id && g.org == group.org && g.name == group.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::GroupAlreadyExist,
                format!(
                    "group with org {} and name {} already exists",
                    group.org, group.name
                ),
            ));
        }
        match state.groups.iter_mut().find(|g| g.id == group.id) {
            Some(stored) => {
                *stored = group.clone();
                Ok(group)
            }
            None => Err(not_found(
                RepoErrorCode::GroupNotFound,
                format!("group {} not found", group.id),
            )),
        }
    }

    async fn remove_group(&self, id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(not_found(
                RepoErrorCode::GroupNotFound,
                format!("group {} not found", id),
            ));
        }
        state.members.retain(|(group_id, _)| group_id != id);
        state.attachments.retain(|(group_id, _)| group_id != id);
        Ok(())
    }

    async fn get_groups_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Group>, usize)> {
        let state = self.state.read();
        let matches: Vec<Group> = state
            .groups
            .iter()
            .filter(|g| {
                matches_org(&g.org, filter)
                    && matches_path_prefix(&g.path, filter)
                    && filter
                        .group_name
                        .as_deref()
                        .map_or(true, |name| name == g.name)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, group_key))
    }

    async fn is_member_of_group(&self, user_id: &str, group_id: &str) -> RepoResult<bool> {
        let state = self.state.read();
        Ok(state
            .members
            .iter()
            .any(|(g, u)| g == group_id && u == user_id))
    }

    async fn add_member(&self, user_id: &str, group_id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        if state
            .members
            .iter()
            .any(|(g, u)| g == group_id && u == user_id)
        {
            return Err(RepoError::new(
                RepoErrorCode::UserIsAlreadyAMemberOfGroup,
                format!("user {} is already a member of group {}", user_id, group_id),
            ));
        }
        state
            .members
            .push((group_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn remove_member(&self, user_id: &str, group_id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.members.len();
        state
            .members
            .retain(|(g, u)| !(g == group_id && u == user_id));
        if state.members.len() == before {
            return Err(RepoError::new(
                RepoErrorCode::UserIsNotAMemberOfGroup,
                format!("user {} is not a member of group {}", user_id, group_id),
            ));
        }
        Ok(())
    }

    async fn get_group_members(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<User>, usize)> {
        let state = self.state.read();
        let matches: Vec<User> = state
            .users
            .iter()
            .filter(|u| {
                state
                    .members
                    .iter()
                    .any(|(g, member_id)| g == group_id && member_id == &u.id)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, user_key))
    }

    async fn is_attached_to_group(&self, group_id: &str, policy_id: &str) -> RepoResult<bool> {
        let state = self.state.read();
        Ok(state
            .attachments
            .iter()
            .any(|(g, p)| g == group_id && p == policy_id))
    }

    async fn attach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        if state
            .attachments
            .iter()
            .any(|(g, p)| g == group_id && p == policy_id)
        {
            return Err(RepoError::new(
                RepoErrorCode::PolicyIsAlreadyAttachedToGroup,
                format!("policy {} is already attached to group {}", policy_id, group_id),
            ));
        }
        state
            .attachments
            .push((group_id.to_string(), policy_id.to_string()));
        Ok(())
    }

    async fn detach_policy(&self, group_id: &str, policy_id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.attachments.len();
        state
            .attachments
            .retain(|(g, p)| !(g == group_id && p == policy_id));
        if state.attachments.len() == before {
            return Err(RepoError::new(
                RepoErrorCode::PolicyIsNotAttachedToGroup,
                format!("policy {} is not attached to group {}", policy_id, group_id),
            ));
        }
        Ok(())
    }

    async fn get_attached_policies(
        &self,
        group_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Policy>, usize)> {
        let state = self.state.read();
        let matches: Vec<Policy> = state
            .policies
            .iter()
            .filter(|p| {
                state
                    .attachments
                    .iter()
                    .any(|(g, policy_id)| g == group_id && policy_id == &p.id)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, policy_key))
    }

    async fn add_policy(&self, policy: Policy) -> RepoResult<Policy> {
        let mut state = self.state.write();
        if state
            .policies
            .iter()
            .any(|p| p.org == policy.org && p.name == policy.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::PolicyAlreadyExist,
                format!(
                    "policy with org {} and name {} already exists",
                    policy.org, policy.name
                ),
            ));
        }
        state.policies.push(policy.clone());
        Ok(policy)
    }

    async fn get_policy_by_name(&self, org: &str, name: &str) -> RepoResult<Policy> {
        let state = self.state.read();
        state
            .policies
            .iter()
            .find(|p| p.org == org && p.name == name)
            .cloned()
            .ok_or_else(|| {
                not_found(
                    RepoErrorCode::PolicyNotFound,
                    format!("policy with org {} and name {} not found", org, name),
                )
            })
    }

    async fn update_policy(&self, policy: Policy) -> RepoResult<Policy> {
        let mut state = self.state.write();
        if state
            .policies
            .iter()
            .any(|p| p.id != policy.id && p.org == policy.org && p.name == policy.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::PolicyAlreadyExist,
                format!(
                    "policy with org {} and name {} already exists",
                    policy.org, policy.name
                ),
            ));
        }
        match state.policies.iter_mut().find(|p| p.id == policy.id) {
            Some(stored) => {
                *stored = policy.clone();
                Ok(policy)
            }
            None => Err(not_found(
                RepoErrorCode::PolicyNotFound,
                format!("policy {} not found", policy.id),
            )),
        }
    }

    async fn remove_policy(&self, id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.policies.len();
        state.policies.retain(|p| p.id != id);
        if state.policies.len() == before {
            return Err(not_found(
                RepoErrorCode::PolicyNotFound,
                format!("policy {} not found", id),
            ));
        }
        state.attachments.retain(|(_, policy_id)| policy_id != id);
        Ok(())
    }

    async fn get_policies_filtered(&self, filter: &Filter) -> RepoResult<(Vec<Policy>, usize)> {
        let state = self.state.read();
        let matches: Vec<Policy> = state
            .policies
            .iter()
            .filter(|p| {
                matches_org(&p.org, filter)
                    && matches_path_prefix(&p.path, filter)
                    && filter
                        .policy_name
                        .as_deref()
                        .map_or(true, |name| name == p.name)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, policy_key))
    }

    async fn get_attached_groups(
        &self,
        policy_id: &str,
        filter: &Filter,
    ) -> RepoResult<(Vec<Group>, usize)> {
        let state = self.state.read();
        let matches: Vec<Group> = state
            .groups
            .iter()
            .filter(|g| {
                state
                    .attachments
                    .iter()
                    .any(|(group_id, p)| group_id == &g.id && p == policy_id)
            })
            .cloned()
            .collect();
        Ok(paginate(matches, filter, group_key))
    }

    async fn add_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource> {
        let mut state = self.state.write();
        if state
            .proxies
            .iter()
            .any(|p| p.org == proxy.org && p.name == proxy.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::ProxyResourceAlreadyExist,
                format!(
                    "proxy resource with org {} and name {} already exists",
                    proxy.org, proxy.name
                ),
            ));
        }
        state.proxies.push(proxy.clone());
        Ok(proxy)
    }

    async fn get_proxy_resource_by_name(
        &self,
        org: &str,
        name: &str,
    ) -> RepoResult<ProxyResource> {
        let state = self.state.read();
        state
            .proxies
            .iter()
            .find(|p| p.org == org && p.name == name)
            .cloned()
            .ok_or_else(|| {
                not_found(
                    RepoErrorCode::ProxyResourceNotFound,
                    format!("proxy resource with org {} and name {} not found", org, name),
                )
            })
    }

    async fn update_proxy_resource(&self, proxy: ProxyResource) -> RepoResult<ProxyResource> {
        let mut state = self.state.write();
        if state
            .proxies
            .iter()
            .any(|p| p.id != proxy.id && p.org == proxy.org && p.name == proxy.name)
        {
            return Err(RepoError::new(
                RepoErrorCode::ProxyResourceAlreadyExist,
                format!(
                    "proxy resource with org {} and name {} already exists",
                    proxy.org, proxy.name
                ),
            ));
        }
        match state.proxies.iter_mut().find(|p| p.id == proxy.id) {
            Some(stored) => {
                *stored = proxy.clone();
                Ok(proxy)
            }
            None => Err(not_found(
                RepoErrorCode::ProxyResourceNotFound,
                format!("proxy resource {} not found", proxy.id),
            )),
        }
    }

    async fn remove_proxy_resource(&self, id: &str) -> RepoResult<()> {
        let mut state = self.state.write();
        let before = state.proxies.len();
        state.proxies.retain(|p| p.id != id);
        if state.proxies.len() == before {
            return Err(not_found(
                RepoErrorCode::ProxyResourceNotFound,
                format!("proxy resource {} not found", id),
            ));
        }
        Ok(())
    }

    async fn get_proxy_resources(
        &self,
        filter: &Filter,
    ) -> RepoResult<(Vec<ProxyResource>, usize)> {
        let state = self.state.read();
        let matches: Vec<ProxyResource> = state
            .proxies
            .iter()
            .filter(|p| matches_org(&p.org, filter) && matches_path_prefix(&p.path, filter))
            .cloned()
            .collect();
        Ok(paginate(matches, filter, proxy_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(id: &str, org: &str, name: &str, path: &str) -> Group {
        let now = Utc::now();
        Group {
            id: id.to_string(),
            name: name.to_string(),
            org: org.to_string(),
            path: path.to_string(),
            urn: format!("urn:iws:iam:{}:group{}{}", org, path, name),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn uniqueness_is_enforced() {
        let repo = MemoryRepository::new();
        repo.add_group(group("1", "org1", "g", "/")).await.unwrap();

        let err = repo
            .add_group(group("2", "org1", "g", "/other/"))
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::GroupAlreadyExist);

        // same name in a different org is a different entity
        repo.add_group(group("3", "org2", "g", "/")).await.unwrap();

        // renaming onto a taken name fails too
        repo.add_group(group("4", "org1", "g2", "/")).await.unwrap();
        let err = repo
            .update_group(group("4", "org1", "g", "/"))
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::GroupAlreadyExist);
    }

    #[tokio::test]
    async fn filtered_queries_report_pre_pagination_totals() {
        let repo = MemoryRepository::new();
        for i in 0..5 {
            repo.add_group(group(&i.to_string(), "org1", &format!("g{}", i), "/teams/"))
                .await
                .unwrap();
        }
        repo.add_group(group("9", "org2", "other", "/teams/"))
            .await
            .unwrap();

        let filter = Filter {
            org: Some("org1".to_string()),
            limit: 2,
            offset: 1,
            order_by: Some("name".to_string()),
            ..Filter::default()
        };
        let (page, total) = repo.get_groups_filtered(&filter).await.unwrap();
        assert_eq!(total, 5);
        let names: Vec<_> = page.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["g1", "g2"]);

        let filter = Filter {
            org: Some("org1".to_string()),
            order_by: Some("name-desc".to_string()),
            ..Filter::default()
        };
        let (page, _) = repo.get_groups_filtered(&filter).await.unwrap();
        assert_eq!(page[0].name, "g4");
    }

    #[tokio::test]
    async fn relationship_rows_deduplicate_and_cascade() {
        let repo = MemoryRepository::new();
        repo.add_group(group("g1", "org1", "g", "/")).await.unwrap();

        repo.add_member("u1", "g1").await.unwrap();
        let err = repo.add_member("u1", "g1").await.unwrap_err();
        assert_eq!(err.code, RepoErrorCode::UserIsAlreadyAMemberOfGroup);

        repo.attach_policy("g1", "p1").await.unwrap();
        let err = repo.attach_policy("g1", "p1").await.unwrap_err();
        assert_eq!(err.code, RepoErrorCode::PolicyIsAlreadyAttachedToGroup);

        repo.remove_group("g1").await.unwrap();
        assert!(!repo.is_member_of_group("u1", "g1").await.unwrap());
        assert!(!repo.is_attached_to_group("g1", "p1").await.unwrap());
    }
}
