use chrono::Utc;

use crate::actions;
use crate::errors::{ApiError, ErrorCode};
use crate::repository::RepoErrorCode;
use crate::types::{Filter, Group, Policy, RequestInfo, User};
use crate::urn::{create_urn, ResourceType};
use crate::validation;

use super::{IamApi, NAMED_ORDER_FIELDS, USER_ORDER_FIELDS};

impl IamApi {
    pub async fn add_group(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        path: &str,
    ) -> Result<Group, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_path("path", path)?;

        match self.repo.get_group_by_name(org, name).await {
            Ok(_) => return Err(group_already_exist(org, name)),
            Err(err) if err.code == RepoErrorCode::GroupNotFound => {}
            Err(err) => return Err(ApiError::unknown(err)),
        }

        let group_urn = create_urn(org, ResourceType::Group, path, name);
        self.authz
            .authorize(request, actions::GROUP_CREATE, &group_urn)
            .await?;

        let now = Utc::now();
        let group = Group {
            id: Self::random_id(),
            name: name.to_string(),
            org: org.to_string(),
            path: path.to_string(),
            urn: group_urn,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(org, name, path, "creating group");
        match self.repo.add_group(group).await {
            Ok(group) => Ok(group),
            Err(err) if err.code == RepoErrorCode::GroupAlreadyExist => {
                Err(group_already_exist(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn get_group_by_name(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<Group, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let group = self.fetch_group(org, name).await?;
        self.authz
            .authorize(request, actions::GROUP_GET, &group.urn)
            .await?;
        Ok(group)
    }

    pub async fn list_groups(
        &self,
        request: &RequestInfo,
        filter: &Filter,
    ) -> Result<(Vec<Group>, usize), ApiError> {
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let (groups, total) = self
            .repo
            .get_groups_filtered(filter)
            .await
            .map_err(ApiError::unknown)?;
        let groups = self
            .authz
            .filter_authorized(request, actions::GROUP_LIST, groups)
            .await?;
        Ok((groups, total))
    }

    /// Rename and/or move a group. Requires update on both the current and
    /// the new URN; a taken new name fails before anything is written.
    pub async fn update_group(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        new_name: &str,
        new_path: &str,
    ) -> Result<Group, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_name("new name", new_name)?;
        validation::check_path("new path", new_path)?;

        let group = self.fetch_group(org, name).await?;
        self.authz
            .authorize(request, actions::GROUP_UPDATE, &group.urn)
            .await?;

        if new_name != group.name {
            match self.repo.get_group_by_name(org, new_name).await {
                Ok(_) => {
                    return Err(ApiError::new(
                        ErrorCode::GroupAlreadyExist,
                        format!("Group name: {} already exists", new_name),
                    ));
                }
                Err(err) if err.code == RepoErrorCode::GroupNotFound => {}
                Err(err) => return Err(ApiError::unknown(err)),
            }
        }

        let new_urn = create_urn(org, ResourceType::Group, new_path, new_name);
        self.authz
            .authorize(request, actions::GROUP_UPDATE, &new_urn)
            .await?;

        let updated = Group {
            name: new_name.to_string(),
            path: new_path.to_string(),
            urn: new_urn,
            updated_at: Utc::now(),
            ..group
        };
        match self.repo.update_group(updated).await {
            Ok(group) => Ok(group),
            Err(err) if err.code == RepoErrorCode::GroupNotFound => {
                Err(group_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    /// Remove a group; the repository detaches its policies and members
    /// without deleting them.
    pub async fn remove_group(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let group = self.fetch_group(org, name).await?;
        self.authz
            .authorize(request, actions::GROUP_DELETE, &group.urn)
            .await?;
        tracing::debug!(org, name, "removing group");
        match self.repo.remove_group(&group.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::GroupNotFound => {
                Err(group_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    /// Add a user to a group. Users are org-less and may join groups in
    /// any org.
    pub async fn add_member(
        &self,
        request: &RequestInfo,
        external_id: &str,
        org: &str,
        group_name: &str,
    ) -> Result<(), ApiError> {
        validation::check_name("externalId", external_id)?;
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_ADD_MEMBER, &group.urn)
            .await?;

        let user = self.fetch_user(external_id).await?;
        let is_member = self
            .repo
            .is_member_of_group(&user.id, &group.id)
            .await
            .map_err(ApiError::unknown)?;
        if is_member {
            return Err(member_conflict(external_id, org, group_name, true));
        }
        match self.repo.add_member(&user.id, &group.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::UserIsAlreadyAMemberOfGroup => {
                Err(member_conflict(external_id, org, group_name, true))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn remove_member(
        &self,
        request: &RequestInfo,
        external_id: &str,
        org: &str,
        group_name: &str,
    ) -> Result<(), ApiError> {
        validation::check_name("externalId", external_id)?;
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_REMOVE_MEMBER, &group.urn)
            .await?;

        let user = self.fetch_user(external_id).await?;
        let is_member = self
            .repo
            .is_member_of_group(&user.id, &group.id)
            .await
            .map_err(ApiError::unknown)?;
        if !is_member {
            return Err(member_conflict(external_id, org, group_name, false));
        }
        match self.repo.remove_member(&user.id, &group.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::UserIsNotAMemberOfGroup => {
                Err(member_conflict(external_id, org, group_name, false))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn list_members(
        &self,
        request: &RequestInfo,
        org: &str,
        group_name: &str,
        filter: &Filter,
    ) -> Result<(Vec<User>, usize), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;
        validation::check_filter(filter, USER_ORDER_FIELDS)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_LIST_MEMBERS, &group.urn)
            .await?;
        self.repo
            .get_group_members(&group.id, filter)
            .await
            .map_err(ApiError::unknown)
    }

    /// Attach a policy to a group. The policy is resolved inside the
    /// group's org, so attachments never cross orgs.
    pub async fn attach_policy(
        &self,
        request: &RequestInfo,
        org: &str,
        group_name: &str,
        policy_name: &str,
    ) -> Result<(), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;
        validation::check_name("policy", policy_name)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_ATTACH_POLICY, &group.urn)
            .await?;

        let policy = self.fetch_policy(org, policy_name).await?;
        let attached = self
            .repo
            .is_attached_to_group(&group.id, &policy.id)
            .await
            .map_err(ApiError::unknown)?;
        if attached {
            return Err(attachment_conflict(org, policy_name, group_name, true));
        }
        match self.repo.attach_policy(&group.id, &policy.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::PolicyIsAlreadyAttachedToGroup => {
                Err(attachment_conflict(org, policy_name, group_name, true))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn detach_policy(
        &self,
        request: &RequestInfo,
        org: &str,
        group_name: &str,
        policy_name: &str,
    ) -> Result<(), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;
        validation::check_name("policy", policy_name)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_DETACH_POLICY, &group.urn)
            .await?;

        let policy = self.fetch_policy(org, policy_name).await?;
        let attached = self
            .repo
            .is_attached_to_group(&group.id, &policy.id)
            .await
            .map_err(ApiError::unknown)?;
        if !attached {
            return Err(attachment_conflict(org, policy_name, group_name, false));
        }
        match self.repo.detach_policy(&group.id, &policy.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::PolicyIsNotAttachedToGroup => {
                Err(attachment_conflict(org, policy_name, group_name, false))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn list_attached_policies(
        &self,
        request: &RequestInfo,
        org: &str,
        group_name: &str,
        filter: &Filter,
    ) -> Result<(Vec<Policy>, usize), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", group_name)?;
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let group = self.fetch_group(org, group_name).await?;
        self.authz
            .authorize(request, actions::GROUP_LIST_ATTACHED_POLICIES, &group.urn)
            .await?;
        self.repo
            .get_attached_policies(&group.id, filter)
            .await
            .map_err(ApiError::unknown)
    }

    pub(crate) async fn fetch_group(&self, org: &str, name: &str) -> Result<Group, ApiError> {
        match self.repo.get_group_by_name(org, name).await {
            Ok(group) => Ok(group),
            Err(err) if err.code == RepoErrorCode::GroupNotFound => {
                Err(group_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }
}

fn group_not_found(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::GroupByOrgAndNameNotFound,
        format!("Group with org {} and name {} not found", org, name),
    )
}

fn group_already_exist(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::GroupAlreadyExist,
        format!(
            "Unable to create group, group with org {} and name {} already exist",
            org, name
        ),
    )
}

fn member_conflict(external_id: &str, org: &str, group_name: &str, present: bool) -> ApiError {
    if present {
        ApiError::new(
            ErrorCode::UserIsAlreadyAMemberOfGroup,
            format!(
                "User with externalId {} is already a member of group with org {} and name {}",
                external_id, org, group_name
            ),
        )
    } else {
        ApiError::new(
            ErrorCode::UserIsNotAMemberOfGroup,
            format!(
                "User with externalId {} is not a member of group with org {} and name {}",
                external_id, org, group_name
            ),
        )
    }
}

fn attachment_conflict(org: &str, policy_name: &str, group_name: &str, present: bool) -> ApiError {
    if present {
        ApiError::new(
            ErrorCode::PolicyIsAlreadyAttachedToGroup,
            format!(
                "Policy with org {} and name {} is already attached to group {}",
                org, policy_name, group_name
            ),
        )
    } else {
        ApiError::new(
            ErrorCode::PolicyIsNotAttachedToGroup,
            format!(
                "Policy with org {} and name {} is not attached to group {}",
                org, policy_name, group_name
            ),
        )
    }
}
