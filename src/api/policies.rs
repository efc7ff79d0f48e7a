use chrono::Utc;

use crate::actions;
use crate::errors::{ApiError, ErrorCode};
use crate::repository::RepoErrorCode;
use crate::types::{Filter, Group, Policy, RequestInfo, Statement};
use crate::urn::{create_urn, ResourceType};
use crate::validation;

use super::{IamApi, NAMED_ORDER_FIELDS};

impl IamApi {
    pub async fn add_policy(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        path: &str,
        statements: Vec<Statement>,
    ) -> Result<Policy, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_path("path", path)?;
        validation::check_statements(&statements)?;

        match self.repo.get_policy_by_name(org, name).await {
            Ok(_) => return Err(policy_already_exist(org, name)),
            Err(err) if err.code == RepoErrorCode::PolicyNotFound => {}
            Err(err) => return Err(ApiError::unknown(err)),
        }

        let policy_urn = create_urn(org, ResourceType::Policy, path, name);
        self.authz
            .authorize(request, actions::POLICY_CREATE, &policy_urn)
            .await?;

        let now = Utc::now();
        let policy = Policy {
            id: Self::random_id(),
            name: name.to_string(),
            org: org.to_string(),
            path: path.to_string(),
            urn: policy_urn,
            statements,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(org, name, path, "creating policy");
        match self.repo.add_policy(policy).await {
            Ok(policy) => Ok(policy),
            Err(err) if err.code == RepoErrorCode::PolicyAlreadyExist => {
                Err(policy_already_exist(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn get_policy_by_name(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<Policy, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let policy = self.fetch_policy(org, name).await?;
        self.authz
            .authorize(request, actions::POLICY_GET, &policy.urn)
            .await?;
        Ok(policy)
    }

    pub async fn list_policies(
        &self,
        request: &RequestInfo,
        filter: &Filter,
    ) -> Result<(Vec<Policy>, usize), ApiError> {
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let (policies, total) = self
            .repo
            .get_policies_filtered(filter)
            .await
            .map_err(ApiError::unknown)?;
        let policies = self
            .authz
            .filter_authorized(request, actions::POLICY_LIST, policies)
            .await?;
        Ok((policies, total))
    }

    /// Replace a policy's name, path, and statements. A rename needs the
    /// update action on both the current and the new URN.
    pub async fn update_policy(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        new_name: &str,
        new_path: &str,
        new_statements: Vec<Statement>,
    ) -> Result<Policy, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_name("new name", new_name)?;
        validation::check_path("new path", new_path)?;
        validation::check_statements(&new_statements)?;

        let policy = self.fetch_policy(org, name).await?;
        self.authz
            .authorize(request, actions::POLICY_UPDATE, &policy.urn)
            .await?;

        if new_name != policy.name {
            match self.repo.get_policy_by_name(org, new_name).await {
                Ok(_) => {
                    return Err(ApiError::new(
                        ErrorCode::PolicyAlreadyExist,
                        format!("Policy name: {} already exists", new_name),
                    ));
                }
                Err(err) if err.code == RepoErrorCode::PolicyNotFound => {}
                Err(err) => return Err(ApiError::unknown(err)),
            }
        }

        let new_urn = create_urn(org, ResourceType::Policy, new_path, new_name);
        self.authz
            .authorize(request, actions::POLICY_UPDATE, &new_urn)
            .await?;

        let updated = Policy {
            name: new_name.to_string(),
            path: new_path.to_string(),
            urn: new_urn,
            statements: new_statements,
            updated_at: Utc::now(),
            ..policy
        };
        match self.repo.update_policy(updated).await {
            Ok(policy) => Ok(policy),
            Err(err) if err.code == RepoErrorCode::PolicyNotFound => {
                Err(policy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    /// Remove a policy; the repository detaches it from every group.
    pub async fn remove_policy(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let policy = self.fetch_policy(org, name).await?;
        self.authz
            .authorize(request, actions::POLICY_DELETE, &policy.urn)
            .await?;
        tracing::debug!(org, name, "removing policy");
        match self.repo.remove_policy(&policy.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::PolicyNotFound => {
                Err(policy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn list_attached_groups(
        &self,
        request: &RequestInfo,
        org: &str,
        policy_name: &str,
        filter: &Filter,
    ) -> Result<(Vec<Group>, usize), ApiError> {
        validation::check_org(org)?;
        validation::check_name("policy", policy_name)?;
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let policy = self.fetch_policy(org, policy_name).await?;
        self.authz
            .authorize(request, actions::POLICY_LIST_ATTACHED_GROUPS, &policy.urn)
            .await?;
        self.repo
            .get_attached_groups(&policy.id, filter)
            .await
            .map_err(ApiError::unknown)
    }

    pub(crate) async fn fetch_policy(&self, org: &str, name: &str) -> Result<Policy, ApiError> {
        match self.repo.get_policy_by_name(org, name).await {
            Ok(policy) => Ok(policy),
            Err(err) if err.code == RepoErrorCode::PolicyNotFound => {
                Err(policy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }
}

fn policy_not_found(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::PolicyByOrgAndNameNotFound,
        format!("Policy with org {} and name {} not found", org, name),
    )
}

fn policy_already_exist(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::PolicyAlreadyExist,
        format!(
            "Unable to create policy, policy with org {} and name {} already exist",
            org, name
        ),
    )
}
