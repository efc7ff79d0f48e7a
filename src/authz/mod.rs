//! Authorization resolver.
//!
//! Aggregates the caller's statements by traversing user -> groups ->
//! attached policies, always in that direction, and evaluates them against
//! the requested (action, resource) pair. Nothing is cached across calls;
//! every authorization reads the current persisted state.

pub mod evaluator;

use std::sync::Arc;

use crate::errors::ApiError;
use crate::repository::{RepoErrorCode, Repository};
use crate::types::{Filter, RequestInfo, Resource, Statement};

use evaluator::Decision;

#[derive(Clone)]
pub struct Authorizer {
    repo: Arc<dyn Repository>,
}

impl Authorizer {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Decide whether the caller may perform `action` on `resource_urn`.
    ///
    /// Admin requests bypass evaluation entirely. For everyone else, a
    /// missing caller record and an explicit or default deny all surface as
    /// `UNAUTHORIZED_RESOURCES_ERROR`.
    pub async fn authorize(
        &self,
        request: &RequestInfo,
        action: &str,
        resource_urn: &str,
    ) -> Result<(), ApiError> {
        if request.admin {
            return Ok(());
        }
        let statements = self.caller_statements(request).await?;
        match evaluator::evaluate(&statements, action, resource_urn) {
            Decision::Allow => Ok(()),
            decision => {
                tracing::debug!(
                    identifier = %request.identifier,
                    action,
                    resource = resource_urn,
                    ?decision,
                    "access denied"
                );
                Err(ApiError::unauthorized(&request.identifier, resource_urn))
            }
        }
    }

    /// Double authorization for operations that move a resource to a new
    /// URN: the caller needs the action on both the current and the new
    /// location. The error cites whichever URN failed.
    pub async fn authorize_update(
        &self,
        request: &RequestInfo,
        action: &str,
        current_urn: &str,
        new_urn: &str,
    ) -> Result<(), ApiError> {
        self.authorize(request, action, current_urn).await?;
        self.authorize(request, action, new_urn).await
    }

    /// Reduce `candidates` to the subset the caller may see, preserving
    /// input order. The caller's statements are loaded once for the whole
    /// batch.
    pub async fn filter_authorized<T: Resource>(
        &self,
        request: &RequestInfo,
        action: &str,
        candidates: Vec<T>,
    ) -> Result<Vec<T>, ApiError> {
        if request.admin {
            return Ok(candidates);
        }
        let statements = self.caller_statements(request).await?;
        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                evaluator::evaluate(&statements, action, candidate.urn()) == Decision::Allow
            })
            .collect())
    }

    /// Load every statement attached to the caller through group
    /// membership. Two sequential loads: groups of the user, then the
    /// policies attached to each group.
    async fn caller_statements(&self, request: &RequestInfo) -> Result<Vec<Statement>, ApiError> {
        let user = match self
            .repo
            .get_user_by_external_id(&request.identifier)
            .await
        {
            Ok(user) => user,
            Err(err) if err.code == RepoErrorCode::UserNotFound => {
                return Err(ApiError::caller_not_found(&request.identifier));
            }
            Err(err) => return Err(ApiError::unknown(err)),
        };

        let (groups, _) = self
            .repo
            .get_groups_by_user_id(&user.id, &Filter::default())
            .await
            .map_err(ApiError::unknown)?;

        let mut statements = Vec::new();
        for group in &groups {
            let (policies, _) = self
                .repo
                .get_attached_policies(&group.id, &Filter::default())
                .await
                .map_err(ApiError::unknown)?;
            for policy in policies {
                statements.extend(policy.statements);
            }
        }
        Ok(statements)
    }
}
