use chrono::Utc;

use crate::actions;
use crate::errors::{ApiError, ErrorCode};
use crate::repository::RepoErrorCode;
use crate::types::{Filter, Group, RequestInfo, User};
use crate::urn::{create_urn, ResourceType};
use crate::validation;

use super::{IamApi, NAMED_ORDER_FIELDS, USER_ORDER_FIELDS};

impl IamApi {
    /// Register a user for an externally-authenticated identity.
    pub async fn add_user(
        &self,
        request: &RequestInfo,
        external_id: &str,
        path: &str,
    ) -> Result<User, ApiError> {
        validation::check_name("externalId", external_id)?;
        validation::check_path("path", path)?;

        match self.repo.get_user_by_external_id(external_id).await {
            Ok(_) => {
                return Err(ApiError::new(
                    ErrorCode::UserAlreadyExist,
                    format!(
                        "Unable to create user, user with externalId {} already exist",
                        external_id
                    ),
                ));
            }
            Err(err) if err.code == RepoErrorCode::UserNotFound => {}
            Err(err) => return Err(ApiError::unknown(err)),
        }

        let user_urn = create_urn("", ResourceType::User, path, external_id);
        self.authz
            .authorize(request, actions::USER_CREATE, &user_urn)
            .await?;

        let now = Utc::now();
        let user = User {
            id: Self::random_id(),
            external_id: external_id.to_string(),
            path: path.to_string(),
            urn: user_urn,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(external_id, path, "creating user");
        match self.repo.add_user(user).await {
            Ok(user) => Ok(user),
            Err(err) if err.code == RepoErrorCode::UserAlreadyExist => Err(ApiError::new(
                ErrorCode::UserAlreadyExist,
                format!(
                    "Unable to create user, user with externalId {} already exist",
                    external_id
                ),
            )),
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn get_user_by_external_id(
        &self,
        request: &RequestInfo,
        external_id: &str,
    ) -> Result<User, ApiError> {
        validation::check_name("externalId", external_id)?;

        let user = self.fetch_user(external_id).await?;
        self.authz
            .authorize(request, actions::USER_GET, &user.urn)
            .await?;
        Ok(user)
    }

    /// List users the caller may see. `total` is the repository's count
    /// before authorization filtering.
    pub async fn list_users(
        &self,
        request: &RequestInfo,
        filter: &Filter,
    ) -> Result<(Vec<User>, usize), ApiError> {
        validation::check_filter(filter, USER_ORDER_FIELDS)?;

        let (users, total) = self
            .repo
            .get_users_filtered(filter)
            .await
            .map_err(ApiError::unknown)?;
        let users = self
            .authz
            .filter_authorized(request, actions::USER_LIST, users)
            .await?;
        Ok((users, total))
    }

    /// Move a user to a new path. The caller needs update on both the
    /// current and the new URN.
    pub async fn update_user(
        &self,
        request: &RequestInfo,
        external_id: &str,
        new_path: &str,
    ) -> Result<User, ApiError> {
        validation::check_name("externalId", external_id)?;
        validation::check_path("path", new_path)?;

        let user = self.fetch_user(external_id).await?;
        let new_urn = create_urn("", ResourceType::User, new_path, external_id);
        self.authz
            .authorize_update(request, actions::USER_UPDATE, &user.urn, &new_urn)
            .await?;

        let updated = User {
            path: new_path.to_string(),
            urn: new_urn,
            updated_at: Utc::now(),
            ..user
        };
        match self.repo.update_user(updated).await {
            Ok(user) => Ok(user),
            Err(err) if err.code == RepoErrorCode::UserNotFound => {
                Err(user_not_found(external_id))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    /// Remove a user; the repository cascades its group memberships.
    pub async fn remove_user(
        &self,
        request: &RequestInfo,
        external_id: &str,
    ) -> Result<(), ApiError> {
        validation::check_name("externalId", external_id)?;

        let user = self.fetch_user(external_id).await?;
        self.authz
            .authorize(request, actions::USER_DELETE, &user.urn)
            .await?;
        tracing::debug!(external_id, "removing user");
        match self.repo.remove_user(&user.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::UserNotFound => {
                Err(user_not_found(external_id))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    /// Groups the user belongs to. Authorizes the user URN; the page comes
    /// back unfiltered since the target of the operation is the user.
    pub async fn list_groups_for_user(
        &self,
        request: &RequestInfo,
        external_id: &str,
        filter: &Filter,
    ) -> Result<(Vec<Group>, usize), ApiError> {
        validation::check_name("externalId", external_id)?;
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let user = self.fetch_user(external_id).await?;
        self.authz
            .authorize(request, actions::USER_LIST_GROUPS, &user.urn)
            .await?;
        self.repo
            .get_groups_by_user_id(&user.id, filter)
            .await
            .map_err(ApiError::unknown)
    }

    pub(crate) async fn fetch_user(&self, external_id: &str) -> Result<User, ApiError> {
        match self.repo.get_user_by_external_id(external_id).await {
            Ok(user) => Ok(user),
            Err(err) if err.code == RepoErrorCode::UserNotFound => {
                Err(user_not_found(external_id))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }
}

fn user_not_found(external_id: &str) -> ApiError {
    ApiError::new(
        ErrorCode::UserByExternalIdNotFound,
        format!("User with externalId {} not found", external_id),
    )
}
