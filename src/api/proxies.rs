use chrono::Utc;

use crate::actions;
use crate::errors::{ApiError, ErrorCode};
use crate::repository::RepoErrorCode;
use crate::types::{Filter, ProxyEndpoint, ProxyResource, RequestInfo};
use crate::urn::{create_urn, ResourceType};
use crate::validation;

use super::{IamApi, NAMED_ORDER_FIELDS};

/// Caller-supplied definition of a proxy resource: the routed endpoint plus
/// the IAM action/resource authorized before forwarding.
#[derive(Debug, Clone)]
pub struct ProxyResourceInput {
    pub endpoint: ProxyEndpoint,
    pub required_action: String,
    pub required_resource: String,
    pub urn_pattern: String,
}

impl ProxyResourceInput {
    fn validate(&self) -> Result<(), ApiError> {
        validation::check_proxy_endpoint(&self.endpoint)?;
        validation::check_action("action", &self.required_action)?;
        validation::check_resource_pattern("resource", &self.required_resource)?;
        validation::check_resource_pattern("urnPattern", &self.urn_pattern)?;
        Ok(())
    }
}

impl IamApi {
    pub async fn add_proxy_resource(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        path: &str,
        input: ProxyResourceInput,
    ) -> Result<ProxyResource, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_path("path", path)?;
        input.validate()?;

        match self.repo.get_proxy_resource_by_name(org, name).await {
            Ok(_) => return Err(proxy_already_exist(org, name)),
            Err(err) if err.code == RepoErrorCode::ProxyResourceNotFound => {}
            Err(err) => return Err(ApiError::unknown(err)),
        }

        let proxy_urn = create_urn(org, ResourceType::Proxy, path, name);
        self.authz
            .authorize(request, actions::PROXY_RESOURCE_CREATE, &proxy_urn)
            .await?;

        let now = Utc::now();
        let proxy = ProxyResource {
            id: Self::random_id(),
            name: name.to_string(),
            org: org.to_string(),
            path: path.to_string(),
            urn: proxy_urn,
            endpoint: input.endpoint,
            required_action: input.required_action,
            required_resource: input.required_resource,
            urn_pattern: input.urn_pattern,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(org, name, path, "creating proxy resource");
        match self.repo.add_proxy_resource(proxy).await {
            Ok(proxy) => Ok(proxy),
            Err(err) if err.code == RepoErrorCode::ProxyResourceAlreadyExist => {
                Err(proxy_already_exist(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn get_proxy_resource_by_name(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<ProxyResource, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let proxy = self.fetch_proxy_resource(org, name).await?;
        self.authz
            .authorize(request, actions::PROXY_RESOURCE_GET, &proxy.urn)
            .await?;
        Ok(proxy)
    }

    pub async fn list_proxy_resources(
        &self,
        request: &RequestInfo,
        filter: &Filter,
    ) -> Result<(Vec<ProxyResource>, usize), ApiError> {
        validation::check_filter(filter, NAMED_ORDER_FIELDS)?;

        let (proxies, total) = self
            .repo
            .get_proxy_resources(filter)
            .await
            .map_err(ApiError::unknown)?;
        let proxies = self
            .authz
            .filter_authorized(request, actions::PROXY_RESOURCE_LIST, proxies)
            .await?;
        Ok((proxies, total))
    }

    pub async fn update_proxy_resource(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
        new_name: &str,
        new_path: &str,
        input: ProxyResourceInput,
    ) -> Result<ProxyResource, ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;
        validation::check_name("new name", new_name)?;
        validation::check_path("new path", new_path)?;
        input.validate()?;

        let proxy = self.fetch_proxy_resource(org, name).await?;
        self.authz
            .authorize(request, actions::PROXY_RESOURCE_UPDATE, &proxy.urn)
            .await?;

        if new_name != proxy.name {
            match self.repo.get_proxy_resource_by_name(org, new_name).await {
                Ok(_) => {
                    return Err(ApiError::new(
                        ErrorCode::ProxyResourceAlreadyExist,
                        format!("Proxy resource name: {} already exists", new_name),
                    ));
                }
                Err(err) if err.code == RepoErrorCode::ProxyResourceNotFound => {}
                Err(err) => return Err(ApiError::unknown(err)),
            }
        }

        let new_urn = create_urn(org, ResourceType::Proxy, new_path, new_name);
        self.authz
            .authorize(request, actions::PROXY_RESOURCE_UPDATE, &new_urn)
            .await?;

        let updated = ProxyResource {
            name: new_name.to_string(),
            path: new_path.to_string(),
            urn: new_urn,
            endpoint: input.endpoint,
            required_action: input.required_action,
            required_resource: input.required_resource,
            urn_pattern: input.urn_pattern,
            updated_at: Utc::now(),
            ..proxy
        };
        match self.repo.update_proxy_resource(updated).await {
            Ok(proxy) => Ok(proxy),
            Err(err) if err.code == RepoErrorCode::ProxyResourceNotFound => {
                Err(proxy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    pub async fn remove_proxy_resource(
        &self,
        request: &RequestInfo,
        org: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        validation::check_org(org)?;
        validation::check_name("name", name)?;

        let proxy = self.fetch_proxy_resource(org, name).await?;
        self.authz
            .authorize(request, actions::PROXY_RESOURCE_DELETE, &proxy.urn)
            .await?;
        tracing::debug!(org, name, "removing proxy resource");
        match self.repo.remove_proxy_resource(&proxy.id).await {
            Ok(()) => Ok(()),
            Err(err) if err.code == RepoErrorCode::ProxyResourceNotFound => {
                Err(proxy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }

    async fn fetch_proxy_resource(&self, org: &str, name: &str) -> Result<ProxyResource, ApiError> {
        match self.repo.get_proxy_resource_by_name(org, name).await {
            Ok(proxy) => Ok(proxy),
            Err(err) if err.code == RepoErrorCode::ProxyResourceNotFound => {
                Err(proxy_not_found(org, name))
            }
            Err(err) => Err(ApiError::unknown(err)),
        }
    }
}

fn proxy_not_found(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::ProxyResourceByOrgAndNameNotFound,
        format!("Proxy resource with org {} and name {} not found", org, name),
    )
}

fn proxy_already_exist(org: &str, name: &str) -> ApiError {
    ApiError::new(
        ErrorCode::ProxyResourceAlreadyExist,
        format!(
            "Unable to create proxy resource, proxy resource with org {} and name {} already exist",
            org, name
        ),
    )
}
