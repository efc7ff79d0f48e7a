//! Idempotent seeding of users, groups, and policies from a JSON document.
//!
//! Everything goes through the entity services under the supplied request,
//! so seeded state obeys the same validation and URN invariants as state
//! created through the API. Running the same document twice is a no-op.

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::api::IamApi;
use crate::errors::ErrorCode;
use crate::types::{RequestInfo, Statement};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDefinition {
    pub external_id: String,
    #[serde(default = "default_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub org: String,
    pub name: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// External ids of member users.
    #[serde(default)]
    pub members: Vec<String>,
    /// Names of attached policies (same org as the group).
    #[serde(default)]
    pub policies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDefinition {
    pub org: String,
    pub name: String,
    #[serde(default = "default_path")]
    pub path: String,
    pub statements: Vec<Statement>,
}

fn default_path() -> String {
    "/".to_string()
}

/// Root structure of the bootstrap JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapDoc {
    #[serde(default)]
    pub users: Vec<UserDefinition>,
    #[serde(default)]
    pub policies: Vec<PolicyDefinition>,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

/// Load a bootstrap document from a JSON file and apply it.
pub async fn load_from_file(api: &IamApi, request: &RequestInfo, file_path: &str) -> Result<()> {
    tracing::info!("Loading bootstrap document from {}", file_path);

    let content = fs::read_to_string(file_path)
        .into_diagnostic()
        .map_err(|e| miette::miette!("Failed to read bootstrap file at '{}': {}", file_path, e))?;
    let doc: BootstrapDoc = serde_json::from_str(&content)
        .into_diagnostic()
        .map_err(|e| miette::miette!("Failed to parse bootstrap JSON: {}", e))?;

    load(api, request, doc).await
}

/// Apply a bootstrap document: users and policies first, then groups with
/// their memberships and attachments.
pub async fn load(api: &IamApi, request: &RequestInfo, doc: BootstrapDoc) -> Result<()> {
    let mut created = 0;
    let mut unchanged = 0;

    for user in &doc.users {
        match api.add_user(request, &user.external_id, &user.path).await {
            Ok(_) => created += 1,
            Err(err) if err.code == ErrorCode::UserAlreadyExist => unchanged += 1,
            Err(err) => return Err(err).into_diagnostic(),
        }
    }

    for policy in &doc.policies {
        match api
            .add_policy(
                request,
                &policy.org,
                &policy.name,
                &policy.path,
                policy.statements.clone(),
            )
            .await
        {
            Ok(_) => created += 1,
            Err(err) if err.code == ErrorCode::PolicyAlreadyExist => unchanged += 1,
            Err(err) => return Err(err).into_diagnostic(),
        }
    }

    for group in &doc.groups {
        match api
            .add_group(request, &group.org, &group.name, &group.path)
            .await
        {
            Ok(_) => created += 1,
            Err(err) if err.code == ErrorCode::GroupAlreadyExist => unchanged += 1,
            Err(err) => return Err(err).into_diagnostic(),
        }

        for external_id in &group.members {
            match api
                .add_member(request, external_id, &group.org, &group.name)
                .await
            {
                Ok(()) => {}
                Err(err) if err.code == ErrorCode::UserIsAlreadyAMemberOfGroup => {}
                Err(err) => return Err(err).into_diagnostic(),
            }
        }

        for policy_name in &group.policies {
            match api
                .attach_policy(request, &group.org, &group.name, policy_name)
                .await
            {
                Ok(()) => {}
                Err(err) if err.code == ErrorCode::PolicyIsAlreadyAttachedToGroup => {}
                Err(err) => return Err(err).into_diagnostic(),
            }
        }
    }

    tracing::info!(
        "Bootstrap complete: {} created, {} unchanged",
        created,
        unchanged
    );
    Ok(())
}
