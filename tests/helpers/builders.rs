use std::sync::Arc;

use warden::api::IamApi;
use warden::types::{Group, Policy, RequestInfo, Statement, User};

use super::ScriptedRepo;

/// The bootstrap administrator every fixture uses for seeding.
pub fn admin() -> RequestInfo {
    RequestInfo::new("123456", true)
}

/// A plain authenticated caller.
pub fn caller(external_id: &str) -> RequestInfo {
    RequestInfo::new(external_id, false)
}

pub fn statement(effect: &str, actions: &[&str], resources: &[&str]) -> Statement {
    Statement {
        effect: effect.to_string(),
        actions: actions.iter().map(|s| s.to_string()).collect(),
        resources: resources.iter().map(|s| s.to_string()).collect(),
    }
}

/// An `IamApi` over a recording repository, with seeding shortcuts that go
/// through the service layer as the administrator.
pub struct TestFixture {
    pub repo: Arc<ScriptedRepo>,
    pub api: IamApi,
}

impl TestFixture {
    pub fn new() -> Self {
        let repo = Arc::new(ScriptedRepo::new());
        let api = IamApi::new(repo.clone());
        Self { repo, api }
    }

    pub async fn seed_user(&self, external_id: &str, path: &str) -> User {
        self.api
            .add_user(&admin(), external_id, path)
            .await
            .expect("seed user")
    }

    pub async fn seed_group(&self, org: &str, name: &str, path: &str) -> Group {
        self.api
            .add_group(&admin(), org, name, path)
            .await
            .expect("seed group")
    }

    pub async fn seed_policy(
        &self,
        org: &str,
        name: &str,
        path: &str,
        statements: Vec<Statement>,
    ) -> Policy {
        self.api
            .add_policy(&admin(), org, name, path, statements)
            .await
            .expect("seed policy")
    }

    /// Give `external_id` (an existing user) the supplied statements via a
    /// fresh group and policy in `org`.
    pub async fn grant(
        &self,
        external_id: &str,
        org: &str,
        group_name: &str,
        policy_name: &str,
        statements: Vec<Statement>,
    ) {
        self.seed_group(org, group_name, "/").await;
        self.seed_policy(org, policy_name, "/", statements).await;
        self.api
            .add_member(&admin(), external_id, org, group_name)
            .await
            .expect("seed membership");
        self.api
            .attach_policy(&admin(), org, group_name, policy_name)
            .await
            .expect("seed attachment");
    }
}
