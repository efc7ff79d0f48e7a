//! Entity services: the authorized operation envelope.
//!
//! Every operation validates its inputs, resolves the target, runs the
//! caller through the authorization resolver, and only then delegates to
//! the repository. Exactly one repository error code is translated per call
//! site; everything else collapses to `UNKNOWN_API_ERROR`.

pub mod groups;
pub mod policies;
pub mod proxies;
pub mod users;

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;

use crate::authz::Authorizer;
use crate::repository::Repository;

/// Sortable fields for user listings.
pub(crate) const USER_ORDER_FIELDS: &[&str] = &["external_id", "path", "created_at", "updated_at"];
/// Sortable fields for org-scoped entities (groups, policies, proxy resources).
pub(crate) const NAMED_ORDER_FIELDS: &[&str] = &["name", "path", "created_at", "updated_at"];

/// The IAM service facade. One instance serves all entity types; requests
/// are independent and share nothing but the repository.
#[derive(Clone)]
pub struct IamApi {
    repo: Arc<dyn Repository>,
    authz: Authorizer,
}

impl IamApi {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        let authz = Authorizer::new(repo.clone());
        Self { repo, authz }
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authz
    }

    /// 24 random bytes, base64url. Used for every entity id.
    pub(crate) fn random_id() -> String {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        Base64UrlUnpadded::encode_string(&bytes)
    }
}
