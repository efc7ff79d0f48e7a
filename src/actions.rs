//! Action strings the resolver matches statements against.

pub const USER_CREATE: &str = "iam:user:create";
pub const USER_GET: &str = "iam:user:get";
pub const USER_LIST: &str = "iam:user:list";
pub const USER_UPDATE: &str = "iam:user:update";
pub const USER_DELETE: &str = "iam:user:delete";
pub const USER_LIST_GROUPS: &str = "iam:user:listGroups";

pub const GROUP_CREATE: &str = "iam:group:create";
pub const GROUP_GET: &str = "iam:group:get";
pub const GROUP_LIST: &str = "iam:group:list";
pub const GROUP_UPDATE: &str = "iam:group:update";
pub const GROUP_DELETE: &str = "iam:group:delete";
pub const GROUP_ADD_MEMBER: &str = "iam:group:addMember";
pub const GROUP_REMOVE_MEMBER: &str = "iam:group:removeMember";
pub const GROUP_LIST_MEMBERS: &str = "iam:group:listMembers";
pub const GROUP_ATTACH_POLICY: &str = "iam:group:attachPolicy";
pub const GROUP_DETACH_POLICY: &str = "iam:group:detachPolicy";
pub const GROUP_LIST_ATTACHED_POLICIES: &str = "iam:group:listAttachedPolicies";

pub const POLICY_CREATE: &str = "iam:policy:create";
pub const POLICY_GET: &str = "iam:policy:get";
pub const POLICY_LIST: &str = "iam:policy:list";
pub const POLICY_UPDATE: &str = "iam:policy:update";
pub const POLICY_DELETE: &str = "iam:policy:delete";
pub const POLICY_LIST_ATTACHED_GROUPS: &str = "iam:policy:listAttachedGroups";

pub const PROXY_RESOURCE_CREATE: &str = "iam:proxyResource:create";
pub const PROXY_RESOURCE_GET: &str = "iam:proxyResource:get";
pub const PROXY_RESOURCE_LIST: &str = "iam:proxyResource:list";
pub const PROXY_RESOURCE_UPDATE: &str = "iam:proxyResource:update";
pub const PROXY_RESOURCE_DELETE: &str = "iam:proxyResource:delete";
