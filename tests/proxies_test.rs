mod helpers;

use helpers::{admin, caller, statement, TestFixture};
use warden::api::proxies::ProxyResourceInput;
use warden::errors::ErrorCode;
use warden::types::{Filter, ProxyEndpoint};

fn users_endpoint() -> ProxyResourceInput {
    ProxyResourceInput {
        endpoint: ProxyEndpoint {
            host: "internal.example.com".to_string(),
            port: 8080,
            path: "/api/users/{id}".to_string(),
            method: "GET".to_string(),
        },
        required_action: "example:user:get".to_string(),
        required_resource: "urn:ews:example:instance/users/*".to_string(),
        urn_pattern: "urn:ews:example:instance/users/*".to_string(),
    }
}

#[tokio::test]
async fn add_and_get_proxy_resource() {
    let fx = TestFixture::new();

    let proxy = fx
        .api
        .add_proxy_resource(&admin(), "example", "get-user", "/routes/", users_endpoint())
        .await
        .unwrap();
    assert_eq!(proxy.urn, "urn:iws:iam:example:proxy/routes/get-user");
    assert_eq!(proxy.endpoint.method, "GET");
    assert_eq!(proxy.required_action, "example:user:get");

    let fetched = fx
        .api
        .get_proxy_resource_by_name(&admin(), "example", "get-user")
        .await
        .unwrap();
    assert_eq!(fetched, proxy);
}

#[tokio::test]
async fn add_duplicate_proxy_resource() {
    let fx = TestFixture::new();
    fx.api
        .add_proxy_resource(&admin(), "example", "get-user", "/routes/", users_endpoint())
        .await
        .unwrap();

    let err = fx
        .api
        .add_proxy_resource(&admin(), "example", "get-user", "/routes/", users_endpoint())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProxyResourceAlreadyExist);
    assert_eq!(
        err.message,
        "Unable to create proxy resource, proxy resource with org example and name get-user already exist"
    );
}

#[tokio::test]
async fn endpoint_validation() {
    let fx = TestFixture::new();

    let mut input = users_endpoint();
    input.endpoint.method = "TRACE".to_string();
    let err = fx
        .api
        .add_proxy_resource(&admin(), "example", "bad", "/routes/", input)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidParameterError);
    assert_eq!(err.message, "Invalid parameter: method TRACE");
    assert!(fx.repo.calls().is_empty());

    let mut input = users_endpoint();
    input.required_action = "example:*".to_string();
    let err = fx
        .api
        .add_proxy_resource(&admin(), "example", "bad", "/routes/", input)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Invalid parameter: action example:*");

    let mut input = users_endpoint();
    input.urn_pattern = "not-a-urn".to_string();
    let err = fx
        .api
        .add_proxy_resource(&admin(), "example", "bad", "/routes/", input)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Invalid parameter: urnPattern not-a-urn");
}

#[tokio::test]
async fn update_proxy_resource_rename() {
    let fx = TestFixture::new();
    fx.api
        .add_proxy_resource(&admin(), "example", "get-user", "/routes/", users_endpoint())
        .await
        .unwrap();

    let mut input = users_endpoint();
    input.endpoint.method = "POST".to_string();
    let updated = fx
        .api
        .update_proxy_resource(&admin(), "example", "get-user", "create-user", "/routes/", input)
        .await
        .unwrap();
    assert_eq!(updated.urn, "urn:iws:iam:example:proxy/routes/create-user");
    assert_eq!(updated.endpoint.method, "POST");

    let err = fx
        .api
        .get_proxy_resource_by_name(&admin(), "example", "get-user")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProxyResourceByOrgAndNameNotFound);
    assert_eq!(
        err.message,
        "Proxy resource with org example and name get-user not found"
    );
}

#[tokio::test]
async fn update_proxy_resource_rename_conflict() {
    let fx = TestFixture::new();
    fx.api
        .add_proxy_resource(&admin(), "example", "r1", "/routes/", users_endpoint())
        .await
        .unwrap();
    fx.api
        .add_proxy_resource(&admin(), "example", "r2", "/routes/", users_endpoint())
        .await
        .unwrap();

    let err = fx
        .api
        .update_proxy_resource(&admin(), "example", "r1", "r2", "/routes/", users_endpoint())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProxyResourceAlreadyExist);
    assert_eq!(err.message, "Proxy resource name: r2 already exists");
}

#[tokio::test]
async fn list_proxy_resources_is_permission_filtered() {
    let fx = TestFixture::new();
    fx.api
        .add_proxy_resource(&admin(), "example", "visible", "/routes/", users_endpoint())
        .await
        .unwrap();
    fx.api
        .add_proxy_resource(&admin(), "example", "hidden", "/internal/", users_endpoint())
        .await
        .unwrap();
    fx.seed_user("1234", "/").await;
    fx.grant(
        "1234",
        "example",
        "callers",
        "caller-perms",
        vec![statement(
            "allow",
            &["iam:proxyResource:list"],
            &["urn:iws:iam:example:proxy/routes/*"],
        )],
    )
    .await;

    let (proxies, total) = fx
        .api
        .list_proxy_resources(&caller("1234"), &Filter::default())
        .await
        .unwrap();
    assert_eq!(proxies.len(), 1);
    assert_eq!(proxies[0].name, "visible");
    assert_eq!(total, 2);
}

#[tokio::test]
async fn remove_proxy_resource() {
    let fx = TestFixture::new();
    fx.api
        .add_proxy_resource(&admin(), "example", "get-user", "/routes/", users_endpoint())
        .await
        .unwrap();

    fx.api
        .remove_proxy_resource(&admin(), "example", "get-user")
        .await
        .unwrap();

    let err = fx
        .api
        .remove_proxy_resource(&admin(), "example", "get-user")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProxyResourceByOrgAndNameNotFound);
}
