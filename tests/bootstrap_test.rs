mod helpers;

use std::io::Write;

use helpers::{admin, caller, TestFixture};
use warden::bootstrap;
use warden::settings::Settings;
use warden::types::Filter;

fn sample_doc() -> serde_json::Value {
    serde_json::json!({
        "users": [
            { "external_id": "alice", "path": "/staff/" },
            { "external_id": "bob" }
        ],
        "policies": [
            {
                "org": "example",
                "name": "policy-readers",
                "path": "/seed/",
                "statements": [
                    {
                        "effect": "allow",
                        "actions": ["iam:policy:get", "iam:policy:list"],
                        "resources": ["urn:iws:iam:example:policy/*"]
                    }
                ]
            }
        ],
        "groups": [
            {
                "org": "example",
                "name": "readers",
                "path": "/seed/",
                "members": ["alice", "bob"],
                "policies": ["policy-readers"]
            }
        ]
    })
}

#[tokio::test]
async fn bootstrap_from_file_is_idempotent() {
    let fx = TestFixture::new();

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{}", sample_doc()).expect("write doc");
    let path = file.path().to_str().expect("utf-8 path").to_string();

    bootstrap::load_from_file(&fx.api, &admin(), &path)
        .await
        .unwrap();
    // a second run sees everything in place and changes nothing
    bootstrap::load_from_file(&fx.api, &admin(), &path)
        .await
        .unwrap();

    let (users, total) = fx
        .api
        .list_users(&admin(), &Filter::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(users.len(), 2);

    let (members, total) = fx
        .api
        .list_members(&admin(), "example", "readers", &Filter::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(members.len(), 2);

    // the seeded grant is live: alice can read policies in the org
    let policy = fx
        .api
        .get_policy_by_name(&caller("alice"), "example", "policy-readers")
        .await
        .unwrap();
    assert_eq!(policy.urn, "urn:iws:iam:example:policy/seed/policy-readers");
}

#[tokio::test]
async fn bootstrap_rejects_invalid_documents() {
    let fx = TestFixture::new();

    let doc = bootstrap::BootstrapDoc {
        users: vec![bootstrap::UserDefinition {
            external_id: "**!^#~".to_string(),
            path: "/".to_string(),
        }],
        ..bootstrap::BootstrapDoc::default()
    };
    let err = bootstrap::load(&fx.api, &admin(), doc).await.unwrap_err();
    assert!(err.to_string().contains("Invalid parameter: externalId"));
}

#[test]
fn settings_defaults_without_file() {
    let settings = Settings::load("does-not-exist").unwrap();
    assert_eq!(settings.database.url, "memory://");
    assert_eq!(settings.admin.external_id, "admin");
    assert!(settings.bootstrap.file.is_none());
}

#[test]
fn settings_load_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("warden.toml");
    std::fs::write(
        &path,
        r#"
[database]
url = "postgres://warden@localhost/warden"

[admin]
external_id = "root"

[bootstrap]
file = "seed.json"
"#,
    )
    .expect("write config");

    let settings = Settings::load(path.to_str().expect("utf-8 path")).unwrap();
    assert_eq!(settings.database.url, "postgres://warden@localhost/warden");
    assert_eq!(settings.admin.external_id, "root");
    assert_eq!(settings.bootstrap.file.as_deref(), Some("seed.json"));
}
