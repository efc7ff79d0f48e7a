use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub admin: Admin,
    #[serde(default)]
    pub bootstrap: Bootstrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Connection string handed to whichever repository backend the
    /// embedder wires up, e.g., postgres://warden@localhost/warden
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    /// External id the upstream authenticator attests as the bootstrap
    /// administrator. The core never derives admin status itself.
    pub external_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Bootstrap {
    /// Optional JSON document of users/groups/policies applied at startup.
    pub file: Option<String>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "memory://".to_string(),
        }
    }
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            external_id: "admin".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database::default(),
            admin: Admin::default(),
            bootstrap: Bootstrap::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database.url", Database::default().url)
            .into_diagnostic()?
            .set_default("admin.external_id", Admin::default().external_id)
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: WARDEN__ADMIN__EXTERNAL_ID=root, etc.
        builder =
            builder.add_source(config::Environment::with_prefix("WARDEN").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let s: Settings = cfg.try_deserialize().into_diagnostic()?;
        Ok(s)
    }
}
