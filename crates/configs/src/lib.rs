//! # configs
//!
//! Typed settings for the repository service. Values come from built-in
//! defaults, then an optional `config/repositorio.{toml,yaml,json}` file, then
//! `REPO__SECTION__KEY` environment variables (`.env` is loaded first).

use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "REPO";
const CONFIG_FILE: &str = "config/repositorio";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub viewer: ViewerSettings,
    pub policy: PolicySettings,
    pub notifier: NotifierSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Cap on request bodies, uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8081,
            max_upload_bytes: 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://repositorio.db?mode=rwc".into(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub uploads_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("./uploads"),
        }
    }
}

/// External viewer for ZIP materials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub allowed_email_domains: Vec<String>,
    pub history_retention_days: i64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            allowed_email_domains: vec!["alumno.ipn.mx".into(), "ipn.mx".into()],
            history_retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Resend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub kind: NotifierKind,
    pub api_key: Option<SecretString>,
    pub from_address: String,
    pub from_name: String,
    /// Who receives pending-review emails.
    pub recipients: Vec<String>,
    /// Upper bound on one request to the email provider.
    pub timeout_secs: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            api_key: None,
            from_address: "no-reply@ipn.mx".into(),
            from_name: "Repositorio".into(),
            recipients: Vec::new(),
            timeout_secs: 10,
        }
    }
}

impl NotifierSettings {
    /// Sender in mailbox form, e.g. `Repositorio <no-reply@ipn.mx>`.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Loads `.env`, the optional config file and the environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment());
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.policy.allowed_email_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "policy.allowed_email_domains needs at least one domain".into(),
            ));
        }
        if self.policy.history_retention_days < 1 {
            return Err(ConfigError::Invalid(
                "policy.history_retention_days must be at least 1".into(),
            ));
        }
        if self.notifier.kind == NotifierKind::Resend && self.notifier.api_key.is_none() {
            return Err(ConfigError::Invalid(
                "notifier.api_key is required when notifier.kind = resend".into(),
            ));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(ConfigError::Invalid("notifier.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("policy.allowed_email_domains")
        .with_list_parse_key("notifier.recipients")
        .try_parsing(true)
}
