//! Configuration schema (parsesync.toml)
//!
//! The configuration is built once at the CLI boundary (file, then
//! environment, then flags) and passed explicitly into every operation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the server URL
pub const ENV_SERVER_URL: &str = "PARSE_SERVER_URL";
/// Fallback environment variable for the server URL
pub const ENV_PUBLIC_SERVER_URL: &str = "PARSE_PUBLIC_SERVER_URL";
/// Environment variable holding the application id
pub const ENV_APP_ID: &str = "PARSE_SERVER_APPLICATION_ID";
/// Environment variable holding the master key
pub const ENV_MASTER_KEY: &str = "PARSE_SERVER_MASTER_KEY";
/// Environment variable holding the namespace prefix
pub const ENV_PREFIX: &str = "PARSESYNC_PREFIX";

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_codegen_output() -> PathBuf {
    PathBuf::from("parse-types.ts")
}

/// Connection settings as written in the config file (all optional)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub server_url: Option<String>,

    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default)]
    pub master_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server_url: None,
            app_id: None,
            master_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConnectionSettings {
    /// Validate the settings into a usable connection
    pub fn resolve(&self) -> Result<ConnectionConfig, ConfigError> {
        let server_url = required(&self.server_url, "server_url")?;
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(server_url.to_string()));
        }

        Ok(ConnectionConfig {
            server_url: server_url.trim_end_matches('/').to_string(),
            app_id: required(&self.app_id, "app_id")?.to_string(),
            master_key: required(&self.master_key, "master_key")?.to_string(),
            timeout_secs: self.timeout_secs,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(name))
}

/// Validated connection to a schema service
///
/// Treated as an opaque capability: `Debug` never prints the master key.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL without trailing slash, e.g. `https://example.com/parse`
    pub server_url: String,
    pub app_id: String,
    pub master_key: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_url", &self.server_url)
            .field("app_id", &self.app_id)
            .field("master_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Reconciliation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Namespace prefix for class names
    #[serde(default)]
    pub prefix: Option<String>,

    /// Delete remote classes with no local counterpart
    #[serde(default = "default_true")]
    pub delete_classes: bool,

    /// Delete remote fields with no local counterpart (and allow
    /// drop-and-recreate of changed fields)
    #[serde(default = "default_true")]
    pub delete_fields: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            delete_classes: true,
            delete_fields: true,
        }
    }
}

/// Type-definition generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodegenSettings {
    /// Output file for generated definitions
    #[serde(default = "default_codegen_output")]
    pub output: PathBuf,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            output: default_codegen_output(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionSettings,

    #[serde(default)]
    pub sync: SyncOptions,

    #[serde(default)]
    pub codegen: CodegenSettings,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    ///
    /// Non-empty values replace what the file provided.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_SERVER_URL).or_else(|| get(ENV_PUBLIC_SERVER_URL)) {
            self.connection.server_url = Some(url);
        }
        if let Some(app_id) = get(ENV_APP_ID) {
            self.connection.app_id = Some(app_id);
        }
        if let Some(master_key) = get(ENV_MASTER_KEY) {
            self.connection.master_key = Some(master_key);
        }
        if let Some(prefix) = get(ENV_PREFIX) {
            self.sync.prefix = Some(prefix);
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing required connection setting '{0}'")]
    MissingField(&'static str),

    #[error("Server URL must start with http:// or https://, got '{0}'")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.sync.delete_classes);
        assert!(config.sync.delete_fields);
        assert_eq!(config.sync.prefix, None);
        assert_eq!(config.connection.timeout_secs, 30);
    }

    #[test]
    fn parses_toml() {
        let config = Config::from_toml(
            r#"
            [connection]
            server_url = "https://example.com/parse/"
            app_id = "myApp"
            master_key = "secret"

            [sync]
            prefix = "app_"
            delete_fields = false
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.prefix.as_deref(), Some("app_"));
        assert!(config.sync.delete_classes);
        assert!(!config.sync.delete_fields);

        let connection = config.connection.resolve().unwrap();
        assert_eq!(connection.server_url, "https://example.com/parse");
        assert_eq!(connection.app_id, "myApp");
    }

    #[test]
    fn missing_connection_field() {
        let settings = ConnectionSettings {
            server_url: Some("https://example.com/parse".to_string()),
            app_id: Some("myApp".to_string()),
            master_key: Some("  ".to_string()),
            ..ConnectionSettings::default()
        };
        assert!(matches!(settings.resolve(), Err(ConfigError::MissingField("master_key"))));
    }

    #[test]
    fn rejects_non_http_url() {
        let settings = ConnectionSettings {
            server_url: Some("example.com".to_string()),
            app_id: Some("a".to_string()),
            master_key: Some("k".to_string()),
            ..ConnectionSettings::default()
        };
        assert!(matches!(settings.resolve(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::from_toml("[connection]\napp_id = \"fromFile\"").unwrap();
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_PUBLIC_SERVER_URL, "http://localhost:1337/parse"),
            (ENV_APP_ID, "fromEnv"),
            (ENV_MASTER_KEY, "key"),
            (ENV_PREFIX, ""),
        ]);
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.connection.server_url.as_deref(), Some("http://localhost:1337/parse"));
        assert_eq!(config.connection.app_id.as_deref(), Some("fromEnv"));
        assert_eq!(config.sync.prefix, None);
    }

    #[test]
    fn debug_redacts_master_key() {
        let connection = ConnectionConfig {
            server_url: "https://example.com/parse".to_string(),
            app_id: "myApp".to_string(),
            master_key: "super-secret".to_string(),
            timeout_secs: 30,
        };
        let printed = format!("{connection:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
