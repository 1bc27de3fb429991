//! Configuration loading and management
//!
//! Settings come from an optional JSON file, then environment overrides.
//! The result is validated once at startup and injected into components.

use std::path::Path;

use notes_authorizer::{AuthStrategy, AuthorizerConfig};
use notes_core::store::DynamoSettings;
use serde::{Deserialize, Serialize};

/// Main configuration for the notes API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where notes are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// How requests are authorized
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Dynamodb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// DynamoDB table holding the notes
    #[serde(default)]
    pub table_name: Option<String>,

    /// Partition key attribute name
    #[serde(default = "default_partition_key")]
    pub partition_key: String,

    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override (DynamoDB Local)
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            table_name: None,
            partition_key: default_partition_key(),
            region: None,
            endpoint_url: None,
        }
    }
}

fn default_partition_key() -> String {
    "notesId".to_string()
}

impl StorageConfig {
    pub fn dynamo_settings(&self) -> Result<DynamoSettings, ConfigError> {
        let table_name = self
            .table_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid("dynamodb storage needs storage.table_name".to_string())
            })?;
        Ok(DynamoSettings {
            table_name,
            partition_key: self.partition_key.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub authorizer: AuthorizerConfig,

    /// Prefix of the resource identifier evaluated for each request.
    /// The full resource is `<prefix>/<METHOD><path>`, mirroring a gateway method ARN.
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorizer: AuthorizerConfig::default(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

fn default_resource_prefix() -> String {
    "arn:aws:execute-api:local:000000000000:notes/local".to_string()
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(config_file) = config_file else {
            tracing::info!("No config file given, using defaults");
            return Ok(Config::default());
        };

        if !config_file.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_file);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(config_file).map_err(|source| ConfigError::Read {
            path: config_file.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", config_file);
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("NOTES_STORAGE_BACKEND") {
            self.storage.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "dynamodb" => StorageBackend::Dynamodb,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "Unknown storage backend: {}",
                        other
                    )));
                }
            };
        }
        if let Some(table) = lookup("NOTES_TABLE") {
            self.storage.table_name = Some(table);
        }
        if let Some(endpoint) = lookup("NOTES_DYNAMODB_ENDPOINT") {
            self.storage.endpoint_url = Some(endpoint);
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.storage.region = Some(region.clone());
            self.auth.authorizer.region = Some(region);
        }

        let auth = &mut self.auth.authorizer;
        if let Some(strategy) = lookup("AUTH_STRATEGY") {
            auth.strategy = strategy
                .parse::<AuthStrategy>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(issuer) = lookup("AUTH_ISSUER") {
            auth.issuer = Some(issuer);
        }
        if let Some(audience) = lookup("AUTH_AUDIENCE") {
            auth.audience = audience
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(pool) = lookup("AUTH_USER_POOL_ID") {
            auth.user_pool_id = Some(pool);
        }
        if let Some(uri) = lookup("AUTH_JWKS_URI") {
            auth.jwks_uri = Some(uri.parse().map_err(|e| {
                ConfigError::Invalid(format!("AUTH_JWKS_URI is not a URL: {}", e))
            })?);
        }
        if let Some(secret) = lookup("AUTH_SHARED_SECRET") {
            auth.shared_secret = Some(secret);
        }
        if let Some(prefix) = lookup("AUTH_RESOURCE_PREFIX") {
            self.auth.resource_prefix = prefix;
        }
        Ok(())
    }

    /// Check that every selected backend and strategy is fully configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Dynamodb {
            self.storage.dynamo_settings()?;
        }
        self.auth
            .authorizer
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_memory_and_static() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.partition_key, "notesId");
        assert_eq!(config.auth.authorizer.strategy, AuthStrategy::Static);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_storage_and_auth() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("NOTES_STORAGE_BACKEND", "dynamodb"),
                ("NOTES_TABLE", "notesTable"),
                ("AWS_REGION", "ap-south-1"),
                ("AUTH_STRATEGY", "jwt"),
                ("AUTH_USER_POOL_ID", "ap-south-1_AbCdEf"),
                ("AUTH_AUDIENCE", "client-a, client-b"),
            ]))
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Dynamodb);
        assert_eq!(config.storage.region.as_deref(), Some("ap-south-1"));
        assert_eq!(config.auth.authorizer.audience, ["client-a", "client-b"]);
        assert_eq!(
            config.auth.authorizer.resolved_issuer().as_deref(),
            Some("https://cognito-idp.ap-south-1.amazonaws.com/ap-south-1_AbCdEf")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_region_replaces_file_region() {
        let mut config = Config::default();
        config.storage.region = Some("us-east-1".into());
        config.auth.authorizer.region = Some("us-east-1".into());

        config.apply_env(env(&[("AWS_REGION", "eu-west-1")])).unwrap();

        assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.auth.authorizer.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn dynamodb_without_table_is_rejected() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("NOTES_STORAGE_BACKEND", "dynamodb")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_values_are_rejected() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("NOTES_STORAGE_BACKEND", "sqlite")])).is_err());
        assert!(config.apply_env(env(&[("AUTH_STRATEGY", "oauth")])).is_err());
        assert!(config.apply_env(env(&[("AUTH_JWKS_URI", "not a url")])).is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "storage": {"backend": "dynamodb", "table_name": "notesTable"},
                "auth": {"strategy": "jwt", "issuer": "https://issuer.example.com", "audience": ["notes"], "shared_secret": "dev", "resource_prefix": "arn:test"}
            }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.table_name.as_deref(), Some("notesTable"));
        assert_eq!(config.storage.partition_key, "notesId");
        assert_eq!(config.auth.authorizer.strategy, AuthStrategy::Jwt);
        assert_eq!(config.auth.authorizer.leeway_secs, 60);
        assert_eq!(config.auth.resource_prefix, "arn:test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse(_))));
    }
}
