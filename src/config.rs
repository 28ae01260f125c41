use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::data::remote::{AccessKeys, S3Settings};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SCOUTBOARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "scoutboard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Application configuration.
///
/// ```toml
/// [aws]
/// access_key_id = "AKIA..."
/// secret_access_key = "..."
///
/// [storage]
/// bucket = "startup-momentum-pipeline"
/// region = "us-east-1"
/// # endpoint = "http://localhost:9000"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// S3-compatible endpoint override; switches to path-style addressing.
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            bucket: "startup-momentum-pipeline".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Discovery order: `$SCOUTBOARD_CONFIG`, else `./scoutboard.toml`, else
    /// built-in defaults. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);
        let mut config = if path.exists() {
            log::info!("loading configuration from {}", path.display());
            Self::from_toml_file(path)?
        } else {
            log::warn!(
                "no configuration at {}, using defaults (unsigned requests)",
                path.display()
            );
            Config::default()
        };
        config.apply_overrides(
            std::env::var("AWS_ACCESS_KEY_ID").ok(),
            std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        );
        Ok(config)
    }

    /// The standard AWS environment variables win over the file.
    fn apply_overrides(&mut self, access_key_id: Option<String>, secret_access_key: Option<String>) {
        if let Some(id) = access_key_id {
            self.aws.access_key_id = id;
        }
        if let Some(secret) = secret_access_key {
            self.aws.secret_access_key = secret;
        }
    }

    /// Storage settings for the S3 store. Credentials count only when both
    /// halves are present; their values are never logged.
    pub fn s3_settings(&self) -> S3Settings {
        let credentials = if self.aws.access_key_id.is_empty()
            || self.aws.secret_access_key.is_empty()
        {
            None
        } else {
            Some(AccessKeys {
                access_key_id: self.aws.access_key_id.clone(),
                secret_access_key: self.aws.secret_access_key.clone(),
            })
        };
        S3Settings {
            bucket: self.storage.bucket.clone(),
            region: self.storage.region.clone(),
            endpoint: self.storage.endpoint.clone(),
            credentials,
        }
    }
}
