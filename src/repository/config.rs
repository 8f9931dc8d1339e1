// src/repository/config.rs

//! Repository configuration resource
//!
//! The resource is key/value text in TOML form:
//!
//! ```toml
//! [remote]
//! url = "https://updates.example.com/ostree/repo"
//! gpg-verify = true
//! tls-client-cert-path = "/etc/treeota/client.crt"
//! tls-client-key-path = "/etc/treeota/client.key"
//! tls-permissive = false
//! tls-ca-path = "/etc/treeota/ca.pem"
//! ```
//!
//! Only `url` is required. A loaded config is immutable; reloading yields a
//! new value that callers compare against the previous one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default location of the repository config resource
pub const DEFAULT_REPO_CONFIG_PATH: &str = "/etc/treeota/repository.toml";

/// Errors raised while loading or saving a repository config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Repository config not found: {0}")]
    NotFound(String),

    #[error("Malformed repository config: {0}")]
    Malformed(String),

    #[error("Failed to access repository config: {0}")]
    Io(#[from] io::Error),
}

/// Description of one update source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    pub url: String,

    #[serde(default = "default_gpg_verify")]
    pub gpg_verify: bool,

    #[serde(default)]
    pub tls_client_cert_path: String,

    #[serde(default)]
    pub tls_client_key_path: String,

    #[serde(default)]
    pub tls_permissive: bool,

    #[serde(default)]
    pub tls_ca_path: String,
}

fn default_gpg_verify() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigResource {
    remote: RepositoryConfig,
}

impl RepositoryConfig {
    /// Create a config for `url` with every other field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            gpg_verify: default_gpg_verify(),
            tls_client_cert_path: String::new(),
            tls_client_key_path: String::new(),
            tls_permissive: false,
            tls_ca_path: String::new(),
        }
    }

    /// Load a config from a file on disk
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        debug!("Loading repository config from {}", path.display());
        Self::parse(&content)
    }

    /// Parse a config from resource text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let resource: ConfigResource =
            toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let config = resource.remote;
        config.validate()?;
        Ok(config)
    }

    /// Render the config back into resource text
    pub fn to_resource_string(&self) -> Result<String, ConfigError> {
        toml::to_string(&ConfigResource {
            remote: self.clone(),
        })
        .map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Write the config to disk, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = self.to_resource_string()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        debug!("Saved repository config to {}", path.display());
        Ok(())
    }

    /// Field-wise comparison, case-sensitive with no normalization
    pub fn equals(a: &RepositoryConfig, b: &RepositoryConfig) -> bool {
        a == b
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Malformed("url must not be empty".to_string()));
        }
        url::Url::parse(&self.url)
            .map_err(|e| ConfigError::Malformed(format!("invalid url '{}': {}", self.url, e)))?;
        Ok(())
    }
}
