// src/settings.rs

//! Client settings file
//!
//! Tells the `treeota` binary where the repository config lives and how the
//! local tree store is laid out. Every key is optional:
//!
//! ```toml
//! repo_config = "/etc/treeota/repository.toml"
//! sysroot = "/"
//! remote_name = "treeota"
//! branch = "linux/main"
//! ostree_binary = "/usr/bin/ostree"
//! command_timeout_secs = 300
//! ```

use crate::error::{Error, Result};
use crate::repository::DEFAULT_REPO_CONFIG_PATH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default path for the client settings file
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/treeota/client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub repo_config: PathBuf,
    pub sysroot: PathBuf,
    pub remote_name: String,
    pub branch: String,
    /// Explicit ostree binary; looked up on PATH when unset
    pub ostree_binary: Option<PathBuf>,
    pub command_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            repo_config: PathBuf::from(DEFAULT_REPO_CONFIG_PATH),
            sysroot: PathBuf::from("/"),
            remote_name: "treeota".to_string(),
            branch: "linux/main".to_string(),
            ostree_binary: None,
            command_timeout_secs: 300,
        }
    }
}

impl ClientSettings {
    /// Load settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Settings(format!("{}: {}", path.display(), e)))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = ClientSettings::load(&temp.path().join("client.toml")).unwrap();
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.command_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("client.toml");
        fs::write(&path, "branch = \"linux/devel\"\ncommand_timeout_secs = 30\n").unwrap();

        let settings = ClientSettings::load(&path).unwrap();
        assert_eq!(settings.branch, "linux/devel");
        assert_eq!(settings.command_timeout_secs, 30);
        assert_eq!(settings.remote_name, "treeota");
        assert_eq!(settings.sysroot, PathBuf::from("/"));
    }

    #[test]
    fn test_invalid_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("client.toml");
        fs::write(&path, "command_timeout_secs = \"soon\"\n").unwrap();
        assert!(matches!(ClientSettings::load(&path), Err(Error::Settings(_))));
    }
}
