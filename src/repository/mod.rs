// src/repository/mod.rs

//! Update source configuration
//!
//! A device tracks exactly one remote repository. Its description is kept in
//! a small TOML resource; see [`RepositoryConfig`] for the format.

mod config;

pub use config::{ConfigError, DEFAULT_REPO_CONFIG_PATH, RepositoryConfig};
