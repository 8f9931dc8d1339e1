// src/store/mod.rs

//! Tree store boundary
//!
//! The [`TreeStore`] trait is the seam where the real update mechanism plugs
//! in. Every operation may block on network or disk I/O and may fail; the
//! update worker only ever calls it from its own thread.

pub mod ostree;

use crate::repository::RepositoryConfig;
use crate::revision::RevisionInfo;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use ostree::{OstreeCommandStore, OstreeStoreConfig};

/// Failures reported by a tree store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Revision not found: {0}")]
    NotFound(String),

    /// The store backend itself could not be reached (missing binary, timeout)
    #[error("Tree store unavailable: {0}")]
    Unavailable(String),
}

/// Operations the update worker needs from a content-addressed tree store
pub trait TreeStore: Send + 'static {
    /// Revision the device is currently booted into
    fn resolve_booted(&self) -> Result<RevisionInfo, StoreError>;

    /// Head revision advertised by the remote described by `config`
    fn resolve_remote(&self, config: &RepositoryConfig) -> Result<RevisionInfo, StoreError>;

    /// Deployments eligible for rollback, most recent first
    fn list_rollback_candidates(&self) -> Result<Vec<RevisionInfo>, StoreError>;

    /// Fetch the tree for `revision` into local storage
    fn fetch(&self, revision: &str) -> Result<(), StoreError>;

    /// Select `revision` as the tree to boot next
    fn set_default(&self, revision: &str) -> Result<(), StoreError>;

    /// Local path where an already fetched tree for `revision` would live.
    ///
    /// Stores that cannot tell return `None`, which means every fetch goes to
    /// the network.
    fn cached_tree_path(&self, _revision: &str) -> Option<PathBuf> {
        None
    }
}

/// Check whether `path` exists.
///
/// Absence is a normal answer, so lookup failures (permissions, broken
/// links) count as "does not exist" instead of producing an error.
pub fn verify_path_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
