// src/revision.rs

//! Revision value types shared by the store, the worker and the facade.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A revision of the deployed tree together with its commit metadata.
///
/// Produced by a [`TreeStore`](crate::store::TreeStore) and never mutated
/// afterwards. The metadata is whatever structured text the commit carries
/// (usually JSON); the client does not interpret it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    /// Opaque revision id (commit checksum)
    pub revision: String,
    /// Commit metadata as delivered by the store
    pub metadata: String,
}

impl RevisionInfo {
    pub fn new(revision: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            metadata: metadata.into(),
        }
    }

    /// Revision with no metadata attached
    pub fn bare(revision: impl Into<String>) -> Self {
        Self::new(revision, String::new())
    }

    /// Shortened revision id for log lines
    pub fn short(&self) -> &str {
        let end = self
            .revision
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.revision.len());
        &self.revision[..end]
    }
}

impl fmt::Display for RevisionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.revision)
    }
}

/// Most recent rollback target plus the number of eligible trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackInfo {
    pub info: RevisionInfo,
    pub tree_count: usize,
}

impl RollbackInfo {
    /// Build from a recency-ordered candidate list (most recent first)
    pub fn from_candidates(candidates: &[RevisionInfo]) -> Option<Self> {
        candidates.first().map(|first| Self {
            info: first.clone(),
            tree_count: candidates.len(),
        })
    }
}
