// src/lib.rs

//! treeota - over-the-air update client for tree-based deployments
//!
//! Tracks the revision a device is booted into, the head revision of its
//! update remote and the deployments it can roll back to, and drives the
//! long-running operations that change them (check, fetch, apply,
//! rollback).
//!
//! # Architecture
//!
//! - [`store::TreeStore`]: the update mechanism (pull, deploy, status) behind a trait
//! - [`worker::UpdateWorker`]: runs store operations on a dedicated thread and
//!   reports results as sequence-tagged events
//! - [`client::OtaClient`]: caller-facing facade holding the published
//!   [`ClientState`], merging worker events and notifying handlers
//! - [`repository::RepositoryConfig`]: the update source description

pub mod client;
mod error;
pub mod repository;
pub mod revision;
pub mod settings;
pub mod store;
pub mod worker;

pub use client::{ClientOptions, ClientState, NotifyReason, OtaClient};
pub use error::{Error, Result};
pub use repository::{ConfigError, RepositoryConfig};
pub use revision::{RevisionInfo, RollbackInfo};
pub use settings::ClientSettings;
pub use store::{OstreeCommandStore, StoreError, TreeStore, verify_path_exists};
pub use worker::{
    Command, EventKind, OperationOutcome, Reservation, UpdateWorker, WorkerEvent, WorkerPhase,
};
