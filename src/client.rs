// src/client.rs

//! Caller-facing OTA client
//!
//! [`OtaClient`] holds the last published [`ClientState`], forwards commands
//! to the [`UpdateWorker`] and merges the worker's events back into the
//! state on the caller's own task. Handlers registered with
//! [`OtaClient::on_notify`] run during [`OtaClient::pump`] or
//! [`OtaClient::settle`], never on the worker thread.
//!
//! # Example
//!
//! ```ignore
//! use treeota::{ClientOptions, OtaClient};
//!
//! let mut client = OtaClient::new(store, ClientOptions::for_sysroot("/"))?;
//! client.on_notify(|reason, state| println!("{:?}: {}", reason, state.status));
//!
//! client.check_for_update()?;
//! client.settle().await?;
//! if client.snapshot().update_available() {
//!     let remote = client.snapshot().remote.unwrap();
//!     client.fetch_update(&remote.revision)?;
//!     client.settle().await?;
//! }
//! ```

use crate::error::{Error, Result};
use crate::repository::RepositoryConfig;
use crate::revision::{RevisionInfo, RollbackInfo};
use crate::store::{TreeStore, verify_path_exists};
use crate::worker::{
    Command, EventKind, OperationOutcome, Sequence, UpdateWorker, WorkerEvent, WorkerHandle,
    WorkerPhase,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

/// Published client state
///
/// `update_available` and `rollback_available` are computed from the stored
/// fields on every read, so they always agree with the revisions next to
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientState {
    /// Revision the device is booted into (empty until first resolved)
    pub booted: RevisionInfo,
    /// Remote head, unknown until the first successful check
    pub remote: Option<RevisionInfo>,
    /// Most recent rollback target and number of eligible trees
    pub rollback: Option<RollbackInfo>,
    /// Tree selected for the next boot by this client
    pub default: Option<RevisionInfo>,
    /// Set once the boot target changed; only a restart clears it
    pub restart_required: bool,
    /// Whether the device runs from a managed tree at all
    pub ota_enabled: bool,
    /// Last progress message
    pub status: String,
    /// Last failure message
    pub error: String,
    /// When the remote revision was last resolved
    pub last_checked: Option<DateTime<Utc>>,
}

impl ClientState {
    /// A remote revision is known and differs from the booted one
    pub fn update_available(&self) -> bool {
        self.remote
            .as_ref()
            .is_some_and(|remote| remote.revision != self.booted.revision)
    }

    /// At least one previous deployment can be booted
    pub fn rollback_available(&self) -> bool {
        self.rollback.as_ref().is_some_and(|rollback| rollback.tree_count > 0)
    }

    /// JSON rendering including the derived flags
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.insert("update_available".to_string(), self.update_available().into());
            map.insert("rollback_available".to_string(), self.rollback_available().into());
        }
        value
    }
}

/// Which part of the state a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyReason {
    Booted,
    Remote,
    Rollback,
    Default,
    Status,
    Error,
    RestartRequired,
}

type NotifyHandler = Box<dyn FnMut(NotifyReason, &ClientState)>;

/// Construction options for [`OtaClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Path whose existence marks the device as OTA-managed
    pub ota_marker: PathBuf,
    /// Repository config handed to the worker at startup
    pub repository: Option<RepositoryConfig>,
}

impl ClientOptions {
    /// Options for a device whose physical root is `sysroot`
    pub fn for_sysroot(sysroot: impl AsRef<Path>) -> Self {
        Self {
            ota_marker: sysroot.as_ref().join("ostree"),
            repository: None,
        }
    }

    pub fn with_repository(mut self, config: RepositoryConfig) -> Self {
        self.repository = Some(config);
        self
    }
}

/// OTA client facade
pub struct OtaClient {
    state: ClientState,
    worker: WorkerHandle,
    events: UnboundedReceiver<WorkerEvent>,
    handlers: Vec<NotifyHandler>,
    seq: Sequence,
    in_flight: bool,
    last_outcome: Option<OperationOutcome>,
}

impl OtaClient {
    /// Start the worker for `store` and build the facade around it
    pub fn new<S: TreeStore>(store: S, options: ClientOptions) -> Result<Self> {
        let ota_enabled = verify_path_exists(&options.ota_marker);
        if !ota_enabled {
            warn!(
                "{} does not exist, OTA updates are disabled",
                options.ota_marker.display()
            );
        }

        let (worker, events) = UpdateWorker::spawn(store, options.repository)?;

        Ok(Self {
            state: ClientState {
                ota_enabled,
                ..ClientState::default()
            },
            worker,
            events,
            handlers: Vec::new(),
            seq: 0,
            in_flight: false,
            last_outcome: None,
        })
    }

    /// Hand `command` to the worker and return immediately.
    ///
    /// Fails synchronously with [`Error::Busy`] while another command runs
    /// and with [`Error::Disabled`] on devices that are not OTA-managed.
    /// Neither failure touches the published state.
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        if !self.state.ota_enabled {
            return Err(Error::Disabled(format!("cannot run {}", command.name())));
        }

        let reservation = self.worker.reserve(&command)?;
        // The previous command's events are all queued once the worker
        // rests; merge them before they turn stale.
        self.pump();

        let seq = self.seq + 1;
        self.worker.send(reservation, seq, command)?;
        self.seq = seq;
        self.in_flight = true;
        self.last_outcome = None;
        Ok(())
    }

    pub fn check_for_update(&mut self) -> Result<()> {
        self.dispatch(Command::CheckForUpdate)
    }

    pub fn fetch_update(&mut self, revision: &str) -> Result<()> {
        self.dispatch(Command::FetchUpdate {
            revision: revision.to_string(),
        })
    }

    pub fn apply_update(&mut self, revision: &str) -> Result<()> {
        self.dispatch(Command::ApplyUpdate {
            revision: revision.to_string(),
        })
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.dispatch(Command::Rollback)
    }

    pub fn refresh_info(&mut self) -> Result<()> {
        self.dispatch(Command::RefreshInfo)
    }

    pub fn set_repository_config(&mut self, config: RepositoryConfig) -> Result<()> {
        self.dispatch(Command::SetRepositoryConfig(config))
    }

    pub fn remove_repository_config(&mut self) -> Result<()> {
        self.dispatch(Command::RemoveRepositoryConfig)
    }

    /// Copy of the last fully merged state
    pub fn snapshot(&self) -> ClientState {
        self.state.clone()
    }

    /// Borrow the last fully merged state
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Register a handler called after every merge
    pub fn on_notify<F>(&mut self, handler: F)
    where
        F: FnMut(NotifyReason, &ClientState) + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Current worker phase
    pub fn phase(&self) -> WorkerPhase {
        self.worker.phase()
    }

    /// Whether a dispatched command has not reported completion yet
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Outcome of the most recently completed command
    pub fn last_outcome(&self) -> Option<&OperationOutcome> {
        self.last_outcome.as_ref()
    }

    /// Merge every event already queued, without waiting.
    ///
    /// Returns the number of events that were applied (stale ones excluded).
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if self.handle_event(event) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Wait until the current command has finished, merging its events.
    ///
    /// Returns the command's outcome, or the last one if nothing is in
    /// flight.
    pub async fn settle(&mut self) -> Result<Option<OperationOutcome>> {
        self.pump();
        while self.in_flight {
            match self.events.recv().await {
                Some(event) => {
                    self.handle_event(event);
                }
                None => return Err(Error::WorkerGone),
            }
        }
        Ok(self.last_outcome.clone())
    }

    /// Merge one event; returns whether it belonged to the current command
    fn handle_event(&mut self, event: WorkerEvent) -> bool {
        if event.seq != self.seq {
            debug!(
                "Discarding stale event from operation {} (current {}): {:?}",
                event.seq, self.seq, event.kind
            );
            return false;
        }

        if let Some(reason) = self.merge(event.kind) {
            self.notify(reason);
        }
        true
    }

    /// Apply one event to the state, touching only the fields it names
    fn merge(&mut self, kind: EventKind) -> Option<NotifyReason> {
        match kind {
            EventKind::BootedChanged(booted) => {
                self.state.booted = booted;
                Some(NotifyReason::Booted)
            }
            EventKind::RemoteChanged(remote) => {
                if remote.is_some() {
                    self.state.last_checked = Some(Utc::now());
                }
                self.state.remote = remote;
                Some(NotifyReason::Remote)
            }
            EventKind::RollbackChanged(candidates) => {
                self.state.rollback = RollbackInfo::from_candidates(&candidates);
                Some(NotifyReason::Rollback)
            }
            EventKind::DefaultChanged(default) => {
                self.state.default = Some(default);
                Some(NotifyReason::Default)
            }
            EventKind::StatusChanged(status) => {
                self.state.status = status;
                Some(NotifyReason::Status)
            }
            EventKind::ErrorOccurred(error) => {
                self.state.error = error;
                Some(NotifyReason::Error)
            }
            EventKind::RestartRequired => {
                if !self.state.restart_required {
                    info!("Restart required to boot the new default tree");
                }
                self.state.restart_required = true;
                Some(NotifyReason::RestartRequired)
            }
            EventKind::Finished(outcome) => {
                self.in_flight = false;
                self.last_outcome = Some(outcome);
                None
            }
        }
    }

    fn notify(&mut self, reason: NotifyReason) {
        for handler in &mut self.handlers {
            handler(reason, &self.state);
        }
    }
}
