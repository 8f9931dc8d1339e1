// src/worker.rs

//! Update worker
//!
//! The worker owns the [`TreeStore`] and runs every store operation on a
//! dedicated thread. Commands arrive over a channel tagged with the
//! dispatcher's sequence number; results leave as typed [`WorkerEvent`]s
//! carrying the same number, so the facade can drop results that belong to
//! a superseded command.
//!
//! # Phases
//!
//! ```text
//! Idle ──► Checking ──► Idle
//! Idle ──► Fetching ──► FetchedReady | Idle
//! Idle | FetchedReady ──► Applying ──► Idle
//! Idle ──► RollingBack ──► Idle
//! ```
//!
//! Only `Idle` and `FetchedReady` accept new commands, and both accept any
//! command. A command submitted in any other phase is refused with
//! [`Error::Busy`] before it reaches the store. All events of a command are
//! queued before the phase returns to a resting state; the terminal
//! [`EventKind::Finished`] marker follows.

use crate::error::{Error, Result};
use crate::repository::RepositoryConfig;
use crate::revision::RevisionInfo;
use crate::store::{StoreError, TreeStore, verify_path_exists};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Monotonic operation number assigned by the dispatcher
pub type Sequence = u64;

/// Status text published after a successful fetch
pub const STATUS_FETCHED: &str = "fetched";

/// Status text published after the boot target changed
pub const STATUS_RESTART_REQUIRED: &str = "restart required";

/// Commands understood by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve booted, remote and rollback revisions
    CheckForUpdate,
    /// Fetch the tree for a revision
    FetchUpdate { revision: String },
    /// Make a revision the default boot target
    ApplyUpdate { revision: String },
    /// Make the most recent rollback candidate the default boot target
    Rollback,
    /// Re-resolve booted and rollback revisions without touching the network
    RefreshInfo,
    /// Switch to a new repository config
    SetRepositoryConfig(RepositoryConfig),
    /// Forget the repository config
    RemoveRepositoryConfig,
}

impl Command {
    /// Phase the worker enters while executing this command
    fn active_phase(&self) -> WorkerPhase {
        match self {
            Command::CheckForUpdate | Command::RefreshInfo => WorkerPhase::Checking,
            Command::FetchUpdate { .. } => WorkerPhase::Fetching,
            Command::ApplyUpdate { .. } => WorkerPhase::Applying,
            Command::Rollback => WorkerPhase::RollingBack,
            Command::SetRepositoryConfig(_) | Command::RemoveRepositoryConfig => {
                WorkerPhase::Configuring
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::CheckForUpdate => "check-for-update",
            Command::FetchUpdate { .. } => "fetch-update",
            Command::ApplyUpdate { .. } => "apply-update",
            Command::Rollback => "rollback",
            Command::RefreshInfo => "refresh-info",
            Command::SetRepositoryConfig(_) => "set-repository-config",
            Command::RemoveRepositoryConfig => "remove-repository-config",
        }
    }
}

/// Worker execution phase
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkerPhase {
    #[default]
    Idle,
    Checking,
    Fetching,
    /// A tree has been fetched and is ready to apply.
    ///
    /// Resting like `Idle`: any command is accepted here, not only the
    /// apply. Leaving this phase does not discard the fetched tree.
    FetchedReady(String),
    Applying,
    RollingBack,
    Configuring,
}

impl WorkerPhase {
    /// Whether a command is currently executing
    pub fn is_busy(&self) -> bool {
        !matches!(self, WorkerPhase::Idle | WorkerPhase::FetchedReady(_))
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerPhase::Idle => write!(f, "idle"),
            WorkerPhase::Checking => write!(f, "checking"),
            WorkerPhase::Fetching => write!(f, "fetching"),
            WorkerPhase::FetchedReady(rev) => write!(f, "fetched {}", rev),
            WorkerPhase::Applying => write!(f, "applying"),
            WorkerPhase::RollingBack => write!(f, "rolling back"),
            WorkerPhase::Configuring => write!(f, "configuring"),
        }
    }
}

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Check completed, remote matches booted
    UpToDate,
    /// Check completed, remote differs from booted
    UpdateFound,
    /// Tree is available locally
    Fetched,
    /// Default boot target changed; restart required
    Applied,
    /// Offline refresh completed
    Refreshed,
    /// Repository config handled; `changed` tells whether remote state was invalidated
    Reconfigured { changed: bool },
    /// The command failed with the given reason
    Failed(String),
}

/// Payload of a worker event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    BootedChanged(RevisionInfo),
    /// `None` invalidates the remote revision
    RemoteChanged(Option<RevisionInfo>),
    /// Rollback candidates, most recent first
    RollbackChanged(Vec<RevisionInfo>),
    DefaultChanged(RevisionInfo),
    StatusChanged(String),
    ErrorOccurred(String),
    RestartRequired,
    /// Terminal marker for the command
    Finished(OperationOutcome),
}

/// Event produced by the worker for one dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEvent {
    pub seq: Sequence,
    pub kind: EventKind,
}

struct Envelope {
    seq: Sequence,
    command: Command,
}

/// Caller-side handle to a running worker thread
pub struct WorkerHandle {
    commands: Option<UnboundedSender<Envelope>>,
    phase: Arc<Mutex<WorkerPhase>>,
    thread: Option<JoinHandle<()>>,
}

/// Busy-check result for a command that has not been sent yet
#[derive(Debug)]
pub struct Reservation {
    previous: WorkerPhase,
}

impl WorkerHandle {
    /// Claim the worker for `command` without sending it.
    ///
    /// Fails with [`Error::Busy`] if a command is still executing. On success
    /// the worker is in the command's active phase and every event of the
    /// previous command except its `Finished` marker is already queued.
    pub fn reserve(&self, command: &Command) -> Result<Reservation> {
        if self.commands.is_none() {
            return Err(Error::WorkerGone);
        }

        let mut phase = self.phase.lock();
        if phase.is_busy() {
            return Err(Error::Busy(phase.to_string()));
        }
        let previous = std::mem::replace(&mut *phase, command.active_phase());
        Ok(Reservation { previous })
    }

    /// Send a reserved command; the reservation is released if the worker is gone
    pub fn send(&self, reservation: Reservation, seq: Sequence, command: Command) -> Result<()> {
        debug!("Submitting {} as operation {}", command.name(), seq);
        let sent = self
            .commands
            .as_ref()
            .is_some_and(|sender| sender.send(Envelope { seq, command }).is_ok());
        if !sent {
            *self.phase.lock() = reservation.previous;
            return Err(Error::WorkerGone);
        }
        Ok(())
    }

    /// Current worker phase
    pub fn phase(&self) -> WorkerPhase {
        self.phase.lock().clone()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the current command is done
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Update worker thread panicked");
            }
        }
    }
}

/// Executes commands against a tree store on its own thread
pub struct UpdateWorker<S: TreeStore> {
    store: S,
    config: Option<RepositoryConfig>,
    phase: Arc<Mutex<WorkerPhase>>,
    events: UnboundedSender<WorkerEvent>,
    last_booted: Option<RevisionInfo>,
    last_remote: Option<RevisionInfo>,
    last_candidates: Vec<RevisionInfo>,
}

impl<S: TreeStore> UpdateWorker<S> {
    /// Start the worker thread.
    ///
    /// Returns the handle used to submit commands and the receiving end of
    /// the event channel.
    pub fn spawn(
        store: S,
        config: Option<RepositoryConfig>,
    ) -> Result<(WorkerHandle, UnboundedReceiver<WorkerEvent>)> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let phase = Arc::new(Mutex::new(WorkerPhase::Idle));

        let worker = UpdateWorker {
            store,
            config,
            phase: Arc::clone(&phase),
            events: event_tx,
            last_booted: None,
            last_remote: None,
            last_candidates: Vec::new(),
        };

        let thread = thread::Builder::new()
            .name("treeota-worker".to_string())
            .spawn(move || worker.run(command_rx))?;

        Ok((
            WorkerHandle {
                commands: Some(command_tx),
                phase,
                thread: Some(thread),
            },
            event_rx,
        ))
    }

    fn run(mut self, mut commands: UnboundedReceiver<Envelope>) {
        debug!("Update worker started");

        while let Some(Envelope { seq, command }) = commands.blocking_recv() {
            info!("Operation {}: {} started", seq, command.name());
            let fetching = match &command {
                Command::FetchUpdate { revision } => Some(revision.clone()),
                _ => None,
            };
            let outcome = self.execute(seq, command);
            info!("Operation {}: finished with {:?}", seq, outcome);

            let resting = match (fetching, &outcome) {
                (Some(revision), OperationOutcome::Fetched) => WorkerPhase::FetchedReady(revision),
                _ => WorkerPhase::Idle,
            };
            *self.phase.lock() = resting;
            self.emit(seq, EventKind::Finished(outcome));
        }

        debug!("Update worker stopped");
    }

    fn execute(&mut self, seq: Sequence, command: Command) -> OperationOutcome {
        match command {
            Command::CheckForUpdate => match self.config.clone() {
                Some(config) => self.check_for_update(seq, &config),
                None => self.fail_with(seq, "no repository configured".to_string()),
            },
            Command::FetchUpdate { revision } => self.fetch_update(seq, &revision),
            Command::ApplyUpdate { revision } => self.apply_update(seq, &revision),
            Command::Rollback => self.rollback(seq),
            Command::RefreshInfo => self.refresh_info(seq),
            Command::SetRepositoryConfig(config) => self.set_repository_config(seq, config),
            Command::RemoveRepositoryConfig => self.remove_repository_config(seq),
        }
    }

    /// Resolve booted, remote and rollback state and publish all three.
    ///
    /// Nothing is published unless every store call succeeds.
    pub fn check_for_update(&mut self, seq: Sequence, config: &RepositoryConfig) -> OperationOutcome {
        self.emit(seq, EventKind::StatusChanged("checking for update".to_string()));

        let (booted, remote, candidates) = match self.resolve_all(config) {
            Ok(resolved) => resolved,
            Err(e) => return self.fail(seq, "check for update", e),
        };

        let found = remote.revision != booted.revision;
        info!(
            "Booted {} / remote {} / {} rollback candidate(s)",
            booted.short(),
            remote.short(),
            candidates.len()
        );

        self.last_booted = Some(booted.clone());
        self.last_remote = Some(remote.clone());
        self.last_candidates = candidates.clone();

        self.emit(seq, EventKind::BootedChanged(booted));
        self.emit(seq, EventKind::RemoteChanged(Some(remote)));
        self.emit(seq, EventKind::RollbackChanged(candidates));

        if found {
            self.emit(seq, EventKind::StatusChanged("update available".to_string()));
            OperationOutcome::UpdateFound
        } else {
            self.emit(seq, EventKind::StatusChanged("system is up to date".to_string()));
            OperationOutcome::UpToDate
        }
    }

    fn resolve_all(
        &self,
        config: &RepositoryConfig,
    ) -> std::result::Result<(RevisionInfo, RevisionInfo, Vec<RevisionInfo>), StoreError> {
        let booted = self.store.resolve_booted()?;
        let remote = self.store.resolve_remote(config)?;
        let candidates = self.store.list_rollback_candidates()?;
        Ok((booted, remote, candidates))
    }

    /// Fetch a tree unless a complete copy is already present locally
    pub fn fetch_update(&mut self, seq: Sequence, revision: &str) -> OperationOutcome {
        if let Some(path) = self.store.cached_tree_path(revision) {
            if verify_path_exists(&path) {
                info!("Tree {} already present at {}, skipping fetch", revision, path.display());
                self.emit(seq, EventKind::StatusChanged(STATUS_FETCHED.to_string()));
                return OperationOutcome::Fetched;
            }
        }

        self.emit(seq, EventKind::StatusChanged(format!("fetching {}", revision)));
        match self.store.fetch(revision) {
            Ok(()) => {
                self.emit(seq, EventKind::StatusChanged(STATUS_FETCHED.to_string()));
                OperationOutcome::Fetched
            }
            Err(e) => self.fail(seq, "fetch update", e),
        }
    }

    /// Make `revision` the next boot target
    pub fn apply_update(&mut self, seq: Sequence, revision: &str) -> OperationOutcome {
        self.emit(seq, EventKind::StatusChanged(format!("deploying {}", revision)));
        self.commit_default(seq, revision, "apply update")
    }

    /// Roll back to the most recent previous deployment
    pub fn rollback(&mut self, seq: Sequence) -> OperationOutcome {
        let candidates = match self.store.list_rollback_candidates() {
            Ok(candidates) => candidates,
            Err(e) => return self.fail(seq, "rollback", e),
        };
        self.last_candidates = candidates;

        let Some(target) = self.last_candidates.first().cloned() else {
            return self.fail_with(seq, "no rollback target available".to_string());
        };

        self.emit(seq, EventKind::StatusChanged(format!("rolling back to {}", target.revision)));
        self.commit_default(seq, &target.revision, "rollback")
    }

    fn commit_default(&mut self, seq: Sequence, revision: &str, operation: &str) -> OperationOutcome {
        if let Err(e) = self.store.set_default(revision) {
            return self.fail(seq, operation, e);
        }

        let info = self.lookup(revision);
        self.emit(seq, EventKind::DefaultChanged(info));
        self.emit(seq, EventKind::StatusChanged(STATUS_RESTART_REQUIRED.to_string()));
        self.emit(seq, EventKind::RestartRequired);
        OperationOutcome::Applied
    }

    /// Re-read local deployment state only
    pub fn refresh_info(&mut self, seq: Sequence) -> OperationOutcome {
        let resolved = self
            .store
            .resolve_booted()
            .and_then(|booted| Ok((booted, self.store.list_rollback_candidates()?)));

        match resolved {
            Ok((booted, candidates)) => {
                self.last_booted = Some(booted.clone());
                self.last_candidates = candidates.clone();
                self.emit(seq, EventKind::BootedChanged(booted));
                self.emit(seq, EventKind::RollbackChanged(candidates));
                OperationOutcome::Refreshed
            }
            Err(e) => self.fail(seq, "refresh info", e),
        }
    }

    /// Adopt `config`; remote state is invalidated only if it actually differs
    pub fn set_repository_config(&mut self, seq: Sequence, config: RepositoryConfig) -> OperationOutcome {
        let unchanged = self
            .config
            .as_ref()
            .is_some_and(|current| RepositoryConfig::equals(current, &config));
        if unchanged {
            debug!("Repository config unchanged");
            return OperationOutcome::Reconfigured { changed: false };
        }

        info!("Repository config changed, remote state invalidated");
        self.config = Some(config);
        self.invalidate_remote(seq);
        OperationOutcome::Reconfigured { changed: true }
    }

    pub fn remove_repository_config(&mut self, seq: Sequence) -> OperationOutcome {
        if self.config.take().is_none() {
            return OperationOutcome::Reconfigured { changed: false };
        }
        info!("Repository config removed, remote state invalidated");
        self.invalidate_remote(seq);
        OperationOutcome::Reconfigured { changed: true }
    }

    fn invalidate_remote(&mut self, seq: Sequence) {
        self.last_remote = None;
        self.emit(seq, EventKind::RemoteChanged(None));
        self.emit(
            seq,
            EventKind::StatusChanged("repository config changed, check for update required".to_string()),
        );
    }

    /// Find metadata for a revision among the ones already resolved
    fn lookup(&self, revision: &str) -> RevisionInfo {
        self.last_remote
            .iter()
            .chain(self.last_candidates.iter())
            .chain(self.last_booted.iter())
            .find(|info| info.revision == revision)
            .cloned()
            .unwrap_or_else(|| RevisionInfo::bare(revision))
    }

    fn fail(&self, seq: Sequence, operation: &str, error: StoreError) -> OperationOutcome {
        warn!("{} failed: {}", operation, error);
        self.fail_with(seq, format!("{} failed: {}", operation, error))
    }

    fn fail_with(&self, seq: Sequence, reason: String) -> OperationOutcome {
        self.emit(seq, EventKind::ErrorOccurred(reason.clone()));
        OperationOutcome::Failed(reason)
    }

    fn emit(&self, seq: Sequence, kind: EventKind) {
        // The facade may already be gone during shutdown
        let _ = self.events.send(WorkerEvent { seq, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Store answering from fixed values; `remote` failing simulates a network error
    struct FixedStore {
        booted: RevisionInfo,
        remote: std::result::Result<RevisionInfo, StoreError>,
        candidates: Vec<RevisionInfo>,
        cached: Option<PathBuf>,
    }

    impl TreeStore for FixedStore {
        fn resolve_booted(&self) -> std::result::Result<RevisionInfo, StoreError> {
            Ok(self.booted.clone())
        }

        fn resolve_remote(
            &self,
            _config: &RepositoryConfig,
        ) -> std::result::Result<RevisionInfo, StoreError> {
            self.remote.clone()
        }

        fn list_rollback_candidates(&self) -> std::result::Result<Vec<RevisionInfo>, StoreError> {
            Ok(self.candidates.clone())
        }

        fn fetch(&self, _revision: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Network("offline".to_string()))
        }

        fn set_default(&self, _revision: &str) -> std::result::Result<(), StoreError> {
            Ok(())
        }

        fn cached_tree_path(&self, _revision: &str) -> Option<PathBuf> {
            self.cached.clone()
        }
    }

    fn fixed_store() -> FixedStore {
        FixedStore {
            booted: RevisionInfo::new("rev-A", "{\"version\":\"1.0\"}"),
            remote: Ok(RevisionInfo::new("rev-B", "{\"version\":\"2.0\"}")),
            candidates: vec![RevisionInfo::bare("rev-0")],
            cached: None,
        }
    }

    fn worker_for(store: FixedStore) -> (UpdateWorker<FixedStore>, UnboundedReceiver<WorkerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let worker = UpdateWorker {
            store,
            config: Some(RepositoryConfig::new("https://example.com/repo")),
            phase: Arc::new(Mutex::new(WorkerPhase::Idle)),
            events,
            last_booted: None,
            last_remote: None,
            last_candidates: Vec::new(),
        };
        (worker, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<WorkerEvent>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[test]
    fn test_resting_phases() {
        assert!(!WorkerPhase::Idle.is_busy());
        assert!(!WorkerPhase::FetchedReady("rev-B".to_string()).is_busy());
        assert!(WorkerPhase::Checking.is_busy());
        assert!(WorkerPhase::Fetching.is_busy());
        assert!(WorkerPhase::Applying.is_busy());
        assert!(WorkerPhase::RollingBack.is_busy());
        assert!(WorkerPhase::Configuring.is_busy());
    }

    #[test]
    fn test_check_emits_raw_values() {
        let (mut worker, mut rx) = worker_for(fixed_store());
        let config = RepositoryConfig::new("https://example.com/repo");

        let outcome = worker.check_for_update(3, &config);
        assert_eq!(outcome, OperationOutcome::UpdateFound);

        let kinds = drain(&mut rx);
        assert_eq!(
            kinds,
            vec![
                EventKind::StatusChanged("checking for update".to_string()),
                EventKind::BootedChanged(RevisionInfo::new("rev-A", "{\"version\":\"1.0\"}")),
                EventKind::RemoteChanged(Some(RevisionInfo::new("rev-B", "{\"version\":\"2.0\"}"))),
                EventKind::RollbackChanged(vec![RevisionInfo::bare("rev-0")]),
                EventKind::StatusChanged("update available".to_string()),
            ]
        );
    }

    #[test]
    fn test_check_failure_publishes_no_revisions() {
        let mut store = fixed_store();
        store.remote = Err(StoreError::Network("connection refused".to_string()));
        let (mut worker, mut rx) = worker_for(store);
        let config = RepositoryConfig::new("https://example.com/repo");

        let outcome = worker.check_for_update(1, &config);
        assert!(matches!(outcome, OperationOutcome::Failed(_)));

        let kinds = drain(&mut rx);
        assert!(kinds.iter().all(|k| matches!(
            k,
            EventKind::StatusChanged(_) | EventKind::ErrorOccurred(_)
        )));
        assert!(kinds.iter().any(|k| matches!(k, EventKind::ErrorOccurred(r) if r.contains("connection refused"))));
    }

    #[test]
    fn test_apply_uses_known_metadata() {
        let (mut worker, mut rx) = worker_for(fixed_store());
        let config = RepositoryConfig::new("https://example.com/repo");
        worker.check_for_update(1, &config);
        drain(&mut rx);

        assert_eq!(worker.apply_update(2, "rev-B"), OperationOutcome::Applied);
        let kinds = drain(&mut rx);
        let position = |wanted: &EventKind| kinds.iter().position(|k| k == wanted).unwrap();

        let default = EventKind::DefaultChanged(RevisionInfo::new("rev-B", "{\"version\":\"2.0\"}"));
        let status = EventKind::StatusChanged(STATUS_RESTART_REQUIRED.to_string());
        assert!(position(&default) < position(&status));
        assert!(position(&status) < position(&EventKind::RestartRequired));

        // Unknown revisions get empty metadata
        assert_eq!(worker.apply_update(3, "rev-X"), OperationOutcome::Applied);
        assert!(drain(&mut rx).contains(&EventKind::DefaultChanged(RevisionInfo::bare("rev-X"))));
    }

    #[test]
    fn test_rollback_without_candidates() {
        let mut store = fixed_store();
        store.candidates.clear();
        let (mut worker, mut rx) = worker_for(store);

        assert!(matches!(worker.rollback(1), OperationOutcome::Failed(_)));
        let kinds = drain(&mut rx);
        assert!(!kinds.iter().any(|k| matches!(k, EventKind::DefaultChanged(_))));
        assert!(kinds.iter().any(|k| matches!(k, EventKind::ErrorOccurred(_))));
    }

    #[test]
    fn test_cached_tree_skips_fetch() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = fixed_store();
        store.cached = Some(temp.path().to_path_buf());
        let (mut worker, mut rx) = worker_for(store);

        // The store's fetch always fails, so success proves it was skipped
        assert_eq!(worker.fetch_update(1, "rev-B"), OperationOutcome::Fetched);
        assert_eq!(
            drain(&mut rx),
            vec![EventKind::StatusChanged(STATUS_FETCHED.to_string())]
        );

        let mut store = fixed_store();
        store.cached = Some(temp.path().join("missing"));
        let (mut worker, _rx) = worker_for(store);
        assert!(matches!(worker.fetch_update(1, "rev-B"), OperationOutcome::Failed(_)));
    }

    #[test]
    fn test_config_change_detection() {
        let (mut worker, mut rx) = worker_for(fixed_store());

        let same = RepositoryConfig::new("https://example.com/repo");
        assert_eq!(
            worker.set_repository_config(1, same),
            OperationOutcome::Reconfigured { changed: false }
        );
        assert!(drain(&mut rx).is_empty());

        let mut other = RepositoryConfig::new("https://example.com/repo");
        other.tls_permissive = true;
        assert_eq!(
            worker.set_repository_config(2, other),
            OperationOutcome::Reconfigured { changed: true }
        );
        assert!(drain(&mut rx).contains(&EventKind::RemoteChanged(None)));

        assert_eq!(
            worker.remove_repository_config(3),
            OperationOutcome::Reconfigured { changed: true }
        );
        assert_eq!(
            worker.remove_repository_config(4),
            OperationOutcome::Reconfigured { changed: false }
        );
    }
}
