// tests/common/mod.rs

//! Shared test utilities: a scripted in-memory tree store and client setup.

#![allow(dead_code)]

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use treeota::{
    ClientOptions, OtaClient, RepositoryConfig, RevisionInfo, StoreError, TreeStore,
};

#[derive(Default)]
struct MockState {
    booted: Mutex<Option<RevisionInfo>>,
    remote: Mutex<Option<Result<RevisionInfo, StoreError>>>,
    candidates: Mutex<Vec<RevisionInfo>>,
    fetch_error: Mutex<Option<StoreError>>,
    set_default_error: Mutex<Option<StoreError>>,
    calls: Mutex<Vec<String>>,
    gate_closed: Mutex<bool>,
    gate: Condvar,
}

/// Tree store answering from values the test sets up.
///
/// Clones share state, so a test keeps one clone to steer the store after
/// the other has been moved into the client. Closing the gate makes every
/// store call block until it is opened again.
#[derive(Clone, Default)]
pub struct MockTreeStore {
    state: Arc<MockState>,
}

impl MockTreeStore {
    pub fn new(booted: &str, remote: &str) -> Self {
        let store = Self::default();
        store.set_booted(booted);
        store.set_remote(remote);
        store
    }

    pub fn set_booted(&self, revision: &str) {
        *self.state.booted.lock() = Some(RevisionInfo::new(revision, format!("{{\"rev\":\"{}\"}}", revision)));
    }

    pub fn set_remote(&self, revision: &str) {
        *self.state.remote.lock() =
            Some(Ok(RevisionInfo::new(revision, format!("{{\"rev\":\"{}\"}}", revision))));
    }

    pub fn fail_remote(&self, error: StoreError) {
        *self.state.remote.lock() = Some(Err(error));
    }

    pub fn set_candidates(&self, revisions: &[&str]) {
        *self.state.candidates.lock() = revisions.iter().map(|r| RevisionInfo::bare(*r)).collect();
    }

    pub fn fail_fetch(&self, error: StoreError) {
        *self.state.fetch_error.lock() = Some(error);
    }

    pub fn fail_set_default(&self, error: StoreError) {
        *self.state.set_default_error.lock() = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().clone()
    }

    pub fn close_gate(&self) {
        *self.state.gate_closed.lock() = true;
    }

    pub fn open_gate(&self) {
        *self.state.gate_closed.lock() = false;
        self.state.gate.notify_all();
    }

    fn enter(&self, call: String) {
        let mut closed = self.state.gate_closed.lock();
        while *closed {
            self.state.gate.wait(&mut closed);
        }
        drop(closed);
        self.state.calls.lock().push(call);
    }
}

impl TreeStore for MockTreeStore {
    fn resolve_booted(&self) -> Result<RevisionInfo, StoreError> {
        self.enter("resolve_booted".to_string());
        self.state
            .booted
            .lock()
            .clone()
            .ok_or_else(|| StoreError::NotFound("no booted deployment".to_string()))
    }

    fn resolve_remote(&self, config: &RepositoryConfig) -> Result<RevisionInfo, StoreError> {
        self.enter(format!("resolve_remote:{}", config.url));
        self.state
            .remote
            .lock()
            .clone()
            .unwrap_or_else(|| Err(StoreError::NotFound("no remote head".to_string())))
    }

    fn list_rollback_candidates(&self) -> Result<Vec<RevisionInfo>, StoreError> {
        self.enter("list_rollback_candidates".to_string());
        Ok(self.state.candidates.lock().clone())
    }

    fn fetch(&self, revision: &str) -> Result<(), StoreError> {
        self.enter(format!("fetch:{}", revision));
        match self.state.fetch_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn set_default(&self, revision: &str) -> Result<(), StoreError> {
        self.enter(format!("set_default:{}", revision));
        match self.state.set_default_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub const REPO_URL: &str = "https://updates.example.com/repo";

/// Sysroot directory that marks the device as OTA-managed
pub fn managed_sysroot() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(temp.path().join("ostree")).unwrap();
    temp
}

/// Client over `store` with a repository configured.
///
/// Returns (TempDir, client) - keep the TempDir alive for the test.
pub fn client_with(store: &MockTreeStore) -> (TempDir, OtaClient) {
    let sysroot = managed_sysroot();
    let options =
        ClientOptions::for_sysroot(sysroot.path()).with_repository(RepositoryConfig::new(REPO_URL));
    let client = OtaClient::new(store.clone(), options).unwrap();
    (sysroot, client)
}

/// Block until the worker has left its busy phase without pumping events
pub fn wait_until_resting(client: &OtaClient) {
    for _ in 0..500 {
        if !client.phase().is_busy() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("worker did not finish in time");
}
