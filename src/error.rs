// src/error.rs

//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by the OTA client
#[derive(Debug, Error)]
pub enum Error {
    /// A command was dispatched while another one is still in flight
    #[error("Another operation is already in progress ({0})")]
    Busy(String),

    /// The device is not booted into a managed deployment
    #[error("OTA updates are disabled: {0}")]
    Disabled(String),

    /// The worker thread has exited and can no longer accept commands
    #[error("Update worker is no longer running")]
    WorkerGone,

    /// Settings file could not be read or parsed
    #[error("Settings error: {0}")]
    Settings(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for OTA client operations
pub type Result<T> = std::result::Result<T, Error>;
