//! Legacy store abstraction traits

use crate::LegacyBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Legacy store operation errors
#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Directory navigation failed: {0}")]
    Navigation(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Legacy transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Session already closed")]
    Closed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LegacyError {
    /// Whether the store explicitly reported the file as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, LegacyError::NotFound(_))
    }
}

/// Result type for legacy store operations
pub type LegacyResult<T> = Result<T, LegacyError>;

/// A legacy file store that hands out short-lived sessions.
///
/// Implementations must not cache sessions across `connect()` calls; a pool may
/// sit behind `connect()` as long as every returned session is exclusive to
/// its caller until closed.
#[async_trait]
pub trait LegacyStore: Send + Sync {
    /// Open a new authenticated session
    async fn connect(&self) -> LegacyResult<Box<dyn LegacySession>>;

    /// Fixed directory holding the assets, relative to the session root
    fn asset_dir(&self) -> &str;

    /// Get the legacy backend type
    fn backend_type(&self) -> LegacyBackend;
}

/// One open connection to a legacy store.
#[async_trait]
pub trait LegacySession: Send {
    /// Change the working directory
    async fn change_dir(&mut self, dir: &str) -> LegacyResult<()>;

    /// Download a file from the working directory into memory
    async fn retrieve(&mut self, filename: &str) -> LegacyResult<Vec<u8>>;

    /// Close the session, releasing the underlying connection
    async fn close(self: Box<Self>) -> LegacyResult<()>;
}
