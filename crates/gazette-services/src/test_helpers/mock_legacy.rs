//! Mock legacy store that counts opened and closed sessions.

use async_trait::async_trait;
use gazette_storage::{LegacyBackend, LegacyError, LegacyResult, LegacySession, LegacyStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted outcome for every session
#[derive(Debug, Clone)]
pub enum LegacyBehavior {
    /// Serve these bytes for any filename
    Serve(Vec<u8>),
    /// The file does not exist
    Missing,
    /// `change_dir` fails
    NoDirectory,
    /// `connect` fails
    Unreachable,
    /// Serve bytes but fail on close
    FailOnClose(Vec<u8>),
    /// `retrieve` never completes
    Stall,
}

#[derive(Clone)]
pub struct MockLegacyStore {
    behavior: LegacyBehavior,
    asset_dir: String,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
    retrieved: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockLegacyStore {
    pub fn new(behavior: LegacyBehavior) -> Self {
        Self {
            behavior,
            asset_dir: "/public_html/uploads".to_string(),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicUsize::new(0)),
            retrieved: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn serving(data: impl Into<Vec<u8>>) -> Self {
        Self::new(LegacyBehavior::Serve(data.into()))
    }

    /// Sessions successfully opened
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions explicitly closed
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sessions released, whether closed explicitly or dropped
    pub fn released(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// (directory, filename) pairs passed to `retrieve`
    pub fn retrieved(&self) -> Vec<(String, String)> {
        self.retrieved.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacyStore for MockLegacyStore {
    async fn connect(&self) -> LegacyResult<Box<dyn LegacySession>> {
        if matches!(self.behavior, LegacyBehavior::Unreachable) {
            return Err(LegacyError::Connect("connection refused".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            store: self.clone(),
            cwd: "/".to_string(),
        }))
    }

    fn asset_dir(&self) -> &str {
        &self.asset_dir
    }

    fn backend_type(&self) -> LegacyBackend {
        LegacyBackend::Ftp
    }
}

struct MockSession {
    store: MockLegacyStore,
    cwd: String,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.store.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LegacySession for MockSession {
    async fn change_dir(&mut self, dir: &str) -> LegacyResult<()> {
        if matches!(self.store.behavior, LegacyBehavior::NoDirectory) {
            return Err(LegacyError::Navigation(format!("{}: no such directory", dir)));
        }
        self.cwd = dir.to_string();
        Ok(())
    }

    async fn retrieve(&mut self, filename: &str) -> LegacyResult<Vec<u8>> {
        gazette_storage::validate_filename(filename)?;
        self.store
            .retrieved
            .lock()
            .unwrap()
            .push((self.cwd.clone(), filename.to_string()));

        match &self.store.behavior {
            LegacyBehavior::Serve(data) | LegacyBehavior::FailOnClose(data) => Ok(data.clone()),
            LegacyBehavior::Missing => Err(LegacyError::NotFound(filename.to_string())),
            LegacyBehavior::Stall => std::future::pending().await,
            LegacyBehavior::NoDirectory | LegacyBehavior::Unreachable => {
                Err(LegacyError::Transfer("unexpected retrieve".to_string()))
            }
        }
    }

    async fn close(self: Box<Self>) -> LegacyResult<()> {
        self.store.closed.fetch_add(1, Ordering::SeqCst);
        if matches!(self.store.behavior, LegacyBehavior::FailOnClose(_)) {
            return Err(LegacyError::Transfer("QUIT failed".to_string()));
        }
        Ok(())
    }
}
