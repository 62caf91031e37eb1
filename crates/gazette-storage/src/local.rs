use crate::keys::validate_filename;
use crate::traits::{LegacyError, LegacyResult, LegacySession, LegacyStore};
use crate::LegacyBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem legacy store
///
/// Serves a directory tree as if it were the legacy FTP server. Used for
/// development and for deployments where the legacy files are mounted locally.
#[derive(Clone)]
pub struct LocalLegacyStore {
    base_path: PathBuf,
    asset_dir: String,
    max_file_bytes: Option<usize>,
}

impl LocalLegacyStore {
    /// Create a new LocalLegacyStore instance
    ///
    /// # Arguments
    /// * `base_path` - Session root directory (e.g., "/srv/legacy")
    /// * `asset_dir` - Asset directory relative to the root (e.g., "uploads")
    pub fn new(base_path: impl Into<PathBuf>, asset_dir: impl Into<String>) -> Self {
        LocalLegacyStore {
            base_path: base_path.into(),
            asset_dir: asset_dir.into(),
            max_file_bytes: None,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = Some(max_file_bytes);
        self
    }
}

#[async_trait]
impl LegacyStore for LocalLegacyStore {
    async fn connect(&self) -> LegacyResult<Box<dyn LegacySession>> {
        let metadata = fs::metadata(&self.base_path).await.map_err(|e| {
            LegacyError::Connect(format!(
                "Legacy root {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(LegacyError::Connect(format!(
                "Legacy root {} is not a directory",
                self.base_path.display()
            )));
        }

        Ok(Box::new(LocalSession {
            root: self.base_path.clone(),
            cwd: self.base_path.clone(),
            max_file_bytes: self.max_file_bytes,
        }))
    }

    fn asset_dir(&self) -> &str {
        &self.asset_dir
    }

    fn backend_type(&self) -> LegacyBackend {
        LegacyBackend::Local
    }
}

struct LocalSession {
    root: PathBuf,
    cwd: PathBuf,
    max_file_bytes: Option<usize>,
}

impl LocalSession {
    /// Resolve `dir` against the session root. Absolute paths are rooted at the
    /// session root, as on a chrooted FTP account; parent references are rejected.
    fn resolve_dir(&self, dir: &str) -> LegacyResult<PathBuf> {
        let relative = Path::new(dir.trim_start_matches('/'));
        let mut path = if dir.starts_with('/') {
            self.root.clone()
        } else {
            self.cwd.clone()
        };

        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(LegacyError::Navigation(format!(
                        "Directory {} escapes the legacy root",
                        dir
                    )))
                }
            }
        }

        Ok(path)
    }
}

#[async_trait]
impl LegacySession for LocalSession {
    async fn change_dir(&mut self, dir: &str) -> LegacyResult<()> {
        let path = self.resolve_dir(dir)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                self.cwd = path;
                Ok(())
            }
            Ok(_) => Err(LegacyError::Navigation(format!("{} is not a directory", dir))),
            Err(e) => Err(LegacyError::Navigation(format!("{}: {}", dir, e))),
        }
    }

    async fn retrieve(&mut self, filename: &str) -> LegacyResult<Vec<u8>> {
        validate_filename(filename)?;
        let path = self.cwd.join(filename);
        let start = std::time::Instant::now();

        if let Some(limit) = self.max_file_bytes {
            match fs::metadata(&path).await {
                Ok(metadata) if metadata.len() > limit as u64 => {
                    return Err(LegacyError::TooLarge { limit })
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(LegacyError::NotFound(filename.to_string()))
                }
                _ => {}
            }
        }

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LegacyError::NotFound(filename.to_string()))
            }
            Err(e) => {
                return Err(LegacyError::Transfer(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local legacy download successful"
        );

        Ok(data)
    }

    async fn close(self: Box<Self>) -> LegacyResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store_with_file(name: &str, contents: &[u8]) -> (TempDir, LocalLegacyStore) {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("uploads");
        fs::create_dir_all(&uploads).await.unwrap();
        fs::write(uploads.join(name), contents).await.unwrap();
        let store = LocalLegacyStore::new(temp_dir.path(), "uploads");
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_retrieve_from_asset_dir() {
        let (_temp_dir, store) = store_with_file("cover.png", b"png-bytes").await;
        let mut session = store.connect().await.unwrap();
        session.change_dir(store.asset_dir()).await.unwrap();
        let data = session.retrieve("cover.png").await.unwrap();
        assert_eq!(data, b"png-bytes");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_temp_dir, store) = store_with_file("cover.png", b"x").await;
        let mut session = store.connect().await.unwrap();
        session.change_dir("/uploads").await.unwrap();
        let err = session.retrieve("absent.jpg").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_directory_is_navigation_error() {
        let (_temp_dir, store) = store_with_file("cover.png", b"x").await;
        let mut session = store.connect().await.unwrap();
        let err = session.change_dir("archive").await.unwrap_err();
        assert!(matches!(err, LegacyError::Navigation(_)));
    }

    #[tokio::test]
    async fn test_rejects_escaping_directory() {
        let (_temp_dir, store) = store_with_file("cover.png", b"x").await;
        let mut session = store.connect().await.unwrap();
        let err = session.change_dir("uploads/../..").await.unwrap_err();
        assert!(matches!(err, LegacyError::Navigation(_)));
    }

    #[tokio::test]
    async fn test_rejects_traversal_filename() {
        let (_temp_dir, store) = store_with_file("cover.png", b"x").await;
        let mut session = store.connect().await.unwrap();
        let err = session.retrieve("../cover.png").await.unwrap_err();
        assert!(matches!(err, LegacyError::InvalidFilename(_)));
    }

    #[tokio::test]
    async fn test_oversize_file_is_rejected() {
        let (_temp_dir, store) = store_with_file("poster.jpg", &[0u8; 32]).await;
        let store = store.with_max_file_bytes(31);
        let mut session = store.connect().await.unwrap();
        session.change_dir("uploads").await.unwrap();
        let err = session.retrieve("poster.jpg").await.unwrap_err();
        assert!(matches!(err, LegacyError::TooLarge { limit: 31 }));
    }

    #[tokio::test]
    async fn test_file_at_limit_is_served() {
        let (_temp_dir, store) = store_with_file("poster.jpg", &[0u8; 32]).await;
        let store = store.with_max_file_bytes(32);
        let mut session = store.connect().await.unwrap();
        session.change_dir("uploads").await.unwrap();
        assert_eq!(session.retrieve("poster.jpg").await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_connect_fails_for_missing_root() {
        let store = LocalLegacyStore::new("/nonexistent/gazette-legacy-root", "uploads");
        assert!(matches!(store.connect().await, Err(LegacyError::Connect(_))));
    }
}
