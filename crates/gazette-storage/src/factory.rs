#[cfg(feature = "legacy-ftp")]
use crate::FtpLegacyStore;
#[cfg(feature = "legacy-local")]
use crate::LocalLegacyStore;
use crate::{LegacyBackend, LegacyResult, LegacyStore};
use gazette_core::Config;
use std::sync::Arc;

/// Create the legacy store based on configuration.
///
/// Returns `None` when the legacy store is disabled.
pub fn create_legacy_store(config: &Config) -> LegacyResult<Option<Arc<dyn LegacyStore>>> {
    match config.legacy.backend {
        #[cfg(feature = "legacy-ftp")]
        LegacyBackend::Ftp => {
            let store = FtpLegacyStore::from_config(&config.legacy)?;
            Ok(Some(Arc::new(store)))
        }

        #[cfg(not(feature = "legacy-ftp"))]
        LegacyBackend::Ftp => Err(crate::LegacyError::ConfigError(
            "FTP legacy store not available (legacy-ftp feature not enabled)".to_string(),
        )),

        #[cfg(feature = "legacy-local")]
        LegacyBackend::Local => {
            let base_path = config.legacy.local_path.clone().ok_or_else(|| {
                crate::LegacyError::ConfigError("LEGACY_LOCAL_PATH not configured".to_string())
            })?;
            let store = LocalLegacyStore::new(base_path, config.legacy.local_dir.clone())
                .with_max_file_bytes(config.legacy.max_file_bytes);
            Ok(Some(Arc::new(store)))
        }

        #[cfg(not(feature = "legacy-local"))]
        LegacyBackend::Local => Err(crate::LegacyError::ConfigError(
            "Local legacy store not available (legacy-local feature not enabled)".to_string(),
        )),

        LegacyBackend::Disabled => Ok(None),
    }
}

#[cfg(all(test, feature = "legacy-local"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_backend_yields_none() {
        let config =
            Config::from_lookup(|key| (key == "LEGACY_STORE_BACKEND").then(|| "none".to_string()))
                .unwrap();
        assert!(create_legacy_store(&config).unwrap().is_none());
    }

    #[test]
    fn test_local_backend() {
        let config = Config::from_lookup(|key| match key {
            "LEGACY_STORE_BACKEND" => Some("local".to_string()),
            "LEGACY_LOCAL_PATH" => Some("/srv/legacy".to_string()),
            "LEGACY_LOCAL_DIR" => Some("uploads".to_string()),
            _ => None,
        })
        .unwrap();
        let store = create_legacy_store(&config).unwrap().unwrap();
        assert_eq!(store.backend_type(), LegacyBackend::Local);
        assert_eq!(store.asset_dir(), "uploads");
    }
}
