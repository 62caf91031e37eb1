//! Gazette Storage Library
//!
//! This crate provides the legacy file-store abstraction used as the fallback
//! source for media that has not been migrated to the CDN, with an FTP backend
//! and a local filesystem backend.
//!
//! # Session model
//!
//! A store hands out one session per `connect()` call. Callers acquire a
//! session, navigate into the asset directory, retrieve the file and close the
//! session within a single request. Sessions are never shared across requests;
//! dropping a session without closing it still releases the connection.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "legacy-ftp")]
pub mod ftp;
#[cfg(feature = "legacy-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_legacy_store;
#[cfg(feature = "legacy-ftp")]
pub use ftp::FtpLegacyStore;
pub use gazette_core::LegacyBackend;
pub use keys::validate_filename;
#[cfg(feature = "legacy-local")]
pub use local::LocalLegacyStore;
pub use traits::{LegacyError, LegacyResult, LegacySession, LegacyStore};
