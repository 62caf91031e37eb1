//! Gazette Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! content-type inference shared across all Gazette components.

pub mod config;
pub mod constants;
pub mod error;
pub mod mime;
pub mod models;

// Re-export commonly used types
pub use config::{Config, LegacyBackend, LegacyStoreConfig, PrimaryFetchConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaKind, MediaPayload, MediaReference, MediaSource, ResolvedMedia};
