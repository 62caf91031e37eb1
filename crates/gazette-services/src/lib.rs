//! Gazette Services Layer
//!
//! This crate hosts the media resolver: it combines the primary (CDN/origin)
//! fetcher with the legacy store and re-exports the storage API so that the
//! API crate depends on a single service facade.

pub mod resolver;
pub mod ssrf;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use gazette_storage::{
    create_legacy_store, LegacyBackend, LegacyError, LegacyResult, LegacySession, LegacyStore,
};
pub use resolver::{
    FetchError, HttpPrimaryFetcher, MediaResolver, PrimaryFetcher, PrimaryResponse,
    ResolutionError, SourceFailure, SourceFailures,
};
pub use ssrf::{check_url, validate_url_for_ssrf, UrlRejected};
