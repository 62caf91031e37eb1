//! Media resolution across the primary source and the legacy store.

mod error;
mod fetcher;
mod service;

pub use error::{ResolutionError, SourceFailure, SourceFailures};
pub use fetcher::{FetchError, HttpPrimaryFetcher, PrimaryFetcher, PrimaryResponse};
pub use service::MediaResolver;
