//! Test helpers: mock primary fetchers and legacy stores.

pub mod mock_fetcher;
pub mod mock_legacy;

pub use mock_fetcher::{FetchBehavior, MockPrimaryFetcher};
pub use mock_legacy::{LegacyBehavior, MockLegacyStore};
