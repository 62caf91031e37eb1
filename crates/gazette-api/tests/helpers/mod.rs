//! Test helpers: build AppState and router around mock sources.
//!
//! Run from workspace root: `cargo test -p gazette-api`.

use axum_test::TestServer;
use gazette_api::setup::routes;
use gazette_api::state::AppState;
use gazette_core::Config;
use gazette_services::test_helpers::{MockLegacyStore, MockPrimaryFetcher};
use gazette_services::{LegacyStore, MediaResolver};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Test application: server plus handles on the mocks behind it.
pub struct TestApp {
    pub server: TestServer,
    pub fetcher: MockPrimaryFetcher,
    pub legacy: Option<MockLegacyStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Configuration for tests. Private hosts are allowed so that no DNS lookups happen.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("LEGACY_STORE_BACKEND".to_string(), "none".to_string()),
        ("MEDIA_ALLOW_PRIVATE_HOSTS".to_string(), "true".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config should parse")
}

pub fn setup_test_app(fetcher: MockPrimaryFetcher, legacy: Option<MockLegacyStore>) -> TestApp {
    setup_test_app_with_config(test_config(&[]), fetcher, legacy)
}

pub fn setup_test_app_with_config(
    config: Config,
    fetcher: MockPrimaryFetcher,
    legacy: Option<MockLegacyStore>,
) -> TestApp {
    let resolver = MediaResolver::new(
        Arc::new(fetcher.clone()),
        legacy
            .clone()
            .map(|store| Arc::new(store) as Arc<dyn LegacyStore>),
        Duration::from_secs(2),
    )
    .with_video_passthrough(config.primary.video_passthrough)
    .with_legacy_timeout(config.legacy.ftp_timeout);

    let state = Arc::new(AppState::new(config.clone(), resolver));
    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        fetcher,
        legacy,
    }
}
