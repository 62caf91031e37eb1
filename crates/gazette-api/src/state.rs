//! Application state shared by all handlers.

use gazette_core::Config;
use gazette_services::MediaResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resolver: MediaResolver,
}

impl AppState {
    pub fn new(config: Config, resolver: MediaResolver) -> Self {
        Self { config, resolver }
    }
}
