//! Gazette API Library
//!
//! HTTP surface of the media resolver: handlers, error conversion, state and
//! application setup.

mod api_doc;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
