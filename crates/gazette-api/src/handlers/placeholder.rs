//! Static placeholder, the last tier of the client-side fallback chain.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use gazette_core::constants::IMMUTABLE_CACHE_CONTROL;

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300" role="img" aria-label="Image unavailable"><rect width="400" height="300" fill="#e5e7eb"/><path d="M150 190l40-50 30 36 20-24 40 38H150z" fill="#9ca3af"/><circle cx="245" cy="120" r="14" fill="#9ca3af"/></svg>"##;

#[utoipa::path(
    get,
    path = "/media/placeholder",
    tag = "media",
    responses(
        (status = 200, description = "Placeholder image", content_type = "image/svg+xml")
    )
)]
pub async fn get_placeholder() -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL),
        ],
        PLACEHOLDER_SVG,
    )
        .into_response()
}
