//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use gazette_core::models;

pub fn openapi_document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gazette Media API",
        version = "0.1.0",
        description = "Resolves article media from the CDN or origin, falling back to the legacy file store."
    ),
    paths(
        handlers::media_get::get_media,
        handlers::placeholder::get_placeholder,
    ),
    components(schemas(error::ErrorResponse, models::MediaKind)),
    tags(
        (name = "media", description = "Media resolution")
    )
)]
struct ApiDoc;
