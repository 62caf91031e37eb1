//! Media route: resolves a reference through the primary source and the legacy
//! store, and streams back whichever answered first.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use gazette_core::constants::{IMMUTABLE_CACHE_CONTROL, MEDIA_SOURCE_HEADER, NO_STORE_CACHE_CONTROL};
use gazette_core::{AppError, MediaKind, MediaPayload, MediaReference, ResolvedMedia};
use gazette_services::validate_url_for_ssrf;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MediaQuery {
    /// Primary (CDN or origin) URL of the asset
    pub url: Option<String>,
    /// Legacy filename; derived from `url` when omitted
    pub file: Option<String>,
    /// `image` (default) or `video`
    pub kind: Option<String>,
}

impl MediaQuery {
    fn into_reference(self) -> Result<MediaReference, AppError> {
        let kind = match self.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(kind) => kind
                .parse::<MediaKind>()
                .map_err(|_| AppError::InvalidInput(format!("Unknown media kind: {}", kind)))?,
            None => MediaKind::default(),
        };

        let url = self.url.filter(|u| !u.trim().is_empty());
        let file = self.file.filter(|f| !f.trim().is_empty());

        let reference = match (url, file) {
            (Some(url), None) => MediaReference::from_stored_url(kind, &url),
            (url, file) => MediaReference::new(kind, url, file),
        };

        if !reference.is_resolvable() {
            return Err(AppError::InvalidInput(
                "Either the url or the file parameter is required".to_string(),
            ));
        }
        Ok(reference)
    }
}

#[utoipa::path(
    get,
    path = "/media",
    tag = "media",
    params(MediaQuery),
    responses(
        (status = 200, description = "Media bytes from the primary source or the legacy store", content_type = "application/octet-stream"),
        (status = 302, description = "Redirect to the primary URL (video passthrough)"),
        (status = 400, description = "Invalid media reference", body = ErrorResponse),
        (status = 404, description = "Media missing from every source", body = ErrorResponse),
        (status = 502, description = "No source could be reached", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "get_media"))]
pub async fn get_media(
    Query(query): Query<MediaQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let mut reference = query.into_reference()?;

    // Fetch and redirect with the parsed form, which is always a valid header value.
    if let Some(url) = &reference.primary_url {
        let primary = &state.config.primary;
        let normalized = validate_url_for_ssrf(
            url,
            primary.allow_private_hosts,
            primary.allowed_hosts.as_deref(),
        )
        .await?;
        reference.primary_url = Some(normalized.to_string());
    }

    let resolved = state.resolver.resolve(&reference).await?;

    tracing::debug!(
        source = %resolved.source_used,
        content_type = %resolved.content_type,
        "Serving resolved media"
    );

    media_response(resolved)
}

fn media_response(resolved: ResolvedMedia) -> Result<Response, HttpAppError> {
    let cache_control = if resolved.cacheable {
        IMMUTABLE_CACHE_CONTROL
    } else {
        NO_STORE_CACHE_CONTROL
    };

    let builder = Response::builder()
        .header(header::CACHE_CONTROL, cache_control)
        .header(MEDIA_SOURCE_HEADER, resolved.source_used.as_str());

    let response = match resolved.payload {
        MediaPayload::Redirect(location) => builder
            .status(StatusCode::FOUND)
            .header(header::LOCATION, location)
            .body(Body::empty()),
        MediaPayload::Bytes(bytes) => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, resolved.content_type)
            .header(header::CONTENT_LENGTH, bytes.len())
            .body(Body::from(bytes)),
    };

    response.map_err(|e| {
        tracing::error!(error = %e, "Failed to build response");
        AppError::Internal(e.to_string()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: Option<&str>, file: Option<&str>, kind: Option<&str>) -> MediaQuery {
        MediaQuery {
            url: url.map(String::from),
            file: file.map(String::from),
            kind: kind.map(String::from),
        }
    }

    #[test]
    fn test_url_only_derives_legacy_filename() {
        let reference = query(Some("https://cdn.example/uploads/a%20b.png"), None, None)
            .into_reference()
            .unwrap();
        assert_eq!(reference.kind, MediaKind::Image);
        assert_eq!(reference.legacy_filename.as_deref(), Some("a b.png"));
    }

    #[test]
    fn test_explicit_file_overrides_derived_name() {
        let reference = query(Some("https://cdn.example/x/123"), Some("old.gif"), Some("video"))
            .into_reference()
            .unwrap();
        assert_eq!(reference.kind, MediaKind::Video);
        assert_eq!(reference.legacy_filename.as_deref(), Some("old.gif"));
    }

    #[test]
    fn test_blank_parameters_are_rejected() {
        let err = query(Some("  "), Some(""), None).into_reference().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = query(None, Some("a.jpg"), Some("audio")).into_reference().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
