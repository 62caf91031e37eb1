//! HTTP error response conversion
//!
//! Handlers return `Result<Response, HttpAppError>`. Anything convertible into
//! `AppError` becomes an `HttpAppError` through `?` and renders with a
//! consistent status, body and log line.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use gazette_core::{AppError, ErrorMetadata, LogLevel};
use gazette_services::{ResolutionError, UrlRejected};

pub use gazette_infra::ErrorResponse;

/// Wrapper that lets `AppError` implement `IntoResponse` (orphan rule)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<ResolutionError> for HttpAppError {
    fn from(err: ResolutionError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<UrlRejected> for HttpAppError {
    fn from(err: UrlRejected) -> Self {
        HttpAppError(AppError::InvalidInput(err.to_string()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

tokio::task_local! {
    static EXPOSE_ERROR_DETAILS: bool;
}

/// Scopes the configured error-detail setting over the rest of the request.
///
/// Errors rendered outside this middleware never carry details.
pub async fn error_detail_middleware(
    State(expose_details): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    EXPOSE_ERROR_DETAILS
        .scope(expose_details, next.run(request))
        .await
}

fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.try_with(|expose| *expose).unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let mut body = ErrorResponse::new(app_error.client_message(), app_error.error_code());
        body.recoverable = app_error.is_recoverable();
        body.suggested_action = app_error.suggested_action().map(String::from);

        // Details stay server-side in production and for errors that describe upstream internals
        if expose_error_details() && !app_error.is_sensitive() {
            body.details = Some(app_error.detailed_message());
            body.error_type = Some(app_error.error_type().to_string());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_details_hidden_outside_scope() {
        let response = HttpAppError(AppError::InvalidInput("bad kind".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!expose_error_details());
    }

    #[tokio::test]
    async fn test_scope_controls_details() {
        assert!(EXPOSE_ERROR_DETAILS.scope(true, async { expose_error_details() }).await);
        assert!(!EXPOSE_ERROR_DETAILS.scope(false, async { expose_error_details() }).await);
    }
}
