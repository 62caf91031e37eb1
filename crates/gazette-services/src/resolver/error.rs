use gazette_core::{AppError, MediaSource};
use std::fmt;
use thiserror::Error;

/// Why one source attempt did not produce media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: MediaSource,
    pub reason: String,
    /// The source explicitly reported the asset as absent
    pub absent: bool,
}

impl SourceFailure {
    pub fn new(source: MediaSource, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
            absent: false,
        }
    }

    pub fn absent(source: MediaSource, reason: impl Into<String>) -> Self {
        Self {
            source,
            reason: reason.into(),
            absent: true,
        }
    }
}

/// Ordered record of every failed source attempt in one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFailures(Vec<SourceFailure>);

impl SourceFailures {
    pub fn push(&mut self, failure: SourceFailure) {
        self.0.push(failure);
    }

    pub fn attempts(&self) -> &[SourceFailure] {
        &self.0
    }

    /// True when at least one source was tried and every tried source reported absence.
    pub fn all_absent(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|f| f.absent)
    }
}

impl fmt::Display for SourceFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no source attempted");
        }
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", failure.source, failure.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for SourceFailures {}

/// Caller-visible resolution failure. Transport faults never escape as-is;
/// they are retained inside `SourceFailures` for server-side logging.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid media reference: {0}")]
    InvalidReference(String),

    #[error("Media not found in any source")]
    NotFound(#[source] SourceFailures),

    #[error("All media sources failed")]
    UpstreamUnavailable(#[source] SourceFailures),
}

impl ResolutionError {
    pub(crate) fn exhausted(failures: SourceFailures) -> Self {
        if failures.all_absent() {
            ResolutionError::NotFound(failures)
        } else {
            ResolutionError::UpstreamUnavailable(failures)
        }
    }

    pub fn failures(&self) -> Option<&SourceFailures> {
        match self {
            ResolutionError::InvalidReference(_) => None,
            ResolutionError::NotFound(failures) | ResolutionError::UpstreamUnavailable(failures) => {
                Some(failures)
            }
        }
    }
}

impl From<ResolutionError> for AppError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::InvalidReference(msg) => AppError::InvalidInput(msg),
            ResolutionError::NotFound(_) => AppError::NotFound("Media not found".to_string()),
            ResolutionError::UpstreamUnavailable(failures) => {
                AppError::UpstreamUnavailable(failures.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ErrorMetadata;

    #[test]
    fn test_all_absent_classifies_as_not_found() {
        let mut failures = SourceFailures::default();
        failures.push(SourceFailure::absent(MediaSource::Primary, "HTTP 404"));
        failures.push(SourceFailure::absent(MediaSource::Legacy, "File not found: x.jpg"));
        let err = ResolutionError::exhausted(failures);
        assert!(matches!(err, ResolutionError::NotFound(_)));
        assert_eq!(AppError::from(err).http_status_code(), 404);
    }

    #[test]
    fn test_any_transport_failure_classifies_as_unavailable() {
        let mut failures = SourceFailures::default();
        failures.push(SourceFailure::absent(MediaSource::Primary, "HTTP 404"));
        failures.push(SourceFailure::new(MediaSource::Legacy, "Connection failed: refused"));
        let err = ResolutionError::exhausted(failures);
        assert!(matches!(err, ResolutionError::UpstreamUnavailable(_)));

        let app_error = AppError::from(err);
        assert_eq!(app_error.http_status_code(), 502);
        assert!(!app_error.client_message().contains("refused"));
    }

    #[test]
    fn test_display_lists_attempts_in_order() {
        let mut failures = SourceFailures::default();
        failures.push(SourceFailure::new(MediaSource::Primary, "empty body"));
        failures.push(SourceFailure::absent(MediaSource::Legacy, "File not found: a.png"));
        assert_eq!(
            failures.to_string(),
            "primary: empty body; legacy: File not found: a.png"
        );
    }

    #[test]
    fn test_no_attempts_is_unavailable() {
        let err = ResolutionError::exhausted(SourceFailures::default());
        assert!(matches!(err, ResolutionError::UpstreamUnavailable(_)));
    }
}
