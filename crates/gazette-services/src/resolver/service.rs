use super::error::{ResolutionError, SourceFailure, SourceFailures};
use super::fetcher::{FetchError, PrimaryFetcher};
use bytes::Bytes;
use gazette_core::mime::{concrete_content_type, content_type_for_filename};
use gazette_core::{MediaKind, MediaPayload, MediaReference, MediaSource, ResolvedMedia};
use gazette_storage::{validate_filename, LegacyError, LegacyResult, LegacySession, LegacyStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_LEGACY_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolves media references by trying the primary source, then the legacy store.
///
/// Holds no per-request state; one instance is shared by all requests.
#[derive(Clone)]
pub struct MediaResolver {
    fetcher: Arc<dyn PrimaryFetcher>,
    legacy: Option<Arc<dyn LegacyStore>>,
    primary_timeout: Duration,
    legacy_timeout: Duration,
    video_passthrough: bool,
}

impl MediaResolver {
    pub fn new(
        fetcher: Arc<dyn PrimaryFetcher>,
        legacy: Option<Arc<dyn LegacyStore>>,
        primary_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            legacy,
            primary_timeout,
            legacy_timeout: DEFAULT_LEGACY_TIMEOUT,
            video_passthrough: false,
        }
    }

    /// Upper bound on one whole legacy attempt, from connect through close.
    pub fn with_legacy_timeout(mut self, timeout: Duration) -> Self {
        self.legacy_timeout = timeout;
        self
    }

    /// Redirect video references to their primary URL instead of proxying the bytes.
    pub fn with_video_passthrough(mut self, enabled: bool) -> Self {
        self.video_passthrough = enabled;
        self
    }

    pub fn legacy_store(&self) -> Option<&Arc<dyn LegacyStore>> {
        self.legacy.as_ref()
    }

    /// Resolve a reference into displayable media.
    ///
    /// Each source attempt is independent: any failure advances to the next
    /// source, and only exhaustion of all sources is returned as an error.
    #[tracing::instrument(
        skip(self, reference),
        fields(
            kind = %reference.kind,
            primary_url = ?reference.primary_url,
            legacy_filename = ?reference.legacy_filename
        )
    )]
    pub async fn resolve(&self, reference: &MediaReference) -> Result<ResolvedMedia, ResolutionError> {
        if !reference.is_resolvable() {
            return Err(ResolutionError::InvalidReference(
                "Reference has neither a primary URL nor a legacy filename".to_string(),
            ));
        }

        if reference.primary_url.is_none() {
            if let Some(filename) = &reference.legacy_filename {
                validate_filename(filename)
                    .map_err(|e| ResolutionError::InvalidReference(e.to_string()))?;
            }
        }

        if self.video_passthrough && reference.kind == MediaKind::Video {
            if let Some(url) = &reference.primary_url {
                tracing::debug!("Passing video reference through to primary URL");
                return Ok(ResolvedMedia {
                    payload: MediaPayload::Redirect(url.clone()),
                    content_type: reference.fallback_content_type(),
                    cacheable: false,
                    source_used: MediaSource::Passthrough,
                });
            }
        }

        let mut failures = SourceFailures::default();

        if let Some(url) = &reference.primary_url {
            match self.attempt_primary(reference, url).await {
                Ok(resolved) => return Ok(resolved),
                Err(failure) => failures.push(failure),
            }
        }

        if let Some(filename) = &reference.legacy_filename {
            match &self.legacy {
                Some(store) => match self.attempt_legacy(store.as_ref(), reference, filename).await {
                    Ok(resolved) => return Ok(resolved),
                    Err(failure) => failures.push(failure),
                },
                None => tracing::debug!("Legacy store disabled, skipping legacy attempt"),
            }
        }

        let err = ResolutionError::exhausted(failures);
        tracing::warn!(error = %err, causes = %err.failures().map(ToString::to_string).unwrap_or_default(), "Media resolution exhausted all sources");
        Err(err)
    }

    async fn attempt_primary(
        &self,
        reference: &MediaReference,
        url: &str,
    ) -> Result<ResolvedMedia, SourceFailure> {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(self.primary_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.primary_timeout)),
        };
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(error = %e, duration_ms, "Primary source failed");
                return Err(SourceFailure::new(MediaSource::Primary, e.to_string()));
            }
        };

        if !response.is_success() {
            tracing::info!(status = response.status, duration_ms, "Primary source returned non-success status");
            let reason = format!("HTTP {}", response.status);
            return Err(if matches!(response.status, 404 | 410) {
                SourceFailure::absent(MediaSource::Primary, reason)
            } else {
                SourceFailure::new(MediaSource::Primary, reason)
            });
        }

        if response.body.is_empty() {
            tracing::info!(status = response.status, duration_ms, "Primary source returned an empty body");
            return Err(SourceFailure::new(MediaSource::Primary, "empty body"));
        }

        let content_type = response
            .content_type
            .as_deref()
            .and_then(concrete_content_type)
            .unwrap_or_else(|| reference.fallback_content_type());

        tracing::info!(
            size_bytes = response.body.len(),
            content_type = %content_type,
            duration_ms,
            "Resolved media from primary source"
        );

        Ok(ResolvedMedia {
            payload: MediaPayload::Bytes(response.body),
            content_type,
            cacheable: true,
            source_used: MediaSource::Primary,
        })
    }

    /// Acquire a session, download, release. The session is closed on every path
    /// that completes in time; on timeout, dropping the session releases it.
    async fn attempt_legacy(
        &self,
        store: &dyn LegacyStore,
        reference: &MediaReference,
        filename: &str,
    ) -> Result<ResolvedMedia, SourceFailure> {
        let start = Instant::now();

        let attempt = async {
            let mut session = store.connect().await?;
            let outcome = download(session.as_mut(), store.asset_dir(), filename).await;
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "Failed to close legacy session cleanly");
            }
            outcome
        };
        let outcome = match tokio::time::timeout(self.legacy_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(LegacyError::Timeout(self.legacy_timeout)),
        };
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let data = match outcome {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                tracing::info!(duration_ms, "Legacy store returned an empty file");
                return Err(SourceFailure::new(MediaSource::Legacy, "empty file"));
            }
            Err(e) => {
                tracing::info!(error = %e, duration_ms, "Legacy source failed");
                return Err(legacy_failure(e));
            }
        };

        let content_type = content_type_for_filename(reference.kind, filename).to_string();

        tracing::info!(
            size_bytes = data.len(),
            content_type = %content_type,
            duration_ms,
            "Resolved media from legacy store"
        );

        Ok(ResolvedMedia {
            payload: MediaPayload::Bytes(Bytes::from(data)),
            content_type,
            cacheable: true,
            source_used: MediaSource::Legacy,
        })
    }
}

async fn download(
    session: &mut dyn LegacySession,
    asset_dir: &str,
    filename: &str,
) -> LegacyResult<Vec<u8>> {
    session.change_dir(asset_dir).await?;
    session.retrieve(filename).await
}

fn legacy_failure(err: LegacyError) -> SourceFailure {
    if err.is_not_found() {
        SourceFailure::absent(MediaSource::Legacy, err.to_string())
    } else {
        SourceFailure::new(MediaSource::Legacy, err.to_string())
    }
}
