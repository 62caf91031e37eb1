use crate::ssrf::check_url;
use async_trait::async_trait;
use bytes::Bytes;
use gazette_core::PrimaryFetchConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE, PRAGMA, REFERER};
use std::time::{Duration, Instant};
use thiserror::Error;

const MAX_REDIRECTS: usize = 5;

/// Primary source fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(Duration::ZERO)
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Raw response from the primary source
#[derive(Debug, Clone)]
pub struct PrimaryResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Empty for non-2xx responses; the body is not read
    pub body: Bytes,
}

impl PrimaryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches media from a CDN or origin URL
#[async_trait]
pub trait PrimaryFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PrimaryResponse, FetchError>;
}

/// `reqwest`-backed primary fetcher.
///
/// Sends a browser-like User-Agent and `no-store` caching headers, since
/// origins may gate on `User-Agent`/`Referer`.
#[derive(Clone)]
pub struct HttpPrimaryFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
    timeout: Duration,
}

impl HttpPrimaryFetcher {
    pub fn new(config: &PrimaryFetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/*,video/*;q=0.9,*/*;q=0.8"),
        );
        if let Some(referer) = &config.referer {
            let value = HeaderValue::from_str(referer)
                .map_err(|e| FetchError::ConfigError(format!("Invalid PRIMARY_REFERER: {}", e)))?;
            headers.insert(REFERER, value);
        }

        // Redirect targets get the same host checks as the original URL.
        let allow_private_hosts = config.allow_private_hosts;
        let allowed_hosts = config.allowed_hosts.clone();
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                return attempt.error("too many redirects");
            }
            match check_url(attempt.url(), allow_private_hosts, allowed_hosts.as_deref()) {
                Ok(()) => attempt.follow(),
                Err(rejected) => {
                    tracing::warn!(url = %attempt.url(), error = %rejected, "Refusing primary redirect");
                    attempt.error(rejected)
                }
            }
        });

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect_policy)
            .build()
            .map_err(|e| FetchError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
            timeout: config.timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        match FetchError::from(err) {
            FetchError::Timeout(_) => FetchError::Timeout(self.timeout),
            other => other,
        }
    }
}

#[async_trait]
impl PrimaryFetcher for HttpPrimaryFetcher {
    async fn fetch(&self, url: &str) -> Result<PrimaryResponse, FetchError> {
        let start = Instant::now();

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        if !response.status().is_success() {
            return Ok(PrimaryResponse {
                status,
                content_type,
                body: Bytes::new(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            status,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Primary fetch completed"
        );

        Ok(PrimaryResponse {
            status,
            content_type,
            body: Bytes::from(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::constants::DEFAULT_USER_AGENT;

    fn fetch_config() -> PrimaryFetchConfig {
        PrimaryFetchConfig {
            timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: Some("https://news.example/".to_string()),
            max_body_bytes: 1024,
            allowed_hosts: None,
            allow_private_hosts: true,
            video_passthrough: false,
        }
    }

    #[tokio::test]
    async fn test_fetch_success_sends_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/x.jpg")
            .match_header("user-agent", DEFAULT_USER_AGENT)
            .match_header("cache-control", "no-store")
            .match_header("referer", "https://news.example/")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(vec![0xFF, 0xD8, 0xFF, 0xE0])
            .create_async()
            .await;

        let fetcher = HttpPrimaryFetcher::new(&fetch_config()).unwrap();
        let response = fetcher
            .fetch(&format!("{}/x.jpg", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(response.body.as_ref(), &[0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn test_fetch_not_found_returns_status_without_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let fetcher = HttpPrimaryFetcher::new(&fetch_config()).unwrap();
        let response = fetcher
            .fetch(&format!("{}/missing.jpg", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/huge.jpg")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let fetcher = HttpPrimaryFetcher::new(&fetch_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/huge.jpg", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::TooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = HttpPrimaryFetcher::new(&fetch_config()).unwrap();
        let result = fetcher
            .fetch(&format!("http://127.0.0.1:{}/x.jpg", port))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_redirect_to_private_host_is_refused() {
        let mut origin = mockito::Server::new_async().await;
        let mut internal = mockito::Server::new_async().await;
        let metadata = internal
            .mock("GET", "/latest/meta-data")
            .with_status(200)
            .with_body("iam-credentials")
            .expect(0)
            .create_async()
            .await;
        origin
            .mock("GET", "/x.jpg")
            .with_status(302)
            .with_header("location", &format!("{}/latest/meta-data", internal.url()))
            .create_async()
            .await;

        let mut config = fetch_config();
        config.allow_private_hosts = false;
        let fetcher = HttpPrimaryFetcher::new(&config).unwrap();
        let result = fetcher.fetch(&format!("{}/x.jpg", origin.url())).await;

        assert!(matches!(result, Err(FetchError::Request(_))));
        metadata.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_followed_when_target_allowed() {
        let mut origin = mockito::Server::new_async().await;
        let mut cdn = mockito::Server::new_async().await;
        cdn.mock("GET", "/y.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png")
            .create_async()
            .await;
        origin
            .mock("GET", "/y.png")
            .with_status(301)
            .with_header("location", &format!("{}/y.png", cdn.url()))
            .create_async()
            .await;

        let fetcher = HttpPrimaryFetcher::new(&fetch_config()).unwrap();
        let response = fetcher
            .fetch(&format!("{}/y.png", origin.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"png");
    }

    #[tokio::test]
    async fn test_redirect_outside_allowlist_is_refused() {
        let mut origin = mockito::Server::new_async().await;
        origin
            .mock("GET", "/z.jpg")
            .with_status(302)
            .with_header("location", "http://attacker.example/z.jpg")
            .create_async()
            .await;

        let mut config = fetch_config();
        config.allowed_hosts = Some(vec!["127.0.0.1".to_string()]);
        let fetcher = HttpPrimaryFetcher::new(&config).unwrap();
        let result = fetcher.fetch(&format!("{}/z.jpg", origin.url())).await;

        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[test]
    fn test_invalid_referer_rejected() {
        let mut config = fetch_config();
        config.referer = Some("bad\nvalue".to_string());
        assert!(matches!(
            HttpPrimaryFetcher::new(&config),
            Err(FetchError::ConfigError(_))
        ));
    }
}
