//! Mock primary fetcher that records every requested URL.

use crate::resolver::{FetchError, PrimaryFetcher, PrimaryResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted outcome for every fetch
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    Respond {
        status: u16,
        content_type: Option<String>,
        body: Bytes,
    },
    ConnectError,
    /// Sleep before answering, to exercise timeouts
    Hang(Duration),
}

#[derive(Clone)]
pub struct MockPrimaryFetcher {
    behavior: FetchBehavior,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockPrimaryFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(FetchBehavior::Respond {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        })
    }

    pub fn status(status: u16) -> Self {
        Self::new(FetchBehavior::Respond {
            status,
            content_type: None,
            body: Bytes::new(),
        })
    }

    pub fn connect_error() -> Self {
        Self::new(FetchBehavior::ConnectError)
    }

    pub fn hang(duration: Duration) -> Self {
        Self::new(FetchBehavior::Hang(duration))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PrimaryFetcher for MockPrimaryFetcher {
    async fn fetch(&self, url: &str) -> Result<PrimaryResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        match &self.behavior {
            FetchBehavior::Respond {
                status,
                content_type,
                body,
            } => Ok(PrimaryResponse {
                status: *status,
                content_type: content_type.clone(),
                body: body.clone(),
            }),
            FetchBehavior::ConnectError => {
                Err(FetchError::Connect("connection refused".to_string()))
            }
            FetchBehavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(PrimaryResponse {
                    status: 200,
                    content_type: Some("image/jpeg".to_string()),
                    body: Bytes::from_static(b"late"),
                })
            }
        }
    }
}
