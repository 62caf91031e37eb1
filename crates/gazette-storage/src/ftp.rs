use crate::keys::validate_filename;
use crate::traits::{LegacyError, LegacyResult, LegacySession, LegacyStore};
use crate::LegacyBackend;
use async_trait::async_trait;
use gazette_core::LegacyStoreConfig;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};

const DEFAULT_MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

/// FTP-backed legacy store
///
/// Every `connect()` opens a fresh control connection in passive binary mode.
/// The blocking `suppaftp` client runs on tokio's blocking pool.
#[derive(Clone)]
pub struct FtpLegacyStore {
    host: String,
    port: u16,
    user: String,
    password: String,
    asset_dir: String,
    timeout: Duration,
    max_file_bytes: usize,
}

impl FtpLegacyStore {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        asset_dir: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            asset_dir: asset_dir.into(),
            timeout,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Downloads larger than this fail with `LegacyError::TooLarge`
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Build the store from configuration. All connection parameters are required.
    pub fn from_config(config: &LegacyStoreConfig) -> LegacyResult<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| LegacyError::ConfigError(format!("{} not configured", name)))
        };

        Ok(Self::new(
            required(&config.ftp_host, "LEGACY_FTP_HOST")?,
            config.ftp_port,
            required(&config.ftp_user, "LEGACY_FTP_USER")?,
            required(&config.ftp_password, "LEGACY_FTP_PASSWORD")?,
            required(&config.ftp_dir, "LEGACY_FTP_DIR")?,
            config.ftp_timeout,
        )
        .with_max_file_bytes(config.max_file_bytes))
    }

    fn open_stream(&self) -> LegacyResult<FtpStream> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| LegacyError::Connect(format!("Failed to resolve legacy host: {}", e)))?
            .next()
            .ok_or_else(|| LegacyError::Connect("Legacy host did not resolve".to_string()))?;

        let timeout = self.timeout;
        let mut stream = FtpStream::connect_timeout(addr, timeout)
            .map_err(|e| LegacyError::Connect(e.to_string()))?
            .passive_stream_builder(move |data_addr| {
                let data = TcpStream::connect_timeout(&data_addr, timeout)
                    .map_err(FtpError::ConnectionError)?;
                data.set_read_timeout(Some(timeout))
                    .map_err(FtpError::ConnectionError)?;
                Ok(data)
            });
        stream
            .get_ref()
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| LegacyError::Connect(format!("Failed to set read timeout: {}", e)))?;

        if let Err(e) = stream.login(&self.user, &self.password) {
            let _ = stream.quit();
            return Err(LegacyError::Auth(e.to_string()));
        }

        if let Err(e) = stream.transfer_type(FileType::Binary) {
            let _ = stream.quit();
            return Err(LegacyError::Connect(format!(
                "Failed to switch to binary mode: {}",
                e
            )));
        }

        Ok(stream)
    }
}

#[async_trait]
impl LegacyStore for FtpLegacyStore {
    async fn connect(&self) -> LegacyResult<Box<dyn LegacySession>> {
        let store = self.clone();
        let start = Instant::now();

        let stream = tokio::task::spawn_blocking(move || store.open_stream())
            .await
            .map_err(|e| LegacyError::Connect(format!("FTP connect task failed: {}", e)))??;

        tracing::debug!(
            host = %self.host,
            port = self.port,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Legacy FTP session opened"
        );

        Ok(Box::new(FtpSession {
            stream: Some(stream),
            max_file_bytes: self.max_file_bytes,
        }))
    }

    fn asset_dir(&self) -> &str {
        &self.asset_dir
    }

    fn backend_type(&self) -> LegacyBackend {
        LegacyBackend::Ftp
    }
}

/// One FTP control connection. Dropping the session closes the socket.
struct FtpSession {
    stream: Option<FtpStream>,
    max_file_bytes: usize,
}

impl FtpSession {
    /// Run a blocking FTP command on the pooled thread, handing the stream back afterwards.
    async fn run<T, F>(&mut self, op: F) -> LegacyResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> LegacyResult<T> + Send + 'static,
    {
        let mut stream = self.stream.take().ok_or(LegacyError::Closed)?;

        let (stream, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        })
        .await
        .map_err(|e| LegacyError::Transfer(format!("FTP task failed: {}", e)))?;

        self.stream = Some(stream);
        result
    }
}

fn is_file_unavailable(err: &FtpError) -> bool {
    matches!(
        err,
        FtpError::UnexpectedResponse(response) if matches!(response.status, Status::FileUnavailable)
    )
}

#[async_trait]
impl LegacySession for FtpSession {
    async fn change_dir(&mut self, dir: &str) -> LegacyResult<()> {
        let dir = dir.to_string();
        self.run(move |stream| {
            stream
                .cwd(&dir)
                .map_err(|e| LegacyError::Navigation(format!("{}: {}", dir, e)))
        })
        .await
    }

    async fn retrieve(&mut self, filename: &str) -> LegacyResult<Vec<u8>> {
        validate_filename(filename)?;
        let filename = filename.to_string();
        let limit = self.max_file_bytes;
        let start = Instant::now();

        let data = self
            .run(move |stream| {
                let mut exceeded = false;
                let result = stream.retr(&filename, |reader| {
                    let mut buf = Vec::new();
                    reader
                        .take(limit as u64 + 1)
                        .read_to_end(&mut buf)
                        .map_err(FtpError::ConnectionError)?;
                    exceeded = buf.len() > limit;
                    Ok(buf)
                });

                // An aborted oversize transfer may also fail to finalize.
                if exceeded {
                    return Err(LegacyError::TooLarge { limit });
                }
                match result {
                    Ok(buf) => Ok(buf),
                    Err(e) if is_file_unavailable(&e) => Err(LegacyError::NotFound(filename)),
                    Err(e) => Err(LegacyError::Transfer(e.to_string())),
                }
            })
            .await?;

        tracing::debug!(
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Legacy FTP download successful"
        );

        Ok(data)
    }

    async fn close(mut self: Box<Self>) -> LegacyResult<()> {
        if let Some(mut stream) = self.stream.take() {
            tokio::task::spawn_blocking(move || stream.quit())
                .await
                .map_err(|e| LegacyError::Transfer(format!("FTP task failed: {}", e)))?
                .map_err(|e| LegacyError::Transfer(format!("QUIT failed: {}", e)))?;
        }
        Ok(())
    }
}
