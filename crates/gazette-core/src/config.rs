//! Configuration module
//!
//! Configuration is read from the environment (after loading a `.env` file when
//! present). Connection parameters for the legacy store have no embedded
//! defaults: a missing host or credential fails startup.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::DEFAULT_USER_AGENT;

// Common constants
const SERVER_PORT: u16 = 4000;
const PRIMARY_FETCH_TIMEOUT_SECS: u64 = 10;
const MAX_MEDIA_SIZE_MB: usize = 50;
const LEGACY_FTP_PORT: u16 = 21;
const LEGACY_FTP_TIMEOUT_SECS: u64 = 15;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
    /// `text` or `json`
    pub log_format: String,
}

/// Settings for fetching from the CDN / origin URL
#[derive(Clone, Debug)]
pub struct PrimaryFetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub referer: Option<String>,
    pub max_body_bytes: usize,
    /// If set, only these hosts (and their subdomains) may be fetched
    pub allowed_hosts: Option<Vec<String>>,
    pub allow_private_hosts: bool,
    /// Redirect video references to their primary URL instead of proxying them
    pub video_passthrough: bool,
}

/// Legacy store backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyBackend {
    Ftp,
    Local,
    Disabled,
}

impl FromStr for LegacyBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ftp" => Ok(LegacyBackend::Ftp),
            "local" => Ok(LegacyBackend::Local),
            "none" | "disabled" => Ok(LegacyBackend::Disabled),
            _ => Err(anyhow::anyhow!("Invalid legacy store backend: {}", s)),
        }
    }
}

impl fmt::Display for LegacyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyBackend::Ftp => write!(f, "ftp"),
            LegacyBackend::Local => write!(f, "local"),
            LegacyBackend::Disabled => write!(f, "none"),
        }
    }
}

/// Connection parameters for the legacy file store
#[derive(Clone)]
pub struct LegacyStoreConfig {
    pub backend: LegacyBackend,
    pub ftp_host: Option<String>,
    pub ftp_port: u16,
    pub ftp_user: Option<String>,
    pub ftp_password: Option<String>,
    /// Fixed remote directory holding the assets
    pub ftp_dir: Option<String>,
    pub ftp_timeout: Duration,
    /// Larger legacy files count as a failed attempt
    pub max_file_bytes: usize,
    pub local_path: Option<String>,
    pub local_dir: String,
}

impl fmt::Debug for LegacyStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyStoreConfig")
            .field("backend", &self.backend)
            .field("ftp_host", &self.ftp_host)
            .field("ftp_port", &self.ftp_port)
            .field("ftp_user", &self.ftp_user)
            .field("ftp_password", &self.ftp_password.as_ref().map(|_| "<redacted>"))
            .field("ftp_dir", &self.ftp_dir)
            .field("ftp_timeout", &self.ftp_timeout)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("local_path", &self.local_path)
            .field("local_dir", &self.local_dir)
            .finish()
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub primary: PrimaryFetchConfig,
    pub legacy: LegacyStoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str| {
            var(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };
        let list = |key: &str| {
            var(key).map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
        };

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: match var("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            cors_origins,
            environment,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            log_format: var("LOG_FORMAT")
                .map(|f| f.to_lowercase())
                .unwrap_or_else(|| "text".to_string()),
        };

        let max_media_size_mb = var("MAX_MEDIA_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_MEDIA_SIZE_MB);

        let primary = PrimaryFetchConfig {
            timeout: Duration::from_secs(
                var("PRIMARY_FETCH_TIMEOUT_SECS")
                    .map(|s| {
                        s.parse::<u64>().map_err(|_| {
                            anyhow::anyhow!("PRIMARY_FETCH_TIMEOUT_SECS must be a valid number")
                        })
                    })
                    .transpose()?
                    .unwrap_or(PRIMARY_FETCH_TIMEOUT_SECS),
            ),
            user_agent: var("PRIMARY_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            referer: var("PRIMARY_REFERER"),
            max_body_bytes: max_media_size_mb * 1024 * 1024,
            allowed_hosts: list("MEDIA_ALLOWED_HOSTS"),
            allow_private_hosts: flag("MEDIA_ALLOW_PRIVATE_HOSTS"),
            video_passthrough: flag("VIDEO_PASSTHROUGH"),
        };

        let legacy = LegacyStoreConfig {
            backend: var("LEGACY_STORE_BACKEND")
                .map(|b| b.parse::<LegacyBackend>())
                .transpose()?
                .unwrap_or(LegacyBackend::Ftp),
            ftp_host: var("LEGACY_FTP_HOST"),
            ftp_port: match var("LEGACY_FTP_PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("LEGACY_FTP_PORT must be a valid number"))?,
                None => LEGACY_FTP_PORT,
            },
            ftp_user: var("LEGACY_FTP_USER"),
            ftp_password: var("LEGACY_FTP_PASSWORD"),
            ftp_dir: var("LEGACY_FTP_DIR"),
            ftp_timeout: Duration::from_secs(
                var("LEGACY_FTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(LEGACY_FTP_TIMEOUT_SECS),
            ),
            max_file_bytes: max_media_size_mb * 1024 * 1024,
            local_path: var("LEGACY_LOCAL_PATH"),
            local_dir: var("LEGACY_LOCAL_DIR").unwrap_or_else(|| ".".to_string()),
        };

        Ok(Config {
            base,
            primary,
            legacy,
        })
    }

    /// Fail fast on misconfiguration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.primary.timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "PRIMARY_FETCH_TIMEOUT_SECS must be at least 1"
            ));
        }

        if self.primary.max_body_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_MEDIA_SIZE_MB must be at least 1"));
        }

        if !matches!(self.base.log_format.as_str(), "text" | "json") {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'text' or 'json'"));
        }

        match self.legacy.backend {
            LegacyBackend::Ftp => {
                let required = [
                    ("LEGACY_FTP_HOST", &self.legacy.ftp_host),
                    ("LEGACY_FTP_USER", &self.legacy.ftp_user),
                    ("LEGACY_FTP_PASSWORD", &self.legacy.ftp_password),
                    ("LEGACY_FTP_DIR", &self.legacy.ftp_dir),
                ];
                let missing: Vec<&str> = required
                    .iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                if !missing.is_empty() {
                    return Err(anyhow::anyhow!(
                        "{} must be set when using the ftp legacy store (set LEGACY_STORE_BACKEND=none to disable it)",
                        missing.join(", ")
                    ));
                }
                if self.legacy.ftp_timeout.is_zero() {
                    return Err(anyhow::anyhow!("LEGACY_FTP_TIMEOUT_SECS must be at least 1"));
                }
            }
            LegacyBackend::Local => {
                if self.legacy.local_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LEGACY_LOCAL_PATH must be set when using the local legacy store"
                    ));
                }
            }
            LegacyBackend::Disabled => {}
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    fn ftp_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("LEGACY_FTP_HOST", "ftp.example"),
            ("LEGACY_FTP_USER", "assets"),
            ("LEGACY_FTP_PASSWORD", "s3cret"),
            ("LEGACY_FTP_DIR", "/public_html/uploads"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&ftp_vars()).unwrap();
        assert_eq!(config.server_port(), 4000);
        assert_eq!(config.primary.timeout, Duration::from_secs(10));
        assert_eq!(config.primary.max_body_bytes, 50 * 1024 * 1024);
        assert_eq!(config.legacy.backend, LegacyBackend::Ftp);
        assert_eq!(config.legacy.ftp_port, 21);
        assert!(!config.primary.video_passthrough);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ftp_backend_requires_credentials() {
        let config = config_from(&[("LEGACY_FTP_HOST", "ftp.example")]).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("LEGACY_FTP_USER"));
        assert!(err.contains("LEGACY_FTP_PASSWORD"));
        assert!(!err.contains("LEGACY_FTP_HOST,"));
    }

    #[test]
    fn test_disabled_backend_needs_nothing() {
        let config = config_from(&[("LEGACY_STORE_BACKEND", "none")]).unwrap();
        assert_eq!(config.legacy.backend, LegacyBackend::Disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_backend_requires_path() {
        let config = config_from(&[("LEGACY_STORE_BACKEND", "local")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut vars = ftp_vars();
        vars.push(("ENVIRONMENT", "production"));
        assert!(config_from(&vars).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut vars = ftp_vars();
        vars.push(("PRIMARY_FETCH_TIMEOUT_SECS", "0"));
        let config = config_from(&vars).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allowed_hosts_parsed() {
        let mut vars = ftp_vars();
        vars.push(("MEDIA_ALLOWED_HOSTS", "CDN.example.com, img.example.org ,"));
        let config = config_from(&vars).unwrap();
        assert_eq!(
            config.primary.allowed_hosts,
            Some(vec!["cdn.example.com".to_string(), "img.example.org".to_string()])
        );
    }

    #[test]
    fn test_legacy_file_cap_follows_media_size() {
        let mut vars = ftp_vars();
        vars.push(("MAX_MEDIA_SIZE_MB", "3"));
        let config = config_from(&vars).unwrap();
        assert_eq!(config.legacy.max_file_bytes, 3 * 1024 * 1024);
        assert_eq!(config.legacy.max_file_bytes, config.primary.max_body_bytes);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = config_from(&ftp_vars()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
