//! API constants

/// Route serving resolved media
pub const MEDIA_PATH: &str = "/media";

/// Route serving the client-side placeholder
pub const PLACEHOLDER_PATH: &str = "/media/placeholder";

/// Upper bound for each readiness check
pub const READINESS_TIMEOUT_SECS: u64 = 5;
