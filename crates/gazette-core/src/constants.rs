//! Shared constants

/// Cache-Control value for results that are safe to cache for a long time
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Cache-Control value for results that must not be cached
pub const NO_STORE_CACHE_CONTROL: &str = "no-store";

/// Header naming the backing store that satisfied a media request
pub const MEDIA_SOURCE_HEADER: &str = "X-Media-Source";

/// Default User-Agent sent to the primary origin. Some origins gate on it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
