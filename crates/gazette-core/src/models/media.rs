use crate::mime;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Kind of asset a reference points at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Backing store that satisfied a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    /// CDN or absolute origin URL
    Primary,
    /// Legacy file-transfer store
    Legacy,
    /// Client is redirected to the primary URL without proxying
    Passthrough,
}

impl MediaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSource::Primary => "primary",
            MediaSource::Legacy => "legacy",
            MediaSource::Passthrough => "passthrough",
        }
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Logical pointer to one media asset, built per display request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub kind: MediaKind,
    pub primary_url: Option<String>,
    pub legacy_filename: Option<String>,
    pub content_type_hint: Option<String>,
}

impl MediaReference {
    /// Build a reference from explicit parts. Blank values are treated as absent.
    ///
    /// The content-type hint is taken from the legacy filename when present,
    /// otherwise from the last path segment of the primary URL.
    pub fn new(kind: MediaKind, primary_url: Option<String>, legacy_filename: Option<String>) -> Self {
        let primary_url = primary_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let legacy_filename = legacy_filename
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let hint_source = legacy_filename
            .clone()
            .or_else(|| primary_url.as_deref().and_then(last_path_segment));
        let content_type_hint = hint_source
            .filter(|name| mime::extension_of(name).is_some())
            .map(|name| mime::content_type_for_filename(kind, &name).to_string());

        Self {
            kind,
            primary_url,
            legacy_filename,
            content_type_hint,
        }
    }

    /// Build a reference from a content record's stored URL.
    ///
    /// The legacy filename is the URL's last path segment (percent-decoded,
    /// without query or fragment).
    pub fn from_stored_url(kind: MediaKind, url: &str) -> Self {
        let legacy_filename = last_path_segment(url.trim());
        Self::new(kind, Some(url.to_string()), legacy_filename)
    }

    /// Reference that can only be satisfied by the legacy store.
    pub fn legacy_only(kind: MediaKind, filename: &str) -> Self {
        Self::new(kind, None, Some(filename.to_string()))
    }

    /// Whether the reference carries at least one usable locator.
    pub fn is_resolvable(&self) -> bool {
        self.primary_url.is_some() || self.legacy_filename.is_some()
    }

    /// Content type to use when the source does not report one.
    pub fn fallback_content_type(&self) -> String {
        self.content_type_hint
            .clone()
            .unwrap_or_else(|| mime::default_content_type(self.kind).to_string())
    }
}

/// Last non-empty path segment of a URL, percent-decoded.
fn last_path_segment(url: &str) -> Option<String> {
    let without_suffix = url.split(['?', '#']).next()?;
    let path = match without_suffix.split_once("://") {
        Some((_, rest)) => &rest[rest.find('/')?..],
        None => without_suffix,
    };
    let segment = path.rsplit('/').next()?.trim();
    if segment.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    Some(decoded.into_owned())
}

/// Resolved payload: either the asset bytes or a URL the client should follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    Bytes(Bytes),
    Redirect(String),
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub payload: MediaPayload,
    /// Always a concrete MIME type
    pub content_type: String,
    /// Whether long-lived caching is safe
    pub cacheable: bool,
    pub source_used: MediaSource,
}

impl ResolvedMedia {
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.payload {
            MediaPayload::Bytes(bytes) => Some(bytes),
            MediaPayload::Redirect(_) => None,
        }
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match &self.payload {
            MediaPayload::Redirect(url) => Some(url),
            MediaPayload::Bytes(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stored_url_derives_filename_and_hint() {
        let reference =
            MediaReference::from_stored_url(MediaKind::Image, "https://cdn.example/uploads/cover.PNG?w=640");
        assert_eq!(reference.legacy_filename.as_deref(), Some("cover.PNG"));
        assert_eq!(reference.content_type_hint.as_deref(), Some("image/png"));
        assert_eq!(
            reference.primary_url.as_deref(),
            Some("https://cdn.example/uploads/cover.PNG?w=640")
        );
    }

    #[test]
    fn test_from_stored_url_decodes_segment() {
        let reference =
            MediaReference::from_stored_url(MediaKind::Image, "https://cdn.example/a/front%20page.jpg");
        assert_eq!(reference.legacy_filename.as_deref(), Some("front page.jpg"));
    }

    #[test]
    fn test_host_only_url_has_no_filename() {
        let reference = MediaReference::from_stored_url(MediaKind::Image, "https://cdn.example");
        assert!(reference.legacy_filename.is_none());
        assert!(reference.content_type_hint.is_none());
        assert_eq!(reference.fallback_content_type(), "image/jpeg");
    }

    #[test]
    fn test_blank_parts_are_unresolvable() {
        let reference = MediaReference::new(
            MediaKind::Image,
            Some("   ".to_string()),
            Some(String::new()),
        );
        assert!(!reference.is_resolvable());
    }

    #[test]
    fn test_legacy_only_reference() {
        let reference = MediaReference::legacy_only(MediaKind::Video, "intro.webm");
        assert!(reference.primary_url.is_none());
        assert!(reference.is_resolvable());
        assert_eq!(reference.fallback_content_type(), "video/webm");
    }

    #[test]
    fn test_media_kind_parsing() {
        assert_eq!("VIDEO".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("audio".parse::<MediaKind>().is_err());
        assert_eq!(MediaKind::default().to_string(), "image");
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_value(MediaSource::Legacy).unwrap(), "legacy");
        let kind: MediaKind = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(kind, MediaKind::Video);
    }
}
