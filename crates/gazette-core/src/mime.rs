//! Content-type inference from filenames and response headers.

use crate::models::MediaKind;
use std::path::Path;

pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Lowercased extension of `filename`, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Fallback content type for a media kind when nothing better is known.
pub fn default_content_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => DEFAULT_IMAGE_CONTENT_TYPE,
        MediaKind::Video => DEFAULT_VIDEO_CONTENT_TYPE,
    }
}

/// Infer a content type from the filename's extension.
///
/// Unknown or missing extensions map to the kind's default, so the result is
/// always a concrete MIME type.
pub fn content_type_for_filename(kind: MediaKind, filename: &str) -> &'static str {
    let Some(extension) = extension_of(filename) else {
        return default_content_type(kind);
    };

    match kind {
        MediaKind::Image => match extension.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "avif" => "image/avif",
            "svg" => "image/svg+xml",
            "bmp" => "image/bmp",
            _ => DEFAULT_IMAGE_CONTENT_TYPE,
        },
        MediaKind::Video => match extension.as_str() {
            "webm" => "video/webm",
            "mov" => "video/quicktime",
            "m4v" => "video/x-m4v",
            _ => DEFAULT_VIDEO_CONTENT_TYPE,
        },
    }
}

/// Normalize a `Content-Type` header into a bare MIME type.
///
/// Parameters such as `; charset=utf-8` are stripped. Returns `None` for empty,
/// malformed or generic `application/octet-stream` values so that callers fall
/// back to an inferred type.
pub fn concrete_content_type(header: &str) -> Option<String> {
    let mime = header.split(';').next()?.trim().to_lowercase();
    if mime.is_empty() || !mime.contains('/') || mime == "application/octet-stream" {
        return None;
    }
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo.png"), "image/png");
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo.GIF"), "image/gif");
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo.webp"), "image/webp");
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo.jpeg"), "image/jpeg");
    }

    #[test]
    fn test_missing_extension_defaults_to_jpeg() {
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo"), "image/jpeg");
        assert_eq!(content_type_for_filename(MediaKind::Image, "foo."), "image/jpeg");
        assert_eq!(content_type_for_filename(MediaKind::Image, "archive.tiff"), "image/jpeg");
    }

    #[test]
    fn test_video_extensions() {
        assert_eq!(content_type_for_filename(MediaKind::Video, "clip.MOV"), "video/quicktime");
        assert_eq!(content_type_for_filename(MediaKind::Video, "clip.webm"), "video/webm");
        assert_eq!(content_type_for_filename(MediaKind::Video, "clip"), "video/mp4");
    }

    #[test]
    fn test_concrete_content_type() {
        assert_eq!(
            concrete_content_type("image/PNG; charset=binary"),
            Some("image/png".to_string())
        );
        assert_eq!(concrete_content_type("application/octet-stream"), None);
        assert_eq!(concrete_content_type(""), None);
        assert_eq!(concrete_content_type("garbage"), None);
    }
}
