//! Legacy filename validation shared by all backends.

use crate::traits::{LegacyError, LegacyResult};

/// Reject filenames that could escape the asset directory.
///
/// Legacy filenames are bare names taken from the last segment of a stored URL,
/// so any separator or parent reference is invalid.
pub fn validate_filename(filename: &str) -> LegacyResult<()> {
    if filename.trim().is_empty() {
        return Err(LegacyError::InvalidFilename(
            "Filename is empty".to_string(),
        ));
    }
    if filename.contains('/') || filename.contains('\\') || filename == ".." || filename == "." {
        return Err(LegacyError::InvalidFilename(
            "Filename contains invalid characters".to_string(),
        ));
    }
    if filename.chars().any(|c| c.is_control()) {
        return Err(LegacyError::InvalidFilename(
            "Filename contains control characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate_filename("cover.jpg").is_ok());
        assert!(validate_filename("front page 2019.png").is_ok());
        assert!(validate_filename("draft..final.jpg").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("a/b.jpg").is_err());
        assert!(validate_filename("a\\b.jpg").is_err());
        assert!(validate_filename("..").is_err());
    }

    #[test]
    fn test_rejects_control_characters() {
        // CRLF would let a caller inject FTP commands.
        assert!(validate_filename("x.jpg\r\nDELE y.jpg").is_err());
        assert!(validate_filename("").is_err());
    }
}
