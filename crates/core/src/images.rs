//! Uploaded keyframe constants and validators.
//!
//! Mirrors the limits enforced at the HTTP boundary: allowed extensions,
//! a 10 MiB size cap, and a header-only decodability probe.

use std::io::Cursor;

use image::ImageReader;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Extensions accepted for uploaded keyframe images (lowercase, with dot).
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Maximum accepted size per uploaded image (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Extract the lowercase extension (with leading dot) from a filename.
///
/// Returns `None` for names without a dot or with nothing after it.
pub fn file_extension(filename: &str) -> Option<String> {
    let idx = filename.rfind('.')?;
    if idx + 1 == filename.len() {
        return None;
    }
    Some(filename[idx..].to_ascii_lowercase())
}

/// Validate a filename's extension against the allowed set.
///
/// Returns the normalized (lowercase) extension on success.
pub fn validate_image_extension(filename: &str) -> Result<String, CoreError> {
    let ext = file_extension(filename).ok_or_else(|| {
        CoreError::Validation(format!("File '{filename}' has no extension"))
    })?;
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "File '{filename}' has unsupported format '{ext}'. Supported formats: {}",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// Validate an upload's size against [`MAX_IMAGE_BYTES`].
pub fn validate_image_size(filename: &str, len: usize) -> Result<(), CoreError> {
    if len > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "File '{filename}' is {:.2} MiB, exceeding the 10 MiB limit",
            len as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

/// Probe the dimensions of an in-memory image without a full decode.
///
/// Only the header is read. Fails if the bytes are not a recognizable,
/// decodable image format.
pub fn probe_dimensions(filename: &str, bytes: &[u8]) -> Result<(u32, u32), CoreError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Validation(format!("File '{filename}' is unreadable: {e}")))?
        .into_dimensions()
        .map_err(|e| {
            CoreError::Validation(format!("File '{filename}' is not a decodable image: {e}"))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    // -- file_extension --

    #[test]
    fn extension_lowercased() {
        assert_eq!(file_extension("Photo.JPG").as_deref(), Some(".jpg"));
    }

    #[test]
    fn extension_uses_last_dot() {
        assert_eq!(file_extension("archive.tar.png").as_deref(), Some(".png"));
    }

    #[test]
    fn extension_missing() {
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    // -- validate_image_extension --

    #[test]
    fn allowed_extensions_accepted() {
        for name in ["a.jpg", "b.jpeg", "c.PNG", "d.gif", "e.bmp", "f.webp"] {
            assert!(validate_image_extension(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn disallowed_extension_rejected() {
        assert!(validate_image_extension("clip.mp4").is_err());
        assert!(validate_image_extension("doc.pdf").is_err());
        assert!(validate_image_extension("noext").is_err());
    }

    // -- validate_image_size --

    #[test]
    fn size_at_limit_accepted() {
        assert!(validate_image_size("a.png", MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn size_over_limit_rejected() {
        assert!(validate_image_size("a.png", MAX_IMAGE_BYTES + 1).is_err());
    }

    // -- probe_dimensions --

    #[test]
    fn probe_valid_png() {
        let bytes = png_bytes(3, 2);
        assert_eq!(probe_dimensions("a.png", &bytes).unwrap(), (3, 2));
    }

    #[test]
    fn probe_garbage_rejected() {
        assert!(probe_dimensions("a.png", b"definitely not an image").is_err());
    }
}
