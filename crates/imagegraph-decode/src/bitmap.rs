//! Bitmap decoding for image point photographs.
//!
//! The image endpoint serves JPEG thumbnails; PNG is accepted as well so
//! locally generated fixtures can be served without recompression.

use image::RgbaImage;

use crate::error::{DecodeError, DecodeResult};

/// Decode image bytes to RGBA8 pixels.
///
/// The container format is detected from the data signature.
///
/// # Errors
///
/// Returns an error if the buffer is empty or the image cannot be decoded.
pub fn decode_bitmap(data: &[u8]) -> DecodeResult<RgbaImage> {
    if data.is_empty() {
        return Err(DecodeError::BufferTooSmall {
            expected: 1,
            actual: 0,
        });
    }

    let img = image::load_from_memory(data).map_err(|e| DecodeError::InvalidFormat {
        context: "bitmap",
        detail: e.to_string(),
    })?;

    Ok(img.to_rgba8())
}
