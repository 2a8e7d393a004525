//! Image decoding and intensity conversion.
//!
//! [`decode`] turns encoded bytes (PNG, JPEG, BMP, WebP) into a
//! [`PixelBuffer`]; [`intensity`] reduces a frame to the single luma
//! channel the contour strategy works on.

use image::GrayImage;

use crate::types::{PipelineError, PixelBuffer};

/// Decode raw image bytes into an RGBA8 frame.
///
/// Supports whatever formats the `image` crate was built with.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `bytes` is empty or the
/// decoded image has zero area.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::InvalidInput("image data is empty".into()));
    }

    let img = image::load_from_memory(bytes)?;
    PixelBuffer::from_image(img.to_rgba8())
}

/// Convert a frame to single-channel luma.
///
/// Uses the `image` crate's Rec. 709 weighting, so green contributes
/// most and blue least. Alpha is ignored.
#[must_use = "returns the luma image"]
pub fn intensity(buffer: &PixelBuffer) -> GrayImage {
    image::imageops::grayscale(buffer.as_image())
}
