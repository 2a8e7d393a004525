//! Binary foreground maps and morphological closing.
//!
//! Every function here returns a binary image where 255 marks a
//! candidate chip pixel and 0 marks background. Three ways to get
//! there are supported: an adaptive (local mean) threshold, Canny
//! gradient edges, and a global brightness cut-off.

use image::GrayImage;
use imageproc::distance_transform::Norm;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero marks every pixel with any gradient as a
/// potential edge, which closes into one frame-sized blob.
pub const MIN_CANNY_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_CANNY_THRESHOLD > 0.0);

/// Adaptive mean threshold, inverted.
///
/// A pixel is foreground when it is at least `offset` levels darker than
/// the mean of the `(2 * block_radius + 1)²` window centered on it.
/// Uniform areas (of any brightness) are background.
#[must_use = "returns the binary foreground map"]
pub fn adaptive_threshold(image: &GrayImage, block_radius: u32, offset: u8) -> GrayImage {
    let mean = crate::blur::local_mean(image, block_radius);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = u16::from(image.get_pixel(x, y).0[0]);
        let local = u16::from(mean.get_pixel(x, y).0[0]);
        image::Luma([if value + u16::from(offset) <= local {
            255
        } else {
            0
        }])
    })
}

/// Detect edges using the Canny algorithm.
///
/// Returns 255 for edge pixels, 0 otherwise. Both thresholds are clamped
/// to at least [`MIN_CANNY_THRESHOLD`] and `low` is clamped to at most
/// `high`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_CANNY_THRESHOLD);
    let low = low_threshold.max(MIN_CANNY_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}

/// Global inverted threshold: pixels darker than `level` are foreground.
#[must_use = "returns the binary foreground map"]
pub fn below_level(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([if image.get_pixel(x, y).0[0] < level {
            255
        } else {
            0
        }])
    })
}

/// Morphological closing (dilate then erode) with a square element of
/// side `2 * radius + 1`.
///
/// Bridges gaps narrower than the element so a speckled or broken
/// silhouette becomes one connected blob. A radius of zero is a no-op.
#[must_use = "returns the closed map"]
pub fn close(binary: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return binary.clone();
    }
    imageproc::morphology::close(binary, Norm::LInf, radius)
}

/// Number of foreground (non-zero) pixels.
#[must_use]
pub fn count_foreground(binary: &GrayImage) -> u64 {
    binary.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
}
