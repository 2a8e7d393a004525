//! Box smoothing and local means.
//!
//! Wraps [`imageproc::filter::box_filter`]. The same filter serves two
//! purposes: a fixed 5x5 mean to suppress sensor noise before
//! thresholding, and a wide window mean that the adaptive threshold
//! compares each pixel against.

use image::GrayImage;

/// Radius of the noise-suppression window (5x5).
pub const SMOOTHING_RADIUS: u32 = 2;

/// Apply the fixed 5x5 mean filter.
///
/// Pixels near the border average over replicated edge pixels, so a
/// uniform image stays uniform.
#[must_use = "returns the smoothed image"]
pub fn smooth(image: &GrayImage) -> GrayImage {
    local_mean(image, SMOOTHING_RADIUS)
}

/// Mean over the `(2 * radius + 1)²` window around every pixel.
///
/// A radius of zero returns the image unchanged.
#[must_use = "returns the local mean image"]
pub fn local_mean(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    imageproc::filter::box_filter(image, radius, radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn zero_radius_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(local_mean(&img, 0), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let smoothed = smooth(&img);
        assert_eq!(smoothed.width(), 17);
        assert_eq!(smoothed.height(), 31);
    }

    #[test]
    fn smoothing_softens_sharp_edge() {
        let img = sharp_edge_image();
        let smoothed = smooth(&img);

        let left_of_edge = smoothed.get_pixel(4, 5).0[0];
        let right_of_edge = smoothed.get_pixel(5, 5).0[0];

        assert!(
            left_of_edge > 0,
            "expected smoothing to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected smoothing to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn uniform_image_unchanged() {
        let img = GrayImage::from_fn(10, 10, |_, _| image::Luma([128]));
        let smoothed = smooth(&img);
        for pixel in smoothed.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(
                diff.abs() <= 1,
                "expected uniform image to stay near 128, got {}",
                pixel.0[0],
            );
        }
    }

    #[test]
    fn smoothing_only_reaches_two_pixels() {
        let img = sharp_edge_image();
        let smoothed = smooth(&img);
        // Three columns away from the edge the 5x5 window sees only black.
        assert_eq!(smoothed.get_pixel(1, 5).0[0], 0);
        assert_eq!(smoothed.get_pixel(8, 5).0[0], 255);
    }
}
