//! Image-processing primitives used by region extraction.
//!
//! The pipeline never reaches for a global image library. Instead an
//! [`Analyzer`](crate::Analyzer) owns a [`Primitives`] implementation,
//! chosen once at construction. [`Imageproc`] is the default and is
//! backed by the `imageproc` crate; tests and alternative backends can
//! supply their own.

use image::GrayImage;

use crate::config::ForegroundMethod;
use crate::types::Contour;

/// Raster operations the contour strategy depends on.
pub trait Primitives {
    /// Fixed 5x5 noise suppression.
    fn smooth(&self, gray: &GrayImage) -> GrayImage;

    /// Binary foreground map (255 = candidate chip pixel).
    fn foreground(&self, gray: &GrayImage, method: ForegroundMethod) -> GrayImage;

    /// Morphological closing with a square element of side `2 * radius + 1`.
    fn close(&self, binary: &GrayImage, radius: u8) -> GrayImage;

    /// Outermost closed boundaries of the foreground, in discovery order.
    fn external_contours(&self, binary: &GrayImage) -> Vec<Contour>;
}

/// Default [`Primitives`] backed by `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Imageproc;

impl Primitives for Imageproc {
    fn smooth(&self, gray: &GrayImage) -> GrayImage {
        crate::blur::smooth(gray)
    }

    fn foreground(&self, gray: &GrayImage, method: ForegroundMethod) -> GrayImage {
        match method {
            ForegroundMethod::AdaptiveThreshold {
                block_radius,
                offset,
            } => crate::foreground::adaptive_threshold(gray, block_radius, offset),
            ForegroundMethod::Canny { low, high } => crate::foreground::canny(gray, low, high),
            ForegroundMethod::Brightness { level } => crate::foreground::below_level(gray, level),
        }
    }

    fn close(&self, binary: &GrayImage, radius: u8) -> GrayImage {
        crate::foreground::close(binary, radius)
    }

    fn external_contours(&self, binary: &GrayImage) -> Vec<Contour> {
        crate::contour::external_contours(binary)
    }
}
