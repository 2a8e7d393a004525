//! Contour strategy: find the chip silhouette as the largest external
//! boundary of a closed foreground map and reduce it to a polygon.
//!
//! Steps: luma -> 5x5 smoothing -> foreground map -> closing ->
//! external contours -> largest by area -> closed RDP approximation.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::config::ContourParams;
use crate::primitives::Primitives;
use crate::types::{Contour, PixelBuffer, Point, Polygon};

/// What the contour strategy saw, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContourStats {
    /// Foreground pixels after closing.
    pub foreground_pixels: u64,
    /// External contours found.
    pub contour_count: usize,
    /// Area of the largest contour, if any contour was found.
    pub largest_area: Option<f64>,
    /// Vertices in the approximated polygon, if approximation ran.
    pub polygon_vertices: Option<usize>,
}

/// Trace the outermost boundaries of a binary map.
///
/// Uses Suzuki-Abe border following via
/// [`imageproc::contours::find_contours`] and keeps only outer borders
/// with no enclosing border, so holes and anything nested inside
/// another blob are ignored. Order follows a raster scan of each
/// contour's starting pixel.
#[must_use]
pub fn external_contours(binary: &GrayImage) -> Vec<Contour> {
    imageproc::contours::find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour::new(c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect()))
        .collect()
}

/// Index and area of the contour enclosing the most area.
///
/// Ties keep the earliest contour. Returns `None` for an empty slice.
#[must_use]
pub fn largest_by_area(contours: &[Contour]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, contour) in contours.iter().enumerate() {
        let area = contour.area();
        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((i, area));
        }
    }
    best
}

/// Run the contour strategy.
///
/// Returns the approximated polygon when a contour of at least
/// `params.min_area` survives and reduces to three or more vertices.
/// `None` tells the caller to fall back.
pub fn locate(
    buffer: &PixelBuffer,
    params: &ContourParams,
    primitives: &dyn Primitives,
) -> (Option<Polygon>, ContourStats) {
    let gray = crate::grayscale::intensity(buffer);
    let smoothed = primitives.smooth(&gray);
    let foreground = primitives.foreground(&smoothed, params.foreground);
    let closed = primitives.close(&foreground, params.closing_radius);

    let contours = primitives.external_contours(&closed);
    let mut stats = ContourStats {
        foreground_pixels: crate::foreground::count_foreground(&closed),
        contour_count: contours.len(),
        ..ContourStats::default()
    };

    let Some((index, area)) = largest_by_area(&contours) else {
        tracing::debug!("no external contour found");
        return (None, stats);
    };
    stats.largest_area = Some(area);

    if area < params.min_area {
        tracing::debug!(area, min_area = params.min_area, "largest contour below area floor");
        return (None, stats);
    }

    let contour = &contours[index];
    let epsilon = params.epsilon_fraction * contour.perimeter();
    let polygon = crate::simplify::approximate_closed(contour, epsilon);
    stats.polygon_vertices = Some(polygon.len());

    tracing::debug!(
        area,
        points = contour.len(),
        epsilon,
        vertices = polygon.len(),
        "selected chip contour"
    );

    if polygon.len() >= 3 {
        (Some(polygon), stats)
    } else {
        (None, stats)
    }
}
