//! Region extraction: locate the chip and produce its mask.
//!
//! Extraction never fails. If the configured strategy finds nothing
//! usable, the centered fallback rectangle is used instead.

use image::{GrayImage, Luma};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::component::ComponentStats;
use crate::config::{FallbackRect, RegionConfig, RegionStrategy};
use crate::contour::ContourStats;
use crate::primitives::Primitives;
use crate::types::{Dimensions, Mask, PixelBuffer, Polygon};

/// Where a region's mask came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionSource {
    /// Filled polygon approximated from the largest contour.
    Polygon,
    /// Largest connected component under the brightness cut-off.
    Component,
    /// The fixed centered rectangle.
    Rectangle,
}

impl RegionSource {
    /// Short stable name, used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Component => "component",
            Self::Rectangle => "rectangle",
        }
    }
}

/// Strategy-specific observations from one extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionStats {
    /// The contour strategy ran.
    Contour(ContourStats),
    /// The connected-component strategy ran.
    Component(ComponentStats),
}

/// The located chip.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Pixels belonging to the chip. Same dimensions as the frame.
    pub mask: Mask,
    /// The polygon that was filled, when the contour strategy succeeded.
    pub polygon: Option<Polygon>,
    /// Which path produced the mask.
    pub source: RegionSource,
    /// What the strategy saw before any fallback.
    pub stats: RegionStats,
}

/// Locates the chip within a frame.
pub trait RegionExtractor {
    /// Extract the chip region.
    ///
    /// Always returns a mask with the frame's dimensions. The mask is
    /// empty only when the frame is too small for the fallback
    /// rectangle to cover a single pixel.
    fn extract(&self, buffer: &PixelBuffer, primitives: &dyn Primitives) -> Region;
}

impl RegionExtractor for RegionConfig {
    fn extract(&self, buffer: &PixelBuffer, primitives: &dyn Primitives) -> Region {
        let dimensions = buffer.dimensions();

        let (found, stats) = match &self.strategy {
            RegionStrategy::Contour(params) => {
                let (polygon, stats) = crate::contour::locate(buffer, params, primitives);
                let found = polygon.map(|polygon| {
                    let mask = fill_polygon(dimensions, &polygon);
                    (mask, Some(polygon), RegionSource::Polygon)
                });
                (found, RegionStats::Contour(stats))
            }
            RegionStrategy::ColorThreshold(params) => {
                let (mask, stats) = crate::component::locate(buffer, params);
                let found = mask.map(|mask| (mask, None, RegionSource::Component));
                (found, RegionStats::Component(stats))
            }
        };

        match found {
            Some((mask, polygon, source)) if !mask.is_empty() => {
                tracing::debug!(
                    strategy = self.strategy.name(),
                    source = source.name(),
                    pixels = mask.count(),
                    "chip region located"
                );
                Region {
                    mask,
                    polygon,
                    source,
                    stats,
                }
            }
            _ => {
                let mask = fallback_rectangle(dimensions, &self.fallback);
                tracing::debug!(
                    strategy = self.strategy.name(),
                    pixels = mask.count(),
                    "no usable region, using fallback rectangle"
                );
                Region {
                    mask,
                    polygon: None,
                    source: RegionSource::Rectangle,
                    stats,
                }
            }
        }
    }
}

/// Rasterize a polygon (interior and boundary) into a mask.
///
/// Polygons with fewer than three vertices produce an empty mask.
#[must_use]
pub fn fill_polygon(dimensions: Dimensions, polygon: &Polygon) -> Mask {
    if polygon.len() < 3 {
        return Mask::empty(dimensions);
    }

    let points: Vec<imageproc::point::Point<i32>> = polygon
        .vertices()
        .iter()
        .map(|v| imageproc::point::Point::new(v.x, v.y))
        .collect();
    // `Polygon` never repeats its first vertex, which `draw_polygon_mut`
    // would reject.
    if points.first() == points.last() {
        return Mask::empty(dimensions);
    }

    let mut canvas = GrayImage::new(dimensions.width, dimensions.height);
    imageproc::drawing::draw_polygon_mut(&mut canvas, &points, Luma([255]));
    Mask::from_gray(&canvas)
}

/// Pixel bounds `(x, y, width, height)` of the fallback rectangle,
/// clipped to the frame.
///
/// Each fraction is scaled by the frame size and floored.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "fractions are validated to [0, 1] so products fit the frame size"
)]
pub fn fallback_bounds(dimensions: Dimensions, rect: &FallbackRect) -> (u32, u32, u32, u32) {
    let scale = |size: u32, fraction: f64| (f64::from(size) * fraction.clamp(0.0, 1.0)).floor() as u32;

    let x = scale(dimensions.width, rect.left).min(dimensions.width);
    let y = scale(dimensions.height, rect.top).min(dimensions.height);
    let w = scale(dimensions.width, rect.width).min(dimensions.width - x);
    let h = scale(dimensions.height, rect.height).min(dimensions.height - y);
    (x, y, w, h)
}

/// The centered rectangle of last resort as a mask.
#[must_use]
pub fn fallback_rectangle(dimensions: Dimensions, rect: &FallbackRect) -> Mask {
    let (x, y, w, h) = fallback_bounds(dimensions, rect);
    let mut canvas = GrayImage::new(dimensions.width, dimensions.height);
    if w > 0 && h > 0 {
        #[allow(clippy::cast_possible_wrap, reason = "bounded by the frame size")]
        let at = Rect::at(x as i32, y as i32).of_size(w, h);
        imageproc::drawing::draw_filled_rect_mut(&mut canvas, at, Luma([255]));
    }
    Mask::from_gray(&canvas)
}
