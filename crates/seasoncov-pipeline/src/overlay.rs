//! Overlay rendering.
//!
//! The overlay is a new RGBA frame with the source's dimensions:
//!
//! | pixel                        | color                     |
//! |------------------------------|---------------------------|
//! | outside the mask             | `(0, 0, 0, 0)`            |
//! | treated                      | red, `treated_alpha`      |
//! | untreated, `Highlight`       | original RGB, opaque      |
//! | untreated, `TwoTone`         | blue, `untreated_alpha`   |
//! | polygon outline (optional)   | opaque green, in-mask only |
//!
//! [`composite`] blends an overlay onto the original frame for display.

use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::config::{OverlayConfig, OverlayMode};
use crate::types::{Classification, Mask, PixelBuffer, PixelClass, Polygon};

/// Tint for treated pixels.
pub const TREATED_RGB: [u8; 3] = [255, 0, 0];
/// Tint for untreated pixels in [`OverlayMode::TwoTone`].
pub const UNTREATED_RGB: [u8; 3] = [0, 0, 255];
/// Polygon outline color.
pub const OUTLINE_RGBA: [u8; 4] = [0, 255, 0, 255];

/// Render the classification overlay.
///
/// `buffer` is only read. `polygon` is drawn when
/// [`OverlayConfig::outline`] is set; its pixels are clipped to `mask`.
#[must_use]
pub fn render(
    buffer: &PixelBuffer,
    mask: &Mask,
    classification: &Classification,
    polygon: Option<&Polygon>,
    config: &OverlayConfig,
) -> PixelBuffer {
    debug_assert_eq!(buffer.dimensions(), classification.dimensions());

    let source = buffer.as_image();
    let [tr, tg, tb] = TREATED_RGB;
    let [ur, ug, ub] = UNTREATED_RGB;

    let mut overlay = RgbaImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        match classification.get(x, y) {
            PixelClass::Outside => Rgba([0, 0, 0, 0]),
            PixelClass::Treated => Rgba([tr, tg, tb, config.treated_alpha]),
            PixelClass::Untreated => match config.mode {
                OverlayMode::Highlight => {
                    let [r, g, b, _] = source.get_pixel(x, y).0;
                    Rgba([r, g, b, u8::MAX])
                }
                OverlayMode::TwoTone => Rgba([ur, ug, ub, config.untreated_alpha]),
            },
        }
    });

    if config.outline
        && let Some(polygon) = polygon
    {
        let outline = rasterize_outline(buffer.width(), buffer.height(), polygon);
        for (x, y, p) in outline.enumerate_pixels() {
            if p.0[0] != 0 && mask.contains(x, y) {
                overlay.put_pixel(x, y, Rgba(OUTLINE_RGBA));
            }
        }
    }

    PixelBuffer(overlay)
}

/// Draw the closed polygon's edges one pixel wide.
#[allow(clippy::cast_precision_loss, reason = "pixel coordinates are small")]
fn rasterize_outline(width: u32, height: u32, polygon: &Polygon) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    if polygon.len() < 2 {
        return canvas;
    }
    for (a, b) in polygon.edges() {
        imageproc::drawing::draw_line_segment_mut(
            &mut canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            Luma([255]),
        );
    }
    canvas
}

/// Alpha-blend `overlay` onto `original`.
///
/// Each output channel is `original * (1 - a) + overlay * a` with `a` the
/// overlay alpha; the output keeps the original's alpha. Frames must
/// share dimensions.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn composite(original: &PixelBuffer, overlay: &PixelBuffer) -> RgbaImage {
    debug_assert_eq!(original.dimensions(), overlay.dimensions());

    let base = original.as_image();
    let top = overlay.as_image();
    RgbaImage::from_fn(base.width(), base.height(), |x, y| {
        let o = base.get_pixel(x, y).0;
        let p = top.get_pixel(x, y).0;
        let t = f64::from(p[3]) / 255.0;

        let blend = |o: u8, p: u8| -> u8 {
            let val = f64::from(o).mul_add(1.0 - t, f64::from(p) * t);
            val.round().clamp(0.0, 255.0) as u8
        };

        Rgba([blend(o[0], p[0]), blend(o[1], p[1]), blend(o[2], p[2]), o[3]])
    })
}
