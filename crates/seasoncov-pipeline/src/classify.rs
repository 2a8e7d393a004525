//! Per-pixel seasoning classification inside the chip mask.
//!
//! A masked pixel is treated when either test fires:
//!
//! 1. **Hue band**: its hue lies in the seasoning band and it is
//!    saturated and bright enough for the hue to mean something.
//! 2. **Adaptive darkness**: its value is below
//!    `max(darkness_floor, mean_value * darkness_factor)`, where
//!    `mean_value` is the average value over the whole mask. This
//!    catches dark speckles (pepper, char) whose hue is unreliable.
//!
//! Pixels outside the mask are [`PixelClass::Outside`] and never enter
//! any statistic.

use crate::color::{Hsv, in_hue_band, rgb_to_hsv};
use crate::config::ClassifierConfig;
use crate::types::{Classification, Mask, PixelBuffer, PixelClass};

/// Classify every pixel of `buffer` against `mask`.
///
/// `mask` must have the buffer's dimensions. An empty mask yields a
/// grid of [`PixelClass::Outside`] with a mean value of 0.
#[must_use]
pub fn classify(buffer: &PixelBuffer, mask: &Mask, config: &ClassifierConfig) -> Classification {
    debug_assert_eq!(buffer.dimensions(), mask.dimensions());

    // HSV plus the exact 0-255 value (max channel) of each masked pixel.
    let hsv: Vec<Option<(Hsv, u8)>> = buffer
        .pixels()
        .zip(mask.as_slice())
        .map(|([r, g, b, _], &inside)| inside.then(|| (rgb_to_hsv(r, g, b), r.max(g).max(b))))
        .collect();

    let (sum, count) = hsv
        .iter()
        .flatten()
        .fold((0_u64, 0_u64), |(sum, count), &(_, v)| {
            (sum + u64::from(v), count + 1)
        });
    #[allow(clippy::cast_precision_loss, reason = "pixel sums fit in f64 mantissa")]
    let mean_value = if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    };
    let darkness_threshold =
        f64::from(config.darkness_floor).max(mean_value * f64::from(config.darkness_factor));

    let classes = hsv
        .iter()
        .map(|p| match p {
            None => PixelClass::Outside,
            Some((p, v)) if is_treated(*p, *v, darkness_threshold, config) => PixelClass::Treated,
            Some(_) => PixelClass::Untreated,
        })
        .collect();

    tracing::debug!(
        masked = count,
        mean_value,
        darkness_threshold,
        "classified masked pixels"
    );

    Classification::new(buffer.dimensions(), classes, mean_value, darkness_threshold)
}

/// The two treatment tests for a single masked pixel.
fn is_treated(p: Hsv, value: u8, darkness_threshold: f64, config: &ClassifierConfig) -> bool {
    let colored = in_hue_band(p.h, config.hue_min, config.hue_max)
        && p.s >= config.min_saturation
        && p.v >= config.min_value;
    let dark = f64::from(value) < darkness_threshold;
    colored || dark
}
