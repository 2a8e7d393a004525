//! Coverage aggregation.

use crate::types::{Classification, CoverageResult, PixelClass};

/// Count treated and masked pixels and derive the coverage percentage.
///
/// A classification with no masked pixel yields 0%, never NaN.
#[must_use]
pub fn aggregate(classification: &Classification) -> CoverageResult {
    let (treated_pixels, masked_pixels) =
        classification
            .as_slice()
            .iter()
            .fold((0_u64, 0_u64), |(treated, masked), class| match class {
                PixelClass::Outside => (treated, masked),
                PixelClass::Untreated => (treated, masked + 1),
                PixelClass::Treated => (treated + 1, masked + 1),
            });

    #[allow(clippy::cast_precision_loss, reason = "pixel counts fit in f64 mantissa")]
    let percentage = if masked_pixels == 0 {
        0.0
    } else {
        100.0 * treated_pixels as f64 / masked_pixels as f64
    };

    tracing::debug!(treated_pixels, masked_pixels, percentage, "coverage");

    CoverageResult {
        treated_pixels,
        masked_pixels,
        percentage,
    }
}
