//! Property tests: coverage bounds, mask agreement and determinism over
//! arbitrary frames.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use seasoncov_pipeline::{
    ComponentParams, Imageproc, OverlayMode, PipelineConfig, PixelBuffer, PixelClass,
    RegionExtractor, RegionStrategy, analyze, classify, coverage,
};

/// Arbitrary small RGBA frame.
fn frames() -> impl Strategy<Value = PixelBuffer> {
    (1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |pixels| PixelBuffer::new(w, h, pixels).unwrap())
    })
}

/// Frames made of a few large flat blocks, so region strategies have
/// something to find.
fn blocky_frames() -> impl Strategy<Value = PixelBuffer> {
    (
        40u32..120,
        40u32..120,
        prop::collection::vec(any::<[u8; 3]>(), 4),
    )
        .prop_map(|(w, h, colors)| {
            let img = image::RgbaImage::from_fn(w, h, |x, y| {
                let i = usize::from(x >= w / 2) + 2 * usize::from(y >= h / 2);
                let [r, g, b] = colors[i];
                image::Rgba([r, g, b, 255])
            });
            PixelBuffer::from_image(img).unwrap()
        })
}

fn configs() -> impl Strategy<Value = PipelineConfig> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(components, two_tone, outline)| {
        let mut config = PipelineConfig::default();
        if components {
            config.region.strategy = RegionStrategy::ColorThreshold(ComponentParams::default());
        }
        if two_tone {
            config.overlay.mode = OverlayMode::TwoTone;
        }
        config.overlay.outline = outline;
        config
    })
}

proptest! {
    #[test]
    fn coverage_is_bounded(buffer in frames(), config in configs()) {
        let analysis = analyze(&buffer, &config).unwrap();
        let c = analysis.coverage;
        let frame_pixels = u64::from(buffer.width()) * u64::from(buffer.height());

        prop_assert!(c.percentage >= 0.0 && c.percentage <= 100.0);
        prop_assert!(c.treated_pixels <= c.masked_pixels);
        prop_assert!(c.masked_pixels <= frame_pixels);
        prop_assert_eq!(c.masked_pixels, analysis.mask.count() as u64);
        prop_assert_eq!(analysis.overlay.dimensions(), buffer.dimensions());
    }

    #[test]
    fn blocky_coverage_is_bounded(buffer in blocky_frames(), config in configs()) {
        let analysis = analyze(&buffer, &config).unwrap();
        let c = analysis.coverage;
        prop_assert!(c.percentage >= 0.0 && c.percentage <= 100.0);
        prop_assert!(c.treated_pixels <= c.masked_pixels);
        // Frames this large always fit the fallback rectangle.
        prop_assert!(c.masked_pixels > 0);
    }

    #[test]
    fn classification_agrees_with_mask(buffer in blocky_frames(), config in configs()) {
        let region = config.region.extract(&buffer, &Imageproc);
        let classification = classify::classify(&buffer, &region.mask, &config.classifier);
        for (class, &inside) in classification.as_slice().iter().zip(region.mask.as_slice()) {
            prop_assert_eq!(*class != PixelClass::Outside, inside);
        }
        let c = coverage::aggregate(&classification);
        prop_assert_eq!(c.masked_pixels, region.mask.count() as u64);
    }

    #[test]
    fn analysis_is_deterministic(buffer in frames(), config in configs()) {
        let first = analyze(&buffer, &config).unwrap();
        let second = analyze(&buffer, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn overlay_outside_mask_is_transparent(buffer in blocky_frames(), config in configs()) {
        let analysis = analyze(&buffer, &config).unwrap();
        for (x, y, p) in analysis.overlay.as_image().enumerate_pixels() {
            if !analysis.mask.contains(x, y) {
                prop_assert_eq!(p.0, [0, 0, 0, 0]);
            }
        }
    }
}
