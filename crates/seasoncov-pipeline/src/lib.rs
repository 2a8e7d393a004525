//! seasoncov-pipeline: Pure seasoning coverage pipeline (sans-IO).
//!
//! Estimates what fraction of a photographed chip is covered by
//! seasoning, from a single RGBA frame:
//!
//! region extraction -> per-pixel classification -> coverage
//! aggregation / overlay rendering.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! frames and byte slices and returns structured data. Loading files,
//! writing PNGs and printing live in the `seasoncov` binary.

pub mod blur;
pub mod classify;
pub mod color;
pub mod component;
pub mod config;
pub mod contour;
pub mod coverage;
pub mod diagnostics;
pub mod foreground;
pub mod grayscale;
pub mod overlay;
pub mod primitives;
pub mod region;
pub mod simplify;
pub mod types;

use serde::{Deserialize, Serialize};

pub use config::{
    ClassifierConfig, ComponentParams, ContourParams, FallbackRect, ForegroundMethod,
    OverlayConfig, OverlayMode, PipelineConfig, RegionConfig, RegionStrategy,
};
pub use diagnostics::{AnalysisDiagnostics, Clock, NullClock};
pub use primitives::{Imageproc, Primitives};
pub use region::{Region, RegionExtractor, RegionSource};
pub use types::{
    Classification, CoverageResult, Dimensions, Mask, PipelineError, PixelBuffer, PixelClass,
    Point, Polygon,
};

use diagnostics::{AnalysisSummary, StageDiagnostics, StageMetrics};

/// Where the analyzed region came from, and its outline when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Which extraction path produced the mask.
    pub source: RegionSource,
    /// The filled polygon, when the contour strategy succeeded.
    pub polygon: Option<Polygon>,
}

/// Everything one analysis produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Treated / masked pixel counts and the coverage percentage.
    pub coverage: CoverageResult,
    /// Colored overlay, same dimensions as the input frame.
    pub overlay: PixelBuffer,
    /// The chip mask the coverage was computed over.
    pub mask: Mask,
    /// How the mask was obtained.
    pub region: RegionInfo,
}

/// Runs the pipeline with a fixed configuration.
///
/// The analyzer holds no mutable state; one instance can serve any
/// number of frames, from any number of threads.
#[derive(Debug, Clone)]
pub struct Analyzer<P: Primitives = Imageproc> {
    config: PipelineConfig,
    primitives: P,
}

impl Analyzer {
    /// Create an analyzer backed by the default `imageproc` primitives.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_primitives(config, Imageproc)
    }
}

impl<P: Primitives> Analyzer<P> {
    /// Create an analyzer with custom image primitives.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn with_primitives(config: PipelineConfig, primitives: P) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, primitives })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze one frame.
    #[must_use]
    pub fn analyze(&self, buffer: &PixelBuffer) -> Analysis {
        self.run(buffer, &NullClock).0
    }

    /// Analyze one frame and collect per-stage diagnostics, timed with
    /// `clock`.
    pub fn analyze_with_diagnostics<C: Clock>(
        &self,
        buffer: &PixelBuffer,
        clock: &C,
    ) -> (Analysis, AnalysisDiagnostics) {
        self.run(buffer, clock)
    }

    fn run<C: Clock>(&self, buffer: &PixelBuffer, clock: &C) -> (Analysis, AnalysisDiagnostics) {
        let total_start = clock.now();
        let dimensions = buffer.dimensions();
        tracing::debug!(
            width = dimensions.width,
            height = dimensions.height,
            strategy = self.config.region.strategy.name(),
            "analyzing frame"
        );

        // 1. Locate the chip.
        let start = clock.now();
        let region = self.config.region.extract(buffer, &self.primitives);
        let region_diag = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::region(self.config.region.strategy.name(), &region),
        };

        // 2. Classify masked pixels.
        let start = clock.now();
        let classification =
            classify::classify(buffer, &region.mask, &self.config.classifier);
        let classify_diag = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::classify(&classification),
        };

        // 3. Aggregate.
        let start = clock.now();
        let coverage = coverage::aggregate(&classification);
        let coverage_diag = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Coverage {
                percentage: coverage.percentage,
            },
        };

        // 4. Render the overlay.
        let start = clock.now();
        let overlay = overlay::render(
            buffer,
            &region.mask,
            &classification,
            region.polygon.as_ref(),
            &self.config.overlay,
        );
        let overlay_diag = StageDiagnostics {
            duration: clock.elapsed(&start),
            metrics: StageMetrics::Overlay {
                mode: self.config.overlay.mode,
                outline: self.config.overlay.outline,
            },
        };

        tracing::debug!(
            source = region.source.name(),
            percentage = coverage.percentage,
            "analysis complete"
        );

        let diagnostics = AnalysisDiagnostics {
            region: region_diag,
            classify: classify_diag,
            coverage: coverage_diag,
            overlay: overlay_diag,
            total_duration: clock.elapsed(&total_start),
            summary: AnalysisSummary {
                image_width: dimensions.width,
                image_height: dimensions.height,
                pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
                region_source: region.source,
                coverage,
            },
        };

        let analysis = Analysis {
            coverage,
            overlay,
            mask: region.mask,
            region: RegionInfo {
                source: region.source,
                polygon: region.polygon,
            },
        };

        (analysis, diagnostics)
    }
}

/// Analyze a decoded frame with the default primitives.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn analyze(buffer: &PixelBuffer, config: &PipelineConfig) -> Result<Analysis, PipelineError> {
    Ok(Analyzer::new(config.clone())?.analyze(buffer))
}

/// Analyze a decoded frame and collect per-stage diagnostics.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn analyze_with_diagnostics<C: Clock>(
    buffer: &PixelBuffer,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(Analysis, AnalysisDiagnostics), PipelineError> {
    Ok(Analyzer::new(config.clone())?.analyze_with_diagnostics(buffer, clock))
}

/// Decode encoded image bytes (PNG, JPEG, BMP, WebP) and analyze them.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the format is unrecognized or the
/// data is corrupt, and [`PipelineError::InvalidConfig`] if `config`
/// fails validation.
pub fn analyze_image_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<Analysis, PipelineError> {
    let analyzer = Analyzer::new(config.clone())?;
    let buffer = grayscale::decode(image_bytes)?;
    Ok(analyzer.analyze(&buffer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::GrayImage;

    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    fn red_square_on_white() -> image::RgbaImage {
        image::RgbaImage::from_fn(120, 120, |x, y| {
            if (20..100).contains(&x) && (20..100).contains(&y) {
                image::Rgba([220, 40, 30, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn analyzer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
        assert_send_sync::<Analysis>();
        assert_send_sync::<AnalysisDiagnostics>();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            classifier: ClassifierConfig {
                min_saturation: 2.0,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Analyzer::new(config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_bytes_are_invalid_input() {
        let result = analyze_image_bytes(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let result = analyze_image_bytes(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn png_bytes_are_analyzed() {
        let png = encode_png(&red_square_on_white());
        let analysis = analyze_image_bytes(&png, &PipelineConfig::default()).unwrap();
        assert_eq!(analysis.overlay.width(), 120);
        assert!(analysis.coverage.masked_pixels > 0);
        assert!(analysis.coverage.percentage > 90.0);
    }

    #[test]
    fn overlay_matches_frame_dimensions() {
        let buffer = PixelBuffer::from_image(red_square_on_white()).unwrap();
        let analysis = analyze(&buffer, &PipelineConfig::default()).unwrap();
        assert_eq!(analysis.overlay.dimensions(), buffer.dimensions());
        assert_eq!(analysis.mask.dimensions(), buffer.dimensions());
    }

    #[test]
    fn null_clock_diagnostics_have_zero_durations() {
        let buffer = PixelBuffer::from_image(red_square_on_white()).unwrap();
        let (analysis, diag) =
            analyze_with_diagnostics(&buffer, &PipelineConfig::default(), &NullClock).unwrap();
        assert_eq!(diag.total_duration, std::time::Duration::ZERO);
        assert_eq!(diag.summary.coverage, analysis.coverage);
        assert_eq!(diag.summary.region_source, analysis.region.source);
        assert!(diag.report().contains("Region"));
    }

    #[test]
    fn analyze_and_diagnostics_agree() {
        let buffer = PixelBuffer::from_image(red_square_on_white()).unwrap();
        let analyzer = Analyzer::new(PipelineConfig::default()).unwrap();
        let plain = analyzer.analyze(&buffer);
        let (with_diag, _) = analyzer.analyze_with_diagnostics(&buffer, &NullClock);
        assert_eq!(plain, with_diag);
    }

    /// Primitives that never find any foreground.
    struct Blind;

    impl Primitives for Blind {
        fn smooth(&self, gray: &GrayImage) -> GrayImage {
            gray.clone()
        }
        fn foreground(&self, gray: &GrayImage, _: ForegroundMethod) -> GrayImage {
            GrayImage::new(gray.width(), gray.height())
        }
        fn close(&self, binary: &GrayImage, _: u8) -> GrayImage {
            binary.clone()
        }
        fn external_contours(&self, _: &GrayImage) -> Vec<types::Contour> {
            Vec::new()
        }
    }

    #[test]
    fn injected_primitives_drive_contour_strategy() {
        let buffer = PixelBuffer::from_image(red_square_on_white()).unwrap();
        let analyzer = Analyzer::with_primitives(PipelineConfig::default(), Blind).unwrap();
        let analysis = analyzer.analyze(&buffer);
        assert_eq!(analysis.region.source, RegionSource::Rectangle);
        assert!(analysis.region.polygon.is_none());
    }
}
