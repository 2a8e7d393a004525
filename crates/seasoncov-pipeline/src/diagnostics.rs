//! Analysis diagnostics: timing, counts, and other metrics for each stage.
//!
//! Collected by [`Analyzer::analyze_with_diagnostics`](crate::Analyzer::analyze_with_diagnostics)
//! alongside the regular [`Analysis`](crate::Analysis), for threshold
//! tuning and troubleshooting.
//!
//! The library has no timer of its own. Callers pass a [`Clock`]; a
//! native front end wraps `std::time::Instant`, and [`NullClock`]
//! reports zero durations for deterministic tests.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::OverlayMode;
use crate::region::{Region, RegionSource, RegionStats};
use crate::types::{Classification, CoverageResult, PixelClass};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A [`Clock`] on which no time ever passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClock;

impl Clock for NullClock {
    type Instant = ();

    fn now(&self) -> Self::Instant {}

    fn elapsed(&self, _since: &Self::Instant) -> Duration {
        Duration::ZERO
    }
}

/// Diagnostics collected from a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Stage 1: region extraction (including any fallback).
    pub region: StageDiagnostics,
    /// Stage 2: per-pixel classification.
    pub classify: StageDiagnostics,
    /// Stage 3: coverage aggregation.
    pub coverage: StageDiagnostics,
    /// Stage 4: overlay rendering.
    pub overlay: StageDiagnostics,
    /// Total wall-clock duration of the analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Region extraction metrics.
    Region {
        /// Configured strategy name.
        strategy: String,
        /// Which path produced the mask.
        source: RegionSource,
        /// Foreground pixels the strategy saw.
        foreground_pixels: u64,
        /// Candidates found: external contours or connected components.
        candidate_count: usize,
        /// Area of the largest contour, or size of the largest component.
        largest_candidate: Option<f64>,
        /// Vertices of the approximated polygon, if approximation ran.
        polygon_vertices: Option<usize>,
        /// Pixels in the final mask.
        mask_pixels: usize,
    },
    /// Classification metrics.
    Classify {
        /// Mean value (0-255) over masked pixels.
        mean_value: f64,
        /// Effective darkness threshold (0-255).
        darkness_threshold: f64,
        /// Treated pixel count.
        treated_pixels: u64,
        /// Untreated pixel count.
        untreated_pixels: u64,
    },
    /// Coverage aggregation metrics.
    Coverage {
        /// Coverage percentage.
        percentage: f64,
    },
    /// Overlay rendering metrics.
    Overlay {
        /// Rendering mode.
        mode: OverlayMode,
        /// Whether the polygon outline was requested.
        outline: bool,
    },
}

impl StageMetrics {
    /// Metrics for a completed region extraction.
    #[must_use]
    pub fn region(strategy: &str, region: &Region) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let (foreground_pixels, candidate_count, largest_candidate, polygon_vertices) =
            match region.stats {
                RegionStats::Contour(s) => (
                    s.foreground_pixels,
                    s.contour_count,
                    s.largest_area,
                    s.polygon_vertices,
                ),
                RegionStats::Component(s) => (
                    s.foreground_pixels,
                    s.component_count,
                    (s.component_count > 0).then_some(s.largest_size as f64),
                    None,
                ),
            };
        Self::Region {
            strategy: strategy.to_owned(),
            source: region.source,
            foreground_pixels,
            candidate_count,
            largest_candidate,
            polygon_vertices,
            mask_pixels: region.mask.count(),
        }
    }

    /// Metrics for a completed classification.
    #[must_use]
    pub fn classify(classification: &Classification) -> Self {
        let (treated_pixels, untreated_pixels) = classification.as_slice().iter().fold(
            (0_u64, 0_u64),
            |(t, u), class| match class {
                PixelClass::Treated => (t + 1, u),
                PixelClass::Untreated => (t, u + 1),
                PixelClass::Outside => (t, u),
            },
        );
        Self::Classify {
            mean_value: classification.mean_value(),
            darkness_threshold: classification.darkness_threshold(),
            treated_pixels,
            untreated_pixels,
        }
    }
}

/// High-level summary for the whole analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Frame width in pixels.
    pub image_width: u32,
    /// Frame height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Which path produced the mask.
    pub region_source: RegionSource,
    /// The coverage result.
    pub coverage: CoverageResult,
}

impl AnalysisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Region", &self.region),
            ("Classify", &self.classify),
            ("Coverage", &self.coverage),
            ("Overlay", &self.overlay),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        let coverage = &self.summary.coverage;
        lines.push(String::new());
        lines.push(format!(
            "Region: {}  |  Treated: {}/{}  |  Coverage: {:.1}%",
            self.summary.region_source.name(),
            coverage.treated_pixels,
            coverage.masked_pixels,
            coverage.percentage,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Region {
            strategy,
            source,
            foreground_pixels,
            candidate_count,
            largest_candidate,
            polygon_vertices,
            mask_pixels,
        } => {
            let largest = largest_candidate.map_or_else(|| "-".to_owned(), |a| format!("{a:.0}"));
            let vertices = polygon_vertices.map_or_else(|| "-".to_owned(), |v| v.to_string());
            format!(
                "{strategy} -> {} fg={foreground_pixels} candidates={candidate_count} largest={largest} vertices={vertices} mask={mask_pixels}",
                source.name(),
            )
        }
        StageMetrics::Classify {
            mean_value,
            darkness_threshold,
            treated_pixels,
            untreated_pixels,
        } => format!(
            "meanV={mean_value:.1} dark<{darkness_threshold:.1} treated={treated_pixels} untreated={untreated_pixels}",
        ),
        StageMetrics::Coverage { percentage } => format!("{percentage:.2}%"),
        StageMetrics::Overlay { mode, outline } => format!("{mode:?} outline={outline}"),
    }
}
