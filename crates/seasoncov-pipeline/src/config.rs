//! Pipeline configuration.
//!
//! Every threshold the pipeline uses is a tunable heuristic constant
//! exposed here with its default. Nothing is learned from data.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Configuration for the full analysis pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How the chip region is located.
    pub region: RegionConfig,
    /// How masked pixels are classified.
    pub classifier: ClassifierConfig,
    /// How the overlay is drawn.
    pub overlay: OverlayConfig,
}

impl PipelineConfig {
    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending parameter.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.region.validate()?;
        self.classifier.validate()?;
        self.overlay.validate()
    }
}

// ───────────────────────── Region ──────────────────────────

/// Region extraction settings: a strategy plus the rectangle of last resort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Which extraction strategy to run.
    pub strategy: RegionStrategy,
    /// Rectangle used when the strategy finds no usable region.
    pub fallback: FallbackRect,
}

impl RegionConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        match &self.strategy {
            RegionStrategy::Contour(params) => params.validate()?,
            RegionStrategy::ColorThreshold(_) => {}
        }
        self.fallback.validate()
    }
}

/// Selects which region extraction algorithm to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionStrategy {
    /// Foreground map -> closing -> largest external contour -> polygon.
    Contour(ContourParams),
    /// Brightness threshold -> largest 4-connected component.
    ColorThreshold(ComponentParams),
}

impl Default for RegionStrategy {
    fn default() -> Self {
        Self::Contour(ContourParams::default())
    }
}

impl RegionStrategy {
    /// Short stable name, used in logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contour(_) => "contour",
            Self::ColorThreshold(_) => "color-threshold",
        }
    }
}

/// Parameters for the contour strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// How the binary foreground map is produced.
    pub foreground: ForegroundMethod,
    /// Radius of the square closing element; 4 gives a 9x9 element.
    pub closing_radius: u8,
    /// Contours enclosing less area than this (px²) are rejected as noise.
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter.
    pub epsilon_fraction: f64,
}

impl ContourParams {
    /// Default closing radius (9x9 element).
    pub const DEFAULT_CLOSING_RADIUS: u8 = 4;
    /// Default minimum contour area in px².
    pub const DEFAULT_MIN_AREA: f64 = 5000.0;
    /// Default approximation tolerance (2% of perimeter).
    pub const DEFAULT_EPSILON_FRACTION: f64 = 0.02;

    fn validate(&self) -> Result<(), PipelineError> {
        if !(self.min_area.is_finite() && self.min_area >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_area must be finite and >= 0, got {}",
                self.min_area
            )));
        }
        if !(self.epsilon_fraction > 0.0 && self.epsilon_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "epsilon_fraction must be in (0, 1), got {}",
                self.epsilon_fraction
            )));
        }
        self.foreground.validate()
    }
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            foreground: ForegroundMethod::default(),
            closing_radius: Self::DEFAULT_CLOSING_RADIUS,
            min_area: Self::DEFAULT_MIN_AREA,
            epsilon_fraction: Self::DEFAULT_EPSILON_FRACTION,
        }
    }
}

/// How the contour strategy separates the chip from the background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForegroundMethod {
    /// A pixel is foreground when it is at least `offset` levels darker
    /// than the mean of the `(2 * block_radius + 1)²` window around it.
    AdaptiveThreshold {
        /// Half-size of the averaging window.
        block_radius: u32,
        /// Required darkness below the local mean.
        offset: u8,
    },
    /// Canny gradient edges.
    Canny {
        /// Hysteresis low threshold.
        low: f32,
        /// Hysteresis high threshold.
        high: f32,
    },
    /// A pixel is foreground when its luma is below `level`.
    Brightness {
        /// Luma cut-off.
        level: u8,
    },
}

impl ForegroundMethod {
    /// Default adaptive window half-size (51x51 window).
    pub const DEFAULT_BLOCK_RADIUS: u32 = 25;
    /// Default adaptive offset below the local mean.
    pub const DEFAULT_OFFSET: u8 = 7;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 50.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 150.0;
    /// Default luma cut-off for [`Brightness`](Self::Brightness).
    pub const DEFAULT_BRIGHTNESS_LEVEL: u8 = 240;

    /// Canny edges with default thresholds.
    #[must_use]
    pub const fn canny() -> Self {
        Self::Canny {
            low: Self::DEFAULT_CANNY_LOW,
            high: Self::DEFAULT_CANNY_HIGH,
        }
    }

    /// Global brightness cut-off with the default level.
    #[must_use]
    pub const fn brightness() -> Self {
        Self::Brightness {
            level: Self::DEFAULT_BRIGHTNESS_LEVEL,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        match *self {
            Self::AdaptiveThreshold { block_radius, .. } if block_radius == 0 => Err(
                PipelineError::InvalidConfig("block_radius must be at least 1".into()),
            ),
            Self::Canny { low, high } if !(low.is_finite() && high.is_finite()) => Err(
                PipelineError::InvalidConfig(format!(
                    "canny thresholds must be finite, got low={low} high={high}"
                )),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for ForegroundMethod {
    fn default() -> Self {
        Self::AdaptiveThreshold {
            block_radius: Self::DEFAULT_BLOCK_RADIUS,
            offset: Self::DEFAULT_OFFSET,
        }
    }
}

/// Parameters for the connected-component strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentParams {
    /// A pixel whose mean of R, G and B is below this is foreground.
    /// The background is assumed to be brighter.
    pub brightness_cutoff: u8,
}

impl ComponentParams {
    /// Default brightness cut-off.
    pub const DEFAULT_BRIGHTNESS_CUTOFF: u8 = 210;
}

impl Default for ComponentParams {
    fn default() -> Self {
        Self {
            brightness_cutoff: Self::DEFAULT_BRIGHTNESS_CUTOFF,
        }
    }
}

/// Centered rectangle used when no region can be extracted, as fractions
/// of the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackRect {
    /// Left margin as a fraction of width.
    pub left: f64,
    /// Top margin as a fraction of height.
    pub top: f64,
    /// Rectangle width as a fraction of width.
    pub width: f64,
    /// Rectangle height as a fraction of height.
    pub height: f64,
}

impl FallbackRect {
    fn validate(&self) -> Result<(), PipelineError> {
        let fractions = [
            ("left", self.left),
            ("top", self.top),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::InvalidConfig(format!(
                    "fallback {name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.left + self.width > 1.0 || self.top + self.height > 1.0 {
            return Err(PipelineError::InvalidConfig(
                "fallback rectangle extends past the frame".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FallbackRect {
    fn default() -> Self {
        Self {
            left: 0.08,
            top: 0.18,
            width: 0.84,
            height: 0.5,
        }
    }
}

// ───────────────────────── Classifier ──────────────────────────

/// Seasoning classification thresholds.
///
/// Hue is in degrees `[0, 360)`; saturation and value are fractions in
/// `[0, 1]`. The darkness floor is on the 0-255 value scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Start of the seasoning hue band. When greater than `hue_max` the
    /// band wraps through 0 (red).
    pub hue_min: f32,
    /// End of the seasoning hue band (inclusive).
    pub hue_max: f32,
    /// Minimum saturation for the hue test.
    pub min_saturation: f32,
    /// Minimum value for the hue test.
    pub min_value: f32,
    /// Pixels darker than `mean_value * darkness_factor` are speckles.
    pub darkness_factor: f32,
    /// Lower bound of the darkness threshold (0-255 scale).
    pub darkness_floor: f32,
}

impl ClassifierConfig {
    /// Default band start (wraps through red).
    pub const DEFAULT_HUE_MIN: f32 = 340.0;
    /// Default band end (orange / red-yellow).
    pub const DEFAULT_HUE_MAX: f32 = 40.0;
    /// Default saturation floor.
    pub const DEFAULT_MIN_SATURATION: f32 = 0.25;
    /// Default value floor.
    pub const DEFAULT_MIN_VALUE: f32 = 0.20;
    /// Default relative darkness factor.
    pub const DEFAULT_DARKNESS_FACTOR: f32 = 0.92;
    /// Default absolute darkness floor.
    pub const DEFAULT_DARKNESS_FLOOR: f32 = 10.0;

    fn validate(&self) -> Result<(), PipelineError> {
        for (name, hue) in [("hue_min", self.hue_min), ("hue_max", self.hue_max)] {
            if !(0.0..=360.0).contains(&hue) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be in [0, 360], got {hue}"
                )));
            }
        }
        for (name, frac) in [
            ("min_saturation", self.min_saturation),
            ("min_value", self.min_value),
        ] {
            if !(0.0..=1.0).contains(&frac) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {frac}"
                )));
            }
        }
        if !(self.darkness_factor.is_finite() && self.darkness_factor >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "darkness_factor must be finite and >= 0, got {}",
                self.darkness_factor
            )));
        }
        if !(0.0..=255.0).contains(&self.darkness_floor) {
            return Err(PipelineError::InvalidConfig(format!(
                "darkness_floor must be in [0, 255], got {}",
                self.darkness_floor
            )));
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hue_min: Self::DEFAULT_HUE_MIN,
            hue_max: Self::DEFAULT_HUE_MAX,
            min_saturation: Self::DEFAULT_MIN_SATURATION,
            min_value: Self::DEFAULT_MIN_VALUE,
            darkness_factor: Self::DEFAULT_DARKNESS_FACTOR,
            darkness_floor: Self::DEFAULT_DARKNESS_FLOOR,
        }
    }
}

// ───────────────────────── Overlay ──────────────────────────

/// How untreated pixels appear in the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Untreated pixels keep their original color; only seasoning is tinted.
    #[default]
    Highlight,
    /// Untreated pixels are tinted blue.
    TwoTone,
}

/// Overlay rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Treatment of untreated pixels.
    pub mode: OverlayMode,
    /// Alpha of the red tint on treated pixels.
    pub treated_alpha: u8,
    /// Alpha of the blue tint on untreated pixels in [`OverlayMode::TwoTone`].
    pub untreated_alpha: u8,
    /// Draw the selected polygon's outline in green.
    pub outline: bool,
}

impl OverlayConfig {
    /// Default treated alpha.
    pub const DEFAULT_TREATED_ALPHA: u8 = 160;
    /// Default untreated alpha.
    pub const DEFAULT_UNTREATED_ALPHA: u8 = 140;
    /// Accepted treated alphas.
    pub const TREATED_ALPHA_RANGE: RangeInclusive<u8> = 140..=180;
    /// Accepted untreated alphas.
    pub const UNTREATED_ALPHA_RANGE: RangeInclusive<u8> = 100..=160;

    fn validate(&self) -> Result<(), PipelineError> {
        for (name, alpha, range) in [
            ("treated_alpha", self.treated_alpha, Self::TREATED_ALPHA_RANGE),
            (
                "untreated_alpha",
                self.untreated_alpha,
                Self::UNTREATED_ALPHA_RANGE,
            ),
        ] {
            if !range.contains(&alpha) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be in [{}, {}], got {alpha}",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mode: OverlayMode::default(),
            treated_alpha: Self::DEFAULT_TREATED_ALPHA,
            untreated_alpha: Self::DEFAULT_UNTREATED_ALPHA,
            outline: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn default_strategy_is_adaptive_contour() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.region.strategy,
            RegionStrategy::Contour(ContourParams {
                foreground: ForegroundMethod::AdaptiveThreshold {
                    block_radius: 25,
                    offset: 7,
                },
                closing_radius: 4,
                min_area: 5000.0,
                epsilon_fraction: 0.02,
            })
        );
    }

    #[test]
    fn default_fallback_matches_documented_rectangle() {
        let r = FallbackRect::default();
        assert!((r.left - 0.08).abs() < f64::EPSILON);
        assert!((r.top - 0.18).abs() < f64::EPSILON);
        assert!((r.width - 0.84).abs() < f64::EPSILON);
        assert!((r.height - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_hue_out_of_range() {
        let config = PipelineConfig {
            classifier: ClassifierConfig {
                hue_max: 400.0,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_epsilon() {
        let config = PipelineConfig {
            region: RegionConfig {
                strategy: RegionStrategy::Contour(ContourParams {
                    epsilon_fraction: 0.0,
                    ..ContourParams::default()
                }),
                ..RegionConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_fallback_past_frame() {
        let config = PipelineConfig {
            region: RegionConfig {
                fallback: FallbackRect {
                    left: 0.5,
                    width: 0.6,
                    ..FallbackRect::default()
                },
                ..RegionConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan_darkness_factor() {
        let config = PipelineConfig {
            classifier: ClassifierConfig {
                darkness_factor: f32::NAN,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overlay_alpha_out_of_range() {
        for overlay in [
            OverlayConfig {
                treated_alpha: 0,
                ..OverlayConfig::default()
            },
            OverlayConfig {
                treated_alpha: 181,
                ..OverlayConfig::default()
            },
            OverlayConfig {
                untreated_alpha: 99,
                ..OverlayConfig::default()
            },
            OverlayConfig {
                untreated_alpha: 255,
                ..OverlayConfig::default()
            },
        ] {
            let config = PipelineConfig {
                overlay,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "{overlay:?}"
            );
        }
    }

    #[test]
    fn accepts_overlay_alpha_at_range_ends() {
        for (treated_alpha, untreated_alpha) in [(140, 100), (180, 160)] {
            let config = PipelineConfig {
                overlay: OverlayConfig {
                    treated_alpha,
                    untreated_alpha,
                    ..OverlayConfig::default()
                },
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"overlay": {"mode": "TwoTone"}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.overlay.mode, OverlayMode::TwoTone);
        assert_eq!(config.overlay.treated_alpha, 160);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn strategy_json_is_tagged() {
        let json = r#"{"region": {"strategy": {"ColorThreshold": {"brightness_cutoff": 200}}}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.region.strategy,
            RegionStrategy::ColorThreshold(ComponentParams {
                brightness_cutoff: 200
            })
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PipelineConfig {
            region: RegionConfig {
                strategy: RegionStrategy::Contour(ContourParams {
                    foreground: ForegroundMethod::canny(),
                    ..ContourParams::default()
                }),
                ..RegionConfig::default()
            },
            ..PipelineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
