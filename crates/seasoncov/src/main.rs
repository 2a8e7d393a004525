//! Estimate seasoning coverage of a chip photographed in a single image.
//!
//! Prints `Coverage: NN.N%` (or a JSON report) and optionally writes the
//! overlay, a composite preview and the chip mask as PNGs.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use seasoncov_pipeline::{
    AnalysisDiagnostics, Analyzer, Clock, ComponentParams, ContourParams, CoverageResult,
    ForegroundMethod, OverlayMode, PipelineConfig, PipelineError, RegionInfo, RegionStrategy,
    grayscale, overlay,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid configuration JSON: {0}")]
    ConfigJson(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

/// Estimate seasoning coverage of a chip in an image.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Input image (PNG, JPEG, BMP or WebP).
    image: PathBuf,

    /// How the chip region is located.
    #[arg(long, value_enum, default_value_t = StrategyArg::Contour)]
    strategy: StrategyArg,

    /// Foreground map used by the contour strategy.
    #[arg(long, value_enum, default_value_t = ForegroundArg::Adaptive)]
    foreground: ForegroundArg,

    /// How untreated pixels appear in the overlay.
    #[arg(long, value_enum, default_value_t = ModeArg::Highlight)]
    mode: ModeArg,

    /// Draw the chip polygon outline on the overlay.
    #[arg(long)]
    outline: bool,

    /// Write the RGBA overlay to this PNG.
    #[arg(long, value_name = "PATH")]
    overlay: Option<PathBuf>,

    /// Write the overlay blended onto the original to this PNG.
    #[arg(long, value_name = "PATH")]
    composite: Option<PathBuf>,

    /// Write the chip mask (white = chip) to this PNG.
    #[arg(long, value_name = "PATH")]
    mask: Option<PathBuf>,

    /// Print a JSON report instead of the one-line summary.
    #[arg(long)]
    json: bool,

    /// Collect per-stage timings and metrics.
    #[arg(long)]
    diagnostics: bool,

    /// Full pipeline configuration as JSON; overrides the flags above.
    #[arg(long, value_name = "JSON", conflicts_with = "config")]
    config_json: Option<String>,

    /// Read the pipeline configuration from a JSON file; overrides the
    /// flags above.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Contour,
    ColorThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ForegroundArg {
    Adaptive,
    Canny,
    Brightness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Highlight,
    TwoTone,
}

impl Cli {
    /// Resolve the pipeline configuration from a config source or the flags.
    fn pipeline_config(&self) -> CliResult<PipelineConfig> {
        if let Some(json) = &self.config_json {
            return Ok(serde_json::from_str(json)?);
        }
        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(serde_json::from_str(&text)?);
        }

        let mut config = PipelineConfig::default();
        config.region.strategy = match self.strategy {
            StrategyArg::Contour => RegionStrategy::Contour(ContourParams {
                foreground: match self.foreground {
                    ForegroundArg::Adaptive => ForegroundMethod::default(),
                    ForegroundArg::Canny => ForegroundMethod::canny(),
                    ForegroundArg::Brightness => ForegroundMethod::brightness(),
                },
                ..ContourParams::default()
            }),
            StrategyArg::ColorThreshold => {
                RegionStrategy::ColorThreshold(ComponentParams::default())
            }
        };
        config.overlay.mode = match self.mode {
            ModeArg::Highlight => OverlayMode::Highlight,
            ModeArg::TwoTone => OverlayMode::TwoTone,
        };
        config.overlay.outline = self.outline;
        Ok(config)
    }
}

/// Wall-clock [`Clock`] for native runs.
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// JSON report printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    coverage: CoverageResult,
    region: &'a RegionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a AnalysisDiagnostics>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> CliResult<()> {
    let config = cli.pipeline_config()?;
    let analyzer = Analyzer::new(config)?;

    let bytes = std::fs::read(&cli.image).map_err(|source| CliError::Io {
        path: cli.image.clone(),
        source,
    })?;
    let buffer = grayscale::decode(&bytes)?;
    tracing::info!(
        image = %cli.image.display(),
        width = buffer.width(),
        height = buffer.height(),
        strategy = analyzer.config().region.strategy.name(),
        "loaded image"
    );

    let (analysis, diagnostics) = if cli.diagnostics {
        let (analysis, diagnostics) = analyzer.analyze_with_diagnostics(&buffer, &StdClock);
        (analysis, Some(diagnostics))
    } else {
        (analyzer.analyze(&buffer), None)
    };
    tracing::info!(
        source = analysis.region.source.name(),
        treated = analysis.coverage.treated_pixels,
        masked = analysis.coverage.masked_pixels,
        "analysis complete"
    );

    if let Some(path) = &cli.overlay {
        save(path, || analysis.overlay.as_image().save(path))?;
    }
    if let Some(path) = &cli.composite {
        let blended = overlay::composite(&buffer, &analysis.overlay);
        save(path, || blended.save(path))?;
    }
    if let Some(path) = &cli.mask {
        let gray = analysis.mask.to_gray_image();
        save(path, || gray.save(path))?;
    }

    if cli.json {
        let report = Report {
            image: &cli.image,
            width: buffer.width(),
            height: buffer.height(),
            coverage: analysis.coverage,
            region: &analysis.region,
            diagnostics: diagnostics.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Coverage: {:.1}%", analysis.coverage.percentage);
        if let Some(diagnostics) = &diagnostics {
            eprintln!("{}", diagnostics.report());
        }
    }

    Ok(())
}

/// Run an image write and attach the destination path to any error.
fn save(path: &Path, write: impl FnOnce() -> image::ImageResult<()>) -> CliResult<()> {
    write().map_err(|source| CliError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote image");
    Ok(())
}
