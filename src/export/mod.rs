//! Canvas export
//!
//! Export turns the rendered canvas into a PNG or JPEG file. Pixels come from
//! an ordered chain of strategies: the vector route (scene → SVG → raster)
//! first, screen capture as the fallback. The pipeline skips strategies that
//! report themselves unavailable, returns the first success, and otherwise
//! reports every attempt that failed.

pub mod capture;
pub mod chroma;
pub mod encode;
pub mod rasterizer;
pub mod svg;

use std::fmt;
use std::path::{Path, PathBuf};

use tiny_skia::Pixmap;

use crate::domain::core::Rect;
use crate::ui::scene::Scene;

pub use capture::{
    CaptureError, ScreenCapture, UnsupportedCapture, pixmap_from_bgra, platform_capture,
};
pub use chroma::{ColorMatch, chroma_key};
pub use encode::{EncodeError, ExportFormat};
pub use rasterizer::{CommandRasterizer, RasterizeError, SvgRasterizer};

#[cfg(feature = "resvg")]
pub use rasterizer::ResvgRasterizer;

/// Error from a single strategy attempt
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error(transparent)]
    Rasterize(#[from] RasterizeError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// A failed attempt, tagged with the strategy that made it
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: StrategyError,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unsupported export format for {}: use .png, .jpg or .jpeg", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("No export method is available on this system")]
    NoStrategyAvailable,

    #[error("Export failed ({})", join_failures(.attempts))]
    AllStrategiesFailed { attempts: Vec<StrategyFailure> },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ExportError {
    /// The failure of the last strategy tried, if any strategy ran
    pub fn last_failure(&self) -> Option<&StrategyFailure> {
        match self {
            ExportError::AllStrategiesFailed { attempts } => attempts.last(),
            _ => None,
        }
    }
}

fn join_failures(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything the export strategies need to reproduce the canvas pixels
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    pub scene: Scene,
    /// Canvas rectangle in screen coordinates while it is shown
    pub screen_region: Option<Rect>,
}

impl CanvasSurface {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            screen_region: None,
        }
    }

    pub fn with_screen_region(mut self, region: Rect) -> Self {
        self.screen_region = Some(region);
        self
    }
}

/// One way of producing canvas pixels
pub trait ExportStrategy {
    fn name(&self) -> &str;

    /// Capability probe; unavailable strategies are skipped without an attempt
    fn is_available(&self) -> bool;

    fn attempt(&self, surface: &CanvasSurface) -> Result<Pixmap, StrategyError>;

    /// Whether this strategy is the screen-capture fallback
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Vector route: serialize the scene to SVG and rasterize it
pub struct VectorExport<R> {
    rasterizer: R,
    name: String,
}

impl<R: SvgRasterizer> VectorExport<R> {
    pub fn new(rasterizer: R) -> Self {
        let name = format!("vector ({})", rasterizer.name());
        Self { rasterizer, name }
    }
}

impl<R: SvgRasterizer> ExportStrategy for VectorExport<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.rasterizer.is_available()
    }

    fn attempt(&self, surface: &CanvasSurface) -> Result<Pixmap, StrategyError> {
        let document = svg::scene_to_svg(&surface.scene);
        let pixmap =
            self.rasterizer
                .rasterize(&document, surface.scene.width, surface.scene.height)?;
        Ok(pixmap)
    }
}

/// Fallback route: copy the canvas pixels off the screen
pub struct ScreenCaptureExport<C> {
    capture: C,
    name: String,
}

impl<C: ScreenCapture> ScreenCaptureExport<C> {
    pub fn new(capture: C) -> Self {
        let name = format!("screen capture ({})", capture.name());
        Self { capture, name }
    }
}

impl<C: ScreenCapture> ExportStrategy for ScreenCaptureExport<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.capture.is_available()
    }

    fn attempt(&self, surface: &CanvasSurface) -> Result<Pixmap, StrategyError> {
        let region = surface
            .screen_region
            .ok_or(CaptureError::CanvasNotOnScreen)?;
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion(region).into());
        }
        Ok(self.capture.capture(region)?)
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub strategy: String,
    pub used_fallback: bool,
    /// Number of pixels made transparent by chroma keying
    pub transparent_pixels: usize,
}

/// Ordered chain of export strategies plus output settings
pub struct ExportPipeline {
    strategies: Vec<Box<dyn ExportStrategy>>,
    color_match: ColorMatch,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPipeline {
    /// Creates an empty pipeline; add strategies in priority order
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            color_match: ColorMatch::Exact,
        }
    }

    /// Vector export through the available rasterizers, then screen capture
    pub fn platform_default() -> Self {
        let pipeline = Self::new();
        #[cfg(feature = "resvg")]
        let pipeline = pipeline.with_strategy(VectorExport::new(ResvgRasterizer::new()));
        pipeline
            .with_strategy(VectorExport::new(CommandRasterizer::rsvg_convert()))
            .with_strategy(ScreenCaptureExport::new(platform_capture()))
    }

    pub fn with_strategy(mut self, strategy: impl ExportStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_color_match(mut self, rule: ColorMatch) -> Self {
        self.color_match = rule;
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Produces canvas pixels from the first strategy that succeeds
    ///
    /// Returns the pixmap together with the strategy that produced it.
    pub fn rasterize(&self, surface: &CanvasSurface) -> Result<(Pixmap, &dyn ExportStrategy), ExportError> {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            if !strategy.is_available() {
                tracing::debug!(strategy = strategy.name(), "export strategy unavailable; skipping");
                continue;
            }

            match strategy.attempt(surface) {
                Ok(pixmap) => return Ok((pixmap, strategy.as_ref())),
                Err(error) => {
                    tracing::warn!(strategy = strategy.name(), error = %error, "export strategy failed");
                    attempts.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        error,
                    });
                }
            }
        }

        if attempts.is_empty() {
            Err(ExportError::NoStrategyAvailable)
        } else {
            Err(ExportError::AllStrategiesFailed { attempts })
        }
    }

    /// Exports the canvas to `path`, choosing the format from its extension
    ///
    /// With `transparent` set and a PNG destination, pixels matching the
    /// scene background become fully transparent. JPEG ignores the flag.
    pub fn export(
        &self,
        surface: &CanvasSurface,
        path: &Path,
        transparent: bool,
    ) -> Result<ExportReport, ExportError> {
        let format = ExportFormat::from_path(path)
            .ok_or_else(|| ExportError::UnsupportedFormat(path.to_path_buf()))?;

        let (mut pixmap, strategy) = self.rasterize(surface)?;

        let mut transparent_pixels = 0;
        if transparent && format.supports_alpha() {
            transparent_pixels = chroma_key(&mut pixmap, surface.scene.background, self.color_match);
        } else if transparent {
            tracing::debug!(%format, "format has no alpha channel; transparency skipped");
        }

        encode::write_image(&pixmap, path, format)?;

        let report = ExportReport {
            path: path.to_path_buf(),
            format,
            strategy: strategy.name().to_string(),
            used_fallback: strategy.is_fallback(),
            transparent_pixels,
        };
        tracing::info!(
            path = %report.path.display(),
            %format,
            strategy = %report.strategy,
            transparent_pixels,
            "canvas exported"
        );
        Ok(report)
    }
}
