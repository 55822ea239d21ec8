//! SVG rasterizers for the vector export route
//!
//! A rasterizer decodes an SVG document into pixels. The in-process resvg
//! backend is used when the `resvg` feature is enabled; `CommandRasterizer`
//! shells out to an external converter (`rsvg-convert` by default), which may
//! be missing at runtime. Both report availability up front so the export
//! pipeline can skip straight to the fallback.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use tiny_skia::Pixmap;
use wait_timeout::ChildExt;

/// Default external converter program
pub const DEFAULT_CONVERTER: &str = "rsvg-convert";
/// Default limit on a single external conversion
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("Failed to parse SVG document: {0}")]
    Parse(String),

    #[error("Failed to create {width}x{height} pixmap")]
    PixmapCreationFailed { width: u32, height: u32 },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error talking to {program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ConverterFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("Converter output is not a valid PNG: {0}")]
    Decode(String),
}

/// Decodes an SVG document into a pixmap of the requested size
pub trait SvgRasterizer {
    fn name(&self) -> &str;

    /// Whether the backend can run in this environment
    fn is_available(&self) -> bool;

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Pixmap, RasterizeError>;
}

impl<R: SvgRasterizer + ?Sized> SvgRasterizer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Pixmap, RasterizeError> {
        (**self).rasterize(svg, width, height)
    }
}

/// In-process rasterizer backed by resvg
#[cfg(feature = "resvg")]
pub struct ResvgRasterizer {
    options: resvg::usvg::Options<'static>,
}

#[cfg(feature = "resvg")]
impl ResvgRasterizer {
    /// Creates a rasterizer with the system font database loaded
    pub fn new() -> Self {
        let mut options = resvg::usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Self { options }
    }
}

#[cfg(feature = "resvg")]
impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "resvg")]
impl SvgRasterizer for ResvgRasterizer {
    fn name(&self) -> &str {
        "resvg"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Pixmap, RasterizeError> {
        let tree = resvg::usvg::Tree::from_str(svg, &self.options)
            .map_err(|err| RasterizeError::Parse(err.to_string()))?;

        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterizeError::PixmapCreationFailed { width, height })?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Rasterizer that pipes the document through an external converter
///
/// The converter reads SVG on stdin and writes PNG on stdout. A conversion
/// that runs past the timeout is killed and reported as a failure.
#[derive(Debug)]
pub struct CommandRasterizer {
    program: String,
    timeout: Duration,
    available: OnceLock<bool>,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
            available: OnceLock::new(),
        }
    }

    /// `rsvg-convert` from `PATH`
    pub fn rsvg_convert() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn probe(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn io_error(&self, source: std::io::Error) -> RasterizeError {
        RasterizeError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl SvgRasterizer for CommandRasterizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let found = self.probe();
            tracing::debug!(program = %self.program, found, "probed external SVG converter");
            found
        })
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Pixmap, RasterizeError> {
        let mut child = Command::new(&self.program)
            .args(["--format", "png", "--width"])
            .arg(width.to_string())
            .arg("--height")
            .arg(height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RasterizeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a large PNG cannot fill
        // the pipe buffer while we wait on the child.
        let stdout = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                out.read_to_end(&mut buf).map(|_| buf)
            })
        });
        let stderr = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                buf
            })
        });

        // The document can exceed the pipe buffer, and a converter that never
        // reads stdin would block this write. Feed it from a thread so the
        // timeout below always starts.
        let stdin = child.stdin.take().map(|mut input| {
            let document = svg.to_owned();
            thread::spawn(move || {
                // The converter may exit early on bad input; its status reports that
                if let Err(err) = input.write_all(document.as_bytes()) {
                    tracing::debug!(error = %err, "converter closed stdin early");
                }
            })
        });

        let status = match child.wait_timeout(self.timeout).map_err(|e| self.io_error(e))? {
            Some(status) => status,
            None => {
                tracing::warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "external converter timed out; killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                // A writer still blocked on the pipe is detached rather than joined
                drop(stdin);
                return Err(RasterizeError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if let Some(writer) = stdin {
            let _ = writer.join();
        }
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
        if !status.success() {
            return Err(RasterizeError::ConverterFailed {
                program: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        let png = match stdout.map(|h| h.join()) {
            Some(Ok(result)) => result.map_err(|e| self.io_error(e))?,
            _ => Vec::new(),
        };
        if png.is_empty() {
            return Err(RasterizeError::Decode("empty output".to_string()));
        }

        Pixmap::decode_png(&png).map_err(|err| RasterizeError::Decode(err.to_string()))
    }
}
