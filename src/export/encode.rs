//! Output format dispatch and image encoding

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{RgbImage, RgbaImage};
use tiny_skia::Pixmap;

/// JPEG quality used for exports
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Pixel buffer does not match {width}x{height}")]
    BufferSize { width: u32, height: u32 },
}

/// Raster formats the editor can export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Picks the format from the path's extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            _ => None,
        }
    }

    pub fn supports_alpha(&self) -> bool {
        matches!(self, ExportFormat::Png)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => f.write_str("PNG"),
            ExportFormat::Jpeg => f.write_str("JPEG"),
        }
    }
}

/// Writes the pixmap to `path` in the given format
///
/// PNG keeps the alpha channel. JPEG is flattened to RGB and any alpha is
/// dropped.
pub fn write_image(pixmap: &Pixmap, path: &Path, format: ExportFormat) -> Result<(), EncodeError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let file = File::create(path).map_err(|source| EncodeError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let encode_err = |source| EncodeError::Encode {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ExportFormat::Png => {
            let image = RgbaImage::from_raw(width, height, demultiplied_rgba(pixmap))
                .ok_or(EncodeError::BufferSize { width, height })?;
            image
                .write_with_encoder(PngEncoder::new(&mut writer))
                .map_err(encode_err)?;
        }
        ExportFormat::Jpeg => {
            let image = RgbImage::from_raw(width, height, opaque_rgb(pixmap))
                .ok_or(EncodeError::BufferSize { width, height })?;
            image
                .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))
                .map_err(encode_err)?;
        }
    }

    writer.flush().map_err(|source| EncodeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn opaque_rgb(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 3);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    out
}
