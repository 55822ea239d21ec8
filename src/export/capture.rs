//! Screen capture fallback
//!
//! When no vector rasterizer is usable the canvas is copied straight off the
//! screen. The copy is only as good as what is visible: an obscured or
//! off-screen window yields whatever covers it, and this layer cannot tell.

use tiny_skia::Pixmap;

use crate::domain::core::Rect;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Screen capture is not supported on this platform")]
    Unsupported,

    #[error("The canvas is not currently shown on screen")]
    CanvasNotOnScreen,

    #[error("Capture region {0:?} is empty")]
    EmptyRegion(Rect),

    #[error("Failed to acquire the screen device context")]
    DeviceContextFailed,

    #[error("Failed to create capture bitmap")]
    BitmapCreationFailed,

    #[error("Failed to copy screen pixels")]
    CopyFailed,

    #[error("Failed to create {width}x{height} pixmap")]
    PixmapCreationFailed { width: u32, height: u32 },
}

/// Source of on-screen pixels
pub trait ScreenCapture {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Copies the given screen rectangle into an opaque pixmap
    fn capture(&self, region: Rect) -> Result<Pixmap, CaptureError>;
}

impl<C: ScreenCapture + ?Sized> ScreenCapture for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn capture(&self, region: Rect) -> Result<Pixmap, CaptureError> {
        (**self).capture(region)
    }
}

/// Stand-in for targets without a screen capture API
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedCapture;

impl ScreenCapture for UnsupportedCapture {
    fn name(&self) -> &str {
        "screen capture (unsupported)"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn capture(&self, _region: Rect) -> Result<Pixmap, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}

/// Builds an opaque pixmap from top-down 32-bit BGRA rows as GDI returns them
///
/// The alpha byte from the screen is ignored; captured pixels are opaque.
pub fn pixmap_from_bgra(bgra: &[u8], width: u32, height: u32) -> Result<Pixmap, CaptureError> {
    let mut pixmap =
        Pixmap::new(width, height).ok_or(CaptureError::PixmapCreationFailed { width, height })?;
    if bgra.len() != pixmap.data().len() {
        return Err(CaptureError::CopyFailed);
    }
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(bgra.chunks_exact(4)) {
        dst.copy_from_slice(&[src[2], src[1], src[0], 255]);
    }
    Ok(pixmap)
}

/// Screen capture backend for the current platform
pub fn platform_capture() -> Box<dyn ScreenCapture> {
    #[cfg(windows)]
    {
        Box::new(crate::platform::capture::GdiScreenCapture)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedCapture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_capture_reports_unavailable() {
        let capture = UnsupportedCapture;
        assert!(!capture.is_available());
        assert!(matches!(
            capture.capture(Rect::new(0, 0, 10, 10)),
            Err(CaptureError::Unsupported)
        ));
    }

    #[test]
    fn bgra_rows_become_opaque_rgba() {
        let bgra = [0x30, 0x20, 0x10, 0x00, 0xff, 0xff, 0xff, 0x7f];
        let pixmap = pixmap_from_bgra(&bgra, 2, 1).unwrap();
        let first = pixmap.pixel(0, 0).unwrap();
        assert_eq!((first.red(), first.green(), first.blue(), first.alpha()), (0x10, 0x20, 0x30, 255));
        assert_eq!(pixmap.pixel(1, 0).unwrap().alpha(), 255);
        assert!(matches!(
            pixmap_from_bgra(&bgra, 3, 1),
            Err(CaptureError::CopyFailed)
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn platform_capture_is_unavailable_off_windows() {
        assert!(!platform_capture().is_available());
    }
}
