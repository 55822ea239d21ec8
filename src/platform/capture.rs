//! GDI screen capture
//!
//! Copies a rectangle of the virtual desktop into a pixmap with BitBlt and
//! GetDIBits. Secondary monitors can sit at negative coordinates, so the
//! region is checked against the whole virtual screen.

use std::ffi::c_void;

use tiny_skia::Pixmap;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, HGDIOBJ, ReleaseDC, SRCCOPY,
    SelectObject,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use crate::domain::core::Rect;
use crate::export::capture::{CaptureError, ScreenCapture, pixmap_from_bgra};

#[derive(Debug, Default, Clone, Copy)]
pub struct GdiScreenCapture;

impl ScreenCapture for GdiScreenCapture {
    fn name(&self) -> &str {
        "GDI"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn capture(&self, region: Rect) -> Result<Pixmap, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion(region));
        }
        if virtual_screen().intersection(&region).is_none() {
            return Err(CaptureError::CanvasNotOnScreen);
        }

        let bgra = copy_screen_bgra(region)?;
        tracing::debug!(?region, "captured canvas from screen");
        pixmap_from_bgra(&bgra, region.w as u32, region.h as u32)
    }
}

/// Bounding rectangle of all monitors
fn virtual_screen() -> Rect {
    unsafe {
        Rect::new(
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    }
}

fn copy_screen_bgra(region: Rect) -> Result<Vec<u8>, CaptureError> {
    let (width, height) = (region.w, region.h);

    unsafe {
        let screen_dc = GetDC(HWND(0));
        if screen_dc.0 == 0 {
            return Err(CaptureError::DeviceContextFailed);
        }

        let memory_dc = CreateCompatibleDC(screen_dc);
        if memory_dc.0 == 0 {
            ReleaseDC(HWND(0), screen_dc);
            return Err(CaptureError::DeviceContextFailed);
        }

        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.0 == 0 {
            DeleteDC(memory_dc);
            ReleaseDC(HWND(0), screen_dc);
            return Err(CaptureError::BitmapCreationFailed);
        }
        let bitmap_object = HGDIOBJ(bitmap.0);

        let old_bitmap = SelectObject(memory_dc, bitmap_object);
        let copied = BitBlt(
            memory_dc, 0, 0, width, height, screen_dc, region.x, region.y, SRCCOPY,
        );
        SelectObject(memory_dc, old_bitmap);

        let mut bitmap_info = BITMAPINFO::default();
        bitmap_info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            biHeight: -height, // top-down rows
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };

        let mut bgra = vec![0u8; width as usize * height as usize * 4];
        let lines = if copied.is_ok() {
            GetDIBits(
                memory_dc,
                bitmap,
                0,
                height as u32,
                Some(bgra.as_mut_ptr() as *mut c_void),
                &mut bitmap_info,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        DeleteObject(bitmap_object);
        DeleteDC(memory_dc);
        ReleaseDC(HWND(0), screen_dc);

        if lines != height {
            return Err(CaptureError::CopyFailed);
        }
        Ok(bgra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_rejected() {
        let result = GdiScreenCapture.capture(Rect::new(0, 0, 0, 10));
        assert!(matches!(result, Err(CaptureError::EmptyRegion(_))));
    }

    #[test]
    fn region_outside_desktop_is_rejected() {
        let far = Rect::new(1_000_000, 1_000_000, 10, 10);
        assert!(matches!(
            GdiScreenCapture.capture(far),
            Err(CaptureError::CanvasNotOnScreen)
        ));
    }
}
