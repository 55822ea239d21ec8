//! Small Win32 conversion helpers shared by the window, dialogs and capture

use windows::Win32::Foundation::{COLORREF, RECT};

use crate::domain::core::Rect;
use crate::ui::theme::Rgb;

// Matches the Win32 ERROR_CLASS_ALREADY_EXISTS (1410) code.
pub const CLASS_ALREADY_EXISTS_ERR: windows::Win32::Foundation::WIN32_ERROR =
    windows::Win32::Foundation::WIN32_ERROR(1410);

pub fn rect_to_win32_rect(rect: &Rect) -> RECT {
    RECT {
        left: rect.x,
        top: rect.y,
        right: rect.x + rect.w,
        bottom: rect.y + rect.h,
    }
}

pub fn win32_rect_to_rect(rect: &RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top)
}

/// GDI colours are laid out as 0x00BBGGRR
pub fn colorref(color: Rgb) -> COLORREF {
    COLORREF(color.r as u32 | (color.g as u32) << 8 | (color.b as u32) << 16)
}

/// Null-terminated UTF-16 copy of `input`
pub fn to_wstring(input: &str) -> Vec<u16> {
    input.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_conversion_keeps_size() {
        let rect = Rect::new(-1920, 10, 800, 600);
        let win = rect_to_win32_rect(&rect);
        assert_eq!(win.right, -1120);
        assert_eq!(win32_rect_to_rect(&win), rect);
    }

    #[test]
    fn colorref_is_bgr() {
        assert_eq!(colorref(Rgb::new(0x11, 0x22, 0x33)), COLORREF(0x00332211));
    }

    #[test]
    fn wstring_is_terminated() {
        assert_eq!(to_wstring("ab"), vec![97, 98, 0]);
    }
}
