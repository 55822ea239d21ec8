//! Operating-system theme detection
//!
//! Used when the stored preference is `system`. Every probe degrades to
//! [`Theme::Light`] when the setting cannot be read.

use crate::ui::theme::Theme;

/// Current OS light/dark setting
pub fn detect_system_theme() -> Theme {
    let theme = probe().unwrap_or_default();
    tracing::debug!(%theme, "detected system theme");
    theme
}

#[cfg(windows)]
fn probe() -> Option<Theme> {
    use std::ffi::c_void;
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RegGetValueW};
    use windows::core::w;

    let mut value: u32 = 1;
    let mut size = std::mem::size_of::<u32>() as u32;
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            w!("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize"),
            w!("AppsUseLightTheme"),
            RRF_RT_REG_DWORD,
            None,
            Some(&mut value as *mut u32 as *mut c_void),
            Some(&mut size),
        )
    };

    (status == ERROR_SUCCESS).then(|| theme_from_apps_use_light_theme(value))
}

#[cfg(target_os = "macos")]
fn probe() -> Option<Theme> {
    // `defaults` exits non-zero when the key is absent, which means light mode
    let output = std::process::Command::new("defaults")
        .args(["read", "-g", "AppleInterfaceStyle"])
        .output()
        .ok()?;
    Some(theme_from_interface_style(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(any(windows, target_os = "macos")))]
fn probe() -> Option<Theme> {
    std::env::var("GTK_THEME").ok().map(|value| theme_from_gtk_theme(&value))
}

#[cfg_attr(not(windows), allow(dead_code))]
fn theme_from_apps_use_light_theme(value: u32) -> Theme {
    if value == 0 { Theme::Dark } else { Theme::Light }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn theme_from_interface_style(style: &str) -> Theme {
    if style.trim().eq_ignore_ascii_case("dark") {
        Theme::Dark
    } else {
        Theme::Light
    }
}

/// `Adwaita:dark` style values select the dark variant
#[cfg_attr(any(windows, target_os = "macos"), allow(dead_code))]
fn theme_from_gtk_theme(value: &str) -> Theme {
    if value.to_ascii_lowercase().contains("dark") {
        Theme::Dark
    } else {
        Theme::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_value_zero_means_dark() {
        assert_eq!(theme_from_apps_use_light_theme(0), Theme::Dark);
        assert_eq!(theme_from_apps_use_light_theme(1), Theme::Light);
    }

    #[test]
    fn interface_style_parsing() {
        assert_eq!(theme_from_interface_style("Dark\n"), Theme::Dark);
        assert_eq!(theme_from_interface_style(""), Theme::Light);
    }

    #[test]
    fn gtk_theme_variant() {
        assert_eq!(theme_from_gtk_theme("Adwaita:dark"), Theme::Dark);
        assert_eq!(theme_from_gtk_theme("Adwaita"), Theme::Light);
    }
}
