//! Platform integration
//!
//! Theme detection works everywhere. The editor window, the Win32 helpers and
//! screen capture are Win32 only.

pub mod theme;

#[cfg(windows)]
pub mod capture;
#[cfg(windows)]
pub mod win32;
#[cfg(windows)]
pub mod window;

pub use theme::detect_system_theme;
