//! Dialog and theming capability used by the editor
//!
//! The editor never talks to widgets directly. Everything it needs from the
//! windowing side (asking for text, offering a choice, reporting, applying a
//! theme) goes through this trait, so the editor logic runs unchanged under
//! tests with a scripted implementation.

use crate::ui::theme::{Palette, Theme};

pub trait UiShell {
    /// Asks for a line of text; `None` when the user cancels
    fn ask_text(&mut self, title: &str, prompt: &str, initial: &str) -> Option<String>;

    /// Offers `options` and returns the chosen index; `None` when cancelled
    fn ask_choice(&mut self, title: &str, prompt: &str, options: &[&str]) -> Option<usize>;

    fn info(&mut self, title: &str, message: &str);

    fn error(&mut self, title: &str, message: &str);

    /// Lightweight, non-modal feedback such as a rejected gesture
    fn status(&mut self, message: &str) {
        tracing::info!(message, "status");
    }

    /// Brings the canvas on screen up to date before its pixels are read
    ///
    /// Called after the last export dialog closes. Hosts without a screen
    /// have nothing to flush.
    fn before_capture(&mut self) {}

    /// Restyles every widget for the given theme
    fn apply_theme(&mut self, theme: Theme, palette: &Palette);
}
