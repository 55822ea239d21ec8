pub mod renderer;
pub mod scene;
pub mod shell;
pub mod theme;

#[cfg(windows)]
pub mod prompt_dialog;

pub use renderer::{RendererError, SceneRenderer};
pub use scene::Scene;
pub use shell::UiShell;
pub use theme::{Palette, Rgb, Theme};
