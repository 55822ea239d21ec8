//! Application orchestration layer
//!
//! Coordinates the domain model, gesture handling, dialogs, preferences and
//! export. Hosts feed pointer events and commands in and repaint on request.

pub mod canvas;
pub mod controller;
pub mod interactions;
pub mod state;

pub use canvas::{CanvasController, GestureOutcome};
pub use controller::{AppError, EditorController};
pub use interactions::InteractionManager;
