pub mod bindings;

pub use bindings::{EditorCommand, Modifiers, point_from_lparam};
