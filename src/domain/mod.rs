//! Domain model
//!
//! Pure diagram data and its invariants, independent of rendering,
//! windowing and export.

pub mod core;
pub mod diagram;
pub mod model;
pub mod sequence;

pub use diagram::{Diagram, DiagramError};
pub use model::{Actor, ActorId, Interaction, LineStyle};
pub use sequence::{InteractionSequence, MoveDirection, SequenceError};
