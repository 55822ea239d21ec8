//! Diagram records and layout constants
//!
//! Actors store their horizontal centre explicitly. Everything vertical is
//! derived: actors sit on a fixed lane and an interaction's row is a function
//! of its order index, so nothing here can go stale when the list is reordered.

use std::fmt;
use std::str::FromStr;

use crate::domain::core::Rect;

/// Width of an actor box
pub const ACTOR_WIDTH: i32 = 120;
/// Height of an actor box
pub const ACTOR_HEIGHT: i32 = 40;
/// Top edge of every actor box (the fixed actor lane)
pub const ACTOR_TOP_Y: i32 = 20;
/// Horizontal gap between automatically placed actors
pub const ACTOR_SPACING: i32 = 40;
/// Centre of the first automatically placed actor
pub const FIRST_ACTOR_X: i32 = 100;
/// Minimum distance between an actor box and the canvas side edges
pub const ACTOR_EDGE_MARGIN: i32 = 10;

/// Row of the first interaction
pub const INTERACTION_START_Y: i32 = 120;
/// Vertical distance between consecutive interactions
pub const INTERACTION_V_GAP: i32 = 60;

/// Default canvas size
pub const CANVAS_WIDTH: i32 = 1000;
pub const CANVAS_HEIGHT: i32 = 700;

/// Lifelines stop this far above the canvas bottom
pub const LIFELINE_BOTTOM_MARGIN: i32 = 20;
/// Column where interaction order numbers are drawn
pub const INDEX_COLUMN_X: i32 = 40;

/// Stable actor identifier; never reused within a diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named participant on the actor lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    /// Horizontal centre of the actor box (stored)
    pub x: i32,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, x: i32) -> Self {
        Self {
            id,
            name: name.into(),
            x,
        }
    }

    /// Bounding box of the actor, derived from its centre and the fixed lane
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - ACTOR_WIDTH / 2,
            ACTOR_TOP_Y,
            ACTOR_WIDTH,
            ACTOR_HEIGHT,
        )
    }
}

/// Line style of an interaction arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            LineStyle::Solid => LineStyle::Dashed,
            LineStyle::Dashed => LineStyle::Solid,
        }
    }

    /// Dash pattern (on, off) used when drawing, if any
    pub fn dash_pattern(&self) -> Option<[f32; 2]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some([6.0, 4.0]),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            other => Err(format!("unknown line style '{other}'")),
        }
    }
}

/// A directed message between two actors
///
/// The order index is not a field: it is the interaction's position in the
/// owning [`InteractionSequence`](crate::domain::sequence::InteractionSequence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub source: ActorId,
    pub target: ActorId,
    pub label: String,
    pub style: LineStyle,
}

impl Interaction {
    pub fn new(source: ActorId, target: ActorId, label: impl Into<String>, style: LineStyle) -> Self {
        Self {
            source,
            target,
            label: label.into(),
            style,
        }
    }

    /// Returns true if either endpoint is the given actor
    pub fn touches(&self, actor: ActorId) -> bool {
        self.source == actor || self.target == actor
    }
}

/// Vertical position of the interaction at `order_index`
pub fn interaction_y(order_index: usize) -> i32 {
    INTERACTION_START_Y + order_index as i32 * INTERACTION_V_GAP
}

/// Default centre for the `count`-th automatically placed actor
pub fn default_actor_x(count: usize) -> i32 {
    FIRST_ACTOR_X + count as i32 * (ACTOR_WIDTH + ACTOR_SPACING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::Point;

    #[test]
    fn actor_bounds_follow_centre() {
        let actor = Actor::new(ActorId(1), "Client", 100);
        assert_eq!(actor.bounds(), Rect::new(40, ACTOR_TOP_Y, ACTOR_WIDTH, ACTOR_HEIGHT));
        assert!(actor.bounds().contains(Point::new(100, 40)));
        assert!(!actor.bounds().contains(Point::new(100, 100)));
    }

    #[test]
    fn interaction_rows_are_derived_from_order() {
        assert_eq!(interaction_y(0), 120);
        assert_eq!(interaction_y(1), 180);
        assert_eq!(interaction_y(3), 300);
    }

    #[test]
    fn default_actor_positions_step_right() {
        assert_eq!(default_actor_x(0), 100);
        assert_eq!(default_actor_x(1), 260);
        assert_eq!(default_actor_x(2), 420);
    }

    #[test]
    fn line_style_parsing_and_toggle() {
        assert_eq!("Dashed".parse::<LineStyle>(), Ok(LineStyle::Dashed));
        assert_eq!(" solid ".parse::<LineStyle>(), Ok(LineStyle::Solid));
        assert!("dotted".parse::<LineStyle>().is_err());
        assert_eq!(LineStyle::Solid.toggled(), LineStyle::Dashed);
        assert_eq!(LineStyle::Dashed.dash_pattern(), Some([6.0, 4.0]));
        assert_eq!(LineStyle::Solid.dash_pattern(), None);
    }

    #[test]
    fn interaction_touches_endpoints() {
        let interaction = Interaction::new(ActorId(1), ActorId(2), "", LineStyle::Solid);
        assert!(interaction.touches(ActorId(1)));
        assert!(interaction.touches(ActorId(2)));
        assert!(!interaction.touches(ActorId(3)));
    }
}
