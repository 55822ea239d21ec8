//! Display list for the diagram canvas
//!
//! The canvas controller turns the diagram into a `Scene`; the on-screen
//! renderer and the export pipeline both consume it. Keeping geometry here
//! separate from rasterization lets layout be tested without pixels.

use crate::ui::theme::Rgb;

/// Arrow head length and half width, in pixels
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 4.0;

/// Horizontal alignment of a text run around its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
}

/// A single drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
        stroke_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        width: f32,
        dash: Option<[f32; 2]>,
        /// Draw an arrow head at (x2, y2)
        arrow: bool,
    },
    /// Text vertically centred on `y`
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgb,
        size: f32,
        anchor: TextAnchor,
    },
}

/// Ordered list of shapes on a solid background
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, width: f32) -> &mut Shape {
        self.shapes.push(Shape::Line {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            color,
            width,
            dash: None,
            arrow: false,
        });
        let last = self.shapes.len() - 1;
        &mut self.shapes[last]
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, color: Rgb, size: f32, anchor: TextAnchor) {
        self.shapes.push(Shape::Text {
            x,
            y,
            text: text.into(),
            color,
            size,
            anchor,
        });
    }

    /// All text runs in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Shape {
    /// Sets the dash pattern on a line; other shapes are unaffected
    pub fn dashed(&mut self, pattern: Option<[f32; 2]>) -> &mut Self {
        if let Shape::Line { dash, .. } = self {
            *dash = pattern;
        }
        self
    }

    /// Enables the arrow head on a line
    pub fn with_arrow(&mut self) -> &mut Self {
        if let Shape::Line { arrow, .. } = self {
            *arrow = true;
        }
        self
    }
}

/// Triangle (tip, left, right) for an arrow ending at `to`
///
/// Returns `None` for zero-length lines, which have no direction.
pub fn arrow_head_points(from: (f32, f32), to: (f32, f32), width: f32) -> Option<[(f32, f32); 3]> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = dx.hypot(dy);
    if len < f32::EPSILON {
        return None;
    }

    let (ux, uy) = (dx / len, dy / len);
    let length = ARROW_LENGTH + width;
    let half = ARROW_HALF_WIDTH + width / 2.0;
    let base = (to.0 - ux * length, to.1 - uy * length);

    Some([
        to,
        (base.0 - uy * half, base.1 + ux * half),
        (base.0 + uy * half, base.1 - ux * half),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_helpers_decorate_lines() {
        let mut scene = Scene::new(100, 100, Rgb::WHITE);
        scene
            .line((0.0, 0.0), (10.0, 0.0), Rgb::BLACK, 2.0)
            .dashed(Some([6.0, 4.0]))
            .with_arrow();

        match &scene.shapes[0] {
            Shape::Line { dash, arrow, .. } => {
                assert_eq!(*dash, Some([6.0, 4.0]));
                assert!(*arrow);
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn texts_are_listed_in_order() {
        let mut scene = Scene::new(100, 100, Rgb::WHITE);
        scene.text(0.0, 0.0, "a", Rgb::BLACK, 12.0, TextAnchor::Middle);
        scene.line((0.0, 0.0), (1.0, 1.0), Rgb::BLACK, 1.0);
        scene.text(0.0, 0.0, "b", Rgb::BLACK, 12.0, TextAnchor::Start);
        assert_eq!(scene.texts().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn arrow_head_points_along_the_line() {
        let [tip, left, right] = arrow_head_points((0.0, 0.0), (100.0, 0.0), 2.0).unwrap();
        assert_eq!(tip, (100.0, 0.0));
        assert!(left.0 < 100.0 && right.0 < 100.0);
        assert!((left.1 + right.1).abs() < 1e-4);
        assert!(arrow_head_points((5.0, 5.0), (5.0, 5.0), 2.0).is_none());
    }
}
