//! Core geometry types
//!
//! All coordinates are canvas pixels with the origin at the top-left corner
//! of the drawing surface. Screen coordinates only appear at the platform
//! boundary (screen capture, window placement).

/// Rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Returns true if the point lies inside the rectangle, edges included
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Returns the intersection of two rectangles, or None if they don't intersect
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Returns a copy grown by `margin` pixels on every side
    pub fn inflate(&self, margin: i32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2,
            self.h + margin * 2,
        )
    }

    /// Returns true when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// Pointer position in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx.hypot(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_basic_properties() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
        assert!(!rect.is_empty());
        assert!(Rect::new(0, 0, 0, 10).is_empty());
    }

    #[test]
    fn rect_contains_includes_edges() {
        let rect = Rect::new(10, 10, 20, 20);
        assert!(rect.contains(Point::new(15, 15)));
        assert!(rect.contains(Point::new(10, 10)));
        assert!(rect.contains(Point::new(30, 30)));
        assert!(!rect.contains(Point::new(31, 30)));
        assert!(!rect.contains(Point::new(5, 5)));
    }

    #[test]
    fn rect_intersection() {
        let rect1 = Rect::new(0, 0, 20, 20);
        let rect2 = Rect::new(10, 10, 20, 20);
        assert_eq!(rect1.intersection(&rect2), Some(Rect::new(10, 10, 10, 10)));

        let rect3 = Rect::new(30, 30, 10, 10);
        assert!(rect1.intersection(&rect3).is_none());
    }

    #[test]
    fn rect_inflate() {
        assert_eq!(Rect::new(10, 10, 20, 20).inflate(3), Rect::new(7, 7, 26, 26));
    }

    #[test]
    fn point_distance() {
        assert_eq!(Point::new(0, 0).distance_to(Point::new(3, 4)), 5.0);
    }
}
