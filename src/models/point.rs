/// 2D point with floating point coordinates (pixel or normalized space)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Calculate squared distance (no sqrt)
    pub fn distance_squared(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Scale both coordinates independently
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }

    /// Move `amount` along the direction `(ux, uy)`
    pub fn offset(&self, ux: f32, uy: f32, amount: f32) -> Self {
        Self::new(self.x + ux * amount, self.y + uy * amount)
    }

    /// True when both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
        assert!((a.distance_squared(&b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_and_offset() {
        let p = Point::new(0.25, 0.5).scale(1920.0, 1080.0);
        assert_eq!(p, Point::new(480.0, 540.0));
        let q = p.offset(1.0, 0.0, 10.0);
        assert_eq!(q, Point::new(490.0, 540.0));
        assert!(!Point::new(f32::NAN, 0.0).is_finite());
    }
}
