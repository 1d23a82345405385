//! Geometry utilities: planar perspective transforms and 3D marker math.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::models::Point;

/// Planar perspective transformation (3x3 homography, h33 = 1)
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveTransform {
    h: Matrix3<f64>,
}

impl PerspectiveTransform {
    /// Solve the transform sending each `src[i]` to `dst[i]`.
    ///
    /// Direct linear transform with h33 fixed to 1. Returns `None` when the
    /// correspondences do not determine a unique, invertible mapping.
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);
            let row = i * 2;

            a[(row, 0)] = sx;
            a[(row, 1)] = sy;
            a[(row, 2)] = 1.0;
            a[(row, 6)] = -dx * sx;
            a[(row, 7)] = -dx * sy;
            b[row] = dx;

            a[(row + 1, 3)] = sx;
            a[(row + 1, 4)] = sy;
            a[(row + 1, 5)] = 1.0;
            a[(row + 1, 6)] = -dy * sx;
            a[(row + 1, 7)] = -dy * sy;
            b[row + 1] = dy;
        }

        let x = a.lu().solve(&b)?;
        if x.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let h = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);
        if h.determinant().abs() < 1e-12 {
            return None;
        }
        Some(Self { h })
    }

    /// Inverse mapping
    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        if inv[(2, 2)].abs() < 1e-15 {
            return None;
        }
        Some(Self { h: inv / inv[(2, 2)] })
    }

    /// Map a point; `None` for points on the line at infinity
    #[inline]
    pub fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let h = &self.h;
        let w = h[(2, 0)] * x + h[(2, 1)] * y + h[(2, 2)];
        if w.abs() < 1e-12 {
            return None;
        }
        Some((
            (h[(0, 0)] * x + h[(0, 1)] * y + h[(0, 2)]) / w,
            (h[(1, 0)] * x + h[(1, 1)] * y + h[(1, 2)]) / w,
        ))
    }

    /// Map a [`Point`]
    pub fn transform_point(&self, p: &Point) -> Option<Point> {
        self.transform(p.x as f64, p.y as f64)
            .map(|(x, y)| Point::new(x as f32, y as f32))
    }

    /// Underlying matrix
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }
}

/// Euclidean distance between two world positions
pub fn distance(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    subtract(a, b).norm()
}

/// Component-wise `a - b`
pub fn subtract(a: &Vector3<f32>, b: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Distance projected onto the ground (XZ) plane
pub fn xz_distance(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Pitch, yaw and roll (radians) of a rotation, for diagnostics
pub fn euler_angles(rotation: &Matrix3<f32>) -> Vector3<f32> {
    Vector3::new(
        (-rotation[(1, 2)]).asin(),
        rotation[(0, 2)].atan2(rotation[(2, 2)]),
        rotation[(1, 0)].atan2(rotation[(1, 1)]),
    )
}

/// Rotate `p` around `origin` by `degrees` (counter-clockwise in a y-up frame)
pub fn rotate_point(p: &Point, origin: &Point, degrees: f32) -> Point {
    let dx = p.x - origin.x;
    let dy = p.y - origin.y;
    let radius = (dx * dx + dy * dy).sqrt();
    let azimuth = dy.atan2(dx) + degrees.to_radians();
    Point::new(origin.x + radius * azimuth.cos(), origin.y + radius * azimuth.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    const UNIT: [Point; 4] = [
        Point { x: 0.0, y: 0.0 },
        Point { x: 1.0, y: 0.0 },
        Point { x: 0.0, y: 1.0 },
        Point { x: 1.0, y: 1.0 },
    ];

    #[test]
    fn test_perspective_transform_scaling() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        ];
        let t = PerspectiveTransform::from_points(&src, &UNIT).unwrap();
        let p = t.transform_point(&Point::new(50.0, 25.0)).unwrap();
        assert!((p.x - 0.5).abs() < 1e-5);
        assert!((p.y - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_inverse_maps_corners_back() {
        let src = [
            Point::new(12.0, 30.0),
            Point::new(210.0, 8.0),
            Point::new(25.0, 190.0),
            Point::new(230.0, 220.0),
        ];
        let t = PerspectiveTransform::from_points(&src, &UNIT).unwrap();
        let inv = t.inverse().unwrap();
        for (s, u) in src.iter().zip(UNIT.iter()) {
            let back = inv.transform_point(u).unwrap();
            assert!(back.distance(s) < 1e-3, "{:?} vs {:?}", back, s);
        }
    }

    #[test]
    fn test_collinear_points_have_no_transform() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        assert!(PerspectiveTransform::from_points(&src, &UNIT).is_none());
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Vector3::new(1.0, -2.0, 0.5);
        let b = Vector3::new(-3.0, 4.0, 2.0);
        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert!((distance(&Vector3::zeros(), &Vector3::new(2.0, 3.0, 6.0)) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_subtract_and_xz() {
        let a = Vector3::new(4.0, 5.0, 6.0);
        let b = Vector3::new(1.0, 1.0, 2.0);
        assert_eq!(subtract(&a, &b), Vector3::new(3.0, 4.0, 4.0));
        assert!((xz_distance(&a, &b) - 5.0).abs() < 1e-6);

        // Height is ignored
        let above = Vector3::new(3.0, 100.0, 4.0);
        assert!((xz_distance(&above, &Vector3::zeros()) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euler_angles_of_yaw() {
        let rot = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.3).into_inner();
        let angles = euler_angles(&rot);
        assert!(angles.x.abs() < 1e-6);
        assert!((angles.y - 0.3).abs() < 1e-6);
        assert!(angles.z.abs() < 1e-6);
    }

    #[test]
    fn test_rotate_point() {
        let p = rotate_point(&Point::new(2.0, 1.0), &Point::new(1.0, 1.0), 90.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }
}
