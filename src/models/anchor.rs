use nalgebra::{Matrix3, Matrix4, Vector3};

/// Role of a placed marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// First placed marker; the reference point
    Base,
    /// Second placed marker
    Movable,
}

impl MarkerKind {
    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Base => "Base",
            MarkerKind::Movable => "Movable",
        }
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked pose reported by the tracking subsystem
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// World transform (column-major, translation in the last column)
    pub transform: Matrix4<f32>,
    /// Name of the reference target that produced this anchor
    pub target_name: Option<String>,
}

impl Anchor {
    /// Anchor from a full world transform
    pub fn new(transform: Matrix4<f32>) -> Self {
        Self { transform, target_name: None }
    }

    /// Pure translation anchor
    pub fn at(position: Vector3<f32>) -> Self {
        Self::new(Matrix4::new_translation(&position))
    }

    /// World position
    pub fn position(&self) -> Vector3<f32> {
        self.transform.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Upper-left rotation block
    pub fn rotation(&self) -> Matrix3<f32> {
        self.transform.fixed_view::<3, 3>(0, 0).into_owned()
    }
}

/// Movable position minus base position, with its length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// `movable - base`
    pub vector: Vector3<f32>,
    /// Euclidean length of `vector`
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_translation() {
        let anchor = Anchor::at(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(anchor.position(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(anchor.rotation(), Matrix3::identity());
        assert_eq!(MarkerKind::Movable.to_string(), "Movable");
    }
}
