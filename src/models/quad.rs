use super::Point;

/// Barcode symbology reported by a pattern detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// QR code
    Qr,
}

/// One barcode-shaped detection.
///
/// Corners are normalized to [0, 1] relative to the frame, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeObservation {
    /// Top-left corner (normalized)
    pub top_left: Point,
    /// Top-right corner (normalized)
    pub top_right: Point,
    /// Bottom-left corner (normalized)
    pub bottom_left: Point,
    /// Bottom-right corner (normalized)
    pub bottom_right: Point,
    /// Decoded payload, if the detector decodes
    pub payload: Option<String>,
    /// Symbology of the observation
    pub symbology: Symbology,
}

impl BarcodeObservation {
    /// Observation with no payload
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            payload: None,
            symbology: Symbology::Qr,
        }
    }
}

/// Four labelled corners in pixel coordinates.
///
/// Labels are taken as given; nothing here re-sorts them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    /// Top-left corner
    pub top_left: Point,
    /// Top-right corner
    pub top_right: Point,
    /// Bottom-left corner
    pub bottom_left: Point,
    /// Bottom-right corner
    pub bottom_right: Point,
}

impl Quadrilateral {
    /// Create from pixel-space corners
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self { top_left, top_right, bottom_left, bottom_right }
    }

    /// Scale an observation's normalized corners to a `width` x `height` frame
    pub fn from_normalized(obs: &BarcodeObservation, width: usize, height: usize) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self::new(
            obs.top_left.scale(w, h),
            obs.top_right.scale(w, h),
            obs.bottom_left.scale(w, h),
            obs.bottom_right.scale(w, h),
        )
    }

    /// Corners in TL, TR, BL, BR order
    pub fn corners(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
    }

    /// Width of the upright rectangle this quad maps onto
    pub fn target_width(&self) -> f32 {
        self.top_left
            .distance(&self.top_right)
            .max(self.bottom_left.distance(&self.bottom_right))
    }

    /// Height of the upright rectangle this quad maps onto
    pub fn target_height(&self) -> f32 {
        self.top_left
            .distance(&self.bottom_left)
            .max(self.top_right.distance(&self.bottom_right))
    }

    /// True when any three corners are (nearly) collinear
    pub fn is_degenerate(&self) -> bool {
        let c = self.corners();
        let scale = self.target_width().max(self.target_height()).max(1e-6);
        let tol = scale * scale * 1e-4;
        const TRIPLES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
        TRIPLES.iter().any(|&[a, b, d]| {
            let (a, b, d) = (c[a], c[b], c[d]);
            let area2 = (b.x - a.x) * (d.y - a.y) - (b.y - a.y) * (d.x - a.x);
            !area2.is_finite() || area2.abs() <= tol
        })
    }
}
