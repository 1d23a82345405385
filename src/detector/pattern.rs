//! Pattern detectors: anything that can locate a barcode's four corners.

use log::debug;

use crate::detector::finder::{FinderDetector, FinderPattern};
use crate::error::Error;
use crate::models::{BarcodeObservation, FrameBuffer, Point};
use crate::utils::binarization::otsu_binarize;
use crate::utils::grayscale::frame_to_grayscale;

/// Distance, in modules, from a finder centre to the symbol's outer edge
const FINDER_CENTER_TO_EDGE: f32 = 3.5;

/// Only the best-confirmed candidates are tried as triples
const MAX_TRIPLE_CANDIDATES: usize = 12;

/// Locates at most one barcode in a frame.
///
/// Implementations run on a worker thread, never on the caller of
/// [`crate::BarcodeDetector::search`].
pub trait PatternDetector: Send + Sync {
    /// `Ok(None)` when the frame holds no barcode
    fn detect(&self, frame: &FrameBuffer) -> Result<Option<BarcodeObservation>, Error>;
}

/// QR locator built on finder-pattern scanning.
///
/// Finds the three position markers, labels them by geometry (the
/// right-angle marker is top-left) and extrapolates the outer corners. The
/// payload is not decoded.
#[derive(Debug, Clone)]
pub struct FinderPatternDetector {
    /// Row hits a finder needs before it is trusted
    pub min_hits: usize,
}

impl Default for FinderPatternDetector {
    fn default() -> Self {
        Self { min_hits: 2 }
    }
}

impl PatternDetector for FinderPatternDetector {
    fn detect(&self, frame: &FrameBuffer) -> Result<Option<BarcodeObservation>, Error> {
        let (width, height) = (frame.width(), frame.height());
        let gray = frame_to_grayscale(frame);
        let binary = otsu_binarize(&gray, width, height);

        let patterns: Vec<FinderPattern> = FinderDetector::detect(&binary)
            .into_iter()
            .filter(|p| p.hits >= self.min_hits)
            .take(MAX_TRIPLE_CANDIDATES)
            .collect();
        debug!("{} finder patterns in {}x{} frame", patterns.len(), width, height);

        let Some(triple) = select_triple(&patterns) else {
            return Ok(None);
        };
        let [tl, tr, bl, br] = outer_corners(&triple);
        let (sx, sy) = (1.0 / width as f32, 1.0 / height as f32);
        Ok(Some(BarcodeObservation::new(
            tl.scale(sx, sy),
            tr.scale(sx, sy),
            bl.scale(sx, sy),
            br.scale(sx, sy),
        )))
    }
}

/// Three finder centres labelled by position
#[derive(Debug, Clone, Copy)]
struct FinderTriple {
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    module_size: f32,
}

/// Pick the triple that best looks like the corner markers of one symbol
fn select_triple(patterns: &[FinderPattern]) -> Option<FinderTriple> {
    let mut best: Option<(f32, FinderTriple)> = None;

    for i in 0..patterns.len() {
        for j in (i + 1)..patterns.len() {
            for k in (j + 1)..patterns.len() {
                let Some((score, triple)) = order_triple(&patterns[i], &patterns[j], &patterns[k]) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(s, _)| score < *s) {
                    best = Some((score, triple));
                }
            }
        }
    }

    best.map(|(_, triple)| triple)
}

/// Label a triple and score it (lower is better); `None` if implausible
fn order_triple(a: &FinderPattern, b: &FinderPattern, c: &FinderPattern) -> Option<(f32, FinderTriple)> {
    let patterns = [a, b, c];

    let sizes = patterns.map(|p| p.module_size);
    let min_size = sizes.iter().copied().fold(f32::INFINITY, f32::min);
    let max_size = sizes.iter().copied().fold(0.0f32, f32::max);
    if min_size <= 0.0 || max_size / min_size > 1.5 {
        return None;
    }

    // Right-angle corner is top-left
    let mut best_idx = 0usize;
    let mut best_cos = f32::INFINITY;
    for i in 0..3 {
        let p = &patterns[i].center;
        let p1 = &patterns[(i + 1) % 3].center;
        let p2 = &patterns[(i + 2) % 3].center;
        let (v1x, v1y) = (p1.x - p.x, p1.y - p.y);
        let (v2x, v2y) = (p2.x - p.x, p2.y - p.y);
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        if denom == 0.0 {
            continue;
        }
        let cos = ((v1x * v2x + v1y * v2y) / denom).abs();
        if cos < best_cos {
            best_cos = cos;
            best_idx = i;
        }
    }
    if best_cos > 0.3 {
        return None;
    }

    let tl = patterns[best_idx];
    let p1 = patterns[(best_idx + 1) % 3];
    let p2 = patterns[(best_idx + 2) % 3];

    // With y pointing down, TR -> BL turns clockwise around TL
    let cross = (p1.center.x - tl.center.x) * (p2.center.y - tl.center.y)
        - (p1.center.y - tl.center.y) * (p2.center.x - tl.center.x);
    let (tr, bl) = if cross > 0.0 { (p1, p2) } else { (p2, p1) };

    let module_size = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);
    // Version 1 symbols put finder centres 14 modules apart
    if d_tr.min(d_bl) < module_size * 10.0 {
        return None;
    }
    let leg_ratio = d_tr.max(d_bl) / d_tr.min(d_bl);
    if leg_ratio > 1.4 {
        return None;
    }

    let score = best_cos + (leg_ratio - 1.0) + (max_size / min_size - 1.0) * 2.0;
    Some((
        score,
        FinderTriple {
            top_left: tl.center,
            top_right: tr.center,
            bottom_left: bl.center,
            module_size,
        },
    ))
}

/// Push finder centres out to the symbol's outer corners (TL, TR, BL, BR).
///
/// The bottom-right corner has no finder; it completes the parallelogram.
fn outer_corners(t: &FinderTriple) -> [Point; 4] {
    let across = t.top_left.distance(&t.top_right);
    let down = t.top_left.distance(&t.bottom_left);
    let (ux, uy) = ((t.top_right.x - t.top_left.x) / across, (t.top_right.y - t.top_left.y) / across);
    let (vx, vy) = ((t.bottom_left.x - t.top_left.x) / down, (t.bottom_left.y - t.top_left.y) / down);
    let m = FINDER_CENTER_TO_EDGE * t.module_size;

    let top_left = t.top_left.offset(ux, uy, -m).offset(vx, vy, -m);
    let top_right = t.top_right.offset(ux, uy, m).offset(vx, vy, -m);
    let bottom_left = t.bottom_left.offset(ux, uy, -m).offset(vx, vy, m);
    let bottom_right = Point::new(
        t.top_right.x + t.bottom_left.x - t.top_left.x,
        t.top_right.y + t.bottom_left.y - t.top_left.y,
    )
    .offset(ux, uy, m)
    .offset(vx, vy, m);

    [top_left, top_right, bottom_left, bottom_right]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::synthetic_qr;

    fn pattern(x: f32, y: f32) -> FinderPattern {
        FinderPattern { center: Point::new(x, y), module_size: 4.0, hits: 12 }
    }

    #[test]
    fn test_order_triple_labels_by_geometry() {
        // Supplied out of order
        let (_, t) = order_triple(&pattern(110.0, 54.0), &pattern(54.0, 110.0), &pattern(54.0, 54.0)).unwrap();
        assert_eq!(t.top_left, Point::new(54.0, 54.0));
        assert_eq!(t.top_right, Point::new(110.0, 54.0));
        assert_eq!(t.bottom_left, Point::new(54.0, 110.0));
    }

    #[test]
    fn test_order_triple_rejects_line() {
        assert!(order_triple(&pattern(0.0, 0.0), &pattern(60.0, 0.0), &pattern(120.0, 0.0)).is_none());
    }

    #[test]
    fn test_outer_corners_axis_aligned() {
        let t = FinderTriple {
            top_left: Point::new(54.0, 54.0),
            top_right: Point::new(110.0, 54.0),
            bottom_left: Point::new(54.0, 110.0),
            module_size: 4.0,
        };
        let [tl, tr, bl, br] = outer_corners(&t);
        assert_eq!(tl, Point::new(40.0, 40.0));
        assert_eq!(tr, Point::new(124.0, 40.0));
        assert_eq!(bl, Point::new(40.0, 124.0));
        assert_eq!(br, Point::new(124.0, 124.0));
    }

    #[test]
    fn test_detects_synthetic_symbol() {
        let qr = synthetic_qr(320, 240, (60, 50), 5).unwrap();
        let obs = FinderPatternDetector::default().detect(&qr.frame).unwrap().unwrap();
        assert!(obs.payload.is_none());

        let expected = qr.corners;
        let got = [obs.top_left, obs.top_right, obs.bottom_left, obs.bottom_right];
        for (g, e) in got.iter().zip(expected.corners()) {
            let px = g.scale(320.0, 240.0);
            assert!(px.distance(&e) < 1.0, "got {:?}, expected {:?}", px, e);
        }
    }

    #[test]
    fn test_blank_frame_has_no_observation() {
        let frame = FrameBuffer::solid(64, 64, [255, 255, 255, 255]).unwrap();
        assert_eq!(FinderPatternDetector::default().detect(&frame).unwrap(), None);
    }
}
