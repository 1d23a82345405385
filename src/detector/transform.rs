/// Perspective correction of a detected quadrilateral into an upright image
use image::RgbaImage;
use log::debug;
use rayon::prelude::*;

use crate::config::DEFAULT_MAX_RECTIFIED_DIM;
use crate::error::RectifyError;
use crate::models::{FrameBuffer, Point, Quadrilateral};
use crate::utils::geometry::PerspectiveTransform;

const UNIT_SQUARE: [Point; 4] = [
    Point { x: 0.0, y: 0.0 },
    Point { x: 1.0, y: 0.0 },
    Point { x: 0.0, y: 1.0 },
    Point { x: 1.0, y: 1.0 },
];

/// Maps a quadrilateral region of a frame onto an axis-aligned rectangle
#[derive(Debug, Clone)]
pub struct PerspectiveCorrector {
    max_output_dim: u32,
}

impl Default for PerspectiveCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECTIFIED_DIM)
    }
}

impl PerspectiveCorrector {
    /// Corrector refusing outputs wider or taller than `max_output_dim`
    pub fn new(max_output_dim: u32) -> Self {
        Self { max_output_dim }
    }

    /// Output size for `quad`: the longer of each pair of opposite edges
    pub fn output_size(&self, quad: &Quadrilateral) -> Result<(u32, u32), RectifyError> {
        let width = quad.target_width().round();
        let height = quad.target_height().round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(RectifyError::EmptyOutput);
        }
        let limit = self.max_output_dim as f32;
        if width > limit || height > limit {
            return Err(RectifyError::OutputTooLarge {
                width: width as u32,
                height: height as u32,
            });
        }
        Ok((width as u32, height as u32))
    }

    /// Rectify `quad` out of `frame`.
    ///
    /// Solves the homography sending the corners onto the unit square, then
    /// resamples every output pixel centre through its inverse.
    pub fn rectify(&self, quad: &Quadrilateral, frame: &FrameBuffer) -> Result<RgbaImage, RectifyError> {
        if quad.corners().iter().any(|p| !p.is_finite()) || quad.is_degenerate() {
            return Err(RectifyError::DegenerateQuad);
        }
        let (width, height) = self.output_size(quad)?;

        let to_unit =
            PerspectiveTransform::from_points(&quad.corners(), &UNIT_SQUARE).ok_or(RectifyError::SingularTransform)?;
        let from_unit = to_unit.inverse().ok_or(RectifyError::SingularTransform)?;

        let row_len = width as usize * 4;
        let mut pixels: Vec<u8> = Vec::new();
        pixels
            .try_reserve_exact(row_len * height as usize)
            .map_err(|_| RectifyError::OutputTooLarge { width, height })?;
        pixels.resize(row_len * height as usize, 0);

        let (w, h) = (width as f64, height as f64);
        pixels.par_chunks_exact_mut(row_len).enumerate().for_each(|(v, row)| {
            let ny = (v as f64 + 0.5) / h;
            for (u, px) in row.chunks_exact_mut(4).enumerate() {
                let nx = (u as f64 + 0.5) / w;
                if let Some((sx, sy)) = from_unit.transform(nx, ny) {
                    px.copy_from_slice(&sample_bilinear(frame, sx - 0.5, sy - 0.5));
                }
            }
        });

        debug!("rectified {:?} into {}x{}", quad, width, height);
        RgbaImage::from_raw(width, height, pixels).ok_or(RectifyError::EmptyOutput)
    }
}

/// Bilinear RGBA sample at continuous pixel coordinates, clamped to the frame
fn sample_bilinear(frame: &FrameBuffer, x: f64, y: f64) -> [u8; 4] {
    let max_x = (frame.width() - 1) as f64;
    let max_y = (frame.height() - 1) as f64;
    let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
    let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };

    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let x1 = (x0 + 1).min(frame.width() - 1);
    let y1 = (y0 + 1).min(frame.height() - 1);
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let p00 = frame.rgba_at(x0, y0);
    let p10 = frame.rgba_at(x1, y0);
    let p01 = frame.rgba_at(x0, y1);
    let p11 = frame.rgba_at(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
