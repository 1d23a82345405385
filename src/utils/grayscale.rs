/// Luminance conversion for frame buffers
/// Y = 0.299*R + 0.587*G + 0.114*B, as fast integer arithmetic:
/// Y = (76*R + 150*G + 29*B) >> 8
use rayon::prelude::*;

use crate::models::{FrameBuffer, PixelFormat};

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8) as u8
}

/// Convert a frame of any supported format into one byte per pixel
pub fn frame_to_grayscale(frame: &FrameBuffer) -> Vec<u8> {
    let data = frame.data();
    match frame.format() {
        PixelFormat::Luma8 => data.to_vec(),
        PixelFormat::Rgb8 => data.par_chunks_exact(3).map(|p| luma(p[0], p[1], p[2])).collect(),
        PixelFormat::Rgba8 => data.par_chunks_exact(4).map(|p| luma(p[0], p[1], p[2])).collect(),
        PixelFormat::Bgra8 => data.par_chunks_exact(4).map(|p| luma(p[2], p[1], p[0])).collect(),
    }
}
