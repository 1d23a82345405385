//! Helpers shared by the CLI, benchmarks and tests: synthetic QR frames and
//! image file I/O.

use std::path::Path;

use image::RgbaImage;

use crate::error::Error;
use crate::models::{FrameBuffer, PixelFormat, Point, Quadrilateral};

/// Modules per side of a version 1 symbol
pub const VERSION1_MODULES: usize = 21;

/// A rendered symbol and where its outer corners are
#[derive(Debug, Clone)]
pub struct SyntheticQr {
    /// Rendered RGB frame
    pub frame: FrameBuffer,
    /// Outer corners in pixel coordinates
    pub corners: Quadrilateral,
}

fn finder_module(i: isize, j: isize) -> bool {
    if !(0..7).contains(&i) || !(0..7).contains(&j) {
        return false;
    }
    (i - 3).abs().max((j - 3).abs()) != 2
}

/// Whether module (mx, my) of the symbol is dark.
///
/// Three finder patterns with white separators; the rest is a one-module
/// checkerboard, which never forms a 1:1:3:1:1 run.
fn module_is_dark(mx: usize, my: usize) -> bool {
    let (x, y) = (mx as isize, my as isize);
    let far = VERSION1_MODULES as isize - 7;
    match (mx < 8, my < 8, mx >= 13, my >= 13) {
        (true, true, _, _) => finder_module(x, y),
        (_, true, true, _) => finder_module(x - far, y),
        (true, _, _, true) => finder_module(x, y - far),
        _ => (mx + my) % 2 == 0,
    }
}

/// Render an axis-aligned version 1 symbol on a white `width` x `height` frame.
///
/// `origin` is the symbol's top-left pixel; `module` the module size in pixels.
pub fn synthetic_qr(
    width: usize,
    height: usize,
    origin: (usize, usize),
    module: usize,
) -> Result<SyntheticQr, Error> {
    let side = VERSION1_MODULES * module;
    let (ox, oy) = origin;
    let mut data = vec![255u8; width * height * 3];

    for y in oy..(oy + side).min(height) {
        for x in ox..(ox + side).min(width) {
            if module_is_dark((x - ox) / module, (y - oy) / module) {
                let i = (y * width + x) * 3;
                data[i..i + 3].fill(0);
            }
        }
    }

    let (x0, y0) = (ox as f32, oy as f32);
    let (x1, y1) = ((ox + side) as f32, (oy + side) as f32);
    Ok(SyntheticQr {
        frame: FrameBuffer::new(data, width, height, PixelFormat::Rgb8)?,
        corners: Quadrilateral::new(
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
        ),
    })
}

/// Load any image file as an RGBA frame
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<FrameBuffer, Box<dyn std::error::Error + Send + Sync>> {
    let img = image::open(path)?;
    Ok(FrameBuffer::try_from(&img)?)
}

/// Copy a frame into an RGBA image, e.g. to save a rendered synthetic symbol
pub fn frame_to_image(frame: &FrameBuffer) -> RgbaImage {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    RgbaImage::from_fn(w, h, |x, y| image::Rgba(frame.rgba_at(x as usize, y as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finder_corners_are_dark() {
        assert!(module_is_dark(0, 0));
        assert!(module_is_dark(20, 0));
        assert!(module_is_dark(0, 20));
        assert!(!module_is_dark(7, 7));
        // Bottom-right has no finder
        assert!(module_is_dark(20, 20));
        assert!(!module_is_dark(19, 20));
    }

    #[test]
    fn test_synthetic_layout() {
        let qr = synthetic_qr(100, 100, (10, 10), 2).unwrap();
        assert_eq!(qr.corners.bottom_right, Point::new(52.0, 52.0));
        assert_eq!(qr.frame.rgba_at(10, 10), [0, 0, 0, 255]);
        assert_eq!(qr.frame.rgba_at(9, 9), [255, 255, 255, 255]);

        let img = frame_to_image(&qr.frame);
        assert_eq!(img.dimensions(), (100, 100));
    }
}
