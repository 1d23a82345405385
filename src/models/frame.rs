use std::sync::Arc;

use image::DynamicImage;

use crate::error::Error;

/// Pixel layout of a [`FrameBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luminance
    Luma8,
    /// 8-bit RGB
    Rgb8,
    /// 8-bit RGBA
    Rgba8,
    /// 8-bit BGRA (camera native layout on most mobile pipelines)
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

/// Immutable camera frame.
///
/// Pixel data is shared, so cloning a frame to retain it for a detection
/// cycle does not copy the image.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Arc<[u8]>,
}

impl FrameBuffer {
    /// Wrap raw pixel bytes, checking the length against the dimensions
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> Result<Self, Error> {
        let data = data.into();
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or(Error::InvalidFrame { width, height, len: data.len() })?;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(Error::InvalidFrame { width, height, len: data.len() });
        }
        Ok(Self { width, height, format, data })
    }

    /// Frame filled with a single RGBA colour
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self, Error> {
        let data: Vec<u8> = rgba.iter().copied().cycle().take(width * height * 4).collect();
        Self::new(data, width, height, PixelFormat::Rgba8)
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y) as RGBA; caller guarantees bounds
    #[inline]
    pub fn rgba_at(&self, x: usize, y: usize) -> [u8; 4] {
        let ch = self.format.channels();
        let i = (y * self.width + x) * ch;
        let d = &self.data[i..i + ch];
        match self.format {
            PixelFormat::Luma8 => [d[0], d[0], d[0], 255],
            PixelFormat::Rgb8 => [d[0], d[1], d[2], 255],
            PixelFormat::Rgba8 => [d[0], d[1], d[2], d[3]],
            PixelFormat::Bgra8 => [d[2], d[1], d[0], d[3]],
        }
    }
}

impl TryFrom<&DynamicImage> for FrameBuffer {
    type Error = Error;

    fn try_from(img: &DynamicImage) -> Result<Self, Self::Error> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(rgba.into_raw(), width as usize, height as usize, PixelFormat::Rgba8)
    }
}
