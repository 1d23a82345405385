//! Utility functions for image processing and geometry
//!
//! - Grayscale conversion (frame buffers to luminance)
//! - Binarization (Otsu's method and fixed threshold)
//! - Geometry (perspective transforms, 3D marker math)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
