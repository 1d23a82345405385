//! Barcode detection and perspective correction
//!
//! - Finder pattern scanning (the three square position markers)
//! - Pattern detectors (locating a symbol's four corners)
//! - Perspective correction (quadrilateral to upright image)
//! - The guarded, asynchronous barcode detector

/// Single in-flight barcode detector and its listener interface
pub mod barcode;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Pattern detector trait and the finder-based QR locator
pub mod pattern;
/// Perspective correction into rectified images
pub mod transform;
