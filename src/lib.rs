//! qr_anchor - QR reference targets for two-marker AR measurement
//!
//! Finds a QR symbol in a camera frame, perspective-corrects it into an
//! upright reference image for an image-tracking subsystem, and turns the
//! resulting anchor placements into a base/movable marker pair whose
//! separation vector is computed once both are down.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Runtime configuration
pub mod config;
/// Barcode detection modules (finder patterns, pattern detectors, rectification)
pub mod detector;
/// Error types
pub mod error;
/// Core data structures (frames, quads, targets, anchors)
pub mod models;
/// Single-frame detection pipeline
pub mod pipeline;
/// Synthetic frames and image I/O helpers
pub mod tools;
/// Marker placement, session wiring and results
pub mod tracking;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use config::{DetectorConfig, SessionConfig};
pub use detector::barcode::{BarcodeDetector, SearchStatus, TargetListener};
pub use detector::pattern::{FinderPatternDetector, PatternDetector};
pub use detector::transform::PerspectiveCorrector;
pub use error::{Error, RectifyError};
pub use models::{
    Anchor, BarcodeObservation, FrameBuffer, MarkerKind, PixelFormat, Point, Quadrilateral,
    ReferenceTarget, Separation,
};
pub use pipeline::TargetFound;
pub use tracking::controller::{MarkerEvent, MarkerState, MarkerTrackingController, Placement};
pub use tracking::session::{Session, TrackingSubsystem};
pub use tracking::store::SeparationStore;

/// Detect and rectify a QR target in one frame, synchronously.
///
/// Uses the built-in finder-pattern detector and default settings.
///
/// # Example
/// ```
/// let qr = qr_anchor::tools::synthetic_qr(320, 240, (60, 50), 5).unwrap();
/// let found = qr_anchor::detect_target(&qr.frame).unwrap();
/// assert_eq!(found.target.image().dimensions(), (105, 105));
/// ```
pub fn detect_target(frame: &FrameBuffer) -> Result<TargetFound, Error> {
    let config = DetectorConfig::default();
    pipeline::process_frame(
        &FinderPatternDetector::default(),
        &PerspectiveCorrector::new(config.max_output_dim),
        frame,
        config.marker_width,
    )
}

/// Rectify a known quadrilateral out of a frame
pub fn rectify(frame: &FrameBuffer, quad: &Quadrilateral) -> Result<image::RgbaImage, RectifyError> {
    PerspectiveCorrector::default().rectify(quad, frame)
}
