use log::debug;

use crate::detector::pattern::PatternDetector;
use crate::detector::transform::PerspectiveCorrector;
use crate::error::Error;
use crate::models::{BarcodeObservation, FrameBuffer, Quadrilateral, ReferenceTarget};

/// A barcode turned into a trackable reference target
#[derive(Debug, Clone)]
pub struct TargetFound {
    /// Rectified image packaged with its physical width
    pub target: ReferenceTarget,
    /// Observation the target was cut from
    pub observation: BarcodeObservation,
    /// Physical width assumed for the printed marker, in metres
    pub marker_width: f32,
}

/// One detection cycle, synchronously: detect, scale corners, rectify, package.
pub fn process_frame(
    pattern: &dyn PatternDetector,
    corrector: &PerspectiveCorrector,
    frame: &FrameBuffer,
    marker_width: f32,
) -> Result<TargetFound, Error> {
    let observation = pattern.detect(frame)?.ok_or(Error::NoObservation)?;

    let quad = Quadrilateral::from_normalized(&observation, frame.width(), frame.height());
    debug!(
        "barcode at TL={:?} TR={:?} BL={:?} BR={:?}",
        quad.top_left, quad.top_right, quad.bottom_left, quad.bottom_right
    );

    let image = corrector.rectify(&quad, frame)?;
    Ok(TargetFound {
        target: ReferenceTarget::new(image, marker_width),
        observation,
        marker_width,
    })
}
