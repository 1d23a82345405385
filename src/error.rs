//! Error types for detection and rectification.
//!
//! Every failure here is local to one detection cycle; none of them is fatal.

/// Why a perspective correction produced no image
#[derive(Debug, Clone, PartialEq)]
pub enum RectifyError {
    /// Three or more corners collinear, or a corner is not finite
    DegenerateQuad,
    /// The corner-to-rectangle system has no unique solution
    SingularTransform,
    /// The quad maps onto a zero-sized rectangle
    EmptyOutput,
    /// Output exceeds the configured size limit
    OutputTooLarge {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

impl std::fmt::Display for RectifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateQuad => write!(f, "degenerate quadrilateral"),
            Self::SingularTransform => write!(f, "perspective transform is singular"),
            Self::EmptyOutput => write!(f, "rectified output would be empty"),
            Self::OutputTooLarge { width, height } => {
                write!(f, "rectified output too large: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for RectifyError {}

/// Failure of one detection cycle or of frame construction
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Pixel data does not match the declared dimensions
    InvalidFrame {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
        /// Actual byte length
        len: usize,
    },
    /// The pattern detector reported an error
    DetectionFailed(String),
    /// Detection ran but found no barcode
    NoObservation,
    /// A barcode was found but could not be rectified
    Rectification(RectifyError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFrame { width, height, len } => {
                write!(f, "invalid frame: {}x{} with {} bytes", width, height, len)
            }
            Self::DetectionFailed(msg) => write!(f, "barcode detection failed: {}", msg),
            Self::NoObservation => write!(f, "no barcode in frame"),
            Self::Rectification(e) => write!(f, "rectification failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rectification(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RectifyError> for Error {
    fn from(e: RectifyError) -> Self {
        Self::Rectification(e)
    }
}
