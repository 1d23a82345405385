pub mod anchor;
pub mod frame;
pub mod matrix;
pub mod point;
pub mod quad;
pub mod target;

pub use anchor::{Anchor, MarkerKind, Separation};
pub use frame::{FrameBuffer, PixelFormat};
pub use matrix::BitMatrix;
pub use point::Point;
pub use quad::{BarcodeObservation, Quadrilateral, Symbology};
pub use target::{DEFAULT_MARKER_WIDTH, Orientation, ReferenceTarget};
