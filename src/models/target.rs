use image::RgbaImage;

/// Default physical width of a printed marker, in metres
pub const DEFAULT_MARKER_WIDTH: f32 = 0.1;

/// Orientation of a reference image relative to the camera sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Upright
    #[default]
    Up,
}

/// A rectified image packaged for the tracking subsystem.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ReferenceTarget {
    image: RgbaImage,
    physical_width: f32,
    orientation: Orientation,
    name: Option<String>,
}

impl ReferenceTarget {
    /// Package a rectified image with its real-world width in metres
    pub fn new(image: RgbaImage, physical_width: f32) -> Self {
        Self {
            image,
            physical_width,
            orientation: Orientation::Up,
            name: None,
        }
    }

    /// Attach a name the tracking subsystem reports back on anchors
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Rectified pixels
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Physical width in metres
    pub fn physical_width(&self) -> f32 {
        self.physical_width
    }

    /// Physical (width, height) in metres, height following the image aspect
    pub fn physical_size(&self) -> (f32, f32) {
        let (w, h) = self.image.dimensions();
        let aspect = if w == 0 { 0.0 } else { h as f32 / w as f32 };
        (self.physical_width, self.physical_width * aspect)
    }

    /// Orientation
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Optional name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
