use parking_lot::RwLock;

use crate::models::Separation;

/// Latest separation of the current session.
///
/// Written once per session by the marker controller, cleared on restart,
/// read by anything holding the session.
#[derive(Debug, Default)]
pub struct SeparationStore {
    latest: RwLock<Option<Separation>>,
}

impl SeparationStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly computed separation
    pub fn publish(&self, separation: Separation) {
        *self.latest.write() = Some(separation);
    }

    /// Latest separation, if one has been computed this session
    pub fn get(&self) -> Option<Separation> {
        *self.latest.read()
    }

    /// Forget the stored separation
    pub fn clear(&self) {
        *self.latest.write() = None;
    }
}
