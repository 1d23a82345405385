//! Session wiring: frames in, reference targets out to the tracking
//! subsystem, anchors back in, separation out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{debug, info};
use parking_lot::Mutex;

use crate::config::SessionConfig;
use crate::detector::barcode::{BarcodeDetector, SearchStatus, TargetListener};
use crate::detector::pattern::PatternDetector;
use crate::models::{Anchor, FrameBuffer, ReferenceTarget, Separation};
use crate::pipeline::TargetFound;
use crate::tracking::controller::{MarkerEvent, MarkerState, MarkerTrackingController, Placement};
use crate::tracking::store::SeparationStore;

/// The platform service that recognizes reference targets in the live feed
pub trait TrackingSubsystem: Send + Sync {
    /// (Re)start tracking with exactly these targets; empty stops image tracking
    fn run(&self, targets: Vec<ReferenceTarget>);
}

/// Forwards found targets to the tracking subsystem, at most once per window
struct TargetRegistrar {
    tracking: Arc<dyn TrackingSubsystem>,
    rearm_after: Duration,
    registered_at: Mutex<Option<Instant>>,
    marker_width: Mutex<Option<f32>>,
}

impl TargetRegistrar {
    fn reset(&self) {
        *self.registered_at.lock() = None;
    }
}

impl TargetListener for TargetRegistrar {
    fn target_found(&self, found: TargetFound) {
        *self.marker_width.lock() = Some(found.marker_width);
        {
            let mut registered = self.registered_at.lock();
            if registered.is_some_and(|at| at.elapsed() < self.rearm_after) {
                debug!("already tracking a target; ignoring new one");
                return;
            }
            *registered = Some(Instant::now());
        }

        let (w, h) = found.target.image().dimensions();
        info!(
            "registering {}x{} reference target ({} m wide)",
            w, h, found.marker_width
        );
        self.tracking.run(vec![found.target]);
    }
}

/// One marker-measuring session
pub struct Session {
    detector: BarcodeDetector,
    controller: MarkerTrackingController,
    store: Arc<SeparationStore>,
    registrar: Arc<TargetRegistrar>,
}

impl Session {
    /// Wire a session; call [`Session::start`] to begin tracking
    pub fn new(
        config: SessionConfig,
        pattern: Arc<dyn PatternDetector>,
        tracking: Arc<dyn TrackingSubsystem>,
    ) -> Self {
        let store = Arc::new(SeparationStore::new());
        let registrar = Arc::new(TargetRegistrar {
            tracking,
            rearm_after: config.rearm_after,
            registered_at: Mutex::new(None),
            marker_width: Mutex::new(None),
        });
        let detector = BarcodeDetector::new(pattern, config.detector);
        detector.set_listener(Arc::clone(&registrar) as Arc<dyn TargetListener>);

        Self {
            detector,
            controller: MarkerTrackingController::new(Arc::clone(&store)),
            store,
            registrar,
        }
    }

    /// Start tracking with no reference targets
    pub fn start(&self) {
        self.registrar.tracking.run(Vec::new());
    }

    /// Feed a camera frame; throttling is the caller's job
    pub fn on_frame(&self, frame: FrameBuffer) -> SearchStatus {
        self.detector.search(frame)
    }

    /// Feed an anchor placement from the tracking subsystem
    pub fn on_anchor_placed(&self, anchor: Anchor) -> Placement {
        self.controller.on_anchor_placed(anchor)
    }

    /// Separation computed this session, if both markers are placed
    pub fn separation(&self) -> Option<Separation> {
        self.store.get()
    }

    /// Current marker slots
    pub fn markers(&self) -> MarkerState {
        self.controller.state()
    }

    /// Physical width of the last found target
    pub fn marker_width(&self) -> Option<f32> {
        *self.registrar.marker_width.lock()
    }

    /// Marker placement notifications
    pub fn subscribe(&self) -> Receiver<MarkerEvent> {
        self.controller.subscribe()
    }

    /// The barcode detector frames go through
    pub fn detector(&self) -> &BarcodeDetector {
        &self.detector
    }

    /// Clear both markers and the separation, and re-arm detection
    pub fn restart(&self) {
        info!("restarting session");
        self.controller.restart();
        self.registrar.reset();
        self.registrar.tracking.run(Vec::new());
    }
}
