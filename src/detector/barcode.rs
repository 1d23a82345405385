//! Barcode detector with a single in-flight request.
//!
//! `search` never blocks and never queues: while a cycle is running every
//! further frame is dropped. The guard is a generation counter in an atomic
//! (0 = idle) so that an optional timeout can hand the guard to a new cycle
//! without letting the stale one release it or publish its result.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::config::DetectorConfig;
use crate::detector::pattern::PatternDetector;
use crate::detector::transform::PerspectiveCorrector;
use crate::error::Error;
use crate::models::FrameBuffer;
use crate::pipeline::{TargetFound, process_frame};

const IDLE: u64 = 0;

/// Receives the outcome of detection cycles
pub trait TargetListener: Send + Sync {
    /// A barcode was found and rectified
    fn target_found(&self, found: TargetFound);

    /// A cycle ended without a target
    fn detection_missed(&self, _error: &Error) {}
}

/// What `search` did with the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// A detection cycle was started for this frame
    Dispatched,
    /// A cycle was already running; the frame was dropped
    Dropped,
}

struct Shared {
    pattern: Arc<dyn PatternDetector>,
    corrector: PerspectiveCorrector,
    config: DetectorConfig,
    listener: RwLock<Option<Arc<dyn TargetListener>>>,
    in_flight: AtomicU64,
    next_generation: AtomicU64,
    // (generation, start) of the cycle holding the guard
    started: Mutex<(u64, Instant)>,
}

/// Releases the guard when the cycle ends, however it ends
struct CycleGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    released: bool,
}

impl CycleGuard<'_> {
    /// Release now; false if a newer cycle reclaimed the guard
    fn release(mut self) -> bool {
        self.released = true;
        self.shared.release(self.generation)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.shared.release(self.generation);
        }
    }
}

impl Shared {
    fn try_acquire(&self) -> Option<u64> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        match self
            .in_flight
            .compare_exchange(IDLE, generation, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                *self.started.lock() = (generation, Instant::now());
                Some(generation)
            }
            Err(current) => self.try_reclaim(current, generation),
        }
    }

    fn try_reclaim(&self, current: u64, generation: u64) -> Option<u64> {
        let timeout = self.config.busy_timeout?;
        let mut started = self.started.lock();
        if started.0 != current || started.1.elapsed() < timeout {
            return None;
        }
        self.in_flight
            .compare_exchange(current, generation, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        warn!("detection cycle {} exceeded {:?}; reclaiming detector", current, timeout);
        *started = (generation, Instant::now());
        Some(generation)
    }

    fn release(&self, generation: u64) -> bool {
        self.in_flight
            .compare_exchange(generation, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn run_cycle(&self, generation: u64, frame: FrameBuffer) {
        let guard = CycleGuard { shared: self, generation, released: false };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            process_frame(self.pattern.as_ref(), &self.corrector, &frame, self.config.marker_width)
        }))
        .unwrap_or_else(|_| Err(Error::DetectionFailed("pattern detector panicked".into())));

        if !guard.release() {
            debug!("discarding result of reclaimed cycle {}", generation);
            return;
        }

        let listener = self.listener.read().clone();
        match outcome {
            Ok(found) => match listener {
                Some(listener) => listener.target_found(found),
                None => debug!("target found but no listener registered"),
            },
            Err(err) => {
                match &err {
                    Error::NoObservation => debug!("no barcode in frame"),
                    other => warn!("barcode detection failed: {}", other),
                }
                if let Some(listener) = listener {
                    listener.detection_missed(&err);
                }
            }
        }
    }
}

/// Serializes barcode detection: `Idle -> Busy -> Idle`.
///
/// Cloning yields another handle to the same detector.
#[derive(Clone)]
pub struct BarcodeDetector {
    shared: Arc<Shared>,
}

impl BarcodeDetector {
    /// Detector running `pattern` on each accepted frame
    pub fn new(pattern: Arc<dyn PatternDetector>, config: DetectorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                pattern,
                corrector: PerspectiveCorrector::new(config.max_output_dim),
                config,
                listener: RwLock::new(None),
                in_flight: AtomicU64::new(IDLE),
                next_generation: AtomicU64::new(IDLE + 1),
                started: Mutex::new((IDLE, Instant::now())),
            }),
        }
    }

    /// Route cycle outcomes to `listener`, replacing any previous one
    pub fn set_listener(&self, listener: Arc<dyn TargetListener>) {
        *self.shared.listener.write() = Some(listener);
    }

    /// Stop delivering outcomes; found targets are dropped
    pub fn clear_listener(&self) {
        *self.shared.listener.write() = None;
    }

    /// True while a cycle holds the guard
    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire) != IDLE
    }

    /// Settings in use
    pub fn config(&self) -> &DetectorConfig {
        &self.shared.config
    }

    /// Start a detection cycle on `frame` unless one is already running.
    ///
    /// The cycle runs on the rayon pool; the frame is owned by the cycle until
    /// it completes.
    pub fn search(&self, frame: FrameBuffer) -> SearchStatus {
        let Some(generation) = self.shared.try_acquire() else {
            debug!("detector busy; dropping {}x{} frame", frame.width(), frame.height());
            return SearchStatus::Dropped;
        };

        let shared = Arc::clone(&self.shared);
        rayon::spawn(move || shared.run_cycle(generation, frame));
        SearchStatus::Dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarcodeObservation;
    use std::time::Duration;

    struct Panics;

    impl PatternDetector for Panics {
        fn detect(&self, _frame: &FrameBuffer) -> Result<Option<BarcodeObservation>, Error> {
            panic!("detector bug")
        }
    }

    struct Missed(crossbeam_channel::Sender<Error>);

    impl TargetListener for Missed {
        fn target_found(&self, _found: TargetFound) {}

        fn detection_missed(&self, error: &Error) {
            let _ = self.0.send(error.clone());
        }
    }

    #[test]
    fn test_panicking_detector_releases_guard() {
        let detector = BarcodeDetector::new(Arc::new(Panics), DetectorConfig::default());
        let (tx, rx) = crossbeam_channel::unbounded();
        detector.set_listener(Arc::new(Missed(tx)));

        let frame = FrameBuffer::solid(8, 8, [0, 0, 0, 255]).unwrap();
        assert_eq!(detector.search(frame), SearchStatus::Dispatched);

        let err = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(err, Error::DetectionFailed(_)));
        assert!(!detector.is_busy());
    }

    #[test]
    fn test_release_ignores_foreign_generation() {
        let detector = BarcodeDetector::new(Arc::new(Panics), DetectorConfig::default());
        let shared = &detector.shared;
        let generation = shared.try_acquire().unwrap();
        assert!(shared.try_acquire().is_none());
        assert!(!shared.release(generation + 1));
        assert!(detector.is_busy());
        assert!(shared.release(generation));
        assert!(!detector.is_busy());
    }
}
