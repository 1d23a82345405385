//! Two-slot marker placement.
//!
//! The first anchor becomes the base, the second the movable marker, and
//! everything after that is ignored until a restart. The separation between
//! the two is computed exactly once, at the moment the movable slot fills.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info};
use parking_lot::Mutex;

use crate::models::{Anchor, MarkerKind, Separation};
use crate::tracking::store::SeparationStore;
use crate::utils::geometry::{distance, subtract};

/// Snapshot of both marker slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerState {
    /// First placed marker
    pub base: Option<Anchor>,
    /// Second placed marker
    pub movable: Option<Anchor>,
}

impl MarkerState {
    /// Anchor in the given slot
    pub fn get(&self, kind: MarkerKind) -> Option<&Anchor> {
        match kind {
            MarkerKind::Base => self.base.as_ref(),
            MarkerKind::Movable => self.movable.as_ref(),
        }
    }

    /// Both slots filled
    pub fn is_complete(&self) -> bool {
        self.base.is_some() && self.movable.is_some()
    }
}

/// What an anchor placement did
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Became the base marker
    Base,
    /// Became the movable marker; carries the separation just computed
    Movable(Separation),
    /// Both slots were already filled
    Ignored,
}

/// Notifications for the user-facing layer
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent {
    /// The base marker was placed
    BasePlaced(Anchor),
    /// The movable marker was placed and the separation computed
    MovablePlaced {
        /// The movable anchor
        anchor: Anchor,
        /// Movable minus base
        separation: Separation,
    },
    /// Both slots were cleared
    Restarted,
}

/// Serializes anchor placements into the base/movable slots
pub struct MarkerTrackingController {
    slots: Mutex<MarkerState>,
    store: Arc<SeparationStore>,
    subscribers: Mutex<Vec<Sender<MarkerEvent>>>,
}

impl MarkerTrackingController {
    /// Controller publishing separations into `store`
    pub fn new(store: Arc<SeparationStore>) -> Self {
        Self {
            slots: Mutex::new(MarkerState::default()),
            store,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Handle an anchor placed by the tracking subsystem.
    ///
    /// Events go out while the slots are still locked, so subscribers see
    /// them in transition order.
    pub fn on_anchor_placed(&self, anchor: Anchor) -> Placement {
        let mut slots = self.slots.lock();
        let base_position = slots.base.as_ref().map(Anchor::position);
        match (base_position, slots.movable.is_some()) {
            (None, _) => {
                slots.base = Some(anchor.clone());
                info!("{} marker placed", MarkerKind::Base);
                self.broadcast(MarkerEvent::BasePlaced(anchor));
                Placement::Base
            }
            (Some(base), false) => {
                let position = anchor.position();
                let separation = Separation {
                    vector: subtract(&position, &base),
                    distance: distance(&position, &base),
                };
                slots.movable = Some(anchor.clone());
                self.store.publish(separation);
                info!(
                    "{} marker placed; separation {:?}, distance {:.3} m",
                    MarkerKind::Movable,
                    separation.vector,
                    separation.distance
                );
                self.broadcast(MarkerEvent::MovablePlaced { anchor, separation });
                Placement::Movable(separation)
            }
            (Some(_), true) => {
                debug!("both markers placed; ignoring anchor at {:?}", anchor.position());
                Placement::Ignored
            }
        }
    }

    /// Current slots
    pub fn state(&self) -> MarkerState {
        self.slots.lock().clone()
    }

    /// Clear both slots and the stored separation
    pub fn restart(&self) {
        let mut slots = self.slots.lock();
        *slots = MarkerState::default();
        self.store.clear();
        info!("marker slots cleared");
        self.broadcast(MarkerEvent::Restarted);
    }

    /// Receive every subsequent [`MarkerEvent`]
    pub fn subscribe(&self) -> Receiver<MarkerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    // Callers hold the slots lock; hung-up receivers are dropped
    fn broadcast(&self, event: MarkerEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::sync::Barrier;
    use std::thread;

    fn controller() -> (MarkerTrackingController, Arc<SeparationStore>) {
        let store = Arc::new(SeparationStore::new());
        (MarkerTrackingController::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_base_then_movable_then_ignored() {
        let (ctl, store) = controller();
        let first = Anchor::at(Vector3::new(1.0, 0.0, 2.0));
        let second = Anchor::at(Vector3::new(4.0, 0.0, 6.0));

        assert_eq!(ctl.on_anchor_placed(first.clone()), Placement::Base);
        assert_eq!(
            ctl.state(),
            MarkerState { base: Some(first.clone()), movable: None }
        );
        assert!(store.get().is_none());

        let Placement::Movable(sep) = ctl.on_anchor_placed(second.clone()) else {
            panic!("second placement should fill the movable slot");
        };
        assert_eq!(sep.vector, Vector3::new(3.0, 0.0, 4.0));
        assert!((sep.distance - 5.0).abs() < 1e-6);
        assert_eq!(store.get(), Some(sep));

        let before = ctl.state();
        assert_eq!(ctl.on_anchor_placed(Anchor::at(Vector3::new(9.0, 9.0, 9.0))), Placement::Ignored);
        assert_eq!(ctl.state(), before);
        assert_eq!(store.get(), Some(sep));
        assert!(before.is_complete());
        assert_eq!(before.get(MarkerKind::Movable), Some(&second));
    }

    #[test]
    fn test_restart_clears_everything() {
        let (ctl, store) = controller();
        ctl.on_anchor_placed(Anchor::at(Vector3::zeros()));
        ctl.on_anchor_placed(Anchor::at(Vector3::x()));
        ctl.restart();

        assert_eq!(ctl.state(), MarkerState::default());
        assert!(store.get().is_none());
        assert_eq!(ctl.on_anchor_placed(Anchor::at(Vector3::y())), Placement::Base);
    }

    #[test]
    fn test_events_reach_subscribers() {
        let (ctl, _store) = controller();
        let rx = ctl.subscribe();
        let dropped = ctl.subscribe();
        drop(dropped);

        ctl.on_anchor_placed(Anchor::at(Vector3::zeros()));
        ctl.on_anchor_placed(Anchor::at(Vector3::z()));
        ctl.on_anchor_placed(Anchor::at(Vector3::x()));

        assert!(matches!(rx.try_recv(), Ok(MarkerEvent::BasePlaced(_))));
        assert!(matches!(rx.try_recv(), Ok(MarkerEvent::MovablePlaced { .. })));
        assert!(rx.try_recv().is_err());
        assert_eq!(ctl.subscribers.lock().len(), 1);
    }

    #[test]
    fn test_concurrent_placements_fill_each_slot_once() {
        const THREADS: usize = 8;

        for _ in 0..200 {
            let (ctl, store) = controller();
            let ctl = Arc::new(ctl);
            let rx = ctl.subscribe();
            let barrier = Arc::new(Barrier::new(THREADS));

            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let ctl = Arc::clone(&ctl);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        ctl.on_anchor_placed(Anchor::at(Vector3::new(i as f32, 0.0, 1.0)))
                    })
                })
                .collect();
            let placements: Vec<Placement> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            let bases = placements.iter().filter(|p| **p == Placement::Base).count();
            let movables: Vec<Separation> = placements
                .iter()
                .filter_map(|p| match p {
                    Placement::Movable(sep) => Some(*sep),
                    _ => None,
                })
                .collect();
            let ignored = placements.iter().filter(|p| **p == Placement::Ignored).count();
            assert_eq!((bases, movables.len(), ignored), (1, 1, THREADS - 2));

            // One publish: the store holds the only separation handed out
            assert_eq!(store.get(), Some(movables[0]));

            // Events arrive in transition order and match the final slots
            let state = ctl.state();
            let events: Vec<MarkerEvent> = rx.try_iter().collect();
            assert_eq!(events.len(), 2);
            let MarkerEvent::BasePlaced(base) = &events[0] else {
                panic!("first event should place the base: {:?}", events);
            };
            let MarkerEvent::MovablePlaced { anchor, separation } = &events[1] else {
                panic!("second event should place the movable marker: {:?}", events);
            };
            assert_eq!(state.base.as_ref(), Some(base));
            assert_eq!(state.movable.as_ref(), Some(anchor));
            assert_eq!(separation.vector, anchor.position() - base.position());
        }
    }

    #[test]
    fn test_restart_racing_placement_keeps_event_order() {
        for _ in 0..500 {
            let (ctl, store) = controller();
            let ctl = Arc::new(ctl);
            let rx = ctl.subscribe();
            let barrier = Arc::new(Barrier::new(2));

            let placer = {
                let ctl = Arc::clone(&ctl);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ctl.on_anchor_placed(Anchor::at(Vector3::x()))
                })
            };
            let restarter = {
                let ctl = Arc::clone(&ctl);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ctl.restart();
                })
            };
            assert_eq!(placer.join().unwrap(), Placement::Base);
            restarter.join().unwrap();

            let state = ctl.state();
            match rx.try_iter().last() {
                Some(MarkerEvent::Restarted) => assert_eq!(state, MarkerState::default()),
                Some(MarkerEvent::BasePlaced(anchor)) => assert_eq!(state.base, Some(anchor)),
                other => panic!("unexpected last event {:?}", other),
            }
            assert!(store.get().is_none());
        }
    }
}
