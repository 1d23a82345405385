//! Marker tracking: the two-slot placement state machine, the session that
//! wires detection to the tracking subsystem, and the separation store.

/// Base/movable placement state machine
pub mod controller;
/// Session wiring and the tracking subsystem interface
pub mod session;
/// Session-owned separation result
pub mod store;
