//! Grid world simulation.
//!
//! Buildings placed on a randomly colored grid produce units, and units
//! wander to free neighboring cells, each on its own repeating timer.

pub mod entity;
pub mod frontend;
pub mod grid;
pub mod registry;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;

pub use entity::{Building, Unit};
pub use frontend::{deliver_events, dispatch_events, Renderer, SimEvent, ToneRequest, ToneSink};
pub use grid::Grid;
pub use registry::Occupant;
pub use simulation::{Placement, Rejection, Simulation};
pub use snapshot::Snapshot;
