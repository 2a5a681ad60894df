//! Time subsystem.
//!
//! Fixed-rate pacing for the frame loop. Simulation time advances by the
//! nominal interval each tick, independent of how long the tick really took.

mod tick_clock;

pub use tick_clock::{DEFAULT_TICK_INTERVAL, TickClock};
