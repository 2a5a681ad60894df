//! The fixed-rate frame loop and its configuration.

mod config;
mod runner;
mod state;

pub use config::{DEFAULT_CLEAR_COLOR, KeyBindings, LoopConfig};
pub use runner::{FrameLoop, GEOMETRY_LABEL, RunSummary, UNIFORM_LABEL};
pub use state::{FrameState, LoopPhase};
