use std::time::Duration;

use crate::coords::PixelSize;

/// Where the loop is in its life.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopPhase {
    Initializing,
    Running,
    ShuttingDown,
}

/// Mutable loop state, owned by exactly one `FrameLoop`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameState {
    /// Sum of tick intervals since startup.
    pub elapsed: Duration,
    /// Like `elapsed`, but stands still while the freeze key is held.
    pub corrected: Duration,
    pub quit: bool,
    /// Set while no valid program exists.
    pub skip_render: bool,
    pub window_size: PixelSize,
}

impl FrameState {
    pub fn new(window_size: PixelSize) -> Self {
        Self {
            window_size,
            ..Self::default()
        }
    }

    /// Advances simulated time by one tick.
    pub fn advance(&mut self, interval: Duration, frozen: bool) {
        self.elapsed += interval;
        if !frozen {
            self.corrected += interval;
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn corrected_secs(&self) -> f32 {
        self.corrected.as_secs_f32()
    }
}
