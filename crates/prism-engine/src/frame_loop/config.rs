use std::time::Duration;

use crate::coords::ColorRgba;
use crate::gfx::ShaderSources;
use crate::input::Key;
use crate::time::DEFAULT_TICK_INTERVAL;

/// Background color every frame is cleared to.
pub const DEFAULT_CLEAR_COLOR: ColorRgba = ColorRgba::new(0.1, 0.1, 0.1, 1.0);

/// Runtime key bindings. Fixed; there is no remapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyBindings {
    pub quit: Key,
    pub reload_shaders: Key,
    pub dump_diagnostics: Key,
    /// Held, not pressed: pauses corrected time while down.
    pub freeze_time: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: Key::F4,
            reload_shaders: Key::R,
            dump_diagnostics: Key::F1,
            freeze_time: Key::ShiftRight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub tick_interval: Duration,
    pub clear_color: ColorRgba,
    pub shaders: ShaderSources,
    /// Binding slot shared by the uniform block and the program layout.
    pub uniform_binding: u32,
    pub bindings: KeyBindings,
}

impl LoopConfig {
    /// Defaults for everything except the shader pair.
    pub fn new(shaders: ShaderSources) -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            clear_color: DEFAULT_CLEAR_COLOR,
            shaders,
            uniform_binding: 0,
            bindings: KeyBindings::default(),
        }
    }
}
