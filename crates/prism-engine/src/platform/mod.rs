//! Window/input collaborator.
//!
//! The frame loop only needs a non-blocking event queue, two polling queries,
//! a clock and a way to wait. [`Platform`] is that surface; [`WinitPlatform`]
//! implements it on a real window.

mod winit;

use std::time::Duration;

use crate::coords::PixelSize;
use crate::input::Key;

pub use self::winit::{WindowConfig, WinitPlatform};

/// Events the frame loop reacts to. Everything else is absorbed by the platform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformEvent {
    /// The user or the OS asked the application to close.
    Quit,
    /// A key went down. Repeats are reported with `repeat: true`.
    KeyDown { key: Key, repeat: bool },
    /// The drawable area changed size (physical pixels).
    Resized(PixelSize),
}

pub trait Platform {
    /// Collects whatever the OS has queued without waiting for more.
    fn pump_events(&mut self);

    /// Pops the next collected event; `None` once the queue is drained.
    fn poll_event(&mut self) -> Option<PlatformEvent>;

    /// Whether `key` is currently held.
    fn is_held(&self, key: Key) -> bool;

    /// Pointer position in physical pixels, origin top-left.
    fn mouse_position(&self) -> (i32, i32);

    /// Current drawable size.
    fn window_size(&self) -> PixelSize;

    /// Monotonic time since the platform was created.
    fn ticks(&self) -> Duration;

    /// Blocks the calling thread for `duration`.
    fn wait(&mut self, duration: Duration);

    /// Called right before the device presents a frame.
    fn pre_present(&self) {}
}
