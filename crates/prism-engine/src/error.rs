use std::{error::Error as StdError, fmt};

use winit::error::EventLoopError;

use crate::device::DeviceFailure;

/// Failure to bring the sandbox up. Always fatal: the loop never starts.
#[derive(Debug)]
pub enum StartupError {
    /// winit could not create an event loop.
    EventLoop(EventLoopError),
    /// Window creation was refused or never happened.
    Window(String),
    /// Surface, adapter or device acquisition failed.
    Gpu(anyhow::Error),
    /// Creating the initial device resources failed.
    Device(DeviceFailure),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventLoop(e) => write!(f, "event loop: {e}"),
            Self::Window(msg) => write!(f, "window: {msg}"),
            Self::Gpu(e) => write!(f, "gpu context: {e:#}"),
            Self::Device(e) => write!(f, "device: {e}"),
        }
    }
}

impl StdError for StartupError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::EventLoop(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::Window(_) | Self::Gpu(_) => None,
        }
    }
}

impl From<EventLoopError> for StartupError {
    fn from(e: EventLoopError) -> Self {
        Self::EventLoop(e)
    }
}
impl From<DeviceFailure> for StartupError {
    fn from(e: DeviceFailure) -> Self {
        Self::Device(e)
    }
}
impl From<anyhow::Error> for StartupError {
    fn from(e: anyhow::Error) -> Self {
        Self::Gpu(e)
    }
}
