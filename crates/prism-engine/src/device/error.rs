use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// A driver-reported failure outside shader compilation.
///
/// Every variant is treated as loss of the device or context: there is no retry
/// path, and the frame loop hands it straight to the process boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFailure {
    /// The driver raised an error no operation was scoped to catch.
    Uncaptured(String),
    /// The presentation surface cannot be recovered (out of memory).
    SurfaceLost(String),
    /// A handle passed to the driver does not name a live object of the expected kind.
    UnknownHandle { kind: &'static str, id: u32 },
    /// A draw was issued with an incomplete binding set.
    IncompleteBinding(&'static str),
    /// A vertex layout disagrees with the vertex type it describes.
    InvalidLayout(String),
    /// The driver ran out of object ids.
    HandlesExhausted,
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncaptured(msg) => write!(f, "device error: {msg}"),
            Self::SurfaceLost(msg) => write!(f, "surface lost: {msg}"),
            Self::UnknownHandle { kind, id } => write!(f, "no live {kind} with id {id}"),
            Self::IncompleteBinding(what) => write!(f, "draw issued without a bound {what}"),
            Self::InvalidLayout(msg) => write!(f, "invalid vertex layout: {msg}"),
            Self::HandlesExhausted => write!(f, "device object ids exhausted"),
        }
    }
}

impl std::error::Error for DeviceFailure {}
