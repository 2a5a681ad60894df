//! Small value types shared by the loop, the uniform block and the backends.
//!
//! Pixel space follows the window system: physical pixels, origin top-left.
//! The uniform block flips the mouse y axis before it reaches shaders.

mod color;
mod size;

pub use color::ColorRgba;
pub use size::PixelSize;
