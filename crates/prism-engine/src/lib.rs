//! Prism engine crate.
//!
//! Owns the GPU resource lifecycle (geometry, uniform blocks, shader programs),
//! the platform/driver seams they sit on, and the fixed-rate frame loop that
//! drives them.

pub mod coords;
pub mod error;
pub mod device;
pub mod frame_loop;
pub mod gfx;
pub mod input;
pub mod io;
pub mod logging;
pub mod platform;
pub mod time;

#[cfg(test)]
mod testing;
