//! GPU resource wrappers: geometry, the per-frame uniform block, shader programs.
//!
//! Each wrapper exclusively owns its device objects and releases them on drop.
//! None of them is `Clone`; moving one moves ownership.

mod geometry;
mod shader;
mod uniform;
mod vertex;

pub use geometry::GeometryBuffer;
pub use shader::{PROGRAM_LABEL, ShaderCompilationError, ShaderError, ShaderProgram, ShaderSources};
pub use uniform::{UNIFORM_BLOCK_SIZE, UniformBlock, UniformRecord};
pub use vertex::{COLOR_LOCATION, ColorVertex, POSITION_LOCATION, PositionVertex, Vertex};
