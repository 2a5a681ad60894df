//! Driver seam and its wgpu implementation.
//!
//! This module is responsible for:
//! - the [`GraphicsDevice`] trait every GPU resource wrapper talks to
//! - move-only [`RawHandle`]s for device objects
//! - creating the wgpu Instance/Adapter/Device/Queue and configuring the surface
//! - the [`WgpuDevice`] backend that maps the bind-then-draw model onto wgpu

mod bindings;
mod error;
mod gpu;
mod handle;
mod info;
mod init;
mod layout;
mod traits;
mod wgpu_device;

pub use error::{DeviceFailure, SurfaceErrorAction};
pub use gpu::{Gpu, GpuFrame};
pub use handle::{HandleAllocator, RawHandle};
pub use info::DeviceInfo;
pub use init::GpuInit;
pub use layout::{AttributeFormat, ProgramLayout, ShaderStage, VertexAttribute, VertexLayout};
pub use traits::{GraphicsDevice, LinkReport, StageReport};
pub use wgpu_device::WgpuDevice;
