use crate::coords::{ColorRgba, PixelSize};

use super::{DeviceFailure, DeviceInfo, ProgramLayout, RawHandle, ShaderStage, VertexLayout};

/// Outcome of submitting one shader stage to the compiler.
///
/// The stage object exists whether or not compilation succeeded; the caller owns
/// `handle` and must delete it.
#[derive(Debug)]
pub struct StageReport {
    pub handle: RawHandle,
    pub compiled: bool,
    pub log: String,
}

/// Outcome of linking two stages into a program.
///
/// A failed link still yields a program object that the caller must delete.
#[derive(Debug)]
pub struct LinkReport {
    pub handle: RawHandle,
    pub linked: bool,
    pub log: String,
}

/// The graphics driver as seen by the resource wrappers and the frame loop.
///
/// Modeled on a bind-then-operate API: vertex array, program and uniform buffer
/// binding slots are global device state that later calls (`draw_strip`) read.
/// All methods take `&self`; implementations are single-threaded and keep their
/// tables behind interior mutability.
///
/// `delete_*` consumes the handle. Deleting is infallible: by the time an owner
/// releases an object there is nobody left to report a failure to.
pub trait GraphicsDevice {
    /// Creates an empty vertex array object carrying `label`.
    fn create_vertex_array(&self, label: &str) -> Result<RawHandle, DeviceFailure>;

    /// Uploads `contents` as immutable vertex memory and declares `layout` on
    /// `vertex_array`, which must be the array this buffer will feed.
    fn create_vertex_buffer(
        &self,
        vertex_array: &RawHandle,
        label: &str,
        contents: &[u8],
        layout: &VertexLayout,
    ) -> Result<RawHandle, DeviceFailure>;

    /// Allocates `size` bytes of write-only uniform memory.
    fn create_uniform_buffer(&self, label: &str, size: u64) -> Result<RawHandle, DeviceFailure>;

    /// Replaces the full contents of a uniform buffer. `bytes` must match its size.
    fn write_uniform_buffer(&self, buffer: &RawHandle, bytes: &[u8]) -> Result<(), DeviceFailure>;

    /// Attaches `buffer` to uniform binding slot `binding`.
    fn bind_uniform_buffer(&self, binding: u32, buffer: &RawHandle) -> Result<(), DeviceFailure>;

    /// Creates a shader object for `stage` and compiles `source` into it.
    fn create_shader_stage(
        &self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<StageReport, DeviceFailure>;

    /// Creates a program object from a vertex and a fragment stage and links it.
    fn link_program(
        &self,
        label: &str,
        vertex: &RawHandle,
        fragment: &RawHandle,
        layout: &ProgramLayout,
    ) -> Result<LinkReport, DeviceFailure>;

    /// Binds a vertex array, or unbinds with `None`.
    fn bind_vertex_array(&self, vertex_array: Option<&RawHandle>) -> Result<(), DeviceFailure>;

    /// Makes a program current, or clears the program slot with `None`.
    fn use_program(&self, program: Option<&RawHandle>) -> Result<(), DeviceFailure>;

    /// Draws `count` vertices starting at `first` from the bound vertex array as
    /// a connected triangle strip, using the current program and uniform slots.
    fn draw_strip(&self, first: u32, count: u32) -> Result<(), DeviceFailure>;

    /// Resizes the render target region to `size`.
    fn set_viewport(&self, size: PixelSize) -> Result<(), DeviceFailure>;

    /// Starts a frame by clearing the target surface to `color`.
    fn clear(&self, color: ColorRgba) -> Result<(), DeviceFailure>;

    /// Finishes the frame started by `clear` and shows it.
    fn present(&self) -> Result<(), DeviceFailure>;

    fn delete_vertex_array(&self, vertex_array: RawHandle);
    fn delete_buffer(&self, buffer: RawHandle);
    fn delete_shader_stage(&self, stage: RawHandle);
    fn delete_program(&self, program: RawHandle);

    /// Driver identification and limits.
    fn info(&self) -> DeviceInfo;
}
