//! Test doubles for the device, platform and file seams.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::coords::{ColorRgba, PixelSize};
use crate::device::{
    DeviceFailure, DeviceInfo, GraphicsDevice, HandleAllocator, LinkReport, ProgramLayout, RawHandle,
    ShaderStage, StageReport, VertexLayout,
};
use crate::gfx::{ColorVertex, UNIFORM_BLOCK_SIZE, Vertex};
use crate::input::Key;
use crate::io::SourceReader;
use crate::platform::{Platform, PlatformEvent};

pub const VALID_VERTEX: &str = "@vertex fn vs_main() {}";
pub const VALID_FRAGMENT: &str = "@fragment fn fs_main() {}";

pub fn quad() -> Vec<ColorVertex> {
    vec![
        ColorVertex::new([-1.0, 1.0, 0.5], [1.0, 0.0, 0.0, 1.0]),
        ColorVertex::new([-1.0, -1.0, 0.5], [1.0, 0.0, 1.0, 1.0]),
        ColorVertex::new([1.0, 1.0, 0.5], [1.0, 1.0, 0.0, 1.0]),
        ColorVertex::new([1.0, -1.0, 0.5], [1.0, 1.0, 1.0, 1.0]),
    ]
}

pub fn program_layout() -> ProgramLayout {
    ProgramLayout {
        vertex: ColorVertex::layout(),
        uniform_binding: 0,
        uniform_size: UNIFORM_BLOCK_SIZE,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    VertexArray,
    Buffer,
    Stage,
    Program,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVertexArray(u32),
    CreateVertexBuffer { vertex_array: u32, buffer: u32 },
    CreateUniformBuffer(u32),
    WriteUniformBuffer(u32),
    BindUniformBuffer { binding: u32, buffer: u32 },
    CreateShaderStage(u32, ShaderStage),
    LinkProgram(u32),
    BindVertexArray(Option<u32>),
    UseProgram(Option<u32>),
    DrawStrip { first: u32, count: u32 },
    SetViewport(PixelSize),
    Clear,
    Present,
    DeleteVertexArray(u32),
    DeleteBuffer(u32),
    DeleteShaderStage(u32),
    DeleteProgram(u32),
}

/// A draw as the device saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub program: Option<u32>,
    pub count: u32,
    /// Contents of the buffer bound to slot 0 at draw time.
    pub uniforms: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub live: HashMap<u32, Kind>,
    pub labels: HashMap<u32, String>,
    pub buffers: HashMap<u32, Vec<u8>>,
    pub uniform_slots: HashMap<u32, u32>,
    pub compiled: HashMap<u32, bool>,
    pub bound_vertex_array: Option<u32>,
    pub bound_program: Option<u32>,
    pub draws: Vec<Draw>,
    pub viewport: Option<PixelSize>,
    pub clears: usize,
    pub presents: usize,
}

impl Recorder {
    pub fn buffer_labelled(&self, label: &str) -> Option<u32> {
        self.labels
            .iter()
            .find(|(id, l)| l.as_str() == label && self.buffers.contains_key(id))
            .map(|(id, _)| *id)
    }

    pub fn delete_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::DeleteVertexArray(_) | Call::DeleteBuffer(_) | Call::DeleteShaderStage(_) | Call::DeleteProgram(_)
                )
            })
            .count()
    }

    pub fn live_programs(&self) -> usize {
        self.live.values().filter(|k| **k == Kind::Program).count()
    }

    pub fn live_stages(&self) -> usize {
        self.live.values().filter(|k| **k == Kind::Stage).count()
    }

    fn lookup(&self, handle: &RawHandle, kind: Kind, name: &'static str) -> Result<u32, DeviceFailure> {
        let id = handle.get();
        match self.live.get(&id) {
            Some(k) if *k == kind => Ok(id),
            _ => Err(DeviceFailure::UnknownHandle { kind: name, id }),
        }
    }

    fn release(&mut self, handle: RawHandle, kind: Kind) -> u32 {
        let id = handle.get();
        match self.live.remove(&id) {
            Some(k) if k == kind => {}
            other => panic!("delete of #{id} as {kind:?}, found {other:?}"),
        }
        self.buffers.remove(&id);
        self.uniform_slots.retain(|_, b| *b != id);
        if self.bound_vertex_array == Some(id) {
            self.bound_vertex_array = None;
        }
        if self.bound_program == Some(id) {
            self.bound_program = None;
        }
        id
    }
}

/// A `GraphicsDevice` that keeps every call and enough state to check
/// ownership and binding rules. Panics on double delete.
#[derive(Default)]
pub struct RecordingDevice {
    ids: RefCell<HandleAllocator>,
    rec: RefCell<Recorder>,
    in_frame: Cell<bool>,
    fail_buffer: Cell<bool>,
    fail_link: RefCell<Option<String>>,
    stages_until_failure: Cell<Option<usize>>,
}

impl RecordingDevice {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn recorder(&self) -> Ref<'_, Recorder> {
        self.rec.borrow()
    }

    /// Opens a frame without going through `clear`, for wrapper-level tests.
    pub fn begin_test_frame(&self) {
        self.in_frame.set(true);
    }

    /// Makes the next `create_vertex_buffer` fail.
    pub fn fail_next_buffer(&self) {
        self.fail_buffer.set(true);
    }

    /// Makes the next link report failure with `log`.
    pub fn fail_next_link(&self, log: &str) {
        *self.fail_link.borrow_mut() = Some(log.to_string());
    }

    /// Lets `n` stage creations succeed, then fails the next one with a device error.
    pub fn fail_stage_creation_after(&self, n: usize) {
        self.stages_until_failure.set(Some(n));
    }

    fn allocate(&self, kind: Kind, label: &str) -> Result<RawHandle, DeviceFailure> {
        let handle = self.ids.borrow_mut().allocate().ok_or(DeviceFailure::HandlesExhausted)?;
        let mut rec = self.rec.borrow_mut();
        rec.live.insert(handle.get(), kind);
        rec.labels.insert(handle.get(), label.to_string());
        Ok(handle)
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_vertex_array(&self, label: &str) -> Result<RawHandle, DeviceFailure> {
        let handle = self.allocate(Kind::VertexArray, label)?;
        self.rec.borrow_mut().calls.push(Call::CreateVertexArray(handle.get()));
        Ok(handle)
    }

    fn create_vertex_buffer(
        &self,
        vertex_array: &RawHandle,
        label: &str,
        contents: &[u8],
        layout: &VertexLayout,
    ) -> Result<RawHandle, DeviceFailure> {
        if self.fail_buffer.replace(false) {
            return Err(DeviceFailure::Uncaptured("out of device memory".to_string()));
        }
        let vao = self.rec.borrow().lookup(vertex_array, Kind::VertexArray, "vertex array")?;
        layout.validate(layout.stride)?;

        let handle = self.allocate(Kind::Buffer, label)?;
        let mut rec = self.rec.borrow_mut();
        rec.buffers.insert(handle.get(), contents.to_vec());
        rec.calls.push(Call::CreateVertexBuffer {
            vertex_array: vao,
            buffer: handle.get(),
        });
        Ok(handle)
    }

    fn create_uniform_buffer(&self, label: &str, size: u64) -> Result<RawHandle, DeviceFailure> {
        let handle = self.allocate(Kind::Buffer, label)?;
        let mut rec = self.rec.borrow_mut();
        rec.buffers.insert(handle.get(), vec![0; size as usize]);
        rec.calls.push(Call::CreateUniformBuffer(handle.get()));
        Ok(handle)
    }

    fn write_uniform_buffer(&self, buffer: &RawHandle, bytes: &[u8]) -> Result<(), DeviceFailure> {
        let mut rec = self.rec.borrow_mut();
        let id = rec.lookup(buffer, Kind::Buffer, "buffer")?;
        let stored = rec.buffers.get_mut(&id).ok_or(DeviceFailure::UnknownHandle { kind: "buffer", id })?;
        assert_eq!(stored.len(), bytes.len(), "uniform write must replace the whole buffer");
        stored.copy_from_slice(bytes);
        rec.calls.push(Call::WriteUniformBuffer(id));
        Ok(())
    }

    fn bind_uniform_buffer(&self, binding: u32, buffer: &RawHandle) -> Result<(), DeviceFailure> {
        let mut rec = self.rec.borrow_mut();
        let id = rec.lookup(buffer, Kind::Buffer, "buffer")?;
        rec.uniform_slots.insert(binding, id);
        rec.calls.push(Call::BindUniformBuffer { binding, buffer: id });
        Ok(())
    }

    fn create_shader_stage(&self, stage: ShaderStage, label: &str, source: &str) -> Result<StageReport, DeviceFailure> {
        if let Some(n) = self.stages_until_failure.get() {
            if n == 0 {
                self.stages_until_failure.set(None);
                return Err(DeviceFailure::Uncaptured("context lost".to_string()));
            }
            self.stages_until_failure.set(Some(n - 1));
        }

        let handle = self.allocate(Kind::Stage, label)?;
        let compiled = source.contains(stage.entry_point());
        let log = if compiled {
            String::new()
        } else {
            format!("error: entry point '{}' not found", stage.entry_point())
        };

        let mut rec = self.rec.borrow_mut();
        rec.compiled.insert(handle.get(), compiled);
        rec.calls.push(Call::CreateShaderStage(handle.get(), stage));
        Ok(StageReport { handle, compiled, log })
    }

    fn link_program(
        &self,
        label: &str,
        vertex: &RawHandle,
        fragment: &RawHandle,
        layout: &ProgramLayout,
    ) -> Result<LinkReport, DeviceFailure> {
        let (vs, fs) = {
            let rec = self.rec.borrow();
            (
                rec.lookup(vertex, Kind::Stage, "shader stage")?,
                rec.lookup(fragment, Kind::Stage, "shader stage")?,
            )
        };
        layout.vertex.validate(layout.vertex.stride)?;

        let handle = self.allocate(Kind::Program, label)?;
        let mut rec = self.rec.borrow_mut();
        let stages_ok = rec.compiled.get(&vs) == Some(&true) && rec.compiled.get(&fs) == Some(&true);
        let (linked, log) = match self.fail_link.borrow_mut().take() {
            Some(log) => (false, log),
            None if stages_ok => (true, String::new()),
            None => (false, "error: attached stage failed to compile".to_string()),
        };
        rec.calls.push(Call::LinkProgram(handle.get()));
        Ok(LinkReport { handle, linked, log })
    }

    fn bind_vertex_array(&self, vertex_array: Option<&RawHandle>) -> Result<(), DeviceFailure> {
        let mut rec = self.rec.borrow_mut();
        let id = vertex_array
            .map(|h| rec.lookup(h, Kind::VertexArray, "vertex array"))
            .transpose()?;
        rec.bound_vertex_array = id;
        rec.calls.push(Call::BindVertexArray(id));
        Ok(())
    }

    fn use_program(&self, program: Option<&RawHandle>) -> Result<(), DeviceFailure> {
        let mut rec = self.rec.borrow_mut();
        let id = program.map(|h| rec.lookup(h, Kind::Program, "program")).transpose()?;
        rec.bound_program = id;
        rec.calls.push(Call::UseProgram(id));
        Ok(())
    }

    fn draw_strip(&self, first: u32, count: u32) -> Result<(), DeviceFailure> {
        assert!(self.in_frame.get(), "draw outside of a frame");
        let mut rec = self.rec.borrow_mut();
        if rec.bound_vertex_array.is_none() {
            return Err(DeviceFailure::IncompleteBinding("vertex array"));
        }
        let uniforms = rec.uniform_slots.get(&0).and_then(|id| rec.buffers.get(id)).cloned();
        let program = rec.bound_program;
        rec.draws.push(Draw {
            program,
            count,
            uniforms,
        });
        rec.calls.push(Call::DrawStrip { first, count });
        Ok(())
    }

    fn set_viewport(&self, size: PixelSize) -> Result<(), DeviceFailure> {
        let mut rec = self.rec.borrow_mut();
        rec.viewport = Some(size);
        rec.calls.push(Call::SetViewport(size));
        Ok(())
    }

    fn clear(&self, _color: ColorRgba) -> Result<(), DeviceFailure> {
        self.in_frame.set(true);
        let mut rec = self.rec.borrow_mut();
        rec.clears += 1;
        rec.calls.push(Call::Clear);
        Ok(())
    }

    fn present(&self) -> Result<(), DeviceFailure> {
        self.in_frame.set(false);
        let mut rec = self.rec.borrow_mut();
        rec.presents += 1;
        rec.calls.push(Call::Present);
        Ok(())
    }

    fn delete_vertex_array(&self, vertex_array: RawHandle) {
        let mut rec = self.rec.borrow_mut();
        let id = rec.release(vertex_array, Kind::VertexArray);
        rec.calls.push(Call::DeleteVertexArray(id));
    }

    fn delete_buffer(&self, buffer: RawHandle) {
        let mut rec = self.rec.borrow_mut();
        let id = rec.release(buffer, Kind::Buffer);
        rec.calls.push(Call::DeleteBuffer(id));
    }

    fn delete_shader_stage(&self, stage: RawHandle) {
        let mut rec = self.rec.borrow_mut();
        let id = rec.release(stage, Kind::Stage);
        rec.compiled.remove(&id);
        rec.calls.push(Call::DeleteShaderStage(id));
    }

    fn delete_program(&self, program: RawHandle) {
        let mut rec = self.rec.borrow_mut();
        let id = rec.release(program, Kind::Program);
        rec.calls.push(Call::DeleteProgram(id));
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            api: "Recording".to_string(),
            adapter: "test adapter".to_string(),
            max_vertex_attributes: 16,
            ..DeviceInfo::default()
        }
    }
}

/// What the platform reports for one `pump_events` call.
#[derive(Debug, Clone, Default)]
pub struct Pump {
    pub events: Vec<PlatformEvent>,
    pub held: Vec<Key>,
    pub mouse: Option<(i32, i32)>,
}

impl Pump {
    pub fn events(events: impl IntoIterator<Item = PlatformEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn holding(mut self, key: Key) -> Self {
        self.held.push(key);
        self
    }

    pub fn mouse(mut self, x: i32, y: i32) -> Self {
        self.mouse = Some((x, y));
        self
    }
}

/// A `Platform` that replays one `Pump` per tick and sends `Quit` once the
/// script runs out. Time only moves on `wait`.
#[derive(Debug)]
pub struct ScriptedPlatform {
    script: VecDeque<Pump>,
    queue: VecDeque<PlatformEvent>,
    held: Vec<Key>,
    mouse: (i32, i32),
    size: PixelSize,
    now: Duration,
    pub pumps: usize,
    pub waited: Vec<Duration>,
    pub pre_presents: Rc<Cell<usize>>,
}

impl ScriptedPlatform {
    pub fn new(size: PixelSize, script: impl IntoIterator<Item = Pump>) -> Self {
        Self {
            script: script.into_iter().collect(),
            queue: VecDeque::new(),
            held: Vec::new(),
            mouse: (0, 0),
            size,
            now: Duration::ZERO,
            pumps: 0,
            waited: Vec::new(),
            pre_presents: Rc::new(Cell::new(0)),
        }
    }
}

impl Platform for ScriptedPlatform {
    fn pump_events(&mut self) {
        self.pumps += 1;
        match self.script.pop_front() {
            Some(pump) => {
                for event in &pump.events {
                    if let PlatformEvent::Resized(size) = event {
                        self.size = *size;
                    }
                }
                self.queue.extend(pump.events);
                self.held = pump.held;
                if let Some(mouse) = pump.mouse {
                    self.mouse = mouse;
                }
            }
            None => self.queue.push_back(PlatformEvent::Quit),
        }
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.queue.pop_front()
    }

    fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn mouse_position(&self) -> (i32, i32) {
        self.mouse
    }

    fn window_size(&self) -> PixelSize {
        self.size
    }

    fn ticks(&self) -> Duration {
        self.now
    }

    fn wait(&mut self, duration: Duration) {
        self.waited.push(duration);
        self.now += duration;
    }

    fn pre_present(&self) {
        self.pre_presents.set(self.pre_presents.get() + 1);
    }
}

/// In-memory shader files. Clones share the same table, so a test can edit
/// sources after handing a clone to the loop.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    files: Rc<RefCell<HashMap<PathBuf, String>>>,
}

impl MemorySources {
    pub fn set(&self, path: impl Into<PathBuf>, text: &str) {
        self.files.borrow_mut().insert(path.into(), text.to_string());
    }
}

impl SourceReader for MemorySources {
    fn read_text_file(&self, path: &Path) -> io::Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())))
    }
}
