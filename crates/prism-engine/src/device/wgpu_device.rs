use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::coords::{ColorRgba, PixelSize};

use super::bindings::{BindGroupCache, BindingSlots};
use super::{
    DeviceFailure, DeviceInfo, Gpu, GpuFrame, GraphicsDevice, HandleAllocator, LinkReport,
    ProgramLayout, RawHandle, ShaderStage, StageReport, SurfaceErrorAction, VertexLayout,
};

/// [`GraphicsDevice`] implemented on wgpu.
///
/// wgpu has no global binding state and no immediate-mode draws, so this backend
/// keeps both itself:
/// - vertex arrays are layout records pointing at their vertex buffer
/// - programs are render pipelines built at link time
/// - binding slots live in `BindingSlots` and are snapshotted by `draw_strip`
/// - draws between `clear` and `present` are replayed into one render pass
///
/// Compile and link failures are caught with validation error scopes so they come
/// back as reports. Anything the driver raises outside a scope is latched by
/// [`Gpu`] and returned from the next `present`.
pub struct WgpuDevice {
    gpu: RefCell<Gpu>,
    ids: RefCell<HandleAllocator>,
    objects: RefCell<HashMap<u32, Object>>,
    bindings: RefCell<BindingSlots>,
    frame: RefCell<Option<PendingFrame>>,
    viewport: Cell<PixelSize>,
}

enum Object {
    VertexArray(VertexArrayObject),
    Buffer(BufferObject),
    Stage(StageObject),
    Program(ProgramObject),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Self::VertexArray(_) => "vertex array",
            Self::Buffer(_) => "buffer",
            Self::Stage(_) => "shader stage",
            Self::Program(_) => "program",
        }
    }
}

struct VertexArrayObject {
    source: Option<wgpu::Buffer>,
    layout: Option<VertexLayout>,
}

struct BufferObject {
    buffer: wgpu::Buffer,
    uniform: bool,
}

struct StageObject {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    compiled: bool,
}

struct ProgramObject {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_binding: u32,
    /// Bind group for the last uniform buffer drawn with.
    bind_group: BindGroupCache<wgpu::BindGroup>,
}

struct PendingFrame {
    /// `None` when the surface could not provide a texture this frame.
    target: Option<GpuFrame>,
    clear: ColorRgba,
    draws: Vec<DrawOp>,
}

struct DrawOp {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertices: Range<u32>,
}

impl WgpuDevice {
    pub fn new(gpu: Gpu) -> Self {
        let viewport = gpu.size();
        Self {
            gpu: RefCell::new(gpu),
            ids: RefCell::new(HandleAllocator::new()),
            objects: RefCell::new(HashMap::new()),
            bindings: RefCell::new(BindingSlots::default()),
            frame: RefCell::new(None),
            viewport: Cell::new(viewport),
        }
    }

    fn insert(&self, object: Object) -> Result<RawHandle, DeviceFailure> {
        let handle = self
            .ids
            .borrow_mut()
            .allocate()
            .ok_or(DeviceFailure::HandlesExhausted)?;
        self.objects.borrow_mut().insert(handle.get(), object);
        Ok(handle)
    }

    fn remove(&self, handle: RawHandle, kind: &'static str) {
        let id = handle.get();
        let mut objects = self.objects.borrow_mut();
        match objects.get(&id) {
            Some(obj) if obj.kind() == kind => {
                objects.remove(&id);
            }
            Some(obj) => {
                log::warn!("delete of {kind} #{id} names a {}; ignored", obj.kind());
                return;
            }
            None => {
                log::warn!("delete of unknown {kind} #{id}; ignored");
                return;
            }
        }
        drop(objects);

        self.bindings.borrow_mut().forget(id);
    }

    fn scoped<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<String>) {
        capture_validation(self.gpu.borrow().device(), f)
    }

    fn build_pipeline(
        &self,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        layout: &ProgramLayout,
    ) -> (wgpu::BindGroupLayout, wgpu::RenderPipeline, Option<String>) {
        let surface_format = self.gpu.borrow().surface_format();

        let attributes: Vec<wgpu::VertexAttribute> = layout
            .vertex
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format.to_wgpu(),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let ((bgl, pipeline), error) = self.scoped(|device| {
            let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("prism uniform bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: layout.uniform_binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(layout.uniform_size),
                    },
                    count: None,
                }],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("prism pipeline layout"),
                bind_group_layouts: &[&bgl],
                immediate_size: 0,
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: layout.vertex.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(ShaderStage::Fragment.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            (bgl, pipeline)
        });

        (bgl, pipeline, error)
    }

    fn encode(&self, mut target: GpuFrame, clear: ColorRgba, draws: &[DrawOp]) {
        let gpu = self.gpu.borrow();
        let size = gpu.size();
        let [r, g, b, a] = clear.to_f64();

        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);

            for op in draws {
                // Empty slices are rejected by wgpu; a zero-vertex draw has nothing to do.
                if op.vertices.is_empty() {
                    continue;
                }
                rpass.set_pipeline(&op.pipeline);
                rpass.set_bind_group(0, &op.bind_group, &[]);
                rpass.set_vertex_buffer(0, op.vertex_buffer.slice(..));
                rpass.draw(op.vertices.clone(), 0..1);
            }
        }

        gpu.submit(target);
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_vertex_array(&self, label: &str) -> Result<RawHandle, DeviceFailure> {
        let handle = self.insert(Object::VertexArray(VertexArrayObject {
            source: None,
            layout: None,
        }))?;
        log::trace!("vertex array {handle:?} '{label}'");
        Ok(handle)
    }

    fn create_vertex_buffer(
        &self,
        vertex_array: &RawHandle,
        label: &str,
        contents: &[u8],
        layout: &VertexLayout,
    ) -> Result<RawHandle, DeviceFailure> {
        let buffer = self
            .gpu
            .borrow()
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });

        {
            let mut objects = self.objects.borrow_mut();
            let Some(Object::VertexArray(vao)) = objects.get_mut(&vertex_array.get()) else {
                return Err(DeviceFailure::UnknownHandle {
                    kind: "vertex array",
                    id: vertex_array.get(),
                });
            };
            vao.source = Some(buffer.clone());
            vao.layout = Some(layout.clone());
        }

        self.insert(Object::Buffer(BufferObject {
            buffer,
            uniform: false,
        }))
    }

    fn create_uniform_buffer(&self, label: &str, size: u64) -> Result<RawHandle, DeviceFailure> {
        let buffer = self
            .gpu
            .borrow()
            .device()
            .create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

        self.insert(Object::Buffer(BufferObject {
            buffer,
            uniform: true,
        }))
    }

    fn write_uniform_buffer(&self, buffer: &RawHandle, bytes: &[u8]) -> Result<(), DeviceFailure> {
        let objects = self.objects.borrow();
        let Some(Object::Buffer(obj @ BufferObject { uniform: true, .. })) = objects.get(&buffer.get())
        else {
            return Err(DeviceFailure::UnknownHandle {
                kind: "uniform buffer",
                id: buffer.get(),
            });
        };

        if obj.buffer.size() != bytes.len() as u64 {
            return Err(DeviceFailure::Uncaptured(format!(
                "uniform write of {} bytes into a {}-byte buffer",
                bytes.len(),
                obj.buffer.size()
            )));
        }

        self.gpu.borrow().queue().write_buffer(&obj.buffer, 0, bytes);
        Ok(())
    }

    fn bind_uniform_buffer(&self, binding: u32, buffer: &RawHandle) -> Result<(), DeviceFailure> {
        let is_uniform = matches!(
            self.objects.borrow().get(&buffer.get()),
            Some(Object::Buffer(BufferObject { uniform: true, .. }))
        );
        if !is_uniform {
            return Err(DeviceFailure::UnknownHandle {
                kind: "uniform buffer",
                id: buffer.get(),
            });
        }

        self.bindings.borrow_mut().bind_uniform(binding, buffer.get());
        Ok(())
    }

    fn create_shader_stage(
        &self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<StageReport, DeviceFailure> {
        let (module, error) = compile_module(self.gpu.borrow().device(), label, source);

        let compiled = error.is_none();
        let handle = self.insert(Object::Stage(StageObject {
            stage,
            module,
            compiled,
        }))?;

        Ok(StageReport {
            handle,
            compiled,
            log: error.unwrap_or_default(),
        })
    }

    fn link_program(
        &self,
        label: &str,
        vertex: &RawHandle,
        fragment: &RawHandle,
        layout: &ProgramLayout,
    ) -> Result<LinkReport, DeviceFailure> {
        let lookup = |handle: &RawHandle, want: ShaderStage| -> Result<(wgpu::ShaderModule, bool), String> {
            match self.objects.borrow().get(&handle.get()) {
                Some(Object::Stage(s)) if s.stage == want => Ok((s.module.clone(), s.compiled)),
                Some(Object::Stage(s)) => Err(format!("{handle:?} is a {} stage, expected {want}", s.stage)),
                _ => Err(format!("{handle:?} is not a shader stage")),
            }
        };

        let stages = lookup(vertex, ShaderStage::Vertex)
            .and_then(|v| lookup(fragment, ShaderStage::Fragment).map(|f| (v, f)));

        let (program, log) = match stages {
            Ok(((vs, true), (fs, true))) => {
                let (bgl, pipeline, error) = self.build_pipeline(label, &vs, &fs, layout);
                let linked = error.is_none();
                let program = ProgramObject {
                    pipeline: linked.then_some(pipeline),
                    bind_group_layout: Some(bgl),
                    uniform_binding: layout.uniform_binding,
                    bind_group: BindGroupCache::new(),
                };
                (program, error.unwrap_or_default())
            }
            Ok(((_, vs_ok), _)) => {
                let failed = if vs_ok { ShaderStage::Fragment } else { ShaderStage::Vertex };
                (
                    ProgramObject {
                        pipeline: None,
                        bind_group_layout: None,
                        uniform_binding: layout.uniform_binding,
                        bind_group: BindGroupCache::new(),
                    },
                    format!("{failed} stage was not compiled"),
                )
            }
            Err(msg) => (
                ProgramObject {
                    pipeline: None,
                    bind_group_layout: None,
                    uniform_binding: layout.uniform_binding,
                    bind_group: BindGroupCache::new(),
                },
                msg,
            ),
        };

        let linked = program.pipeline.is_some();
        let handle = self.insert(Object::Program(program))?;
        Ok(LinkReport { handle, linked, log })
    }

    fn bind_vertex_array(&self, vertex_array: Option<&RawHandle>) -> Result<(), DeviceFailure> {
        let id = match vertex_array {
            Some(h) => {
                if !matches!(self.objects.borrow().get(&h.get()), Some(Object::VertexArray(_))) {
                    return Err(DeviceFailure::UnknownHandle {
                        kind: "vertex array",
                        id: h.get(),
                    });
                }
                Some(h.get())
            }
            None => None,
        };
        self.bindings.borrow_mut().set_vertex_array(id);
        Ok(())
    }

    fn use_program(&self, program: Option<&RawHandle>) -> Result<(), DeviceFailure> {
        let id = match program {
            Some(h) => {
                let linked = matches!(
                    self.objects.borrow().get(&h.get()),
                    Some(Object::Program(ProgramObject { pipeline: Some(_), .. }))
                );
                if !linked {
                    return Err(DeviceFailure::UnknownHandle {
                        kind: "linked program",
                        id: h.get(),
                    });
                }
                Some(h.get())
            }
            None => None,
        };
        self.bindings.borrow_mut().set_program(id);
        Ok(())
    }

    fn draw_strip(&self, first: u32, count: u32) -> Result<(), DeviceFailure> {
        let bindings = self.bindings.borrow();
        let program_id = bindings.program().ok_or(DeviceFailure::IncompleteBinding("program"))?;
        let vao_id = bindings
            .vertex_array()
            .ok_or(DeviceFailure::IncompleteBinding("vertex array"))?;

        let mut objects = self.objects.borrow_mut();

        let vertex_buffer = match objects.get(&vao_id) {
            Some(Object::VertexArray(VertexArrayObject { source: Some(buf), .. })) => buf.clone(),
            _ => return Err(DeviceFailure::IncompleteBinding("vertex buffer")),
        };

        let uniform_binding = match objects.get(&program_id) {
            Some(Object::Program(p)) => p.uniform_binding,
            _ => return Err(DeviceFailure::IncompleteBinding("program")),
        };
        let uniform_id = bindings
            .uniform(uniform_binding)
            .ok_or(DeviceFailure::IncompleteBinding("uniform buffer"))?;
        let uniform_buffer = match objects.get(&uniform_id) {
            Some(Object::Buffer(b)) => b.buffer.clone(),
            _ => return Err(DeviceFailure::IncompleteBinding("uniform buffer")),
        };

        let Some(Object::Program(program)) = objects.get_mut(&program_id) else {
            return Err(DeviceFailure::IncompleteBinding("program"));
        };
        let (Some(pipeline), Some(bgl)) = (program.pipeline.clone(), program.bind_group_layout.as_ref()) else {
            return Err(DeviceFailure::IncompleteBinding("linked program"));
        };

        let bind_group = match program.bind_group.get(uniform_id) {
            Some(group) => group,
            None => {
                let group = self
                    .gpu
                    .borrow()
                    .device()
                    .create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("prism uniform bind group"),
                        layout: bgl,
                        entries: &[wgpu::BindGroupEntry {
                            binding: uniform_binding,
                            resource: uniform_buffer.as_entire_binding(),
                        }],
                    });
                program.bind_group.store(uniform_id, group.clone());
                group
            }
        };

        let mut frame = self.frame.borrow_mut();
        let pending = frame.as_mut().ok_or(DeviceFailure::IncompleteBinding("frame"))?;
        pending.draws.push(DrawOp {
            pipeline,
            bind_group,
            vertex_buffer,
            vertices: first..first.saturating_add(count),
        });
        Ok(())
    }

    fn set_viewport(&self, size: PixelSize) -> Result<(), DeviceFailure> {
        self.gpu.borrow_mut().resize(size);
        self.viewport.set(size);
        Ok(())
    }

    fn clear(&self, color: ColorRgba) -> Result<(), DeviceFailure> {
        let mut frame = self.frame.borrow_mut();
        if let Some(pending) = frame.as_mut() {
            pending.clear = color;
            pending.draws.clear();
            return Ok(());
        }

        let target = if self.viewport.get().is_empty() {
            None
        } else {
            let acquired = self.gpu.borrow().begin_frame();
            match acquired {
                Ok(target) => Some(target),
                Err(err) => {
                    let msg = err.to_string();
                    match self.gpu.borrow_mut().handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => return Err(DeviceFailure::SurfaceLost(msg)),
                        action => {
                            log::debug!("skipping frame: {msg} ({action:?})");
                            None
                        }
                    }
                }
            }
        };

        *frame = Some(PendingFrame {
            target,
            clear: color,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn present(&self) -> Result<(), DeviceFailure> {
        let pending = self.frame.borrow_mut().take();
        if let Some(PendingFrame {
            target: Some(target),
            clear,
            draws,
        }) = pending
        {
            self.encode(target, clear, &draws);
        }

        match self.gpu.borrow().take_failure() {
            Some(msg) => Err(DeviceFailure::Uncaptured(msg)),
            None => Ok(()),
        }
    }

    fn delete_vertex_array(&self, vertex_array: RawHandle) {
        self.remove(vertex_array, "vertex array");
    }

    fn delete_buffer(&self, buffer: RawHandle) {
        self.remove(buffer, "buffer");
    }

    fn delete_shader_stage(&self, stage: RawHandle) {
        self.remove(stage, "shader stage");
    }

    fn delete_program(&self, program: RawHandle) {
        self.remove(program, "program");
    }

    fn info(&self) -> DeviceInfo {
        self.gpu.borrow().info()
    }
}

/// Runs `f` inside a validation error scope and returns the captured error text.
fn capture_validation<T>(device: &wgpu::Device, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<String>) {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f(device);
    let error = pollster::block_on(scope.pop()).map(|e| e.to_string());
    (value, error)
}

/// Parses and validates one WGSL module. The error text is the compiler log.
fn compile_module(device: &wgpu::Device, label: &str, source: &str) -> (wgpu::ShaderModule, Option<String>) {
    capture_validation(device, |device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}
