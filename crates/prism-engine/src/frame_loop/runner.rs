use std::mem::size_of;
use std::rc::Rc;
use std::time::Duration;

use crate::coords::PixelSize;
use crate::device::{DeviceFailure, GraphicsDevice, ProgramLayout};
use crate::gfx::{GeometryBuffer, ShaderError, ShaderProgram, UNIFORM_BLOCK_SIZE, UniformBlock, Vertex};
use crate::io::SourceReader;
use crate::logging::{log_device_info, log_section};
use crate::platform::{Platform, PlatformEvent};
use crate::time::TickClock;

use super::{FrameState, LoopConfig, LoopPhase};

pub const GEOMETRY_LABEL: &str = "prism::Geometry";
pub const UNIFORM_LABEL: &str = "prism::UBO::FrameBlock";

/// What a finished run looked like.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub elapsed: Duration,
}

/// Single-threaded fixed-rate render loop.
///
/// Owns the program, the geometry and the uniform block. Every tick drains
/// input, advances time, clears, draws unless in skip-render, presents, then
/// waits out the rest of the interval.
///
/// A shader that fails to compile (at startup or on reload) puts the loop in
/// skip-render; it keeps ticking until a reload succeeds. Any `DeviceFailure`
/// ends the loop.
pub struct FrameLoop<P: Platform> {
    // Field order is drop order: program, geometry, uniform block.
    program: Option<ShaderProgram>,
    geometry: GeometryBuffer,
    uniforms: UniformBlock,
    program_layout: ProgramLayout,
    device: Rc<dyn GraphicsDevice>,
    reader: Box<dyn SourceReader>,
    platform: P,
    config: LoopConfig,
    clock: TickClock,
    state: FrameState,
    phase: LoopPhase,
}

impl<P: Platform> FrameLoop<P> {
    /// Creates the uniform block, compiles the shader pair, uploads `vertices`,
    /// then sets the viewport to the current window size.
    pub fn new<V: Vertex>(
        platform: P,
        device: Rc<dyn GraphicsDevice>,
        reader: Box<dyn SourceReader>,
        config: LoopConfig,
        vertices: &[V],
    ) -> Result<Self, DeviceFailure> {
        let uniforms = UniformBlock::new(Rc::clone(&device), UNIFORM_LABEL, config.uniform_binding)?;
        let geometry = GeometryBuffer::new(Rc::clone(&device), vertices, GEOMETRY_LABEL)?;
        let program_layout = ProgramLayout {
            vertex: V::layout(),
            uniform_binding: config.uniform_binding,
            uniform_size: UNIFORM_BLOCK_SIZE,
        };
        debug_assert_eq!(program_layout.vertex.stride, size_of::<V>() as u64);

        let window_size = platform.window_size();
        let mut frame_loop = Self {
            program: None,
            geometry,
            uniforms,
            program_layout,
            device,
            reader,
            clock: TickClock::new(config.tick_interval),
            state: FrameState::new(window_size),
            phase: LoopPhase::Initializing,
            platform,
            config,
        };

        frame_loop.compile_program()?;
        frame_loop.resize(window_size)?;
        Ok(frame_loop)
    }

    /// Ticks until a quit is requested, then releases every device object.
    pub fn run(mut self) -> Result<RunSummary, DeviceFailure> {
        self.phase = LoopPhase::Running;
        log::info!("frame loop running ({:?} per tick)", self.clock.interval());

        while !self.state.quit {
            self.tick()?;
        }

        self.phase = LoopPhase::ShuttingDown;
        let summary = RunSummary {
            ticks: self.clock.tick_index(),
            elapsed: self.state.elapsed,
        };
        log::info!("frame loop stopped after {} ticks", summary.ticks);
        Ok(summary)
    }

    /// One iteration. A tick always completes, even if it requested quit.
    pub fn tick(&mut self) -> Result<(), DeviceFailure> {
        self.clock.begin(self.platform.ticks());

        self.platform.pump_events();
        while let Some(event) = self.platform.poll_event() {
            self.handle_event(event)?;
        }

        let frozen = self.platform.is_held(self.config.bindings.freeze_time);
        self.state.advance(self.clock.interval(), frozen);

        self.device.clear(self.config.clear_color)?;
        if !self.state.skip_render {
            self.render()?;
        }
        self.platform.pre_present();
        self.device.present()?;

        if !self.state.quit {
            let wait = self.clock.remaining(self.platform.ticks());
            if !wait.is_zero() {
                self.platform.wait(wait);
            }
        }
        Ok(())
    }

    /// Drops the current program and compiles a fresh one from disk.
    ///
    /// On compile failure the loop is left with no program (skip-render).
    pub fn reload(&mut self) -> Result<(), DeviceFailure> {
        log::info!("reloading shaders");
        self.program = None;
        self.compile_program()
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn handle_event(&mut self, event: PlatformEvent) -> Result<(), DeviceFailure> {
        let bindings = self.config.bindings;
        match event {
            PlatformEvent::Quit => self.state.quit = true,
            PlatformEvent::Resized(size) => self.resize(size)?,
            PlatformEvent::KeyDown { repeat: true, .. } => {}
            PlatformEvent::KeyDown { key, .. } if key == bindings.quit => self.state.quit = true,
            PlatformEvent::KeyDown { key, .. } if key == bindings.reload_shaders => self.reload()?,
            PlatformEvent::KeyDown { key, .. } if key == bindings.dump_diagnostics => {
                log_device_info(&self.device.info())
            }
            PlatformEvent::KeyDown { .. } => {}
        }
        Ok(())
    }

    fn compile_program(&mut self) -> Result<(), DeviceFailure> {
        log_section("Shader Compilation Begin");
        let compiled = ShaderProgram::compile(
            &self.device,
            self.reader.as_ref(),
            &self.config.shaders,
            &self.program_layout,
        );

        let outcome = match compiled {
            Ok(program) => {
                log::info!("shader compiled successfully");
                self.program = Some(program);
                Ok(())
            }
            Err(ShaderError::Compilation(err)) => {
                log::warn!("{err}; rendering paused until the next reload");
                self.program = None;
                Ok(())
            }
            Err(ShaderError::Device(err)) => Err(err),
        };

        self.state.skip_render = self.program.is_none();
        log_section("Shader Compilation End");
        outcome
    }

    fn resize(&mut self, size: PixelSize) -> Result<(), DeviceFailure> {
        log::info!("window size {}x{}", size.width, size.height);
        self.state.window_size = size;
        self.device.set_viewport(size)?;
        if self.program.is_some() {
            self.push_uniforms()?;
        }
        Ok(())
    }

    fn push_uniforms(&self) -> Result<(), DeviceFailure> {
        self.uniforms.update(
            self.state.window_size,
            self.platform.mouse_position(),
            self.state.elapsed_secs(),
            self.state.corrected_secs(),
        )
    }

    fn render(&self) -> Result<(), DeviceFailure> {
        let Some(program) = &self.program else {
            return Ok(());
        };

        program.bind()?;
        self.push_uniforms()?;
        self.uniforms.bind()?;
        self.geometry.draw()?;
        program.unbind()
    }
}
