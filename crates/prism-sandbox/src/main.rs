use std::rc::Rc;

use anyhow::{Context, Result};

use prism_engine::device::{Gpu, GpuInit, GraphicsDevice, WgpuDevice};
use prism_engine::error::StartupError;
use prism_engine::frame_loop::{FrameLoop, LoopConfig};
use prism_engine::gfx::ShaderSources;
use prism_engine::io::FsSourceReader;
use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::platform::{WindowConfig, WinitPlatform};

mod geometry;

/// The shader pair in this crate's `shaders/` directory.
///
/// The path is the crate directory at build time, so the binary is meant to be
/// started through `cargo run -p prism-sandbox` from a source checkout. Editing
/// the files there and pressing R reloads them.
fn shader_sources() -> ShaderSources {
    ShaderSources::in_dir(
        concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"),
        "first.vert.wgsl",
        "first.frag.wgsl",
    )
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let platform = WinitPlatform::new(WindowConfig::default())?;
    let gpu = pollster::block_on(Gpu::new(platform.window(), GpuInit::default())).map_err(StartupError::Gpu)?;
    let device: Rc<dyn GraphicsDevice> = Rc::new(WgpuDevice::new(gpu));
    log::info!("adapter: {}", device.info().adapter);

    let frame_loop = FrameLoop::new(
        platform,
        device,
        Box::new(FsSourceReader),
        LoopConfig::new(shader_sources()),
        &geometry::FULLSCREEN_QUAD,
    )
    .map_err(StartupError::Device)?;

    let summary = frame_loop.run().context("device failure")?;
    log::info!("exiting after {} ticks", summary.ticks);
    Ok(())
}
