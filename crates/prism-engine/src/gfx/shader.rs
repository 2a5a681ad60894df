use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::device::{DeviceFailure, GraphicsDevice, ProgramLayout, RawHandle, ShaderStage, StageReport};
use crate::io::SourceReader;

/// Label given to every linked program.
pub const PROGRAM_LABEL: &str = "prism::ShaderProgram";

/// Paths of the vertex/fragment source pair. Re-read on every compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// `dir/vertex` and `dir/fragment`.
    pub fn in_dir(dir: impl AsRef<Path>, vertex: &str, fragment: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(vertex), dir.join(fragment))
    }
}

/// A shader pair that did not produce a usable program. Recoverable: fix the
/// source and compile again.
#[derive(Debug)]
pub enum ShaderCompilationError {
    /// A source file could not be read.
    Source { path: PathBuf, error: io::Error },
    /// A stage failed to compile; `log` is the compiler output.
    Stage { stage: ShaderStage, log: String },
    /// Both stages compiled but the program did not link.
    Link { log: String },
}

impl fmt::Display for ShaderCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { path, error } => write!(f, "cannot read {}: {error}", path.display()),
            Self::Stage { stage, log } => write!(f, "{stage} stage failed to compile: {log}"),
            Self::Link { log } => write!(f, "program failed to link: {log}"),
        }
    }
}

impl std::error::Error for ShaderCompilationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Either outcome of [`ShaderProgram::compile`] that is not a program.
///
/// Callers split on the variant: `Compilation` is recoverable, `Device` is not.
#[derive(Debug)]
pub enum ShaderError {
    Compilation(ShaderCompilationError),
    Device(DeviceFailure),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compilation(e) => write!(f, "shader compilation: {e}"),
            Self::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compilation(e) => Some(e),
            Self::Device(e) => Some(e),
        }
    }
}

impl From<ShaderCompilationError> for ShaderError {
    fn from(e: ShaderCompilationError) -> Self {
        Self::Compilation(e)
    }
}
impl From<DeviceFailure> for ShaderError {
    fn from(e: DeviceFailure) -> Self {
        Self::Device(e)
    }
}

/// A linked, drawable program.
///
/// Either a valid program exists or the value does not: a failed compile
/// returns an error and leaves no object behind. Dropping releases the program.
/// Hot reload is "drop the old one, compile a new one".
pub struct ShaderProgram {
    device: Rc<dyn GraphicsDevice>,
    program: Option<RawHandle>,
}

impl ShaderProgram {
    /// Reads both sources, compiles each stage, links.
    ///
    /// The two stage objects are deleted before returning on every path, and a
    /// program that failed to link is deleted before the error is returned.
    /// Nothing the caller already holds is touched.
    pub fn compile(
        device: &Rc<dyn GraphicsDevice>,
        reader: &dyn SourceReader,
        sources: &ShaderSources,
        layout: &ProgramLayout,
    ) -> Result<Self, ShaderError> {
        let vertex_src = read_source(reader, &sources.vertex)?;
        let fragment_src = read_source(reader, &sources.fragment)?;

        let vertex = device.create_shader_stage(ShaderStage::Vertex, "prism::Shader.vert", &vertex_src)?;
        let fragment = match device.create_shader_stage(
            ShaderStage::Fragment,
            "prism::Shader.frag",
            &fragment_src,
        ) {
            Ok(report) => report,
            Err(err) => {
                device.delete_shader_stage(vertex.handle);
                return Err(err.into());
            }
        };

        let linked = device.link_program(PROGRAM_LABEL, &vertex.handle, &fragment.handle, layout);

        let stage_failure = first_stage_failure(&vertex, &fragment);
        device.delete_shader_stage(vertex.handle);
        device.delete_shader_stage(fragment.handle);

        let report = linked?;
        if !report.log.trim().is_empty() {
            log::info!("program info:\n{}", report.log.trim_end());
        }

        if !report.linked {
            device.delete_program(report.handle);
            let err = stage_failure.unwrap_or(ShaderCompilationError::Link { log: report.log });
            return Err(err.into());
        }

        Ok(Self {
            device: Rc::clone(device),
            program: Some(report.handle),
        })
    }

    /// Makes this program current.
    pub fn bind(&self) -> Result<(), DeviceFailure> {
        match &self.program {
            Some(program) => self.device.use_program(Some(program)),
            None => Ok(()),
        }
    }

    /// Clears the program slot.
    pub fn unbind(&self) -> Result<(), DeviceFailure> {
        self.device.use_program(None)
    }

    /// Driver id of the program, for diagnostics.
    pub fn id(&self) -> Option<u32> {
        self.program.as_ref().map(RawHandle::get)
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.device.delete_program(program);
        }
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram").field("program", &self.program).finish()
    }
}

fn read_source(reader: &dyn SourceReader, path: &Path) -> Result<String, ShaderCompilationError> {
    reader
        .read_text_file(path)
        .map_err(|error| ShaderCompilationError::Source {
            path: path.to_path_buf(),
            error,
        })
}

fn first_stage_failure(vertex: &StageReport, fragment: &StageReport) -> Option<ShaderCompilationError> {
    [(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)]
        .into_iter()
        .find(|(_, report)| !report.compiled)
        .map(|(stage, report)| ShaderCompilationError::Stage {
            stage,
            log: report.log.clone(),
        })
}
