use std::fmt;

use super::DeviceFailure;

/// Component type + count of one vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    /// Number of components the shader sees.
    pub const fn components(self) -> u32 {
        match self {
            Self::Float32 => 1,
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 => 4,
        }
    }

    /// Size in bytes inside a vertex record.
    pub const fn size(self) -> u64 {
        self.components() as u64 * 4
    }

    pub(crate) fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            Self::Float32 => wgpu::VertexFormat::Float32,
            Self::Float32x2 => wgpu::VertexFormat::Float32x2,
            Self::Float32x3 => wgpu::VertexFormat::Float32x3,
            Self::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// One attribute binding: shader location, byte offset in the record, format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub offset: u64,
    pub format: AttributeFormat,
}

/// Byte layout of a vertex record as declared to the device.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Checks the layout against a record of `record_size` bytes.
    ///
    /// Every attribute must fit inside the stride, locations must be unique, and
    /// the stride must equal the record size so consecutive vertices line up.
    pub fn validate(&self, record_size: u64) -> Result<(), DeviceFailure> {
        if self.stride != record_size {
            return Err(DeviceFailure::InvalidLayout(format!(
                "stride {} does not match vertex size {record_size}",
                self.stride
            )));
        }
        if self.attributes.is_empty() {
            return Err(DeviceFailure::InvalidLayout("no attributes declared".to_string()));
        }

        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.offset + attr.format.size() > self.stride {
                return Err(DeviceFailure::InvalidLayout(format!(
                    "attribute at location {} ({:?} at offset {}) overruns stride {}",
                    attr.location, attr.format, attr.offset, self.stride
                )));
            }
            if self.attributes[..i].iter().any(|a| a.location == attr.location) {
                return Err(DeviceFailure::InvalidLayout(format!(
                    "location {} declared twice",
                    attr.location
                )));
            }
        }

        Ok(())
    }
}

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point the backend looks up in the stage's module.
    pub const fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// What a program consumes: its vertex input and its single uniform block.
///
/// Backends that bake input state into the program object (wgpu pipelines) need
/// this at link time; others may ignore it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ProgramLayout {
    pub vertex: VertexLayout,
    pub uniform_binding: u32,
    pub uniform_size: u64,
}
