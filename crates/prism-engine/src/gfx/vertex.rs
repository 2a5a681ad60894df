use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::device::{AttributeFormat, VertexAttribute, VertexLayout};

/// Shader location of the position attribute.
pub const POSITION_LOCATION: u32 = 0;
/// Shader location of the color attribute.
pub const COLOR_LOCATION: u32 = 1;

/// A vertex record that can be uploaded verbatim.
///
/// `layout()` is the contract between the record's memory layout and what the
/// device is told about it. [`GeometryBuffer::new`](super::GeometryBuffer::new)
/// validates it once against `size_of::<Self>()`.
pub trait Vertex: Pod {
    fn layout() -> VertexLayout;
}

/// Position-only vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Self>() as u64,
            attributes: vec![VertexAttribute {
                location: POSITION_LOCATION,
                offset: offset_of!(Self, position) as u64,
                format: AttributeFormat::Float32x3,
            }],
        }
    }
}

/// Position + RGBA color vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

impl Vertex for ColorVertex {
    fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Self>() as u64,
            attributes: vec![
                VertexAttribute {
                    location: POSITION_LOCATION,
                    offset: offset_of!(Self, position) as u64,
                    format: AttributeFormat::Float32x3,
                },
                VertexAttribute {
                    location: COLOR_LOCATION,
                    offset: offset_of!(Self, color) as u64,
                    format: AttributeFormat::Float32x4,
                },
            ],
        }
    }
}
