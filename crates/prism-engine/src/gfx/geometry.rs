use std::mem::size_of;
use std::rc::Rc;

use crate::device::{DeviceFailure, GraphicsDevice, RawHandle, VertexLayout};

use super::Vertex;

/// Static vertex geometry: one vertex array plus the buffer that feeds it.
///
/// The vertex sequence is uploaded once, verbatim, as immutable device memory.
/// Dropping the value releases the buffer and then the array, exactly once.
/// Not `Clone`: device objects have no copy semantics.
pub struct GeometryBuffer {
    device: Rc<dyn GraphicsDevice>,
    vertex_array: Option<RawHandle>,
    vertex_buffer: Option<RawHandle>,
    vertex_count: u32,
    layout: VertexLayout,
    label: String,
}

impl GeometryBuffer {
    /// Uploads `vertices` and declares `V`'s attribute layout on a new vertex array.
    ///
    /// The buffer is labelled `"{label}.VBO"`. A layout that disagrees with
    /// `size_of::<V>()` is rejected here and never checked again.
    pub fn new<V: Vertex>(
        device: Rc<dyn GraphicsDevice>,
        vertices: &[V],
        label: &str,
    ) -> Result<Self, DeviceFailure> {
        let layout = V::layout();
        layout.validate(size_of::<V>() as u64)?;

        let vertex_count = u32::try_from(vertices.len())
            .map_err(|_| DeviceFailure::InvalidLayout(format!("{} vertices exceed u32", vertices.len())))?;

        let vertex_array = device.create_vertex_array(label)?;
        let buffer_label = format!("{label}.VBO");

        let vertex_buffer = match device.create_vertex_buffer(
            &vertex_array,
            &buffer_label,
            bytemuck::cast_slice(vertices),
            &layout,
        ) {
            Ok(buffer) => buffer,
            Err(err) => {
                device.delete_vertex_array(vertex_array);
                return Err(err);
            }
        };

        log::debug!("geometry '{label}': {vertex_count} vertices, stride {}", layout.stride);

        Ok(Self {
            device,
            vertex_array: Some(vertex_array),
            vertex_buffer: Some(vertex_buffer),
            vertex_count,
            layout,
            label: label.to_string(),
        })
    }

    /// Binds the vertex array, draws every uploaded vertex as one triangle strip,
    /// then unbinds.
    pub fn draw(&self) -> Result<(), DeviceFailure> {
        let Some(vertex_array) = &self.vertex_array else {
            return Ok(());
        };

        self.device.bind_vertex_array(Some(vertex_array))?;
        let drawn = self.device.draw_strip(0, self.vertex_count);
        self.device.bind_vertex_array(None)?;
        drawn
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for GeometryBuffer {
    fn drop(&mut self) {
        // The array's binding still names the buffer; the buffer goes first.
        if let Some(buffer) = self.vertex_buffer.take() {
            self.device.delete_buffer(buffer);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            self.device.delete_vertex_array(vertex_array);
        }
        log::trace!("geometry '{}' released", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{ColorVertex, PositionVertex};
    use crate::testing::{Call, RecordingDevice, quad};

    fn geometry(dev: &Rc<RecordingDevice>, vertices: &[ColorVertex]) -> GeometryBuffer {
        GeometryBuffer::new(dev.clone(), vertices, "test::Quad").unwrap()
    }

    #[test]
    fn uploads_vertices_verbatim() {
        let dev = RecordingDevice::new();
        let verts = quad();
        let geo = geometry(&dev, &verts);

        let rec = dev.recorder();
        let vbo = rec.buffer_labelled("test::Quad.VBO").unwrap();
        assert_eq!(rec.buffers[&vbo], bytemuck::cast_slice::<ColorVertex, u8>(&verts));
        assert_eq!(geo.vertex_count(), 4);
    }

    #[test]
    fn draw_issues_one_strip_covering_every_vertex() {
        for n in [1usize, 3, 4, 7] {
            let dev = RecordingDevice::new();
            let verts: Vec<ColorVertex> = quad().into_iter().cycle().take(n).collect();
            let geo = geometry(&dev, &verts);

            dev.begin_test_frame();
            geo.draw().unwrap();

            let rec = dev.recorder();
            let strips: Vec<_> = rec.calls.iter().filter(|c| matches!(c, Call::DrawStrip { .. })).collect();
            assert_eq!(strips.len(), 1);
            assert_eq!(*strips[0], Call::DrawStrip { first: 0, count: n as u32 });
        }
    }

    #[test]
    fn draw_binds_then_unbinds() {
        let dev = RecordingDevice::new();
        let geo = geometry(&dev, &quad());
        dev.begin_test_frame();
        geo.draw().unwrap();

        let rec = dev.recorder();
        let tail: Vec<_> = rec.calls.iter().rev().take(3).rev().cloned().collect();
        assert!(matches!(tail[0], Call::BindVertexArray(Some(_))));
        assert!(matches!(tail[1], Call::DrawStrip { .. }));
        assert_eq!(tail[2], Call::BindVertexArray(None));
        assert_eq!(rec.bound_vertex_array, None);
    }

    #[test]
    fn drop_releases_buffer_then_array_once() {
        let dev = RecordingDevice::new();
        let geo = geometry(&dev, &quad());
        drop(geo);

        let rec = dev.recorder();
        let deletes: Vec<_> = rec
            .calls
            .iter()
            .filter(|c| matches!(c, Call::DeleteBuffer(_) | Call::DeleteVertexArray(_)))
            .cloned()
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(matches!(deletes[0], Call::DeleteBuffer(_)));
        assert!(matches!(deletes[1], Call::DeleteVertexArray(_)));
        assert!(rec.live.is_empty());
    }

    #[test]
    fn moved_geometry_releases_once() {
        let dev = RecordingDevice::new();
        let geo = geometry(&dev, &quad());
        let moved = vec![geo];
        drop(moved);
        assert_eq!(dev.recorder().delete_count(), 2);
    }

    #[test]
    fn position_only_layout_declares_one_attribute() {
        let dev = RecordingDevice::new();
        let verts = [PositionVertex { position: [0.0, 1.0, 0.5] }; 3];
        let geo = GeometryBuffer::new(dev.clone(), &verts, "test::Tri").unwrap();
        assert_eq!(geo.layout().attributes.len(), 1);
        assert_eq!(geo.layout().stride, 12);
    }

    #[test]
    fn failed_buffer_upload_releases_the_array() {
        let dev = RecordingDevice::new();
        dev.fail_next_buffer();
        let err = GeometryBuffer::new(dev.clone(), &quad(), "test::Quad");
        assert!(err.is_err());
        assert!(dev.recorder().live.is_empty());
    }
}
