use std::mem::size_of;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::coords::PixelSize;
use crate::device::{DeviceFailure, GraphicsDevice, RawHandle};

/// Per-frame values shared with every shader stage.
///
/// Field order and widths are a wire contract with the shader's uniform block:
/// window size, mouse position (bottom-left origin), elapsed seconds, corrected
/// elapsed seconds. Reordering breaks rendering silently.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct UniformRecord {
    pub window_size: [i32; 2],
    pub mouse: [i32; 2],
    pub elapsed: f32,
    pub corrected_elapsed: f32,
    pub _pad: [f32; 2], // 16-byte block size
}

impl UniformRecord {
    /// Builds a record from window-space inputs.
    ///
    /// `mouse` is in window pixels with a top-left origin and is flipped so the
    /// shader sees y growing upwards, matching its fragment coordinates.
    pub fn new(size: PixelSize, mouse: (i32, i32), elapsed: f32, corrected_elapsed: f32) -> Self {
        let window_size = size.to_i32();
        Self {
            window_size,
            mouse: [mouse.0, window_size[1].saturating_sub(mouse.1)],
            elapsed,
            corrected_elapsed,
            _pad: [0.0; 2],
        }
    }
}

/// Byte size of the uniform block as allocated on the device.
pub const UNIFORM_BLOCK_SIZE: u64 = size_of::<UniformRecord>() as u64;

/// Device-side uniform buffer of fixed size attached to a fixed binding slot.
///
/// Writes replace the whole record. The frame loop only writes between draws on
/// its own thread, so a draw never observes a partially written record.
pub struct UniformBlock {
    device: Rc<dyn GraphicsDevice>,
    buffer: Option<RawHandle>,
    binding: u32,
}

impl UniformBlock {
    /// Allocates `UNIFORM_BLOCK_SIZE` bytes of write-only uniform memory for slot `binding`.
    pub fn new(device: Rc<dyn GraphicsDevice>, label: &str, binding: u32) -> Result<Self, DeviceFailure> {
        let buffer = device.create_uniform_buffer(label, UNIFORM_BLOCK_SIZE)?;
        let block = Self {
            device,
            buffer: Some(buffer),
            binding,
        };
        block.bind()?;
        Ok(block)
    }

    /// Attaches the buffer to its binding slot for subsequent draws.
    pub fn bind(&self) -> Result<(), DeviceFailure> {
        match &self.buffer {
            Some(buffer) => self.device.bind_uniform_buffer(self.binding, buffer),
            None => Ok(()),
        }
    }

    /// Writes all six fields in wire order.
    pub fn update(
        &self,
        size: PixelSize,
        mouse: (i32, i32),
        elapsed: f32,
        corrected_elapsed: f32,
    ) -> Result<(), DeviceFailure> {
        self.write(&UniformRecord::new(size, mouse, elapsed, corrected_elapsed))
    }

    /// Writes a prepared record.
    pub fn write(&self, record: &UniformRecord) -> Result<(), DeviceFailure> {
        match &self.buffer {
            Some(buffer) => self.device.write_uniform_buffer(buffer, bytemuck::bytes_of(record)),
            None => Ok(()),
        }
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }
}

impl Drop for UniformBlock {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.delete_buffer(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingDevice};

    #[test]
    fn record_is_sixteen_byte_aligned() {
        assert_eq!(UNIFORM_BLOCK_SIZE, 32);
        assert_eq!(UNIFORM_BLOCK_SIZE % 16, 0);
    }

    #[test]
    fn record_wire_order() {
        let rec = UniformRecord::new(PixelSize::new(800, 600), (10, 100), 1.5, 0.5);
        let bytes = bytemuck::bytes_of(&rec);

        let i32_at = |o: usize| i32::from_ne_bytes(bytes[o..o + 4].try_into().unwrap());
        let f32_at = |o: usize| f32::from_ne_bytes(bytes[o..o + 4].try_into().unwrap());

        assert_eq!(i32_at(0), 800);
        assert_eq!(i32_at(4), 600);
        assert_eq!(i32_at(8), 10);
        assert_eq!(i32_at(12), 500); // 600 - 100
        assert_eq!(f32_at(16), 1.5);
        assert_eq!(f32_at(20), 0.5);
    }

    #[test]
    fn new_binds_to_slot() {
        let dev = RecordingDevice::new();
        let block = UniformBlock::new(dev.clone(), "test::UBO", 3).unwrap();
        let rec = dev.recorder();
        assert_eq!(block.binding(), 3);
        assert!(rec.uniform_slots.contains_key(&3));
        assert_eq!(rec.buffers[&rec.uniform_slots[&3]].len(), 32);
    }

    #[test]
    fn update_replaces_whole_record() {
        let dev = RecordingDevice::new();
        let block = UniformBlock::new(dev.clone(), "test::UBO", 0).unwrap();
        block.update(PixelSize::new(1280, 720), (0, 0), 2.0, 1.0).unwrap();
        block.update(PixelSize::new(800, 600), (4, 600), 3.0, 2.0).unwrap();

        let rec = dev.recorder();
        let stored: UniformRecord = bytemuck::pod_read_unaligned(&rec.buffers[&rec.uniform_slots[&0]]);
        assert_eq!(stored, UniformRecord::new(PixelSize::new(800, 600), (4, 600), 3.0, 2.0));
        assert_eq!(stored.mouse, [4, 0]);
    }

    #[test]
    fn drop_releases_buffer_once() {
        let dev = RecordingDevice::new();
        let block = UniformBlock::new(dev.clone(), "test::UBO", 0).unwrap();
        drop(block);

        let rec = dev.recorder();
        assert_eq!(rec.calls.iter().filter(|c| matches!(c, Call::DeleteBuffer(_))).count(), 1);
        assert!(rec.live.is_empty());
    }
}
