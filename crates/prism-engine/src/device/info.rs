/// Driver identification and the limits relevant to this renderer.
///
/// Produced on demand by [`GraphicsDevice::info`](super::GraphicsDevice::info)
/// and dumped by the diagnostics key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub api: String,
    pub adapter: String,
    pub vendor: String,
    pub driver: String,
    pub shading_language: String,
    pub max_vertex_attributes: u32,
    pub max_uniform_buffers_per_stage: u32,
    pub max_uniform_block_size: u64,
    pub max_texture_size: u32,
    pub max_bind_groups: u32,
}

impl DeviceInfo {
    /// Human-readable `(label, value)` rows in dump order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("API", self.api.clone()),
            ("Adapter", self.adapter.clone()),
            ("Vendor", self.vendor.clone()),
            ("Driver", self.driver.clone()),
            ("Shading language", self.shading_language.clone()),
            ("Max vertex attributes", self.max_vertex_attributes.to_string()),
            ("Max uniform buffers per stage", self.max_uniform_buffers_per_stage.to_string()),
            ("Max uniform block size", self.max_uniform_block_size.to_string()),
            ("Max texture size", self.max_texture_size.to_string()),
            ("Max bind groups", self.max_bind_groups.to_string()),
        ]
    }
}
