use std::collections::HashMap;

/// Emulated global binding state: current vertex array, current program, and
/// the buffer attached to each uniform slot. Holds raw ids only.
#[derive(Debug, Default)]
pub(crate) struct BindingSlots {
    vertex_array: Option<u32>,
    program: Option<u32>,
    uniforms: HashMap<u32, u32>,
}

impl BindingSlots {
    pub fn vertex_array(&self) -> Option<u32> {
        self.vertex_array
    }

    pub fn program(&self) -> Option<u32> {
        self.program
    }

    pub fn uniform(&self, binding: u32) -> Option<u32> {
        self.uniforms.get(&binding).copied()
    }

    pub fn set_vertex_array(&mut self, id: Option<u32>) {
        self.vertex_array = id;
    }

    pub fn set_program(&mut self, id: Option<u32>) {
        self.program = id;
    }

    pub fn bind_uniform(&mut self, binding: u32, buffer: u32) {
        self.uniforms.insert(binding, buffer);
    }

    /// Drops every slot that names `id`. Called when the object is deleted so a
    /// later draw cannot reach a dead object through a stale slot.
    pub fn forget(&mut self, id: u32) {
        if self.vertex_array == Some(id) {
            self.vertex_array = None;
        }
        if self.program == Some(id) {
            self.program = None;
        }
        self.uniforms.retain(|_, buffer| *buffer != id);
    }
}

/// One cached value keyed by the uniform buffer id it was built for.
#[derive(Debug)]
pub(crate) struct BindGroupCache<T> {
    entry: Option<(u32, T)>,
}

impl<T: Clone> BindGroupCache<T> {
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// The cached value, if it was built for `uniform_id`.
    pub fn get(&self, uniform_id: u32) -> Option<T> {
        self.entry
            .as_ref()
            .filter(|(id, _)| *id == uniform_id)
            .map(|(_, value)| value.clone())
    }

    /// Replaces whatever was cached.
    pub fn store(&mut self, uniform_id: u32, value: T) {
        self.entry = Some((uniform_id, value));
    }
}
