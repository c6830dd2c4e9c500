//! Materials
//!
//! A material names the shader a drawable is rendered with, where that shader
//! expects its vertex attributes and matrix uniforms, and which textures it
//! samples.

use crate::assets::shader::ShaderId;
use crate::render::backend::{GraphicsBackend, TextureHandle};

/// Vertex attribute slots consumed by a shader (`None` = unused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeLocations {
    /// Position slot
    pub position: Option<u32>,
    /// Normal slot
    pub normal: Option<u32>,
    /// Colour slot
    pub colour: Option<u32>,
    /// Texture coordinate slot
    pub tex_coord: Option<u32>,
}

/// Matrix uniform locations consumed by a shader (`None` = unused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniformLocations {
    /// Per-instance world (model) matrix
    pub model: Option<u32>,
    /// Camera view matrix
    pub view: Option<u32>,
    /// Camera projection matrix
    pub projection: Option<u32>,
}

/// A texture bound to a texture unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    /// Texture unit
    pub unit: u32,
    /// Uploaded texture
    pub texture: TextureHandle,
}

/// Shader plus binding layout for a drawable
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    shader: ShaderId,
    attributes: AttributeLocations,
    uniforms: UniformLocations,
    textures: Vec<TextureBinding>,
}

impl Material {
    /// Create a material with no attributes, uniforms or textures
    pub fn new(name: impl Into<String>, shader: ShaderId) -> Self {
        Self {
            name: name.into(),
            shader,
            attributes: AttributeLocations::default(),
            uniforms: UniformLocations::default(),
            textures: Vec::new(),
        }
    }

    /// Set vertex attribute slots
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeLocations) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set matrix uniform locations
    #[must_use]
    pub fn with_uniforms(mut self, uniforms: UniformLocations) -> Self {
        self.uniforms = uniforms;
        self
    }

    /// Bind a texture to `unit`, replacing any texture already on that unit
    #[must_use]
    pub fn with_texture(mut self, unit: u32, texture: TextureHandle) -> Self {
        self.textures.retain(|binding| binding.unit != unit);
        self.textures.push(TextureBinding { unit, texture });
        self
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shader used by this material
    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Vertex attribute slots
    pub fn attributes(&self) -> &AttributeLocations {
        &self.attributes
    }

    /// Matrix uniform locations
    pub fn uniforms(&self) -> &UniformLocations {
        &self.uniforms
    }

    /// Texture bindings
    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    /// Bind per-material state (textures) for the next draw
    pub fn bind(&self, backend: &mut dyn GraphicsBackend) {
        for binding in &self.textures {
            backend.bind_texture(binding.unit, binding.texture);
        }
    }
}
