//! Asset management
//!
//! GPU-backed resources (meshes, shader programs, textures), the materials
//! that combine them, and the [`ResourceManager`] that owns them.

pub mod material;
pub mod mesh;
pub mod resource_manager;
pub mod shader;
pub mod texture;

pub use material::{AttributeLocations, Material, TextureBinding, UniformLocations};
pub use mesh::{GpuMesh, Mesh, MeshCacheOption, MeshError, MeshId, Vertex};
pub use resource_manager::{DrawConfigKey, ResourceError, ResourceKind, ResourceManager};
pub use shader::{Shader, ShaderError, ShaderId, ShaderSource};
pub use texture::{
    Texture, TextureCacheOption, TextureDimensions, TextureError, TextureFilter, TextureId, TextureOptions, TextureWrap,
};
