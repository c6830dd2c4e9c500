//! Resource Manager - GPU-backed resource ownership and draw-configuration reuse
//!
//! The [`ResourceManager`] owns every mesh, shader and texture of an engine
//! instance. Each resource gets a numeric id, assigned in increasing order and
//! never reused, and may carry a lexical name for lookup. Lexical names are
//! unique per resource type; an empty name means the resource is unnamed.
//!
//! **Draw-configuration cache**: renderables built from the same
//! `(shader, mesh)` pair share one backend draw configuration. The cache entry
//! lives until the mesh or the shader is freed; freeing either deletes the
//! configuration, and renderables still holding its handle must be rebuilt.
//!
//! GPU work happens lazily: meshes and textures upload on first use, not at
//! creation.

use std::collections::HashMap;

use crate::assets::material::Material;
use crate::assets::mesh::{Mesh, MeshCacheOption, MeshError, MeshId, Vertex};
use crate::assets::shader::{Shader, ShaderError, ShaderId, ShaderSource};
use crate::assets::texture::{Texture, TextureDimensions, TextureError, TextureId, TextureOptions};
use crate::core::config::ResourceConfig;
use crate::foundation::collections::IdCounter;
use crate::render::backend::{DrawConfigHandle, GraphicsBackend, TextureHandle};
use crate::render::renderable::{Renderable, RenderableError};

/// Resource type, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Mesh
    Mesh,
    /// Shader program
    Shader,
    /// Texture
    Texture,
}

/// Resource Manager errors
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Lexical name already registered for this resource type
    #[error("{kind:?} named '{name}' already exists")]
    DuplicateName {
        /// Resource type
        kind: ResourceKind,
        /// Rejected name
        name: String,
    },

    /// No mesh with this id
    #[error("unknown mesh {0:?}")]
    UnknownMesh(MeshId),

    /// No shader with this id
    #[error("unknown shader {0:?}")]
    UnknownShader(ShaderId),

    /// No texture with this id
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    /// Mesh error
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Shader error
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Texture error
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// Renderable construction error
    #[error(transparent)]
    Renderable(#[from] RenderableError),
}

/// Cache key for draw configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawConfigKey {
    /// Shader of the material
    pub shader: ShaderId,
    /// Mesh drawn
    pub mesh: MeshId,
}

/// Id-keyed storage with an optional unique name per entry
#[derive(Debug)]
struct Table<Id, T> {
    ids: IdCounter,
    items: HashMap<Id, T>,
    names: HashMap<String, Id>,
}

impl<Id: Copy + Eq + std::hash::Hash, T> Table<Id, T> {
    fn new() -> Self {
        Self {
            ids: IdCounter::new(),
            items: HashMap::new(),
            names: HashMap::new(),
        }
    }

    fn check_name(&self, kind: ResourceKind, name: &str) -> Result<(), ResourceError> {
        if !name.is_empty() && self.names.contains_key(name) {
            log::warn!("Rejected duplicate {kind:?} name '{name}'");
            return Err(ResourceError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, id: Id, name: &str, item: T) {
        if !name.is_empty() {
            self.names.insert(name.to_owned(), id);
        }
        self.items.insert(id, item);
    }

    fn by_name(&self, name: &str) -> Option<&T> {
        self.names.get(name).and_then(|id| self.items.get(id))
    }

    fn remove(&mut self, id: Id) -> Option<T> {
        let item = self.items.remove(&id)?;
        self.names.retain(|_, named| *named != id);
        Some(item)
    }
}

/// Owner of all meshes, shaders and textures of one engine instance
#[derive(Debug)]
pub struct ResourceManager {
    config: ResourceConfig,
    meshes: Table<MeshId, Mesh>,
    shaders: Table<ShaderId, Shader>,
    textures: Table<TextureId, Texture>,
    draw_configs: HashMap<DrawConfigKey, DrawConfigHandle>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(ResourceConfig::default())
    }
}

impl ResourceManager {
    /// Create an empty manager
    pub fn new(config: ResourceConfig) -> Self {
        log::info!("Creating ResourceManager with config: {config:?}");
        Self {
            config,
            meshes: Table::new(),
            shaders: Table::new(),
            textures: Table::new(),
            draw_configs: HashMap::new(),
        }
    }

    /// Creation defaults
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    // ---- meshes ----------------------------------------------------------

    /// Register a mesh
    ///
    /// Vertex and index data are assigned immediately when both are given;
    /// otherwise the mesh is an empty placeholder until
    /// [`set_mesh_data`](Self::set_mesh_data). `cache` falls back to the
    /// configured default.
    pub fn create_mesh(
        &mut self,
        lexical_name: &str,
        vertices: Option<Vec<Vertex>>,
        indices: Option<Vec<u32>>,
        cache: Option<MeshCacheOption>,
    ) -> Result<MeshId, ResourceError> {
        self.meshes.check_name(ResourceKind::Mesh, lexical_name)?;

        let id = MeshId(self.meshes.ids.next_id());
        let mut mesh = Mesh::new(id, lexical_name, cache.unwrap_or(self.config.default_mesh_cache));

        match (vertices, indices) {
            (Some(vertices), Some(indices)) => mesh.set_mesh_data(vertices, indices)?,
            (None, None) => {}
            _ => log::warn!("Mesh '{lexical_name}' given only vertices or only indices; data left unassigned"),
        }

        log::debug!("Created mesh '{lexical_name}' as {id:?}");
        self.meshes.insert(id, lexical_name, mesh);
        Ok(id)
    }

    /// Assign data to a mesh that has not been uploaded yet
    pub fn set_mesh_data(&mut self, id: MeshId, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<(), ResourceError> {
        let mesh = self.meshes.items.get_mut(&id).ok_or(ResourceError::UnknownMesh(id))?;
        mesh.set_mesh_data(vertices, indices)?;
        Ok(())
    }

    /// Mesh by id
    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.items.get(&id)
    }

    /// Mesh by id, mutably
    pub fn get_mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.items.get_mut(&id)
    }

    /// Mesh by lexical name
    pub fn get_mesh_by_name(&self, name: &str) -> Option<&Mesh> {
        self.meshes.by_name(name)
    }

    /// Id of the mesh with this lexical name
    pub fn mesh_id(&self, name: &str) -> Option<MeshId> {
        self.meshes.names.get(name).copied()
    }

    /// Remove a mesh, its GPU buffers and every draw configuration that used it
    ///
    /// Returns `false` if the id is unknown.
    pub fn free_mesh(&mut self, id: MeshId, backend: &mut dyn GraphicsBackend) -> bool {
        let Some(mut mesh) = self.meshes.remove(id) else {
            return false;
        };

        self.invalidate_draw_configs(|key| key.mesh == id, backend);
        mesh.release(backend);
        log::debug!("Freed mesh '{}' ({id:?})", mesh.lexical_name());
        true
    }

    /// Number of live meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.items.len()
    }

    // ---- shaders ---------------------------------------------------------

    /// Build and register a shader program
    ///
    /// On compile or link failure the backend diagnostic is logged and
    /// returned; nothing is registered.
    pub fn create_shader(
        &mut self,
        lexical_name: &str,
        vertex: &str,
        fragment: &str,
        source: ShaderSource,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<ShaderId, ResourceError> {
        self.shaders.check_name(ResourceKind::Shader, lexical_name)?;

        let id = ShaderId(self.shaders.ids.peek());
        let shader = Shader::build(id, lexical_name, vertex, fragment, source, backend).map_err(|err| {
            log::error!("{err}");
            err
        })?;
        self.shaders.ids.next_id();

        log::debug!("Created shader '{lexical_name}' as {id:?}");
        self.shaders.insert(id, lexical_name, shader);
        Ok(id)
    }

    /// Shader by id
    pub fn get_shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.items.get(&id)
    }

    /// Shader by lexical name
    pub fn get_shader_by_name(&self, name: &str) -> Option<&Shader> {
        self.shaders.by_name(name)
    }

    /// Id of the shader with this lexical name
    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.shaders.names.get(name).copied()
    }

    /// Remove a shader, its program and every draw configuration that used it
    ///
    /// Returns `false` if the id is unknown.
    pub fn free_shader(&mut self, id: ShaderId, backend: &mut dyn GraphicsBackend) -> bool {
        let Some(shader) = self.shaders.remove(id) else {
            return false;
        };

        self.invalidate_draw_configs(|key| key.shader == id, backend);
        shader.release(backend);
        log::debug!("Freed shader '{}' ({id:?})", shader.lexical_name());
        true
    }

    /// Number of live shaders
    pub fn shader_count(&self) -> usize {
        self.shaders.items.len()
    }

    // ---- textures --------------------------------------------------------

    /// Register a texture; `options` falls back to the configured default
    pub fn create_texture(
        &mut self,
        lexical_name: &str,
        dimensions: TextureDimensions,
        data: Vec<u8>,
        options: Option<TextureOptions>,
    ) -> Result<TextureId, ResourceError> {
        self.textures.check_name(ResourceKind::Texture, lexical_name)?;

        let id = TextureId(self.textures.ids.peek());
        let options = options.unwrap_or(self.config.default_texture_options);
        let texture = Texture::new(id, lexical_name, dimensions, data, options)?;
        self.textures.ids.next_id();

        log::debug!("Created texture '{lexical_name}' as {id:?}");
        self.textures.insert(id, lexical_name, texture);
        Ok(id)
    }

    /// Texture by id
    pub fn get_texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.items.get(&id)
    }

    /// Texture by lexical name
    pub fn get_texture_by_name(&self, name: &str) -> Option<&Texture> {
        self.textures.by_name(name)
    }

    /// Id of the texture with this lexical name
    pub fn texture_id(&self, name: &str) -> Option<TextureId> {
        self.textures.names.get(name).copied()
    }

    /// Backend handle of a texture, uploading it on first request
    pub fn texture_handle(&mut self, id: TextureId, backend: &mut dyn GraphicsBackend) -> Option<TextureHandle> {
        self.textures.items.get_mut(&id)?.gpu_handle(backend)
    }

    /// Remove a texture and its GPU copy; returns `false` if the id is unknown
    pub fn free_texture(&mut self, id: TextureId, backend: &mut dyn GraphicsBackend) -> bool {
        let Some(mut texture) = self.textures.remove(id) else {
            return false;
        };

        texture.release(backend);
        log::debug!("Freed texture '{}' ({id:?})", texture.lexical_name());
        true
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.items.len()
    }

    // ---- renderables -----------------------------------------------------

    /// Build a renderable for `material` drawing mesh `mesh_id`
    ///
    /// The mesh is uploaded if it is not GPU-resident yet. The draw
    /// configuration is shared with every earlier renderable that used the
    /// same shader and mesh; a new one is created only for a new pair.
    pub fn create_renderable(
        &mut self,
        material: Material,
        mesh_id: MeshId,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<Renderable, ResourceError> {
        let shader_id = material.shader();
        let program = self
            .shaders
            .items
            .get(&shader_id)
            .ok_or(RenderableError::MissingShader(shader_id))?
            .program();

        let mesh = self
            .meshes
            .items
            .get_mut(&mesh_id)
            .ok_or(RenderableError::MissingMesh(mesh_id))?;
        let gpu_mesh = mesh
            .upload(backend)
            .map_err(|_| RenderableError::MeshNotUploaded(mesh_id))?;

        let key = DrawConfigKey {
            shader: shader_id,
            mesh: mesh_id,
        };
        let draw_config = if let Some(&handle) = self.draw_configs.get(&key) {
            log::trace!("Reusing draw config {handle:?} for {key:?}");
            handle
        } else {
            let layout = Vertex::attribute_layout(material.attributes());
            let handle = backend.create_draw_config(gpu_mesh.vertex_buffer, gpu_mesh.index_buffer, &layout);
            log::debug!("Created draw config {handle:?} for {key:?}");
            self.draw_configs.insert(key, handle);
            handle
        };

        Ok(Renderable::new(material, mesh_id, gpu_mesh, program, draw_config))
    }

    /// Cached draw configuration for a `(shader, mesh)` pair
    pub fn draw_config(&self, shader: ShaderId, mesh: MeshId) -> Option<DrawConfigHandle> {
        self.draw_configs.get(&DrawConfigKey { shader, mesh }).copied()
    }

    /// Number of cached draw configurations
    pub fn draw_config_count(&self) -> usize {
        self.draw_configs.len()
    }

    fn invalidate_draw_configs(&mut self, matches: impl Fn(&DrawConfigKey) -> bool, backend: &mut dyn GraphicsBackend) {
        self.draw_configs.retain(|key, handle| {
            if matches(key) {
                backend.delete_draw_config(*handle);
                false
            } else {
                true
            }
        });
    }

    /// Release every resource through `backend`
    ///
    /// Ids handed out before the call are not reused afterwards.
    pub fn release_all(&mut self, backend: &mut dyn GraphicsBackend) {
        log::info!(
            "Releasing {} meshes, {} shaders, {} textures, {} draw configs",
            self.meshes.items.len(),
            self.shaders.items.len(),
            self.textures.items.len(),
            self.draw_configs.len()
        );

        for (_, handle) in self.draw_configs.drain() {
            backend.delete_draw_config(handle);
        }
        for (_, mut mesh) in self.meshes.items.drain() {
            mesh.release(backend);
        }
        for (_, shader) in self.shaders.items.drain() {
            shader.release(backend);
        }
        for (_, mut texture) in self.textures.items.drain() {
            texture.release(backend);
        }

        self.meshes.names.clear();
        self.shaders.names.clear();
        self.textures.names.clear();
    }
}
