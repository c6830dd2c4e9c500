//! Renderable component
//!
//! A [`Renderable`] pairs a [`Material`] with an uploaded mesh and the shared
//! draw configuration for that `(shader, mesh)` pair. Build one through
//! [`ResourceManager::create_renderable`](crate::assets::ResourceManager::create_renderable),
//! which guarantees the mesh is GPU-resident and reuses draw configurations.

use std::any::Any;
use std::rc::Rc;

use crate::assets::material::Material;
use crate::assets::mesh::{GpuMesh, MeshId};
use crate::assets::shader::ShaderId;
use crate::foundation::math::Mat4;
use crate::render::backend::{BufferHandle, DrawConfigHandle, ProgramHandle};
use crate::scene::component::{Component, ComponentKind, FrameContext, TypedComponent, DEFAULT_PRIORITY};

/// Renderable construction errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderableError {
    /// The mesh id is not known to the resource manager
    #[error("mesh {0:?} does not exist")]
    MissingMesh(MeshId),

    /// The material's shader id is not known to the resource manager
    #[error("shader {0:?} does not exist")]
    MissingShader(ShaderId),

    /// The mesh has no data and could not be uploaded
    #[error("mesh {0:?} has no GPU buffers")]
    MeshNotUploaded(MeshId),
}

/// One drawable submitted to the renderer for the current frame
#[derive(Debug, Clone)]
pub struct DrawRequest {
    /// Shared vertex layout; the batch key
    pub draw_config: DrawConfigHandle,
    /// Program the material's shader linked to
    pub program: ProgramHandle,
    /// Per-instance vertex buffer
    pub vertex_buffer: BufferHandle,
    /// Number of indices to draw
    pub index_count: u32,
    /// Material shared with the submitting renderable
    pub material: Rc<Material>,
    /// World transform of the owning node
    pub world: Mat4,
}

/// Drawable geometry attached to a scene node
#[derive(Debug, Clone)]
pub struct Renderable {
    material: Rc<Material>,
    mesh: MeshId,
    gpu_mesh: GpuMesh,
    program: ProgramHandle,
    draw_config: DrawConfigHandle,
    priority: u32,
}

impl Renderable {
    pub(crate) fn new(
        material: Material,
        mesh: MeshId,
        gpu_mesh: GpuMesh,
        program: ProgramHandle,
        draw_config: DrawConfigHandle,
    ) -> Self {
        Self {
            material: Rc::new(material),
            mesh,
            gpu_mesh,
            program,
            draw_config,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Set the component priority
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Material used for drawing
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Mesh drawn
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// GPU buffers of the mesh
    pub fn gpu_mesh(&self) -> GpuMesh {
        self.gpu_mesh
    }

    /// Linked program of the material's shader
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Draw configuration shared by every renderable with the same shader and mesh
    pub fn draw_config(&self) -> DrawConfigHandle {
        self.draw_config
    }

    fn draw_request(&self, world: Mat4) -> DrawRequest {
        DrawRequest {
            draw_config: self.draw_config,
            program: self.program,
            vertex_buffer: self.gpu_mesh.vertex_buffer,
            index_count: self.gpu_mesh.index_count,
            material: Rc::clone(&self.material),
            world,
        }
    }
}

impl Component for Renderable {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Renderable
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn frame_start(&mut self, ctx: &mut FrameContext<'_>) {
        let request = self.draw_request(*ctx.world_transform());
        ctx.renderer().add_renderable(request);
    }

    fn clone_box(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedComponent for Renderable {
    const KIND: ComponentKind = ComponentKind::Renderable;
}
