//! Backend abstraction traits for the rendering system
//!
//! The engine core never talks to a graphics API directly. Resource creation
//! and draw submission go through [`GraphicsBackend`], and every GPU-side object
//! is represented by an opaque handle the backend hands out.

use crate::assets::texture::{TextureDimensions, TextureOptions};
use crate::foundation::math::Mat4;
use crate::render::camera::PixelViewport;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Handle to a GPU buffer (vertex or index data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a draw configuration (vertex layout bound to a program's inputs)
///
/// Drawables with the same `(shader, mesh)` pair share one of these, and the
/// renderer batches submissions by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawConfigHandle(pub u32);

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Interleaved vertex data
    Vertex,
    /// Triangle index data
    Index,
}

/// One float vertex attribute inside an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input slot
    pub location: u32,
    /// Number of float components (1..=4)
    pub components: u32,
    /// Byte offset inside one vertex
    pub offset: usize,
    /// Byte size of one vertex
    pub stride: usize,
}

/// Everything a backend needs to create a texture object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDescriptor {
    /// Texture extent
    pub dimensions: TextureDimensions,
    /// Sampling and storage options
    pub options: TextureOptions,
}

/// Errors reported by a graphics backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// A shader stage failed to compile
    #[error("{stage:?} shader failed to compile: {log}")]
    Compile {
        /// Stage that failed
        stage: ShaderStage,
        /// Diagnostic text from the compiler
        log: String,
    },

    /// Program linking failed
    #[error("program failed to link: {log}")]
    Link {
        /// Diagnostic text from the linker
        log: String,
    },
}

/// Graphics API collaborator
///
/// Implementations wrap a concrete API (OpenGL, Vulkan, ...). All calls are made
/// from the single frame thread.
pub trait GraphicsBackend {
    /// Compile and link a program from vertex and fragment source text
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> BackendResult<ProgramHandle>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Upload a buffer
    fn create_buffer(&mut self, kind: BufferKind, data: &[u8]) -> BufferHandle;

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Create a draw configuration binding `vertex_buffer` to the given attribute slots
    fn create_draw_config(
        &mut self,
        vertex_buffer: BufferHandle,
        index_buffer: BufferHandle,
        attributes: &[VertexAttribute],
    ) -> DrawConfigHandle;

    /// Release a draw configuration
    fn delete_draw_config(&mut self, config: DrawConfigHandle);

    /// Upload a texture
    fn create_texture(&mut self, descriptor: &TextureDescriptor, data: &[u8]) -> TextureHandle;

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Restrict rasterization to a pixel rectangle
    fn set_viewport(&mut self, viewport: PixelViewport);

    /// Make `program` current
    fn use_program(&mut self, program: ProgramHandle);

    /// Bind a draw configuration
    fn bind_draw_config(&mut self, config: DrawConfigHandle);

    /// Bind the per-instance vertex buffer
    fn bind_vertex_buffer(&mut self, buffer: BufferHandle);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Upload a 4x4 matrix uniform to the current program
    fn set_uniform_matrix(&mut self, location: u32, matrix: &Mat4);

    /// Issue an indexed triangle draw
    fn draw_indexed(&mut self, index_count: u32);
}
