//! Rendering system
//!
//! Backend-agnostic draw submission. Camera and renderable components register
//! with the [`Renderer`] during the scene walk; the renderer then talks to a
//! [`GraphicsBackend`] once per frame.

pub mod backend;
pub mod backends;
pub mod camera;
pub mod renderable;
pub mod renderer;
pub mod window;

pub use backend::{
    BackendError, BufferHandle, DrawConfigHandle, GraphicsBackend, ProgramHandle, ShaderStage, TextureHandle,
};
pub use camera::{Camera, CameraError, PixelViewport, ProjectionMode, Viewport};
pub use renderable::{DrawRequest, Renderable, RenderableError};
pub use renderer::{DrawBatch, FrameStats, Renderer};
pub use window::{WindowEvent, WindowSurface};
