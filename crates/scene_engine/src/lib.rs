//! # Scene Engine
//!
//! Runtime core of a small real-time rendering engine: a hierarchical scene
//! graph with attachable components, a frame-scoped renderer that batches
//! draws, and a resource manager that shares draw configurations between
//! drawables built from the same shader and mesh.
//!
//! ## Features
//!
//! - **Scene graph**: arena-backed tree with composed world transforms
//! - **Components**: priority-ordered `frame_start`/`frame_end` callbacks
//! - **Batched rendering**: cameras sorted by viewport area, draws grouped by
//!   draw configuration
//! - **Resource management**: id and name lookup, lazy GPU upload
//! - **Pluggable backends**: everything GPU-side goes through
//!   [`GraphicsBackend`](render::GraphicsBackend); a headless implementation
//!   is included
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::headless(EngineConfig::default())?;
//!
//!     let shader = engine.create_shader("flat", "void main() {}", "void main() {}", ShaderSource::Raw)?;
//!     let (vertices, indices) = Mesh::cube_data();
//!     let cube = engine
//!         .resources_mut()
//!         .create_mesh("cube", Some(vertices), Some(indices), None)?;
//!     let renderable = engine.create_renderable(Material::new("flat", shader), cube)?;
//!
//!     let root = engine.scene().root();
//!     let node = engine.scene_mut().spawn_child(root, "cube")?;
//!     engine.scene_mut().add_component(node, renderable)?;
//!     engine.scene_mut().add_component(root, Camera::default())?;
//!
//!     let frames = engine.run(Some(3));
//!     assert_eq!(frames, 3);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{
            AttributeLocations, Material, Mesh, MeshCacheOption, MeshId, ResourceError, ResourceManager, ShaderId,
            ShaderSource, TextureDimensions, TextureId, TextureOptions, UniformLocations, Vertex,
        },
        core::config::{Config, EngineConfig, RendererConfig, ResourceConfig, WindowConfig},
        foundation::{
            collections::NodeId,
            math::{LocalTransform, Mat4, Quat, Vec3},
            time::Timer,
        },
        render::{
            backends::{HeadlessBackend, HeadlessWindow},
            Camera, FrameStats, GraphicsBackend, ProjectionMode, Renderable, Renderer, Viewport, WindowEvent,
            WindowSurface,
        },
        scene::{
            Component, ComponentId, ComponentKind, DetachedNode, FrameContext, Scene, SceneError, SceneNode,
            TypedComponent,
        },
        Engine, EngineError,
    };
}
