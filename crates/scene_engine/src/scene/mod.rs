//! Scene management
//!
//! Hierarchical scene graph with attachable components. The [`Scene`] owns
//! every node; nodes own their components; [`Scene::frame`] walks the tree
//! once per frame, composing world transforms and running component
//! callbacks.

pub mod component;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;

pub use component::{
    AttachedComponent, Component, ComponentId, ComponentKind, FrameContext, TypedComponent, DEFAULT_PRIORITY,
};
pub use node::SceneNode;
pub use scene::{AttachError, DetachedNode, Scene, SceneError, SceneResult, ROOT_NAME};
