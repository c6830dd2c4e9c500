//! Component trait and lifecycle contract
//!
//! A component is a behavior attached to exactly one [`SceneNode`](super::SceneNode)
//! at a time. The node owns it; attaching calls [`Component::startup`], detaching
//! or destroying the node calls [`Component::shutdown`], and while attached the
//! scene calls [`Component::frame_start`] / [`Component::frame_end`] once per frame.
//!
//! Within one node, `frame_start` runs in ascending priority and `frame_end` in
//! descending priority, so the component that starts first also ends last.
//! Equal priorities keep insertion order.

use std::any::Any;
use std::fmt;

use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::render::Renderer;

/// Priority given to components that do not ask for one (sorts last)
pub const DEFAULT_PRIORITY: u32 = u32::MAX;

/// Capability tag used for component lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Registers a viewport with the renderer each frame
    Camera,
    /// Submits a drawable to the renderer each frame
    Renderable,
    /// User-defined behavior, distinguished by name
    Behavior(&'static str),
}

/// Identifies an attached component within its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

/// Per-node state handed to components during the frame walk
pub struct FrameContext<'a> {
    owner: NodeId,
    world_transform: Mat4,
    renderer: &'a mut Renderer,
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(owner: NodeId, world_transform: Mat4, renderer: &'a mut Renderer) -> Self {
        Self {
            owner,
            world_transform,
            renderer,
        }
    }

    /// Node the component is attached to
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// World transform of the owning node for this frame
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Renderer collecting this frame's cameras and drawables
    pub fn renderer(&mut self) -> &mut Renderer {
        self.renderer
    }
}

/// Behavior attachable to a scene node
///
/// Callbacks must not assume their sibling components are already attached in
/// `startup`, and cannot reach the scene tree, so they never mutate the owner's
/// child or component lists mid-walk.
pub trait Component: Any + fmt::Debug {
    /// Capability tag
    fn kind(&self) -> ComponentKind;

    /// Sort key for frame callbacks; lower runs `frame_start` first
    fn priority(&self) -> u32 {
        DEFAULT_PRIORITY
    }

    /// Called once when attached to `owner`
    fn startup(&mut self, _owner: NodeId) {}

    /// Called once when detached or when the owning node is destroyed
    ///
    /// Must release any external resources the component owns directly.
    fn shutdown(&mut self) {}

    /// Called every frame, ascending priority order
    fn frame_start(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called every frame after all `frame_start` calls of the node, descending priority order
    fn frame_end(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Independent copy for attaching elsewhere; owner binding is not copied
    fn clone_box(&self) -> Box<dyn Component>;

    /// Upcast for typed access
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Component type with a fixed capability tag, enabling typed lookup
pub trait TypedComponent: Component + Sized {
    /// Tag every instance of this type reports
    const KIND: ComponentKind;
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Component stored on a node together with its scene id
#[derive(Debug)]
pub struct AttachedComponent {
    pub(crate) id: ComponentId,
    pub(crate) component: Box<dyn Component>,
}

impl AttachedComponent {
    /// Scene-wide id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The component itself
    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    /// Typed view if the tag and concrete type both match
    pub fn downcast_ref<T: TypedComponent>(&self) -> Option<&T> {
        if self.component.kind() == T::KIND {
            self.component.as_any().downcast_ref::<T>()
        } else {
            None
        }
    }

    /// Typed mutable view if the tag and concrete type both match
    pub fn downcast_mut<T: TypedComponent>(&mut self) -> Option<&mut T> {
        if self.component.kind() == T::KIND {
            self.component.as_any_mut().downcast_mut::<T>()
        } else {
            None
        }
    }
}
