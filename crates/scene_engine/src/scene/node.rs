//! Scene graph node
//!
//! A [`SceneNode`] carries a name, a local transform and the components
//! attached to it. Tree links (parent and children) are [`NodeId`]s into the
//! owning [`Scene`](super::Scene); the scene is the only place that rewires
//! them, so a node can never end up with two parents.

use crate::foundation::collections::NodeId;
use crate::foundation::math::{LocalTransform, Mat4, Quat, Vec3};
use crate::render::Renderer;
use crate::scene::component::{AttachedComponent, Component, ComponentId, ComponentKind, FrameContext, TypedComponent};

/// Named node with a local transform and attached components
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    transform: LocalTransform,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<AttachedComponent>,
    components_dirty: bool,
}

impl SceneNode {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: LocalTransform::identity(),
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            components_dirty: false,
        }
    }

    /// Node name (not required to be unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Parent node, `None` for the root and for detached subtree roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in traversal order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local rotation
    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Replace the local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// Compose `delta` onto the local rotation: `rotation = delta * rotation`
    ///
    /// Order matters; `rotate_by(a); rotate_by(b)` differs from
    /// `rotate_by(b); rotate_by(a)` in general.
    pub fn rotate_by(&mut self, delta: Quat) {
        self.transform.rotation = delta * self.transform.rotation;
    }

    /// Local translation
    pub fn translation(&self) -> Vec3 {
        self.transform.translation
    }

    /// Replace the local translation
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.translation = translation;
    }

    /// Local per-axis scale
    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    /// Replace the local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    /// Local transform components
    pub fn local_transform(&self) -> &LocalTransform {
        &self.transform
    }

    /// `translate * rotate * scale`
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Attached components in their current execution order
    pub fn components(&self) -> &[AttachedComponent] {
        &self.components
    }

    /// Component by scene id
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|attached| attached.id == id)
            .map(AttachedComponent::component)
    }

    /// First attached component of type `T`
    pub fn get_component<T: TypedComponent>(&self) -> Option<&T> {
        self.components.iter().find_map(AttachedComponent::downcast_ref::<T>)
    }

    /// First attached component of type `T`, mutably
    ///
    /// The component may change its priority, so execution order is re-sorted
    /// before the next frame.
    pub fn get_component_mut<T: TypedComponent>(&mut self) -> Option<&mut T> {
        let found = self.components.iter_mut().find_map(AttachedComponent::downcast_mut::<T>);
        if found.is_some() {
            self.components_dirty = true;
        }
        found
    }

    /// All attached components of type `T`, in execution order
    pub fn get_components<T: TypedComponent>(&self) -> Vec<&T> {
        self.components
            .iter()
            .filter_map(AttachedComponent::downcast_ref::<T>)
            .collect()
    }

    /// All attached components reporting `kind`
    pub fn components_of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &dyn Component> + '_ {
        self.components
            .iter()
            .map(AttachedComponent::component)
            .filter(move |component| component.kind() == kind)
    }

    pub(crate) fn push_component(&mut self, attached: AttachedComponent) {
        self.components.push(attached);
        self.components_dirty = true;
    }

    pub(crate) fn take_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let index = self.components.iter().position(|attached| attached.id == id)?;
        Some(self.components.remove(index).component)
    }

    /// Run this node's frame callbacks
    ///
    /// Re-sorts by ascending priority if needed (stable, so ties keep
    /// insertion order), then calls `frame_start` front to back and
    /// `frame_end` back to front.
    pub(crate) fn run_components(&mut self, owner: NodeId, world: Mat4, renderer: &mut Renderer) {
        if self.components_dirty {
            self.components.sort_by_key(|attached| attached.component.priority());
            self.components_dirty = false;
        }

        let mut ctx = FrameContext::new(owner, world, renderer);
        for attached in &mut self.components {
            attached.component.frame_start(&mut ctx);
        }
        for attached in self.components.iter_mut().rev() {
            attached.component.frame_end(&mut ctx);
        }
    }
}
