//! Scene graph
//!
//! The [`Scene`] stores every node in a generational arena and owns the tree
//! rooted at the node named `"Root"`, which is created with the scene and
//! never replaced. All tree mutation goes through the scene:
//!
//! - [`Scene::create_node`] makes a standalone node and hands back a
//!   [`DetachedNode`] token. The token is the only way to attach that node,
//!   so a node cannot be inserted twice.
//! - [`Scene::remove_child`] and [`Scene::remove_child_where`] cut a subtree
//!   out and return its token; the caller re-inserts it or destroys it.
//! - [`Scene::destroy`] shuts down every component in a detached subtree and
//!   frees its nodes.
//!
//! Detached subtrees stay in the arena (they can be built up and inspected)
//! but are not visited by [`Scene::frame`].

use crate::foundation::collections::{NodeId, NodeMap};
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::render::Renderer;
use crate::scene::component::{AttachedComponent, Component, ComponentId};
use crate::scene::node::SceneNode;

/// Name of the node every scene is created with
pub const ROOT_NAME: &str = "Root";

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Scene graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The id does not name a live node
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),

    /// No attached component has this id
    #[error("component {0:?} not found")]
    ComponentNotFound(ComponentId),

    /// The new parent is the node itself or one of its descendants
    #[error("attaching {node:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Node being attached
        node: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// The node is not below the given ancestor
    #[error("{node:?} is not a descendant of {ancestor:?}")]
    NotADescendant {
        /// Node asked for
        node: NodeId,
        /// Ancestor searched
        ancestor: NodeId,
    },

    /// No descendant of `ancestor` matched the search
    #[error("no descendant of {ancestor:?} matched")]
    NoMatch {
        /// Node whose subtree was searched
        ancestor: NodeId,
    },

    /// The root cannot be moved or removed
    #[error("the root node cannot be moved")]
    RootImmutable,

    /// The node heads a detached subtree; attach it through its token
    #[error("node {0:?} is detached")]
    Detached(NodeId),
}

/// Ownership token for a node that is not attached to any parent
///
/// Pass it to [`Scene::add_child`] to attach the node or to
/// [`Scene::destroy`] to free it. A token dropped on the floor leaves the
/// subtree in the arena until the scene is cleared or dropped.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a detached node must be attached or destroyed"]
pub struct DetachedNode(NodeId);

impl DetachedNode {
    /// Id of the detached node
    pub fn id(&self) -> NodeId {
        self.0
    }
}

/// Failed attach; carries the node back so ownership is not lost
#[derive(Debug, thiserror::Error)]
#[error("failed to attach node: {error}")]
pub struct AttachError {
    /// The node that was not attached
    pub node: DetachedNode,
    /// Why
    #[source]
    pub error: SceneError,
}

impl AttachError {
    /// Take the node back
    pub fn into_node(self) -> DetachedNode {
        self.node
    }
}

/// Tree of scene nodes and their components
#[derive(Debug)]
pub struct Scene {
    nodes: NodeMap<SceneNode>,
    root: NodeId,
    next_component_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only the root node
    pub fn new() -> Self {
        let mut nodes = NodeMap::with_key();
        let root = nodes.insert(SceneNode::new(ROOT_NAME));
        Self {
            nodes,
            root,
            next_component_id: 0,
        }
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Node by id, mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    fn get(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Whether `id` names a live node (attached or detached)
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || (self.nodes.contains_key(id) && self.ancestors(id).last() == Some(self.root))
    }

    /// Number of live nodes, including the root and detached subtrees
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Parent chain from `id`'s parent up to the top of its tree
    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes.get(id).and_then(SceneNode::parent), move |&current| {
            self.nodes.get(current).and_then(SceneNode::parent)
        })
    }

    fn is_strict_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    // ---- tree mutation ---------------------------------------------------

    /// Create a standalone node
    pub fn create_node(&mut self, name: impl Into<String>) -> DetachedNode {
        DetachedNode(self.nodes.insert(SceneNode::new(name)))
    }

    /// Attach a detached node (and its subtree) as the last child of `parent`
    ///
    /// Fails if either node is unknown (a token outlives its node when the
    /// scene is cleared) or if `parent` lies inside the node's own subtree.
    pub fn add_child(&mut self, parent: NodeId, node: DetachedNode) -> Result<NodeId, AttachError> {
        let id = node.id();
        let error = if !self.nodes.contains_key(id) {
            Some(SceneError::NodeNotFound(id))
        } else if !self.nodes.contains_key(parent) {
            Some(SceneError::NodeNotFound(parent))
        } else if parent == id || self.is_strict_descendant(parent, id) {
            Some(SceneError::WouldCreateCycle { node: id, parent })
        } else {
            None
        };
        if let Some(error) = error {
            return Err(AttachError { node, error });
        }

        self.link(parent, id);
        Ok(id)
    }

    /// Create a named node directly under `parent`
    pub fn spawn_child(&mut self, parent: NodeId, name: impl Into<String>) -> SceneResult<NodeId> {
        self.get(parent)?;
        let node = self.create_node(name);
        let id = node.id();
        self.link(parent, id);
        Ok(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(parent) {
            return;
        }
        let Some(node) = self.nodes.get_mut(child) else {
            return;
        };
        node.parent = Some(parent);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(child);
        }
    }

    fn unlink(&mut self, child: NodeId) -> DetachedNode {
        let parent = self.nodes.get_mut(child).and_then(|node| node.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|&id| id != child);
        }
        DetachedNode(child)
    }

    /// Cut `child`'s subtree out from anywhere below `ancestor`
    pub fn remove_child(&mut self, ancestor: NodeId, child: NodeId) -> SceneResult<DetachedNode> {
        self.get(ancestor)?;
        self.get(child)?;
        if !self.is_strict_descendant(child, ancestor) {
            return Err(SceneError::NotADescendant { node: child, ancestor });
        }
        log::trace!("Detaching {child:?} from below {ancestor:?}");
        Ok(self.unlink(child))
    }

    /// Cut out the first descendant of `ancestor` (depth-first, pre-order) matching `predicate`
    pub fn remove_child_where(
        &mut self,
        ancestor: NodeId,
        mut predicate: impl FnMut(&SceneNode) -> bool,
    ) -> SceneResult<DetachedNode> {
        let found = self
            .descendants(ancestor)?
            .into_iter()
            .find(|&id| self.nodes.get(id).is_some_and(&mut predicate))
            .ok_or(SceneError::NoMatch { ancestor })?;
        Ok(self.unlink(found))
    }

    /// Move an attached node, with its subtree, under `new_parent`
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> SceneResult<()> {
        if node == self.root {
            return Err(SceneError::RootImmutable);
        }
        if self.get(node)?.parent.is_none() {
            return Err(SceneError::Detached(node));
        }
        self.get(new_parent)?;
        if new_parent == node || self.is_strict_descendant(new_parent, node) {
            return Err(SceneError::WouldCreateCycle { node, parent: new_parent });
        }

        let detached = self.unlink(node);
        self.link(new_parent, detached.0);
        Ok(())
    }

    /// Free a detached subtree, shutting down every component in it
    pub fn destroy(&mut self, node: DetachedNode) {
        let ids = self.descendants(node.id()).unwrap_or_default();
        let mut shut_down = 0;
        for id in std::iter::once(node.id()).chain(ids) {
            if let Some(mut removed) = self.nodes.remove(id) {
                for attached in &mut removed.components {
                    attached.component.shutdown();
                    shut_down += 1;
                }
            }
        }
        log::debug!("Destroyed subtree {:?} ({shut_down} components shut down)", node.id());
    }

    /// Deep-copy `id`'s subtree into a new detached subtree
    ///
    /// Names, transforms and components (via [`Component::clone_box`]) are
    /// copied; each copied component is started up on its new node.
    pub fn clone_subtree(&mut self, id: NodeId) -> SceneResult<DetachedNode> {
        let copy = self.clone_node(id)?;
        let children = self.get(id)?.children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.link(copy.id(), child_copy.0);
        }
        Ok(copy)
    }

    fn clone_node(&mut self, id: NodeId) -> SceneResult<DetachedNode> {
        let source = self.get(id)?;
        let name = source.name().to_owned();
        let transform = *source.local_transform();
        let components: Vec<Box<dyn Component>> = source
            .components
            .iter()
            .map(|attached| attached.component.clone_box())
            .collect();

        let copy = self.create_node(name);
        if let Some(node) = self.nodes.get_mut(copy.id()) {
            node.set_translation(transform.translation);
            node.set_rotation(transform.rotation);
            node.set_scale(transform.scale);
        }
        for component in components {
            self.add_boxed_component(copy.id(), component)?;
        }
        Ok(copy)
    }

    /// Drop every node except the root, shutting down all components
    pub fn clear(&mut self) {
        let mut shut_down = 0;
        for (_, node) in &mut self.nodes {
            for attached in &mut node.components {
                attached.component.shutdown();
                shut_down += 1;
            }
        }
        let root = self.root;
        self.nodes.retain(|id, _| id == root);
        if let Some(root) = self.nodes.get_mut(root) {
            root.children.clear();
            root.components.clear();
        }
        log::debug!("Cleared scene ({shut_down} components shut down)");
    }

    // ---- queries ---------------------------------------------------------

    /// Every descendant of `id` (not `id` itself) in depth-first pre-order
    pub fn descendants(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let mut stack: Vec<NodeId> = self.get(id)?.children.iter().rev().copied().collect();
        let mut order = Vec::new();
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(order)
    }

    /// First descendant of `from` named `name`, depth-first pre-order
    ///
    /// `from` itself is never returned.
    pub fn find_child(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(from)
            .ok()?
            .into_iter()
            .find(|&id| self.nodes.get(id).is_some_and(|node| node.name() == name))
    }

    /// All descendants of `from` named `name`, depth-first pre-order
    pub fn find_children(&self, from: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(from)
            .unwrap_or_default()
            .into_iter()
            .filter(|&id| self.nodes.get(id).is_some_and(|node| node.name() == name))
            .collect()
    }

    /// World transform: parent world composed with local, up to the top of the tree
    pub fn world_transform(&self, id: NodeId) -> SceneResult<Mat4> {
        let mut world = self.get(id)?.local_matrix();
        for ancestor in self.ancestors(id) {
            world = self.get(ancestor)?.local_matrix() * world;
        }
        Ok(world)
    }

    /// World rotation: parent rotations composed in front of the local one
    pub fn world_rotation(&self, id: NodeId) -> SceneResult<Quat> {
        let mut rotation = self.get(id)?.rotation();
        for ancestor in self.ancestors(id) {
            rotation = self.get(ancestor)?.rotation() * rotation;
        }
        Ok(rotation)
    }

    /// World position of the node's origin
    pub fn world_translation(&self, id: NodeId) -> SceneResult<Vec3> {
        let world = self.world_transform(id)?;
        Ok(Vec3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)]))
    }

    /// Component-wise product of scales along the parent chain
    pub fn world_scale(&self, id: NodeId) -> SceneResult<Vec3> {
        let mut scale = self.get(id)?.scale();
        for ancestor in self.ancestors(id) {
            scale.component_mul_assign(&self.get(ancestor)?.scale());
        }
        Ok(scale)
    }

    // ---- components ------------------------------------------------------

    /// Attach a component to `node` and start it up
    pub fn add_component<C: Component>(&mut self, node: NodeId, component: C) -> SceneResult<ComponentId> {
        self.add_boxed_component(node, Box::new(component))
    }

    /// Attach an already boxed component to `node` and start it up
    pub fn add_boxed_component(&mut self, node: NodeId, mut component: Box<dyn Component>) -> SceneResult<ComponentId> {
        let id = ComponentId(self.next_component_id);
        let target = self.get_mut(node)?;
        component.startup(node);
        target.push_component(AttachedComponent { id, component });
        self.next_component_id += 1;
        Ok(id)
    }

    /// Detach a component after shutting it down, handing it back
    pub fn remove_component(&mut self, node: NodeId, id: ComponentId) -> SceneResult<Box<dyn Component>> {
        let mut component = self
            .get_mut(node)?
            .take_component(id)
            .ok_or(SceneError::ComponentNotFound(id))?;
        component.shutdown();
        Ok(component)
    }

    // ---- frame -----------------------------------------------------------

    /// Walk the attached tree once: compose world transforms top-down and run
    /// each node's component callbacks, registering cameras and drawables
    /// with `renderer`
    pub fn frame(&mut self, renderer: &mut Renderer) {
        self.frame_node(self.root, &Mat4::identity(), renderer);
    }

    fn frame_node(&mut self, id: NodeId, parent_world: &Mat4, renderer: &mut Renderer) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let world = parent_world * node.local_matrix();
        node.run_components(id, world, renderer);

        let mut index = 0;
        while let Some(child) = self.nodes.get(id).and_then(|node| node.children.get(index).copied()) {
            self.frame_node(child, &world, renderer);
            index += 1;
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for (_, node) in &mut self.nodes {
            for attached in &mut node.components {
                attached.component.shutdown();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use crate::scene::component::{ComponentKind, FrameContext, TypedComponent};
    use approx::assert_relative_eq;
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every lifecycle call into a shared log
    #[derive(Debug, Clone)]
    struct Recorder {
        label: &'static str,
        priority: u32,
        log: Log,
        owner: Option<NodeId>,
    }

    impl Recorder {
        fn new(label: &'static str, priority: u32, log: &Log) -> Self {
            Self {
                label,
                priority,
                log: Rc::clone(log),
                owner: None,
            }
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.label));
        }
    }

    impl Component for Recorder {
        fn kind(&self) -> ComponentKind {
            Self::KIND
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn startup(&mut self, owner: NodeId) {
            self.owner = Some(owner);
            self.record("startup");
        }

        fn shutdown(&mut self) {
            self.owner = None;
            self.record("shutdown");
        }

        fn frame_start(&mut self, _ctx: &mut FrameContext<'_>) {
            self.record("start");
        }

        fn frame_end(&mut self, _ctx: &mut FrameContext<'_>) {
            self.record("end");
        }

        fn clone_box(&self) -> Box<dyn Component> {
            let mut copy = self.clone();
            copy.owner = None;
            Box::new(copy)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl TypedComponent for Recorder {
        const KIND: ComponentKind = ComponentKind::Behavior("recorder");
    }

    /// Captures the world transform it is handed each frame
    #[derive(Debug, Clone, Default)]
    struct WorldProbe {
        seen: Rc<RefCell<Vec<Mat4>>>,
    }

    impl Component for WorldProbe {
        fn kind(&self) -> ComponentKind {
            Self::KIND
        }

        fn frame_start(&mut self, ctx: &mut FrameContext<'_>) {
            self.seen.borrow_mut().push(*ctx.world_transform());
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

    impl TypedComponent for WorldProbe {
        const KIND: ComponentKind = ComponentKind::Behavior("probe");
    }

    fn events(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_new_scene_has_root() {
        let scene = Scene::new();
        let root = scene.node(scene.root()).unwrap();

        assert_eq!(root.name(), ROOT_NAME);
        assert!(root.parent().is_none());
        assert!(scene.is_attached(scene.root()));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_find_child_depth_first() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "A").unwrap();
        let b = scene.spawn_child(a, "B").unwrap();

        assert_eq!(scene.find_child(root, "A"), Some(a));
        assert_eq!(scene.find_child(root, "B"), Some(b));
        assert_eq!(scene.find_child(root, "Z"), None);
    }

    #[test]
    fn test_find_excludes_self_and_keeps_preorder() {
        let mut scene = Scene::new();
        let root = scene.root();
        let first = scene.spawn_child(root, "item").unwrap();
        let nested = scene.spawn_child(first, "item").unwrap();
        let second = scene.spawn_child(root, "item").unwrap();

        assert_eq!(scene.find_children(root, "item"), vec![first, nested, second]);
        assert_eq!(scene.find_child(first, "item"), Some(nested));
        assert!(scene.find_children(nested, "item").is_empty());
        assert_eq!(scene.find_child(root, ROOT_NAME), None);
    }

    #[test]
    fn test_world_transform_composes_parent_and_local() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.spawn_child(root, "parent").unwrap();
        let child = scene.spawn_child(parent, "child").unwrap();

        {
            let node = scene.node_mut(root).unwrap();
            node.set_translation(Vec3::new(0.0, 1.0, 0.0));
        }
        {
            let node = scene.node_mut(parent).unwrap();
            node.set_translation(Vec3::new(1.0, 2.0, 3.0));
            node.set_rotation(Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI));
            node.set_scale(Vec3::new(2.0, 2.0, 2.0));
        }
        scene.node_mut(child).unwrap().set_translation(Vec3::new(1.0, 0.0, 0.0));

        let root_world = scene.world_transform(root).unwrap();
        assert_relative_eq!(root_world, scene.node(root).unwrap().local_matrix());

        for (node, parent) in [(parent, root), (child, parent)] {
            let expected = scene.world_transform(parent).unwrap() * scene.node(node).unwrap().local_matrix();
            assert_relative_eq!(scene.world_transform(node).unwrap(), expected, epsilon = 1e-5);
        }

        // (1,0,0) scaled by 2, rotated 90° about z, then offset by both parents
        let position = scene.world_translation(child).unwrap();
        assert_relative_eq!(position, Vec3::new(1.0, 5.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(scene.world_scale(child).unwrap(), Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(
            scene.world_rotation(child).unwrap().angle(),
            constants::HALF_PI,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_rotate_by_is_not_commutative() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "a").unwrap();
        let b = scene.spawn_child(root, "b").unwrap();
        let q1 = Quat::from_axis_angle(&Vec3::x_axis(), constants::HALF_PI);
        let q2 = Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI);

        let node = scene.node_mut(a).unwrap();
        node.rotate_by(q1);
        node.rotate_by(q2);
        let node = scene.node_mut(b).unwrap();
        node.rotate_by(q2);
        node.rotate_by(q1);

        let ra = scene.node(a).unwrap().rotation();
        let rb = scene.node(b).unwrap().rotation();
        assert_relative_eq!(ra, q2 * q1, epsilon = 1e-6);
        assert!(ra.angle_to(&rb) > 1e-3);
    }

    #[test]
    fn test_removed_subtree_is_not_found() {
        let mut scene = Scene::new();
        let root = scene.root();
        let x = scene.spawn_child(root, "X").unwrap();
        let y = scene.spawn_child(x, "Y").unwrap();
        scene.spawn_child(y, "Z").unwrap();

        let detached = scene.remove_child(root, x).unwrap();

        for name in ["X", "Y", "Z"] {
            assert_eq!(scene.find_child(root, name), None);
        }
        assert!(!scene.is_attached(y));
        assert!(scene.find_child(detached.id(), "Z").is_some());
        assert!(scene.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_child_where_matches_preorder() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "a").unwrap();
        let deep = scene.spawn_child(a, "target").unwrap();
        scene.spawn_child(root, "target").unwrap();

        let removed = scene.remove_child_where(root, |node| node.name() == "target").unwrap();
        assert_eq!(removed.id(), deep);
        assert!(scene.node(a).unwrap().children().is_empty());

        assert_eq!(
            scene.remove_child_where(a, |node| node.name() == "target"),
            Err(SceneError::NoMatch { ancestor: a })
        );
        let missing = scene.create_node("gone");
        let missing_id = missing.id();
        scene.destroy(missing);
        assert_eq!(
            scene.remove_child_where(missing_id, |_| true),
            Err(SceneError::NodeNotFound(missing_id))
        );
        scene.destroy(removed);
    }

    #[test]
    fn test_remove_child_requires_descendant() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "a").unwrap();
        let b = scene.spawn_child(root, "b").unwrap();

        assert_eq!(
            scene.remove_child(a, b),
            Err(SceneError::NotADescendant { node: b, ancestor: a })
        );
        assert_eq!(
            scene.remove_child(root, root),
            Err(SceneError::NotADescendant { node: root, ancestor: root })
        );
    }

    #[test]
    fn test_add_child_rejects_cycles_and_returns_node() {
        let mut scene = Scene::new();
        let subtree = scene.create_node("top");
        let top = subtree.id();
        let inner = scene.spawn_child(top, "inner").unwrap();

        let err = scene.add_child(inner, subtree).unwrap_err();
        assert_eq!(err.error, SceneError::WouldCreateCycle { node: top, parent: inner });

        let subtree = err.into_node();
        let attached = scene.add_child(scene.root(), subtree).unwrap();
        assert_eq!(attached, top);
        assert!(scene.is_attached(inner));
        assert_eq!(scene.node(top).unwrap().parent(), Some(scene.root()));
    }

    #[test]
    fn test_token_outliving_clear_is_rejected() {
        let mut scene = Scene::new();
        let root = scene.root();
        let loose = scene.create_node("loose");
        let id = loose.id();
        scene.clear();

        let err = scene.add_child(root, loose).unwrap_err();
        assert_eq!(err.error, SceneError::NodeNotFound(id));
        assert!(!scene.contains(id));
        assert!(scene.node(root).unwrap().children().is_empty());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_detached_nodes_are_not_traversed() {
        let mut scene = Scene::new();
        let log = Log::default();
        let detached = scene.create_node("loose");
        scene
            .add_component(detached.id(), Recorder::new("loose", 0, &log))
            .unwrap();
        log.borrow_mut().clear();

        let mut renderer = Renderer::default();
        scene.frame(&mut renderer);
        assert!(events(&log).is_empty());

        scene.destroy(detached);
        assert_eq!(events(&log), vec!["loose:shutdown"]);
    }

    #[test]
    fn test_reparent_moves_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "a").unwrap();
        let b = scene.spawn_child(root, "b").unwrap();
        let leaf = scene.spawn_child(a, "leaf").unwrap();

        scene.reparent(a, b).unwrap();

        assert_eq!(scene.node(root).unwrap().children(), &[b]);
        assert_eq!(scene.node(b).unwrap().children(), &[a]);
        assert_eq!(scene.find_children(root, "leaf"), vec![leaf]);
    }

    #[test]
    fn test_reparent_errors() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_child(root, "a").unwrap();
        let leaf = scene.spawn_child(a, "leaf").unwrap();
        let loose = scene.create_node("loose");

        assert_eq!(scene.reparent(root, a), Err(SceneError::RootImmutable));
        assert_eq!(scene.reparent(a, a), Err(SceneError::WouldCreateCycle { node: a, parent: a }));
        assert_eq!(
            scene.reparent(a, leaf),
            Err(SceneError::WouldCreateCycle { node: a, parent: leaf })
        );
        assert_eq!(scene.reparent(loose.id(), a), Err(SceneError::Detached(loose.id())));

        let loose_id = loose.id();
        scene.destroy(loose);
        assert_eq!(scene.reparent(loose_id, a), Err(SceneError::NodeNotFound(loose_id)));
        assert_eq!(scene.node(a).unwrap().parent(), Some(root));
    }

    #[test]
    fn test_component_frame_order_brackets_by_priority() {
        let mut scene = Scene::new();
        let log = Log::default();
        let node = scene.spawn_child(scene.root(), "n").unwrap();
        for (label, priority) in [("p3", 3), ("p1", 1), ("p2", 2)] {
            scene.add_component(node, Recorder::new(label, priority, &log)).unwrap();
        }
        log.borrow_mut().clear();

        scene.frame(&mut Renderer::default());

        assert_eq!(
            events(&log),
            vec!["p1:start", "p2:start", "p3:start", "p3:end", "p2:end", "p1:end"]
        );
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut scene = Scene::new();
        let log = Log::default();
        let node = scene.root();
        scene.add_component(node, Recorder::new("first", 5, &log)).unwrap();
        scene.add_component(node, Recorder::new("second", 5, &log)).unwrap();
        scene.add_component(node, Recorder::new("early", 1, &log)).unwrap();
        log.borrow_mut().clear();

        scene.frame(&mut Renderer::default());

        let starts: Vec<String> = events(&log).into_iter().filter(|e| e.ends_with(":start")).collect();
        assert_eq!(starts, vec!["early:start", "first:start", "second:start"]);
    }

    #[test]
    fn test_priority_change_through_get_component_mut_resorts() {
        let mut scene = Scene::new();
        let log = Log::default();
        let root = scene.root();
        scene.add_component(root, Recorder::new("a", 1, &log)).unwrap();
        scene.frame(&mut Renderer::default());

        scene.add_component(root, Recorder::new("b", 2, &log)).unwrap();
        scene
            .node_mut(root)
            .unwrap()
            .get_component_mut::<Recorder>()
            .unwrap()
            .priority = 9;
        log.borrow_mut().clear();
        scene.frame(&mut Renderer::default());

        assert_eq!(events(&log)[0], "b:start");
    }

    #[test]
    fn test_component_lifecycle() {
        let mut scene = Scene::new();
        let log = Log::default();
        let node = scene.spawn_child(scene.root(), "n").unwrap();

        let id = scene.add_component(node, Recorder::new("c", 0, &log)).unwrap();
        let attached = scene.node(node).unwrap().get_component::<Recorder>().unwrap();
        assert_eq!(attached.owner, Some(node));

        let removed = scene.remove_component(node, id).unwrap();
        let removed = removed.as_any().downcast_ref::<Recorder>().unwrap();
        assert_eq!(removed.owner, None);
        assert_eq!(events(&log), vec!["c:startup", "c:shutdown"]);

        assert!(matches!(
            scene.remove_component(node, id),
            Err(SceneError::ComponentNotFound(_))
        ));
        assert!(scene.node(node).unwrap().get_component::<Recorder>().is_none());
    }

    #[test]
    fn test_typed_lookup_filters_by_kind() {
        let mut scene = Scene::new();
        let log = Log::default();
        let root = scene.root();
        scene.add_component(root, Recorder::new("a", 0, &log)).unwrap();
        scene.add_component(root, WorldProbe::default()).unwrap();
        scene.add_component(root, Recorder::new("b", 0, &log)).unwrap();

        let node = scene.node(root).unwrap();
        assert_eq!(node.get_components::<Recorder>().len(), 2);
        assert!(node.get_component::<WorldProbe>().is_some());
        assert_eq!(node.components_of_kind(ComponentKind::Behavior("probe")).count(), 1);
        assert_eq!(node.components_of_kind(ComponentKind::Camera).count(), 0);
    }

    #[test]
    fn test_components_receive_world_transform() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.spawn_child(root, "parent").unwrap();
        let child = scene.spawn_child(parent, "child").unwrap();
        scene.node_mut(parent).unwrap().set_translation(Vec3::new(1.0, 0.0, 0.0));
        scene.node_mut(child).unwrap().set_translation(Vec3::new(0.0, 2.0, 0.0));

        let probe = WorldProbe::default();
        let seen = Rc::clone(&probe.seen);
        scene.add_component(child, probe).unwrap();

        scene.frame(&mut Renderer::default());

        assert_eq!(seen.borrow().len(), 1);
        assert_relative_eq!(seen.borrow()[0], scene.world_transform(child).unwrap());
    }

    #[test]
    fn test_destroy_shuts_down_whole_subtree() {
        let mut scene = Scene::new();
        let log = Log::default();
        let root = scene.root();
        let top = scene.spawn_child(root, "top").unwrap();
        let inner = scene.spawn_child(top, "inner").unwrap();
        scene.add_component(top, Recorder::new("top", 0, &log)).unwrap();
        scene.add_component(inner, Recorder::new("inner", 0, &log)).unwrap();
        log.borrow_mut().clear();

        let detached = scene.remove_child(root, top).unwrap();
        scene.destroy(detached);

        assert_eq!(events(&log), vec!["top:shutdown", "inner:shutdown"]);
        assert!(!scene.contains(top));
        assert!(!scene.contains(inner));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let mut scene = Scene::new();
        let log = Log::default();
        let root = scene.root();
        let top = scene.spawn_child(root, "top").unwrap();
        let inner = scene.spawn_child(top, "inner").unwrap();
        scene.node_mut(inner).unwrap().set_translation(Vec3::new(3.0, 0.0, 0.0));
        scene.add_component(inner, Recorder::new("r", 4, &log)).unwrap();
        log.borrow_mut().clear();

        let copy = scene.clone_subtree(top).unwrap();
        let copy_top = scene.add_child(root, copy).unwrap();
        let copy_inner = scene.find_child(copy_top, "inner").unwrap();

        assert_ne!(copy_inner, inner);
        assert_eq!(events(&log), vec!["r:startup"]);
        let cloned = scene.node(copy_inner).unwrap().get_component::<Recorder>().unwrap();
        assert_eq!(cloned.owner, Some(copy_inner));
        assert_eq!(cloned.priority, 4);

        scene.node_mut(copy_inner).unwrap().set_translation(Vec3::zeros());
        assert_relative_eq!(scene.node(inner).unwrap().translation(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(scene.find_children(root, "inner"), vec![inner, copy_inner]);
    }

    #[test]
    fn test_clear_and_drop_shut_down_components() {
        let log = Log::default();
        {
            let mut scene = Scene::new();
            let child = scene.spawn_child(scene.root(), "child").unwrap();
            scene.add_component(child, Recorder::new("a", 0, &log)).unwrap();
            scene.clear();
            assert_eq!(scene.node_count(), 1);
            assert!(scene.node(scene.root()).unwrap().children().is_empty());

            scene.add_component(scene.root(), Recorder::new("b", 0, &log)).unwrap();
        }

        assert_eq!(events(&log), vec!["a:startup", "a:shutdown", "b:startup", "b:shutdown"]);
    }
}
