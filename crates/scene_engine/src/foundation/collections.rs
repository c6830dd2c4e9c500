//! Specialized collection types

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Generational handle to a node stored in a [`Scene`](crate::scene::Scene)
    ///
    /// A handle outlives the node it names; once the node is destroyed every
    /// lookup through the stale handle misses instead of aliasing a new node.
    pub struct NodeId;
}

/// Handle-based map keyed by [`NodeId`]
pub type NodeMap<T> = SlotMap<NodeId, T>;

/// Monotonic id generator for resources
///
/// Ids are handed out in increasing order and never reused for the lifetime
/// of the generator, even after the resource they named is freed.
#[derive(Debug, Default, Clone)]
pub struct IdCounter {
    next: u32,
}

impl IdCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Peek at the id the next call will return
    pub fn peek(&self) -> u32 {
        self.next
    }
}
