//! Arena-based ownership model for the instance tree (`spec.md` §9).
//!
//! The source language mutates the previous runtime instance object
//! in-place when children change but props do not. Under Rust's ownership
//! model that pattern is expressed as an arena of [`RuntimeInstance`] slots
//! indexed by a monotonic [`InstanceId`]; "in-place mutation" becomes
//! replacing a slot's children vector and bumping its dirty bits, which
//! preserves the stable identity (the id) without needing pointer identity.

use std::collections::HashMap;

use crate::vnode::{Key, VNode, VNodeTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub const ROOT_PARENT: InstanceId = InstanceId(0);
}

/// A committed node. Owns its VNode (kind + props) and the ids of its
/// children, which live in the same arena.
#[derive(Debug, Clone)]
pub struct RuntimeInstance {
    pub id: InstanceId,
    pub parent: Option<InstanceId>,
    pub vnode: VNode,
    pub children: Vec<InstanceId>,
    pub self_dirty: bool,
    pub dirty: bool,
    /// Widget-key this instance was created/regenerated with, for composite
    /// hook-state invalidation (`spec.md` §4.5 step 1).
    pub widget_key: Option<Key>,
    pub generation: u64,
}

impl RuntimeInstance {
    pub fn tag(&self) -> VNodeTag {
        self.vnode.tag
    }
}

/// Monotonic id allocator; ids are never reused within a commit
/// (`spec.md` §3).
#[derive(Debug, Default)]
pub struct InstanceIdAllocator {
    next: u64,
}

impl InstanceIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        id
    }
}

/// The arena of committed instances plus the root pointer, owned exclusively
/// by the core (`spec.md` §3 "Ownership").
#[derive(Debug, Default)]
pub struct InstanceTree {
    slots: HashMap<InstanceId, RuntimeInstance>,
    pub root: Option<InstanceId>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            root: None,
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<&RuntimeInstance> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut RuntimeInstance> {
        self.slots.get_mut(&id)
    }

    pub fn insert(&mut self, instance: RuntimeInstance) {
        self.slots.insert(instance.id, instance);
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<RuntimeInstance> {
        self.slots.remove(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Replaces a slot's children vector and bumps its dirty bits in place,
    /// preserving the instance id — the arena analogue of the source
    /// language's "mutate the previous runtime instance" fast path.
    pub fn mutate_children_in_place(&mut self, id: InstanceId, new_children: Vec<InstanceId>, vnode: VNode) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.children = new_children;
            slot.vnode = vnode;
            slot.self_dirty = true;
            slot.dirty = true;
        }
    }

    /// Refreshes a slot's vnode with no change to its children or dirty
    /// bits — the full-reuse branch of `spec.md` §4.5: props equal and all
    /// children unchanged.
    pub fn reuse_in_place(&mut self, id: InstanceId, vnode: VNode) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.vnode = vnode;
            slot.self_dirty = false;
            slot.dirty = false;
        }
    }

    pub fn mark_clean_subtree(&mut self, id: InstanceId) {
        let children = match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.self_dirty = false;
                slot.dirty = false;
                slot.children.clone()
            }
            None => return,
        };
        for child in children {
            self.mark_clean_subtree(child);
        }
    }

    pub fn recompute_dirty_bit(&mut self, id: InstanceId) -> bool {
        let children = match self.slots.get(&id) {
            Some(slot) => slot.children.clone(),
            None => return false,
        };
        let any_child_dirty = children.iter().any(|c| self.recompute_dirty_bit(*c));
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.dirty = slot.self_dirty || any_child_dirty;
            slot.dirty
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{LeafKind, LeafPayload, VNode};

    fn leaf_instance(id: u64, parent: Option<InstanceId>) -> RuntimeInstance {
        RuntimeInstance {
            id: InstanceId(id),
            parent,
            vnode: VNode::leaf(LeafKind::Spacer, LeafPayload::Spacer),
            children: Vec::new(),
            self_dirty: false,
            dirty: false,
            widget_key: None,
            generation: 0,
        }
    }

    #[test]
    fn allocator_never_reuses_ids_within_a_session() {
        let mut alloc = InstanceIdAllocator::new();
        let a = alloc.alloc();
        let b = alloc.alloc();
        assert_ne!(a, b);
    }

    #[test]
    fn mutate_children_in_place_preserves_id_and_marks_dirty() {
        let mut tree = InstanceTree::new();
        tree.insert(leaf_instance(1, None));
        let child = InstanceId(2);
        tree.mutate_children_in_place(
            InstanceId(1),
            vec![child],
            VNode::leaf(LeafKind::Divider, LeafPayload::Divider),
        );
        let slot = tree.get(InstanceId(1)).unwrap();
        assert_eq!(slot.children, vec![child]);
        assert!(slot.self_dirty);
        assert!(slot.dirty);
    }

    #[test]
    fn dirty_bit_propagates_up_from_children() {
        let mut tree = InstanceTree::new();
        let mut parent = leaf_instance(1, None);
        parent.children = vec![InstanceId(2)];
        tree.insert(parent);
        let mut child = leaf_instance(2, Some(InstanceId(1)));
        child.self_dirty = true;
        tree.insert(child);

        assert!(tree.recompute_dirty_bit(InstanceId(1)));
        assert!(tree.get(InstanceId(1)).unwrap().dirty);
    }

    #[test]
    fn mark_clean_subtree_clears_all_descendants() {
        let mut tree = InstanceTree::new();
        let mut parent = leaf_instance(1, None);
        parent.children = vec![InstanceId(2)];
        parent.dirty = true;
        tree.insert(parent);
        let mut child = leaf_instance(2, Some(InstanceId(1)));
        child.self_dirty = true;
        child.dirty = true;
        tree.insert(child);

        tree.mark_clean_subtree(InstanceId(1));
        assert!(!tree.get(InstanceId(1)).unwrap().dirty);
        assert!(!tree.get(InstanceId(2)).unwrap().dirty);
    }
}
