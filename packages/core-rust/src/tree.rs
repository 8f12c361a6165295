//! Arena-backed response tree with placement validation.
//!
//! Nodes live in a table keyed by [`NodeId`], with parent and children
//! kept as id references, so every lookup is O(1) and no operation relies
//! on object identity. Roots form an ordered list; there is no synthetic
//! root node.
//!
//! # Placement rules
//!
//! Only object and collection nodes accept children. A field scoped to a
//! collection relationship may only be attached — or moved — under the
//! collection bound to the same relationship. Creation with an
//! unresolvable parent id falls back to root insertion; moves reject it.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::metadata::{FieldDescriptor, RelationshipDescriptor};
use crate::node::{CollectionNode, FieldNode, NodeId, NodeKind, SchemaNode};

/// Default key for a freshly inserted object node.
const NEW_OBJECT_KEY: &str = "newObject";

/// Default key for a freshly inserted unbound collection.
const NEW_ARRAY_KEY: &str = "newArray";

/// Key of the implicit item template created inside every collection.
pub const ITEM_KEY: &str = "item";

/// The response tree: an ordered forest of schema nodes.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    nodes: HashMap<NodeId, SchemaNode>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl SchemaTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- queries ----

    /// Looks up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(&id)
    }

    /// True when the id names a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Ordered root node ids.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all live nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.values()
    }

    /// True when `start` (or one of its ancestors) is a collection bound
    /// to `relationship`.
    #[must_use]
    pub fn within_relationship(&self, start: NodeId, relationship: &str) -> bool {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else {
                return false;
            };
            if let NodeKind::Collection(collection) = &node.kind {
                if collection.relationship.as_deref() == Some(relationship) {
                    return true;
                }
            }
            cursor = node.parent;
        }
        false
    }

    /// True when `node` sits somewhere below `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    // ---- mutations ----

    /// Inserts an object node with the default key.
    ///
    /// An unknown or non-container parent falls back to root insertion,
    /// which keeps replays of stale host edits harmless.
    pub fn insert_object(&mut self, parent: Option<NodeId>) -> NodeId {
        let parent = self.resolve_container(parent);
        self.alloc(NEW_OBJECT_KEY.to_string(), NodeKind::Object, parent)
    }

    /// Inserts an unbound collection with the default key, plus its item
    /// object template.
    ///
    /// Same lenient parent fallback as [`insert_object`](Self::insert_object).
    pub fn insert_collection(&mut self, parent: Option<NodeId>) -> NodeId {
        let parent = self.resolve_container(parent);
        let id = self.alloc(
            NEW_ARRAY_KEY.to_string(),
            NodeKind::Collection(CollectionNode::default()),
            parent,
        );
        self.alloc(ITEM_KEY.to_string(), NodeKind::Object, Some(id));
        id
    }

    /// Attaches a dragged field.
    ///
    /// A descriptor scoped to a relationship is rejected unless `parent`
    /// sits inside the collection bound to that relationship; the tree is
    /// left untouched on rejection. The key defaults to the source field's
    /// logical name.
    pub fn attach_field(
        &mut self,
        descriptor: FieldDescriptor,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SchemaError> {
        if let Some(relationship) = &descriptor.relationship {
            let placed = parent.is_some_and(|p| self.within_relationship(p, relationship));
            if !placed {
                return Err(SchemaError::PlacementRejected {
                    field: descriptor.field,
                    relationship: relationship.clone(),
                });
            }
        }
        let parent = self.resolve_container(parent);
        let key = descriptor.field.clone();
        let kind = NodeKind::Field(FieldNode {
            source_field: descriptor.field,
            display_name: descriptor.display_name,
            entity: descriptor.entity,
            relationship: descriptor.relationship,
        });
        Ok(self.alloc(key, kind, parent))
    }

    /// Attaches a collection bound to a relationship, plus its item object
    /// template.
    ///
    /// The key defaults to the display name lowercased with whitespace
    /// stripped. Bound collections may nest anywhere a container accepts
    /// children; the lenient parent fallback applies.
    pub fn attach_collection(
        &mut self,
        descriptor: RelationshipDescriptor,
        parent: Option<NodeId>,
    ) -> NodeId {
        let parent = self.resolve_container(parent);
        let key: String = descriptor
            .display_name
            .split_whitespace()
            .collect::<String>()
            .to_lowercase();
        let id = self.alloc(
            key,
            NodeKind::Collection(CollectionNode {
                relationship: Some(descriptor.relationship),
                display_name: Some(descriptor.display_name),
            }),
            parent,
        );
        self.alloc(ITEM_KEY.to_string(), NodeKind::Object, Some(id));
        id
    }

    /// Sets a node's output key. Silent no-op on unknown ids.
    pub fn rename(&mut self, id: NodeId, key: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.key = key.into();
        }
    }

    /// Detaches a node from its current position and appends it under
    /// `new_parent` (or to the roots).
    ///
    /// Rejected without effect when the node or target is unknown, the
    /// target cannot hold children, the target sits inside the moved
    /// subtree, or the move would strand a relationship-scoped field
    /// outside its collection.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> Result<(), SchemaError> {
        if !self.contains(id) {
            return Err(SchemaError::UnknownNode(id));
        }
        if let Some(target) = new_parent {
            let Some(node) = self.nodes.get(&target) else {
                return Err(SchemaError::UnknownNode(target));
            };
            if !node.kind.is_container() {
                return Err(SchemaError::NotAContainer(target));
            }
            if target == id || self.is_descendant(target, id) {
                return Err(SchemaError::MoveIntoSelf(id));
            }
        }
        self.validate_subtree_placement(id, new_parent)?;

        self.detach(id);
        match new_parent {
            Some(target) => {
                if let Some(node) = self.nodes.get_mut(&target) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = new_parent;
        }
        Ok(())
    }

    /// Removes a node and its entire subtree. Returns whether anything was
    /// removed; idempotent on unknown ids.
    pub fn delete(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        true
    }

    // ---- internals ----

    /// Allocates a node and links it under `parent` (already resolved) or
    /// into the roots.
    fn alloc(&mut self, key: String, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            SchemaNode {
                id,
                key,
                kind,
                children: Vec::new(),
                parent,
            },
        );
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    /// Resolves a requested parent to a live container node; anything else
    /// means root placement.
    fn resolve_container(&self, parent: Option<NodeId>) -> Option<NodeId> {
        parent.filter(|p| self.nodes.get(p).is_some_and(|n| n.kind.is_container()))
    }

    /// Unlinks a node from its parent's children (or the roots) without
    /// touching the node itself.
    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Checks that every relationship-scoped field inside the subtree at
    /// `id` would still sit under its collection once the subtree hangs
    /// off `new_parent`.
    fn validate_subtree_placement(
        &self,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> Result<(), SchemaError> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            if let NodeKind::Field(field) = &node.kind {
                if let Some(relationship) = &field.relationship {
                    let covered_inside = self.covered_within(current, id, relationship);
                    let covered_above = new_parent
                        .is_some_and(|p| self.within_relationship(p, relationship));
                    if !covered_inside && !covered_above {
                        return Err(SchemaError::PlacementRejected {
                            field: field.source_field.clone(),
                            relationship: relationship.clone(),
                        });
                    }
                }
            }
            stack.extend(node.children.iter().copied());
        }
        Ok(())
    }

    /// True when a collection bound to `relationship` lies on the path
    /// from `node` (exclusive) up to `top` (inclusive).
    fn covered_within(&self, node: NodeId, top: NodeId, relationship: &str) -> bool {
        if node == top {
            return false;
        }
        let mut cursor = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = cursor {
            let Some(current) = self.nodes.get(&id) else {
                return false;
            };
            if let NodeKind::Collection(collection) = &current.kind {
                if collection.relationship.as_deref() == Some(relationship) {
                    return true;
                }
            }
            if id == top {
                return false;
            }
            cursor = current.parent;
        }
        false
    }
}
