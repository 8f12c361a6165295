//! Node types for the response tree.

use std::fmt;

/// Identifies a node within one [`SchemaTree`](crate::tree::SchemaTree).
///
/// Ids are allocated from a per-tree counter and never reused for the
/// tree's lifetime. Formats as `node_<n>`, the id scheme legacy persisted
/// documents carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Payload of a field node: one column pulled from a source entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Logical name of the attribute in the source entity.
    pub source_field: String,
    /// Human-readable label; the projection alias is derived from it.
    pub display_name: String,
    /// Logical name of the entity the attribute belongs to.
    pub entity: String,
    /// Set when the field was offered under a collection relationship.
    /// Such a field may only live under the collection bound to the same
    /// relationship.
    pub relationship: Option<String>,
}

/// Payload of a collection node.
///
/// A bound collection represents a one-to-many or many-to-many
/// relationship expansion. An unbound one is a plain array grouping with
/// no query-layer counterpart; it exists only to shape the response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionNode {
    /// Schema name of the relationship this collection expands, if any.
    pub relationship: Option<String>,
    /// Display label of the relationship, kept for alias generation.
    pub display_name: Option<String>,
}

impl CollectionNode {
    /// True when this collection expands a concrete relationship.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.relationship.is_some()
    }
}

/// What a node contributes to the response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf: one selected column.
    Field(FieldNode),
    /// Nested object; pushes its key onto the projection path.
    Object,
    /// Array of items, optionally bound to a relationship.
    Collection(CollectionNode),
}

impl NodeKind {
    /// True for kinds that may hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, NodeKind::Field(_))
    }
}

/// One element of the response tree.
///
/// Parent and children are stored as id references into the owning
/// arena, never as owned subtrees, so a node can be relocated without
/// touching its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    /// Unique id within the owning tree.
    pub id: NodeId,
    /// Output property name assigned by the user.
    pub key: String,
    /// Field, object, or collection payload.
    pub kind: NodeKind,
    /// Ordered child ids. Always empty for field nodes.
    pub children: Vec<NodeId>,
    /// Parent id, `None` for root nodes.
    pub parent: Option<NodeId>,
}

impl SchemaNode {
    /// Returns the field payload if this is a field node.
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldNode> {
        match &self.kind {
            NodeKind::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the collection payload if this is a collection node.
    #[must_use]
    pub fn as_collection(&self) -> Option<&CollectionNode> {
        match &self.kind {
            NodeKind::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// True if this node is an object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object)
    }
}
