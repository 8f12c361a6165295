//! Error types for the response-schema engine.

use crate::node::NodeId;

/// Errors surfaced by tree mutations and document parsing.
///
/// Mutations that merely name a missing node (`rename`, `delete`) are
/// documented no-ops rather than errors; only operations that would
/// otherwise corrupt the tree report a rejection. Every rejection leaves
/// the tree exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A relationship-scoped field was placed outside the collection bound
    /// to the same relationship.
    #[error("field '{field}' belongs to relationship '{relationship}' and must stay inside its collection")]
    PlacementRejected {
        /// Logical name of the rejected field.
        field: String,
        /// Relationship the field is scoped to.
        relationship: String,
    },

    /// A move named a node that does not exist.
    #[error("node {0} not found")]
    UnknownNode(NodeId),

    /// A move targeted a node that cannot hold children.
    #[error("node {0} cannot contain children")]
    NotAContainer(NodeId),

    /// A move would have made a node its own ancestor.
    #[error("cannot move {0} into its own subtree")]
    MoveIntoSelf(NodeId),

    /// The persisted string is not valid JSON in either the canonical or
    /// the legacy document shape.
    #[error("malformed schema document: {0}")]
    Malformed(#[from] serde_json::Error),
}
