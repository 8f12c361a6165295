//! apishape core — response tree, placement rules, and the select/expand projection.

pub mod document;
pub mod error;
pub mod metadata;
pub mod node;
pub mod projection;
pub mod tree;

pub use document::SchemaDocument;
pub use error::SchemaError;
pub use metadata::{
    display_label, EntityMetadata, FieldDescriptor, FieldMetadata, RelationshipDescriptor,
    RelationshipKind, RelationshipMetadata,
};
pub use node::{CollectionNode, FieldNode, NodeId, NodeKind, SchemaNode};
pub use projection::{
    ExpandEntry, LegacyDocument, LegacyNode, LegacyNodeKind, PersistedDocument, QueryProjection,
    SelectColumn, StorageDocument, CARDINALITY_MULTIPLE,
};
pub use tree::{SchemaTree, ITEM_KEY};
