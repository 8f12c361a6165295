//! Entity metadata and the drag descriptors fed into tree edits.
//!
//! The engine never queries the platform itself; the surrounding control
//! fetches entity, attribute, and relationship metadata and hands slices
//! of it to the tree as descriptors. The types here mirror what the
//! platform's metadata endpoints return.

use heck::ToTitleCase;
use serde::{Deserialize, Serialize};

/// Cardinality of a relationship between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    /// True for relationships that expand into a collection of rows.
    #[must_use]
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// True for relationships that resolve to a single related row.
    #[must_use]
    pub fn is_lookup(self) -> bool {
        matches!(self, Self::ManyToOne)
    }
}

/// One entity exposed by the platform as a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    /// Logical name used in queries.
    pub logical_name: String,
    /// Localized label shown to the user.
    pub display_name: String,
}

/// One attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    /// Logical name used in queries.
    pub logical_name: String,
    /// Localized label shown to the user.
    pub display_name: String,
    /// Platform attribute type (`String`, `Money`, `Lookup`, ...).
    pub attribute_type: String,
}

/// One navigable association from an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetadata {
    /// Schema name identifying the relationship.
    pub schema_name: String,
    /// Logical name of the entity on the other side.
    pub referenced_entity: String,
    /// Label shown to the user.
    pub display_name: String,
    /// Cardinality of the association.
    pub kind: RelationshipKind,
}

/// A field dragged onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Logical name of the attribute.
    pub field: String,
    /// Entity the attribute belongs to.
    pub entity: String,
    /// Label shown to the user; becomes the projection alias.
    pub display_name: String,
    /// Set when the field was offered under a collection relationship.
    pub relationship: Option<String>,
}

impl FieldDescriptor {
    /// Describes an unscoped field of `entity`.
    pub fn new(
        field: impl Into<String>,
        entity: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            entity: entity.into(),
            display_name: display_name.into(),
            relationship: None,
        }
    }

    /// Scopes the field to a collection relationship.
    #[must_use]
    pub fn for_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }
}

/// A collection relationship dragged onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    /// Schema name of the relationship.
    pub relationship: String,
    /// Entity on the many side.
    pub referenced_entity: String,
    /// Label shown to the user; becomes the collection alias.
    pub display_name: String,
}

impl RelationshipDescriptor {
    /// Describes a collection relationship.
    pub fn new(
        relationship: impl Into<String>,
        referenced_entity: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            relationship: relationship.into(),
            referenced_entity: referenced_entity.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<&RelationshipMetadata> for RelationshipDescriptor {
    fn from(metadata: &RelationshipMetadata) -> Self {
        Self::new(
            metadata.schema_name.clone(),
            metadata.referenced_entity.clone(),
            metadata.display_name.clone(),
        )
    }
}

/// Derives a human label from a logical attribute name, for metadata
/// sources that return no localized label. A trailing `id` becomes `ID`.
#[must_use]
pub fn display_label(logical_name: &str) -> String {
    let label = logical_name.to_title_case();
    match label.strip_suffix("Id").or_else(|| label.strip_suffix("id")) {
        Some(prefix) => format!("{prefix}ID"),
        None => label,
    }
}
