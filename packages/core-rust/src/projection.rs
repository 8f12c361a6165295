//! Wire types for the persisted schema document.
//!
//! The canonical shape is the flat `select`/`expand` projection consumed
//! by the query layer. A legacy shape — the node tree serialized directly
//! by earlier builder versions — is still accepted on load; output is
//! always written in the canonical shape.
//!
//! All structs use `#[serde(rename_all = "camelCase")]`; the reserved
//! words `as`, `in`, and `type` keep their wire names through explicit
//! renames.

use serde::{Deserialize, Serialize};

/// Cardinality marker emitted for collection expansions.
pub const CARDINALITY_MULTIPLE: &str = "multiple";

/// Environment host used in the informational query URL.
const QUERY_BASE_URL: &str = "https://your-environment.crm.dynamics.com/api/data/v9.2";

/// One projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectColumn {
    /// Logical name of the source attribute.
    pub column: String,
    /// Output property name, lower camel case.
    #[serde(rename = "as")]
    pub alias: String,
    /// Slash-separated path of enclosing object keys; omitted at the root.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// One relationship expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandEntry {
    /// Navigation property: the relationship's schema name.
    pub nav: String,
    /// Output property name, lower camel case.
    #[serde(rename = "as")]
    pub alias: String,
    /// Always [`CARDINALITY_MULTIPLE`] for collection expansions.
    pub cardinality: String,
    /// Reserved for nested placement; the builder emits root-level expands.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Columns projected from the expanded rows.
    pub select: Vec<SelectColumn>,
}

/// The flat projection consumed by the query layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProjection {
    /// Logical name of the root entity.
    pub entity: String,
    /// Projected columns of the root entity and its nested objects.
    #[serde(default)]
    pub select: Vec<SelectColumn>,
    /// Collection relationship expansions.
    #[serde(default)]
    pub expand: Vec<ExpandEntry>,
}

impl QueryProjection {
    /// Assembles the informational OData query URL for this projection.
    #[must_use]
    pub fn search_query(&self) -> String {
        let columns: Vec<&str> = self.select.iter().map(|s| s.column.as_str()).collect();
        let mut url = format!(
            "{QUERY_BASE_URL}/{}s?$select={}",
            self.entity,
            columns.join(",")
        );
        if !self.expand.is_empty() {
            let expands: Vec<String> = self
                .expand
                .iter()
                .map(|e| {
                    let inner: Vec<&str> = e.select.iter().map(|s| s.column.as_str()).collect();
                    format!("{}($select={})", e.nav, inner.join(","))
                })
                .collect();
            url.push_str("&$expand=");
            url.push_str(&expands.join(","));
        }
        url
    }
}

/// Canonical persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDocument {
    /// Logical name of the root entity (duplicated inside `schema`).
    pub entity: String,
    /// Fully formed query URL; informational only.
    #[serde(default)]
    pub search_query: String,
    /// The projection itself.
    pub schema: QueryProjection,
}

/// Node kind tag in legacy persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyNodeKind {
    Field,
    Object,
    Array,
}

/// One node of a legacy persisted document.
///
/// Earlier builder versions wrote the in-memory tree verbatim, optional
/// fields and all; everything beyond `id` and `type` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyNode {
    /// Node id in the `node_<n>` scheme. Ignored on import; fresh ids are
    /// allocated.
    pub id: String,
    /// Node kind tag.
    #[serde(rename = "type")]
    pub kind: LegacyNodeKind,
    /// Output property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Logical attribute name, for field nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Label the field was dragged with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Entity the field belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    /// Child nodes, nested inline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LegacyNode>,
    /// Parent id; redundant with nesting and ignored on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Marks an array node as a relationship-bound collection.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_collection_container: bool,
    /// Relationship the collection expands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
    /// Display label of the collection relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_display_name: Option<String>,
}

/// Legacy persisted document: the node tree written directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    /// Logical name of the bound entity.
    pub entity_name: String,
    /// Root nodes.
    #[serde(default)]
    pub nodes: Vec<LegacyNode>,
}

/// Either persisted shape, detected structurally on load.
///
/// Canonical documents carry `entity` + `schema`; legacy ones carry
/// `entityName` + `nodes`. The variants share no required keys, so the
/// untagged match is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedDocument {
    Canonical(StorageDocument),
    Legacy(LegacyDocument),
}
