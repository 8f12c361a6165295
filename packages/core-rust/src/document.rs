//! The schema document and its projection codec.
//!
//! Converts the arena tree into the flat `select`/`expand` projection
//! (document order, depth first, pre-order) and parses either persisted
//! shape back into a tree. Alias recovery is lossy by design: display
//! names come back as the title-cased form of the stored alias, and
//! select entries nested under object paths are not reconstructed.

use heck::{ToLowerCamelCase, ToTitleCase};
use tracing::warn;

use crate::error::SchemaError;
use crate::metadata::{FieldDescriptor, RelationshipDescriptor};
use crate::node::{NodeId, NodeKind};
use crate::projection::{
    ExpandEntry, LegacyDocument, LegacyNode, LegacyNodeKind, PersistedDocument, QueryProjection,
    SelectColumn, StorageDocument, CARDINALITY_MULTIPLE,
};
use crate::tree::SchemaTree;

/// A response-shape document: the bound data source plus the node tree.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    /// Logical name of the bound entity.
    pub entity_name: String,
    /// The response tree.
    pub tree: SchemaTree,
}

impl SchemaDocument {
    /// Creates an empty document bound to an entity.
    #[must_use]
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            tree: SchemaTree::new(),
        }
    }

    // ---- tree -> projection ----

    /// Builds the flat projection in document order.
    #[must_use]
    pub fn to_projection(&self) -> QueryProjection {
        let mut projection = QueryProjection {
            entity: self.entity_name.clone(),
            ..QueryProjection::default()
        };
        for &root in self.tree.roots() {
            self.project_node(root, "/", &mut projection);
        }
        projection
    }

    /// Wraps the projection in the canonical storage document.
    #[must_use]
    pub fn to_storage(&self) -> StorageDocument {
        let schema = self.to_projection();
        StorageDocument {
            entity: self.entity_name.clone(),
            search_query: schema.search_query(),
            schema,
        }
    }

    /// Serializes to the canonical persisted JSON string.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(&self.to_storage())?)
    }

    fn project_node(&self, id: NodeId, path: &str, out: &mut QueryProjection) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Field(field) => {
                out.select.push(SelectColumn {
                    column: field.source_field.clone(),
                    alias: alias_for(&field.display_name, &field.source_field),
                    path: (path != "/").then(|| path.to_string()),
                });
            }
            NodeKind::Object => {
                let path = if path == "/" {
                    format!("/{}", node.key)
                } else {
                    format!("{path}/{}", node.key)
                };
                for &child in &node.children {
                    self.project_node(child, &path, out);
                }
            }
            NodeKind::Collection(collection) => {
                if let Some(nav) = &collection.relationship {
                    let mut select = Vec::new();
                    for &child in &node.children {
                        self.collect_expand_columns(child, &mut select);
                    }
                    out.expand.push(ExpandEntry {
                        nav: nav.clone(),
                        alias: collection
                            .display_name
                            .as_deref()
                            .unwrap_or(&node.key)
                            .to_lower_camel_case(),
                        cardinality: CARDINALITY_MULTIPLE.to_string(),
                        path: None,
                        select,
                    });
                } else {
                    // An unbound collection has no query-layer counterpart;
                    // its contents project with the path unchanged.
                    for &child in &node.children {
                        self.project_node(child, path, out);
                    }
                }
            }
        }
    }

    /// Collects every field below a bound collection into its `select`
    /// list, flattening through the item object and any deeper nesting.
    fn collect_expand_columns(&self, id: NodeId, out: &mut Vec<SelectColumn>) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if let NodeKind::Field(field) = &node.kind {
            out.push(SelectColumn {
                column: field.source_field.clone(),
                alias: alias_for(&field.display_name, &field.source_field),
                path: None,
            });
        }
        for &child in &node.children {
            self.collect_expand_columns(child, out);
        }
    }

    // ---- projection -> tree ----

    /// Rebuilds a document from a stored projection.
    ///
    /// One root field per select entry at the root path, one bound
    /// collection (with item object and field children) per expand entry.
    #[must_use]
    pub fn from_projection(projection: &QueryProjection) -> Self {
        let mut doc = Self::new(projection.entity.clone());
        for column in &projection.select {
            if column.path.as_deref().map_or(true, |p| p == "/") {
                let descriptor = FieldDescriptor::new(
                    column.column.clone(),
                    projection.entity.clone(),
                    humanize(&column.alias),
                );
                let _ = doc.tree.attach_field(descriptor, None);
            }
        }
        for expand in &projection.expand {
            let descriptor = RelationshipDescriptor::new(
                expand.nav.clone(),
                String::new(),
                humanize(&expand.alias),
            );
            let id = doc.tree.attach_collection(descriptor, None);
            doc.tree.rename(id, expand.alias.to_lower_camel_case());
            let item = doc.tree.get(id).and_then(|n| n.children.first().copied());
            for column in &expand.select {
                let descriptor = FieldDescriptor::new(
                    column.column.clone(),
                    projection.entity.clone(),
                    humanize(&column.alias),
                );
                let _ = doc.tree.attach_field(descriptor, item);
            }
        }
        doc
    }

    /// Rebuilds a document from the canonical storage shape.
    #[must_use]
    pub fn from_storage(storage: &StorageDocument) -> Self {
        let mut doc = Self::from_projection(&storage.schema);
        if !storage.entity.is_empty() {
            doc.entity_name = storage.entity.clone();
        }
        doc
    }

    /// Rebuilds a document from the legacy node-tree shape, allocating
    /// fresh ids.
    #[must_use]
    pub fn from_legacy(legacy: &LegacyDocument) -> Self {
        let mut doc = Self::new(legacy.entity_name.clone());
        for node in &legacy.nodes {
            import_legacy(&mut doc.tree, node, None, &legacy.entity_name);
        }
        doc
    }

    // ---- persisted string codec ----

    /// Parses a persisted string in either the canonical or legacy shape.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let persisted: PersistedDocument = serde_json::from_str(raw)?;
        Ok(match persisted {
            PersistedDocument::Canonical(storage) => Self::from_storage(&storage),
            PersistedDocument::Legacy(legacy) => Self::from_legacy(&legacy),
        })
    }

    /// Parses a persisted string, degrading to an empty document when the
    /// value is blank or malformed.
    #[must_use]
    pub fn load(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match Self::from_json(raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(%err, "failed to parse persisted schema, starting empty");
                Self::default()
            }
        }
    }
}

/// Projection alias for a field: the display name when present, the
/// logical name otherwise, in lower camel case.
fn alias_for(display_name: &str, source_field: &str) -> String {
    let source = if display_name.is_empty() {
        source_field
    } else {
        display_name
    };
    source.to_lower_camel_case()
}

/// Inverse of alias generation: `accountName` back to `Account Name`.
fn humanize(alias: &str) -> String {
    alias.to_title_case()
}

fn import_legacy(tree: &mut SchemaTree, node: &LegacyNode, parent: Option<NodeId>, entity: &str) {
    match node.kind {
        LegacyNodeKind::Field => {
            let field = node
                .field_name
                .clone()
                .or_else(|| node.key.clone())
                .unwrap_or_default();
            let descriptor = FieldDescriptor::new(
                field,
                node.entity_name.clone().unwrap_or_else(|| entity.to_string()),
                node.display_name.clone().unwrap_or_default(),
            );
            // Legacy fields carry no relationship scope, so this cannot
            // be rejected.
            if let Ok(id) = tree.attach_field(descriptor, parent) {
                if let Some(key) = &node.key {
                    tree.rename(id, key.clone());
                }
            }
        }
        LegacyNodeKind::Object => {
            let id = tree.insert_object(parent);
            if let Some(key) = &node.key {
                tree.rename(id, key.clone());
            }
            for child in &node.children {
                import_legacy(tree, child, Some(id), entity);
            }
        }
        LegacyNodeKind::Array => {
            let id = match (node.is_collection_container, &node.relationship_name) {
                (true, Some(relationship)) => tree.attach_collection(
                    RelationshipDescriptor::new(
                        relationship.clone(),
                        String::new(),
                        node.collection_display_name.clone().unwrap_or_default(),
                    ),
                    parent,
                ),
                _ => tree.insert_collection(parent),
            };
            if let Some(key) = &node.key {
                tree.rename(id, key.clone());
            }
            // The legacy tree carries its own item template; replace the
            // freshly created one when children are present.
            if !node.children.is_empty() {
                if let Some(item) = tree.get(id).and_then(|n| n.children.first().copied()) {
                    tree.delete(item);
                }
                for child in &node.children {
                    import_legacy(tree, child, Some(id), entity);
                }
            }
        }
    }
}
