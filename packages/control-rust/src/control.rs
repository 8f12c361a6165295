//! Host-facing control shell around the schema document.
//!
//! The host drives the control through the lifecycle calls; the control
//! owns the document, pushes every accepted edit through the tree, and
//! reports new output through [`HostNotifier`]. Rejected edits return a
//! typed error and leave the document untouched — nothing here panics or
//! surfaces an exception to the host.

use std::sync::Arc;

use apishape_core::{
    EntityMetadata, FieldDescriptor, FieldMetadata, NodeId, RelationshipDescriptor,
    RelationshipMetadata, SchemaDocument, SchemaError,
};
use tracing::{debug, warn};

use crate::provider::MetadataProvider;

/// Lifecycle of a control instance.
///
/// State machine: Uninitialized -> Ready -> Disposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Constructed but not yet bound to a host value.
    Uninitialized,
    /// Bound and accepting edits.
    Ready,
    /// Torn down by the host; terminal.
    Disposed,
}

/// Callback the host supplies to learn that the output value changed.
///
/// Fired exactly once per accepted edit; the host then pulls the new
/// value via [`SchemaBuilderControl::output_value`].
pub trait HostNotifier: Send + Sync {
    /// Called after every accepted edit.
    fn output_changed(&self);
}

/// Errors from driving the control outside its lifecycle contract.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("control has not been initialized")]
    NotInitialized,
    #[error("control is already initialized")]
    AlreadyInitialized,
    #[error("control has been disposed")]
    Disposed,
    #[error("schema edit rejected: {0}")]
    Schema(#[from] SchemaError),
    #[error("metadata request failed: {0}")]
    Metadata(#[from] anyhow::Error),
}

/// The response-schema builder control.
///
/// Owns one [`SchemaDocument`] and the metadata caches for the currently
/// selected entity. All methods run to completion synchronously except
/// the metadata loads, which await the provider.
pub struct SchemaBuilderControl {
    state: ControlState,
    document: SchemaDocument,
    entities: Vec<EntityMetadata>,
    fields: Vec<FieldMetadata>,
    relationships: Vec<RelationshipMetadata>,
    /// Last value seen from or emitted to the host; used to skip
    /// reloading our own output when it echoes back.
    last_value: Option<String>,
    notifier: Arc<dyn HostNotifier>,
    provider: Arc<dyn MetadataProvider>,
}

impl SchemaBuilderControl {
    /// Creates an uninitialized control.
    pub fn new(provider: Arc<dyn MetadataProvider>, notifier: Arc<dyn HostNotifier>) -> Self {
        Self {
            state: ControlState::Uninitialized,
            document: SchemaDocument::default(),
            entities: Vec::new(),
            fields: Vec::new(),
            relationships: Vec::new(),
            last_value: None,
            notifier,
            provider,
        }
    }

    // ---- lifecycle ----

    /// Binds the control to the host's current value and moves to
    /// `Ready`. A malformed value degrades to an empty document.
    pub fn init(&mut self, bound_value: Option<&str>) -> Result<(), ControlError> {
        match self.state {
            ControlState::Ready => return Err(ControlError::AlreadyInitialized),
            ControlState::Disposed => return Err(ControlError::Disposed),
            ControlState::Uninitialized => {}
        }
        let raw = bound_value.unwrap_or_default();
        self.document = SchemaDocument::load(raw);
        self.last_value = Some(raw.to_string());
        self.state = ControlState::Ready;
        debug!(entity = %self.document.entity_name, "control ready");
        Ok(())
    }

    /// Handles a host-side value change. Returns `true` when the document
    /// was reloaded (the host should re-render), `false` when the value
    /// matched the last one seen or emitted.
    pub fn on_external_value_changed(&mut self, new_value: &str) -> Result<bool, ControlError> {
        self.ensure_ready()?;
        if self.last_value.as_deref() == Some(new_value) {
            return Ok(false);
        }
        self.document = SchemaDocument::load(new_value);
        self.last_value = Some(new_value.to_string());
        debug!(entity = %self.document.entity_name, "document reloaded from host");
        Ok(true)
    }

    /// Serializes the current document to the canonical persisted string
    /// and records it as the last emitted value.
    pub fn output_value(&mut self) -> Result<String, ControlError> {
        self.ensure_ready()?;
        let json = self.document.to_json()?;
        self.last_value = Some(json.clone());
        Ok(json)
    }

    /// Tears the control down. Idempotent; every further call except
    /// [`state`](Self::state) fails with [`ControlError::Disposed`].
    pub fn dispose(&mut self) {
        if self.state != ControlState::Disposed {
            debug!("control disposed");
        }
        self.state = ControlState::Disposed;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// The document being edited.
    #[must_use]
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    // ---- metadata ----

    /// Loads the entity catalog from the provider.
    pub async fn load_entities(&mut self) -> Result<&[EntityMetadata], ControlError> {
        self.ensure_ready()?;
        let entities = self.provider.list_entities().await?;
        self.entities = entities;
        Ok(&self.entities)
    }

    /// Binds the document to an entity and loads its fields and
    /// relationships. An empty name clears the selection. The document
    /// and caches are only touched after both provider calls succeed.
    pub async fn select_entity(&mut self, logical_name: &str) -> Result<(), ControlError> {
        self.ensure_ready()?;
        if logical_name.is_empty() {
            self.document.entity_name.clear();
            self.fields.clear();
            self.relationships.clear();
            self.notifier.output_changed();
            return Ok(());
        }
        let fields = self.provider.list_fields(logical_name).await?;
        let relationships = self.provider.list_relationships(logical_name).await?;
        self.document.entity_name = logical_name.to_string();
        self.fields = fields;
        self.relationships = relationships;
        debug!(entity = logical_name, fields = self.fields.len(), "entity selected");
        self.notifier.output_changed();
        Ok(())
    }

    /// Cached entity catalog.
    #[must_use]
    pub fn entities(&self) -> &[EntityMetadata] {
        &self.entities
    }

    /// Fields of the selected entity.
    #[must_use]
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    /// Relationships of the selected entity.
    #[must_use]
    pub fn relationships(&self) -> &[RelationshipMetadata] {
        &self.relationships
    }

    /// Relationships that resolve to a single related row.
    pub fn lookup_relationships(&self) -> impl Iterator<Item = &RelationshipMetadata> {
        self.relationships.iter().filter(|r| r.kind.is_lookup())
    }

    /// Relationships that expand into collections.
    pub fn collection_relationships(&self) -> impl Iterator<Item = &RelationshipMetadata> {
        self.relationships.iter().filter(|r| r.kind.is_collection())
    }

    // ---- edits ----

    /// Adds an object node under `parent` (or at the root).
    pub fn add_object(&mut self, parent: Option<NodeId>) -> Result<NodeId, ControlError> {
        self.ensure_ready()?;
        let id = self.document.tree.insert_object(parent);
        self.notifier.output_changed();
        Ok(id)
    }

    /// Adds an unbound array node under `parent` (or at the root).
    pub fn add_array(&mut self, parent: Option<NodeId>) -> Result<NodeId, ControlError> {
        self.ensure_ready()?;
        let id = self.document.tree.insert_collection(parent);
        self.notifier.output_changed();
        Ok(id)
    }

    /// Drops a dragged field under `parent`. A rejected placement leaves
    /// the document untouched and does not notify the host.
    pub fn drop_field(
        &mut self,
        descriptor: FieldDescriptor,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ControlError> {
        self.ensure_ready()?;
        match self.document.tree.attach_field(descriptor, parent) {
            Ok(id) => {
                self.notifier.output_changed();
                Ok(id)
            }
            Err(err) => {
                warn!(%err, "field drop rejected");
                Err(err.into())
            }
        }
    }

    /// Drops a dragged collection relationship under `parent`.
    pub fn drop_collection(
        &mut self,
        descriptor: RelationshipDescriptor,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ControlError> {
        self.ensure_ready()?;
        let id = self.document.tree.attach_collection(descriptor, parent);
        self.notifier.output_changed();
        Ok(id)
    }

    /// Renames a node's output key. Unknown ids are ignored without
    /// notifying the host.
    pub fn rename_node(&mut self, id: NodeId, key: &str) -> Result<(), ControlError> {
        self.ensure_ready()?;
        if self.document.tree.contains(id) {
            self.document.tree.rename(id, key);
            self.notifier.output_changed();
        }
        Ok(())
    }

    /// Moves a node under a new parent (or to the root). A rejected move
    /// leaves the document untouched and does not notify the host.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> Result<(), ControlError> {
        self.ensure_ready()?;
        match self.document.tree.move_node(id, new_parent) {
            Ok(()) => {
                self.notifier.output_changed();
                Ok(())
            }
            Err(err) => {
                warn!(%err, "move rejected");
                Err(err.into())
            }
        }
    }

    /// Deletes a node and its subtree. Returns whether anything was
    /// removed; unknown ids are a quiet no-op.
    pub fn delete_node(&mut self, id: NodeId) -> Result<bool, ControlError> {
        self.ensure_ready()?;
        let removed = self.document.tree.delete(id);
        if removed {
            self.notifier.output_changed();
        }
        Ok(removed)
    }

    fn ensure_ready(&self) -> Result<(), ControlError> {
        match self.state {
            ControlState::Uninitialized => Err(ControlError::NotInitialized),
            ControlState::Disposed => Err(ControlError::Disposed),
            ControlState::Ready => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use apishape_core::NodeKind;

    use super::*;
    use crate::sample::SampleMetadataProvider;

    /// Counts notifications instead of re-rendering.
    #[derive(Default)]
    struct CountingNotifier {
        count: AtomicUsize,
    }

    impl HostNotifier for CountingNotifier {
        fn output_changed(&self) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Provider whose every call fails, for state-preservation tests.
    struct FailingProvider;

    #[async_trait::async_trait]
    impl MetadataProvider for FailingProvider {
        async fn list_entities(&self) -> anyhow::Result<Vec<EntityMetadata>> {
            anyhow::bail!("metadata endpoint unreachable")
        }

        async fn list_fields(&self, _entity: &str) -> anyhow::Result<Vec<FieldMetadata>> {
            anyhow::bail!("metadata endpoint unreachable")
        }

        async fn list_relationships(
            &self,
            _entity: &str,
        ) -> anyhow::Result<Vec<RelationshipMetadata>> {
            anyhow::bail!("metadata endpoint unreachable")
        }
    }

    fn ready_control() -> (SchemaBuilderControl, Arc<CountingNotifier>) {
        let notifier = Arc::new(CountingNotifier::default());
        let mut control =
            SchemaBuilderControl::new(Arc::new(SampleMetadataProvider), notifier.clone());
        control.init(None).unwrap();
        (control, notifier)
    }

    // ---- lifecycle ----

    #[test]
    fn edits_require_initialization() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut control = SchemaBuilderControl::new(Arc::new(SampleMetadataProvider), notifier);
        assert!(matches!(
            control.add_object(None),
            Err(ControlError::NotInitialized)
        ));
    }

    #[test]
    fn init_twice_fails() {
        let (mut control, _) = ready_control();
        assert!(matches!(
            control.init(None),
            Err(ControlError::AlreadyInitialized)
        ));
    }

    #[test]
    fn dispose_is_terminal() {
        let (mut control, _) = ready_control();
        control.dispose();
        control.dispose(); // idempotent
        assert_eq!(control.state(), ControlState::Disposed);
        assert!(matches!(
            control.add_object(None),
            Err(ControlError::Disposed)
        ));
        assert!(matches!(control.init(None), Err(ControlError::Disposed)));
    }

    #[test]
    fn init_parses_bound_value() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut control = SchemaBuilderControl::new(Arc::new(SampleMetadataProvider), notifier);
        let raw = r#"{"entity":"account","searchQuery":"","schema":
            {"entity":"account","select":[{"column":"name","as":"accountName"}],"expand":[]}}"#;
        control.init(Some(raw)).unwrap();
        assert_eq!(control.document().entity_name, "account");
        assert_eq!(control.document().tree.len(), 1);
    }

    #[test]
    fn init_with_garbage_starts_empty() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut control = SchemaBuilderControl::new(Arc::new(SampleMetadataProvider), notifier);
        control.init(Some("{broken")).unwrap();
        assert_eq!(control.state(), ControlState::Ready);
        assert!(control.document().tree.is_empty());
    }

    // ---- host value sync ----

    #[test]
    fn external_change_reloads_only_on_difference() {
        let (mut control, _) = ready_control();
        let raw = r#"{"entity":"contact","searchQuery":"","schema":
            {"entity":"contact","select":[{"column":"fullname","as":"fullName"}],"expand":[]}}"#;

        assert!(control.on_external_value_changed(raw).unwrap());
        assert_eq!(control.document().entity_name, "contact");
        // Same value again: no reload.
        assert!(!control.on_external_value_changed(raw).unwrap());
    }

    #[test]
    fn own_output_echoed_back_is_ignored() {
        let (mut control, _) = ready_control();
        control.add_object(None).unwrap();
        let emitted = control.output_value().unwrap();
        assert!(!control.on_external_value_changed(&emitted).unwrap());
    }

    #[test]
    fn output_value_is_canonical_json() {
        let (mut control, _) = ready_control();
        let id = control.add_object(None).unwrap();
        control.rename_node(id, "address").unwrap();

        let raw = control.output_value().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("schema").is_some());
        assert!(value.get("searchQuery").is_some());
    }

    // ---- edits and notification ----

    #[test]
    fn accepted_edits_notify_once_each() {
        let (mut control, notifier) = ready_control();
        let object = control.add_object(None).unwrap();
        control.rename_node(object, "address").unwrap();
        control
            .drop_field(
                FieldDescriptor::new("city", "account", "City"),
                Some(object),
            )
            .unwrap();
        assert_eq!(notifier.count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn rejected_drop_keeps_tree_and_stays_silent() {
        let (mut control, notifier) = ready_control();
        let scoped =
            FieldDescriptor::new("title", "incident", "Title").for_relationship("contact_cases");
        let err = control.drop_field(scoped, None).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Schema(SchemaError::PlacementRejected { .. })
        ));
        assert!(control.document().tree.is_empty());
        assert_eq!(notifier.count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn rename_of_unknown_node_does_not_notify() {
        let (mut control, notifier) = ready_control();
        let object = control.add_object(None).unwrap();
        control.delete_node(object).unwrap();
        control.rename_node(object, "ghost").unwrap();
        // add + delete notified; the stale rename did not.
        assert_eq!(notifier.count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn delete_returns_whether_anything_was_removed() {
        let (mut control, _) = ready_control();
        let object = control.add_object(None).unwrap();
        assert!(control.delete_node(object).unwrap());
        assert!(!control.delete_node(object).unwrap());
    }

    #[test]
    fn drop_collection_builds_item_template() {
        let (mut control, _) = ready_control();
        let id = control
            .drop_collection(
                RelationshipDescriptor::new("contact_cases", "incident", "Cases"),
                None,
            )
            .unwrap();
        let node = control.document().tree.get(id).unwrap();
        assert!(matches!(node.kind, NodeKind::Collection(_)));
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn move_rejection_surfaces_schema_error() {
        let (mut control, notifier) = ready_control();
        let outer = control.add_object(None).unwrap();
        let inner = control.add_object(Some(outer)).unwrap();
        let before = notifier.count.load(Ordering::Relaxed);

        let err = control.move_node(outer, Some(inner)).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Schema(SchemaError::MoveIntoSelf(_))
        ));
        assert_eq!(notifier.count.load(Ordering::Relaxed), before);
    }

    // ---- metadata ----

    #[tokio::test]
    async fn select_entity_loads_fields_and_relationships() {
        let (mut control, notifier) = ready_control();
        control.load_entities().await.unwrap();
        assert!(!control.entities().is_empty());

        control.select_entity("contact").await.unwrap();
        assert_eq!(control.document().entity_name, "contact");
        assert!(control.fields().iter().any(|f| f.logical_name == "fullname"));
        assert!(control.collection_relationships().count() >= 1);
        assert!(control.lookup_relationships().count() >= 1);
        assert_eq!(notifier.count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn clearing_selection_resets_caches() {
        let (mut control, _) = ready_control();
        control.select_entity("contact").await.unwrap();
        control.select_entity("").await.unwrap();
        assert_eq!(control.document().entity_name, "");
        assert!(control.fields().is_empty());
        assert!(control.relationships().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_leaves_state_untouched() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut control = SchemaBuilderControl::new(Arc::new(FailingProvider), notifier.clone());
        control.init(None).unwrap();
        control.document.entity_name = "account".to_string();

        let err = control.select_entity("contact").await.unwrap_err();
        assert!(matches!(err, ControlError::Metadata(_)));
        // Selection, caches, and tree are exactly as before the call.
        assert_eq!(control.document().entity_name, "account");
        assert!(control.fields().is_empty());
        assert_eq!(notifier.count.load(Ordering::Relaxed), 0);
    }
}
