//! Metadata access seam between the control and the host platform.

use apishape_core::{EntityMetadata, FieldMetadata, RelationshipMetadata};
use async_trait::async_trait;

/// Read-only access to platform metadata.
///
/// Implementations wrap whatever the host exposes: a web API, a cached
/// catalog, or a test fixture. Calls are fallible and may run against a
/// remote endpoint; the control commits nothing to its own state until a
/// call has succeeded, so a failure never corrupts the tree.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Lists the entities available as data sources.
    async fn list_entities(&self) -> anyhow::Result<Vec<EntityMetadata>>;

    /// Lists the attributes of one entity.
    async fn list_fields(&self, entity: &str) -> anyhow::Result<Vec<FieldMetadata>>;

    /// Lists the navigable relationships of one entity.
    async fn list_relationships(&self, entity: &str) -> anyhow::Result<Vec<RelationshipMetadata>>;
}
