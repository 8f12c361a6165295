//! Built-in sample catalog for harness runs and tests.
//!
//! Mirrors the handful of standard entities a development harness
//! exposes, so the control stays usable without a live metadata endpoint.
//! Field lists combine a per-entity set with the audit/ownership columns
//! every entity carries.

use apishape_core::{
    display_label, EntityMetadata, FieldMetadata, RelationshipKind, RelationshipMetadata,
};
use async_trait::async_trait;

use crate::provider::MetadataProvider;

/// Metadata provider backed by the static sample catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMetadataProvider;

#[async_trait]
impl MetadataProvider for SampleMetadataProvider {
    async fn list_entities(&self) -> anyhow::Result<Vec<EntityMetadata>> {
        Ok(sample_entities())
    }

    async fn list_fields(&self, entity: &str) -> anyhow::Result<Vec<FieldMetadata>> {
        Ok(sample_fields(entity))
    }

    async fn list_relationships(&self, entity: &str) -> anyhow::Result<Vec<RelationshipMetadata>> {
        Ok(sample_relationships(entity))
    }
}

fn entity(logical_name: &str, display_name: &str) -> EntityMetadata {
    EntityMetadata {
        logical_name: logical_name.to_string(),
        display_name: display_name.to_string(),
    }
}

fn field(logical_name: &str, display_name: &str, attribute_type: &str) -> FieldMetadata {
    FieldMetadata {
        logical_name: logical_name.to_string(),
        display_name: display_name.to_string(),
        attribute_type: attribute_type.to_string(),
    }
}

fn relationship(
    schema_name: &str,
    referenced_entity: &str,
    display_name: &str,
    kind: RelationshipKind,
) -> RelationshipMetadata {
    RelationshipMetadata {
        schema_name: schema_name.to_string(),
        referenced_entity: referenced_entity.to_string(),
        display_name: display_name.to_string(),
        kind,
    }
}

/// Entities every sample environment exposes.
#[must_use]
pub fn sample_entities() -> Vec<EntityMetadata> {
    vec![
        entity("account", "Account"),
        entity("contact", "Contact"),
        entity("opportunity", "Opportunity"),
        entity("incident", "Case"),
        entity("systemuser", "User"),
        entity("team", "Team"),
    ]
}

/// Audit and ownership columns present on every entity.
fn base_fields() -> Vec<FieldMetadata> {
    vec![
        field("createdon", "Created On", "DateTime"),
        field("modifiedon", "Modified On", "DateTime"),
        field("createdby", "Created By", "Lookup"),
        field("modifiedby", "Modified By", "Lookup"),
        field("ownerid", "Owner", "Owner"),
        field("statecode", "Status", "Picklist"),
        field("statuscode", "Status Reason", "Picklist"),
    ]
}

/// Fields of one sample entity. Unknown entities get a generic id/name
/// pair, with labels derived from the logical names.
#[must_use]
pub fn sample_fields(entity: &str) -> Vec<FieldMetadata> {
    let mut fields = match entity {
        "account" => vec![
            field("accountid", "Account ID", "UniqueIdentifier"),
            field("name", "Account Name", "String"),
            field("accountnumber", "Account Number", "String"),
            field("telephone1", "Main Phone", "String"),
            field("emailaddress1", "Email", "String"),
            field("websiteurl", "Website", "String"),
            field("revenue", "Annual Revenue", "Money"),
            field("numberofemployees", "Number of Employees", "Integer"),
            field("address1_city", "City", "String"),
            field("address1_country", "Country", "String"),
            field("primarycontactid", "Primary Contact", "Lookup"),
        ],
        "contact" => vec![
            field("contactid", "Contact ID", "UniqueIdentifier"),
            field("fullname", "Full Name", "String"),
            field("firstname", "First Name", "String"),
            field("lastname", "Last Name", "String"),
            field("emailaddress1", "Email", "String"),
            field("telephone1", "Business Phone", "String"),
            field("mobilephone", "Mobile Phone", "String"),
            field("jobtitle", "Job Title", "String"),
            field("parentcustomerid", "Company Name", "Customer"),
        ],
        "opportunity" => vec![
            field("opportunityid", "Opportunity ID", "UniqueIdentifier"),
            field("name", "Topic", "String"),
            field("customerid", "Potential Customer", "Customer"),
            field("estimatedvalue", "Est. Revenue", "Money"),
            field("closeprobability", "Probability", "Integer"),
            field("estimatedclosedate", "Est. Close Date", "DateTime"),
            field("description", "Description", "Memo"),
        ],
        other => {
            let id_column = format!("{other}id");
            vec![
                field(&id_column, &display_label(&id_column), "UniqueIdentifier"),
                field("name", "Name", "String"),
                field("description", "Description", "Memo"),
            ]
        }
    };
    fields.extend(base_fields());
    fields
}

/// Relationships of one sample entity, lookups and collections mixed,
/// plus the ownership lookups every entity carries.
#[must_use]
pub fn sample_relationships(entity: &str) -> Vec<RelationshipMetadata> {
    let mut relationships = match entity {
        "account" => vec![
            relationship(
                "account_primary_contact",
                "contact",
                "Primary Contact",
                RelationshipKind::ManyToOne,
            ),
            relationship(
                "account_contacts",
                "contact",
                "Contacts",
                RelationshipKind::OneToMany,
            ),
            relationship(
                "account_opportunities",
                "opportunity",
                "Opportunities",
                RelationshipKind::OneToMany,
            ),
        ],
        "contact" => vec![
            relationship(
                "contact_customer_account",
                "account",
                "Company (Account)",
                RelationshipKind::ManyToOne,
            ),
            relationship(
                "contact_opportunities",
                "opportunity",
                "Opportunities",
                RelationshipKind::OneToMany,
            ),
            relationship(
                "contact_cases",
                "incident",
                "Cases",
                RelationshipKind::OneToMany,
            ),
        ],
        "opportunity" => vec![
            relationship(
                "opportunity_customer_account",
                "account",
                "Customer (Account)",
                RelationshipKind::ManyToOne,
            ),
            relationship(
                "opportunity_quotes",
                "quote",
                "Quotes",
                RelationshipKind::OneToMany,
            ),
        ],
        _ => Vec::new(),
    };
    relationships.push(relationship(
        "owner_user",
        "systemuser",
        "Owner (User)",
        RelationshipKind::ManyToOne,
    ));
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_serves_the_catalog() {
        let provider = SampleMetadataProvider;
        let entities = provider.list_entities().await.unwrap();
        assert!(entities.iter().any(|e| e.logical_name == "contact"));

        let fields = provider.list_fields("contact").await.unwrap();
        assert!(fields.iter().any(|f| f.logical_name == "fullname"));
        // Base audit columns are appended for every entity.
        assert!(fields.iter().any(|f| f.logical_name == "createdon"));
    }

    #[tokio::test]
    async fn unknown_entity_gets_generic_fields() {
        let provider = SampleMetadataProvider;
        let fields = provider.list_fields("contract").await.unwrap();
        assert_eq!(fields[0].logical_name, "contractid");
        assert_eq!(fields[0].display_name, "ContractID");
    }

    #[test]
    fn contact_has_collection_and_lookup_relationships() {
        let relationships = sample_relationships("contact");
        assert!(relationships.iter().any(|r| r.kind.is_collection()));
        assert!(relationships.iter().any(|r| r.kind.is_lookup()));
        assert!(relationships
            .iter()
            .any(|r| r.schema_name == "contact_cases"));
    }
}
