//! Tantivy schema definition for artifact entries.
//!
//! Every coordinate is indexed as a raw STRING so lookups are exact term
//! matches. The `uinfo` field carries the full identity key and is the
//! delete key for updates.

use tantivy::schema::{Field, Schema, STORED, STRING};

use artifact_types::ArtifactField;

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct ArtifactSchema {
    schema: Schema,
    /// Identity key group|artifact|version|classifier|packaging (STRING | STORED)
    pub uinfo: Field,
    pub group_id: Field,
    pub artifact_id: Field,
    pub version: Field,
    /// Absent from the document when the artifact has no classifier
    pub classifier: Field,
    /// Absent from the document when the packaging is unknown
    pub packaging: Field,
    /// File name inside the version directory (STRING | STORED)
    pub file_name: Field,
    /// File size in bytes (STORED)
    pub size: Field,
    /// File modification time, ms since epoch (STORED)
    pub last_modified: Field,
}

impl ArtifactSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field handle for an exact-match query clause.
    pub fn field_for(&self, field: ArtifactField) -> Field {
        match field {
            ArtifactField::GroupId => self.group_id,
            ArtifactField::ArtifactId => self.artifact_id,
            ArtifactField::Version => self.version,
            ArtifactField::Classifier => self.classifier,
            ArtifactField::Packaging => self.packaging,
        }
    }

    /// Create an ArtifactSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            uinfo: field("uinfo")?,
            group_id: field("group_id")?,
            artifact_id: field("artifact_id")?,
            version: field("version")?,
            classifier: field("classifier")?,
            packaging: field("packaging")?,
            file_name: field("file_name")?,
            size: field("size")?,
            last_modified: field("last_modified")?,
            schema,
        })
    }
}

/// Build the artifact index schema.
pub fn build_artifact_schema() -> ArtifactSchema {
    let mut schema_builder = Schema::builder();

    let uinfo = schema_builder.add_text_field("uinfo", STRING | STORED);
    let group_id = schema_builder.add_text_field("group_id", STRING | STORED);
    let artifact_id = schema_builder.add_text_field("artifact_id", STRING | STORED);
    let version = schema_builder.add_text_field("version", STRING | STORED);
    let classifier = schema_builder.add_text_field("classifier", STRING | STORED);
    let packaging = schema_builder.add_text_field("packaging", STRING | STORED);
    let file_name = schema_builder.add_text_field("file_name", STRING | STORED);
    let size = schema_builder.add_u64_field("size", STORED);
    let last_modified = schema_builder.add_i64_field("last_modified", STORED);

    let schema = schema_builder.build();

    ArtifactSchema {
        schema,
        uinfo,
        group_id,
        artifact_id,
        version,
        classifier,
        packaging,
        file_name,
        size,
        last_modified,
    }
}
