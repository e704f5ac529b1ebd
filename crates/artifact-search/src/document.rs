//! Mapping between artifact records and Tantivy documents.

use tantivy::schema::Value;
use tantivy::TantivyDocument;

use artifact_types::{ArtifactDescriptor, ArtifactRecord};

use crate::schema::ArtifactSchema;

/// Convert an artifact record to a Tantivy document.
///
/// Optional coordinates and file facts are left out of the document when
/// absent, so an exact classifier clause never matches an artifact without one.
pub fn record_to_doc(schema: &ArtifactSchema, record: &ArtifactRecord) -> TantivyDocument {
    let descriptor = &record.descriptor;
    let mut doc = TantivyDocument::default();

    doc.add_text(schema.uinfo, descriptor.uinfo());
    doc.add_text(schema.group_id, &descriptor.group_id);
    doc.add_text(schema.artifact_id, &descriptor.artifact_id);
    doc.add_text(schema.version, &descriptor.version);
    if let Some(classifier) = &descriptor.classifier {
        doc.add_text(schema.classifier, classifier);
    }
    if let Some(packaging) = &descriptor.packaging {
        doc.add_text(schema.packaging, packaging);
    }
    doc.add_text(schema.file_name, &record.file_name);
    if let Some(size) = record.size {
        doc.add_u64(schema.size, size);
    }
    if let Some(last_modified) = record.last_modified {
        doc.add_i64(schema.last_modified, last_modified);
    }

    doc
}

/// Rebuild an artifact record from a stored document.
///
/// Returns None when a mandatory coordinate is missing.
pub fn doc_to_record(schema: &ArtifactSchema, doc: &TantivyDocument) -> Option<ArtifactRecord> {
    let text = |field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let descriptor = ArtifactDescriptor {
        group_id: text(schema.group_id)?,
        artifact_id: text(schema.artifact_id)?,
        version: text(schema.version)?,
        classifier: text(schema.classifier),
        packaging: text(schema.packaging),
    };

    Some(ArtifactRecord {
        descriptor,
        file_name: text(schema.file_name).unwrap_or_default(),
        size: doc.get_first(schema.size).and_then(|v| v.as_u64()),
        last_modified: doc.get_first(schema.last_modified).and_then(|v| v.as_i64()),
    })
}
