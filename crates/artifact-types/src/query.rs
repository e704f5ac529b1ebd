//! Exact-match queries over artifact descriptor fields.
//!
//! Queries are engine-neutral: the index engine translates each clause into
//! its own term query. Values are matched verbatim, never tokenized.

use crate::descriptor::ArtifactDescriptor;

/// Descriptor fields that can be matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactField {
    GroupId,
    ArtifactId,
    Version,
    Classifier,
    Packaging,
}

impl ArtifactField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactField::GroupId => "group_id",
            ArtifactField::ArtifactId => "artifact_id",
            ArtifactField::Version => "version",
            ArtifactField::Classifier => "classifier",
            ArtifactField::Packaging => "packaging",
        }
    }

    /// Value of this field on a descriptor, if present.
    pub fn value_of<'a>(&self, descriptor: &'a ArtifactDescriptor) -> Option<&'a str> {
        match self {
            ArtifactField::GroupId => Some(&descriptor.group_id),
            ArtifactField::ArtifactId => Some(&descriptor.artifact_id),
            ArtifactField::Version => Some(&descriptor.version),
            ArtifactField::Classifier => descriptor.classifier.as_deref(),
            ArtifactField::Packaging => descriptor.packaging.as_deref(),
        }
    }
}

impl std::fmt::Display for ArtifactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single exact-match clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: ArtifactField,
    pub value: String,
}

/// Conjunction of exact-match clauses; every clause must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactQuery {
    clauses: Vec<FieldMatch>,
}

impl ArtifactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required exact-match clause.
    pub fn must(mut self, field: ArtifactField, value: impl Into<String>) -> Self {
        self.clauses.push(FieldMatch {
            field,
            value: value.into(),
        });
        self
    }

    pub fn clauses(&self) -> &[FieldMatch] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the query against a descriptor in memory.
    pub fn matches(&self, descriptor: &ArtifactDescriptor) -> bool {
        self.clauses
            .iter()
            .all(|c| c.field.value_of(descriptor) == Some(c.value.as_str()))
    }
}

impl std::fmt::Display for ArtifactQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|c| format!("+{}:\"{}\"", c.field, c.value))
            .collect();
        f.write_str(&parts.join(" "))
    }
}
