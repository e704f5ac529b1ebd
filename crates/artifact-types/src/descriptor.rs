//! Artifact descriptors and the records stored in the index.

use serde::{Deserialize, Serialize};

/// Placeholder used in the identity key for an absent classifier or packaging.
pub const NOT_AVAILABLE: &str = "NA";

/// Natural identity of an indexed artifact.
///
/// Two descriptors with the same [`uinfo`](Self::uinfo) describe the same
/// index entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
}

impl ArtifactDescriptor {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            packaging: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = Some(packaging.into());
        self
    }

    /// Identity key: `group|artifact|version|classifier|packaging`.
    pub fn uinfo(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.group_id,
            self.artifact_id,
            self.version,
            self.classifier.as_deref().unwrap_or(NOT_AVAILABLE),
            self.packaging.as_deref().unwrap_or(NOT_AVAILABLE)
        )
    }
}

impl std::fmt::Display for ArtifactDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if let Some(packaging) = &self.packaging {
            write!(f, "@{}", packaging)?;
        }
        Ok(())
    }
}

/// An extracted artifact: descriptor plus file facts captured at extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub descriptor: ArtifactDescriptor,
    /// File name within the version directory
    pub file_name: String,
    /// Size in bytes, if the file existed when extracted
    #[serde(default)]
    pub size: Option<u64>,
    /// Last modification time in milliseconds since epoch
    #[serde(default)]
    pub last_modified: Option<i64>,
}

impl ArtifactRecord {
    pub fn new(descriptor: ArtifactDescriptor, file_name: impl Into<String>) -> Self {
        Self {
            descriptor,
            file_name: file_name.into(),
            size: None,
            last_modified: None,
        }
    }

    pub fn with_file_facts(mut self, size: u64, last_modified: i64) -> Self {
        self.size = Some(size);
        self.last_modified = Some(last_modified);
        self
    }

    pub fn uinfo(&self) -> String {
        self.descriptor.uinfo()
    }
}
