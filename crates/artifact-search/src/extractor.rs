//! Artifact coordinates from Maven-2 repository paths.
//!
//! Layout below the repository root:
//! `g1/../gN/<artifactId>/<version>/<artifactId>-<version>[-<classifier>].<ext>`

use std::path::{Component, Path};
use std::time::UNIX_EPOCH;

use artifact_types::{ArtifactDescriptor, ArtifactRecord};

use crate::error::SearchError;

const CHECKSUM_SUFFIXES: &[&str] = &[".sha1", ".md5", ".sha256", ".sha512", ".asc"];
const COMPOUND_EXTENSIONS: &[&str] = &["tar.gz", "tar.bz2"];
const SNAPSHOT_SUFFIX: &str = "SNAPSHOT";

/// Derive the artifact record for `file` inside the repository at `root`.
///
/// Relative paths are resolved against `root`. Returns `Ok(None)` for files
/// that are not artifacts (metadata, checksums, files outside the layout).
/// File facts are filled in only when the file exists.
pub fn extract_artifact(root: &Path, file: &Path) -> Result<Option<ArtifactRecord>, SearchError> {
    let full_path = if file.is_relative() {
        root.join(file)
    } else {
        file.to_path_buf()
    };

    let relative = full_path.strip_prefix(root).map_err(|_| {
        SearchError::InvalidCoordinate(format!(
            "{} is outside repository {}",
            full_path.display(),
            root.display()
        ))
    })?;

    let segments = path_segments(relative)?;
    if segments.len() < 4 {
        return Ok(None);
    }

    let n = segments.len();
    let file_name = segments[n - 1];
    if is_ignored_file(file_name) {
        return Ok(None);
    }

    let version = segments[n - 2];
    let artifact_id = segments[n - 3];
    let group_segments = &segments[..n - 3];
    if group_segments.iter().any(|s| s.trim().is_empty()) {
        return Err(SearchError::InvalidCoordinate(format!(
            "empty group segment in {}",
            relative.display()
        )));
    }

    let Some(rest) = file_name.strip_prefix(artifact_id).and_then(|r| r.strip_prefix('-')) else {
        return Ok(None);
    };

    let remainder = strip_version(rest, version).ok_or_else(|| {
        SearchError::InvalidCoordinate(format!(
            "file {} does not match version directory {}",
            file_name, version
        ))
    })?;

    let (classifier, extension) = if let Some(extension) = remainder.strip_prefix('.') {
        (None, extension)
    } else if let Some(tail) = remainder.strip_prefix('-') {
        match split_extension(tail) {
            Some((classifier, extension)) => (Some(classifier), extension),
            None => return Ok(None),
        }
    } else if remainder.is_empty() {
        return Ok(None);
    } else {
        return Err(SearchError::InvalidCoordinate(format!(
            "file {} does not match version directory {}",
            file_name, version
        )));
    };
    if extension.is_empty() {
        return Ok(None);
    }

    let mut descriptor = ArtifactDescriptor::new(group_segments.join("."), artifact_id, version)
        .with_packaging(extension);
    if let Some(classifier) = classifier {
        descriptor = descriptor.with_classifier(classifier);
    }

    let mut record = ArtifactRecord::new(descriptor, file_name);
    if let Some((size, last_modified)) = file_facts(&full_path) {
        record = record.with_file_facts(size, last_modified);
    }
    Ok(Some(record))
}

/// UTF-8 path segments, rejecting `.` and `..`.
fn path_segments(relative: &Path) -> Result<Vec<&str>, SearchError> {
    relative
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str().ok_or_else(|| {
                SearchError::InvalidCoordinate(format!(
                    "non UTF-8 segment in {}",
                    relative.display()
                ))
            }),
            _ => Err(SearchError::InvalidCoordinate(format!(
                "unexpected path component in {}",
                relative.display()
            ))),
        })
        .collect()
}

fn is_ignored_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    if CHECKSUM_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return true;
    }
    lower.starts_with("maven-metadata") && lower.ends_with(".xml")
}

/// Split `classifier.ext` into classifier and extension.
fn split_extension(rest: &str) -> Option<(&str, &str)> {
    for &compound in COMPOUND_EXTENSIONS {
        if let Some(stem) = rest.strip_suffix(compound).and_then(|s| s.strip_suffix('.')) {
            if !stem.is_empty() {
                return Some((stem, compound));
            }
        }
    }
    let (stem, extension) = rest.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some((stem, extension))
}

/// Strip the version (or a timestamped form of a SNAPSHOT version) from the
/// start of `rest`. None means the file belongs to another version.
fn strip_version<'a>(rest: &'a str, version: &str) -> Option<&'a str> {
    if let Some(remainder) = rest.strip_prefix(version) {
        return ends_version(remainder).then_some(remainder);
    }

    let base = version.strip_suffix(SNAPSHOT_SUFFIX)?;
    let after_base = rest.strip_prefix(base)?;
    let consumed = snapshot_timestamp_len(after_base)?;
    let remainder = &after_base[consumed..];
    ends_version(remainder).then_some(remainder)
}

/// Whether the version stops at `remainder`: nothing left, a classifier, or
/// an extension. A numeric segment after a dot continues the version
/// (`1.0` + `.1.jar`).
fn ends_version(remainder: &str) -> bool {
    if remainder.is_empty() || remainder.starts_with('-') {
        return true;
    }
    match remainder.strip_prefix('.') {
        Some(extension) => {
            let first = extension.split('.').next().unwrap_or_default();
            first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Length of a leading `yyyyMMdd.HHmmss-N` build stamp, if present.
fn snapshot_timestamp_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let digits = |from: usize, count: usize| {
        bytes.len() >= from + count && bytes[from..from + count].iter().all(u8::is_ascii_digit)
    };

    if !digits(0, 8) || bytes.get(8) != Some(&b'.') || !digits(9, 6) || bytes.get(15) != Some(&b'-')
    {
        return None;
    }

    let build_digits = bytes[16..].iter().take_while(|b| b.is_ascii_digit()).count();
    if build_digits == 0 {
        return None;
    }
    Some(16 + build_digits)
}

fn file_facts(path: &Path) -> Option<(u64, i64)> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Some((metadata.len(), modified))
}
