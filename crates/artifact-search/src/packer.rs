//! Packed index snapshots.
//!
//! A snapshot is a gzip-compressed JSON-lines file: a header line followed by
//! one artifact record per line, sorted by identity key. Both the snapshot
//! and its properties file are written under a temporary name and renamed
//! into place, so readers never observe a partial pack.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ulid::Ulid;

use artifact_types::ArtifactRecord;

use crate::context::IndexContext;
use crate::error::SearchError;
use crate::searcher::ArtifactSearcher;

pub const SNAPSHOT_FILE: &str = "artifact-index.gz";
pub const PROPERTIES_FILE: &str = "artifact-index.properties";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// First line of a packed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub repository_id: String,
    pub created_at: DateTime<Utc>,
    /// Number of record lines that follow
    pub entries: u64,
}

/// What a pack wrote.
#[derive(Debug, Clone)]
pub struct PackSummary {
    pub snapshot_path: PathBuf,
    pub properties_path: PathBuf,
    pub entries: u64,
    pub created_at: DateTime<Utc>,
}

/// A snapshot read back from disk.
#[derive(Debug, Clone)]
pub struct PackedSnapshot {
    pub header: SnapshotHeader,
    pub records: Vec<ArtifactRecord>,
}

/// Publish the committed contents of `ctx` into `target`.
///
/// Staged but uncommitted changes are not included.
pub fn pack_index(ctx: &IndexContext, target: &Path) -> Result<PackSummary, SearchError> {
    let records = ArtifactSearcher::new(ctx).all_records()?;
    fs::create_dir_all(target)?;

    let header = SnapshotHeader {
        format_version: SNAPSHOT_FORMAT_VERSION,
        repository_id: ctx.repository_id().to_string(),
        created_at: Utc::now(),
        entries: records.len() as u64,
    };

    let snapshot_path = write_atomically(target, SNAPSHOT_FILE, |out| {
        let mut encoder = GzEncoder::new(out, Compression::default());
        serde_json::to_writer(&mut encoder, &header)?;
        encoder.write_all(b"\n")?;
        for record in &records {
            serde_json::to_writer(&mut encoder, record)?;
            encoder.write_all(b"\n")?;
        }
        encoder.finish()?;
        Ok(())
    })?;

    let properties_path = write_atomically(target, PROPERTIES_FILE, |out| {
        writeln!(out, "format.version={}", header.format_version)?;
        writeln!(out, "repository.id={}", header.repository_id)?;
        writeln!(out, "created.at={}", header.created_at.to_rfc3339())?;
        writeln!(out, "entries={}", header.entries)?;
        writeln!(out, "snapshot.file={}", SNAPSHOT_FILE)?;
        Ok(())
    })?;

    info!(
        repository = %header.repository_id,
        entries = header.entries,
        path = ?snapshot_path,
        "Packed index snapshot"
    );

    Ok(PackSummary {
        snapshot_path,
        properties_path,
        entries: header.entries,
        created_at: header.created_at,
    })
}

/// Load and validate the snapshot published in `target`.
pub fn read_snapshot(target: &Path) -> Result<PackedSnapshot, SearchError> {
    let path = target.join(SNAPSHOT_FILE);
    let file = File::open(&path).map_err(|e| {
        SearchError::Snapshot(format!("cannot open {}: {}", path.display(), e))
    })?;
    let mut lines = BufReader::new(GzDecoder::new(file)).lines();

    let header_line = lines
        .next()
        .ok_or_else(|| SearchError::Snapshot(format!("{} is empty", path.display())))??;
    let header: SnapshotHeader = serde_json::from_str(&header_line)?;
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SearchError::Snapshot(format!(
            "unsupported format version {}",
            header.format_version
        )));
    }

    let mut records = Vec::with_capacity(header.entries as usize);
    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<ArtifactRecord>(&line)?);
    }

    if records.len() as u64 != header.entries {
        return Err(SearchError::Snapshot(format!(
            "header announces {} entries, found {}",
            header.entries,
            records.len()
        )));
    }

    debug!(path = ?path, entries = records.len(), "Read index snapshot");
    Ok(PackedSnapshot { header, records })
}

/// Write `name` inside `dir` through a synced temporary file and a rename.
fn write_atomically(
    dir: &Path,
    name: &str,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), SearchError>,
) -> Result<PathBuf, SearchError> {
    let final_path = dir.join(name);
    let temp_path = dir.join(format!(".{}.{}.tmp", name, Ulid::new()));

    let result: Result<(), SearchError> = (|| {
        let mut out = BufWriter::new(File::create(&temp_path)?);
        write(&mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&temp_path, &final_path)?;
        Ok(())
    })();

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            warn!(path = ?temp_path, error = %cleanup, "Could not remove temporary pack file");
        }
        return Err(e);
    }
    Ok(final_path)
}
