//! Repository scans that rebuild or reconcile a context's index.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use artifact_types::{ArtifactRecord, ScanMode, ScanStats};

use crate::context::IndexContext;
use crate::error::SearchError;
use crate::extractor::extract_artifact;
use crate::indexer::ArtifactIndexer;
use crate::searcher::ArtifactSearcher;

/// Walk the repository and bring the index in line with its contents.
///
/// Full mode clears the index first. Incremental mode adds new files,
/// replaces entries whose file changed and removes entries whose file is
/// gone. Changes are committed once at the end; on failure everything staged
/// by this scan is rolled back.
pub fn scan_repository(ctx: &IndexContext, mode: ScanMode) -> Result<ScanStats, SearchError> {
    let indexer = ArtifactIndexer::new(ctx);
    match reconcile(ctx, &indexer, mode) {
        Ok(stats) => {
            indexer.commit()?;
            info!(
                repository = %ctx.repository_id(),
                mode = %mode,
                scanned = stats.scanned_files,
                added = stats.added,
                updated = stats.updated,
                removed = stats.removed,
                errors = stats.errors,
                "Scanned repository"
            );
            Ok(stats)
        }
        Err(e) => {
            if let Err(rollback_err) = indexer.rollback() {
                warn!(error = %rollback_err, "Rollback after failed scan failed");
            }
            Err(e)
        }
    }
}

fn reconcile(
    ctx: &IndexContext,
    indexer: &ArtifactIndexer<'_>,
    mode: ScanMode,
) -> Result<ScanStats, SearchError> {
    let mut stats = ScanStats::new();
    let found = collect_records(ctx, &mut stats)?;

    match mode {
        ScanMode::Full => {
            indexer.delete_all()?;
            for record in found.values() {
                indexer.add(record)?;
                stats.added += 1;
            }
        }
        ScanMode::Incremental => {
            let mut existing: BTreeMap<String, ArtifactRecord> = ArtifactSearcher::new(ctx)
                .all_records()?
                .into_iter()
                .map(|r| (r.uinfo(), r))
                .collect();

            for (uinfo, record) in &found {
                match existing.remove(uinfo) {
                    None => {
                        indexer.add(record)?;
                        stats.added += 1;
                    }
                    Some(old) if old.last_modified != record.last_modified => {
                        indexer.delete(uinfo)?;
                        indexer.add(record)?;
                        stats.updated += 1;
                    }
                    Some(_) => stats.unchanged += 1,
                }
            }

            for uinfo in existing.keys() {
                indexer.delete(uinfo)?;
                stats.removed += 1;
            }
        }
    }

    Ok(stats)
}

/// Extract every artifact under the repository root, keyed by identity.
fn collect_records(
    ctx: &IndexContext,
    stats: &mut ScanStats,
) -> Result<BTreeMap<String, ArtifactRecord>, SearchError> {
    let root = ctx.repository_root();
    let excluded = excluded_dirs(ctx);
    let mut found = BTreeMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, &excluded));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        stats.scanned_files += 1;

        match extract_artifact(root, entry.path()) {
            Ok(Some(record)) => {
                found.insert(record.uinfo(), record);
            }
            Ok(None) => {
                stats.skipped += 1;
            }
            Err(SearchError::InvalidCoordinate(reason)) => {
                warn!(path = ?entry.path(), %reason, "Skipping file with invalid coordinates");
                stats.errors += 1;
            }
            Err(e) => return Err(e),
        }
    }

    debug!(root = ?root, artifacts = found.len(), "Collected repository artifacts");
    Ok(found)
}

/// The live index and the snapshot directory, when they sit inside the repository.
fn excluded_dirs(ctx: &IndexContext) -> Vec<PathBuf> {
    let mut dirs = vec![ctx.repository().index_location()];
    if let Some(live) = ctx.index_directory() {
        dirs.push(live);
    }
    dirs
}

fn is_skipped(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let hidden = entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false);
    hidden || excluded.iter().any(|dir| entry.path() == dir.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextConfig, ContextTable};
    use artifact_types::ManagedRepository;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        ctx: Arc<IndexContext>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("repo");
        std::fs::create_dir_all(&root).unwrap();
        let table = ContextTable::new(ContextConfig::new(dir.path().join("idx")).with_memory_mb(15));
        let id = table
            .open_for(&ManagedRepository::new("internal", &root))
            .unwrap();
        let ctx = table.get(id).unwrap();
        Fixture {
            _dir: dir,
            root,
            ctx,
        }
    }

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn uinfos(ctx: &IndexContext) -> Vec<String> {
        ArtifactSearcher::new(ctx)
            .all_records()
            .unwrap()
            .iter()
            .map(|r| r.uinfo())
            .collect()
    }

    #[test]
    fn test_full_scan_indexes_artifacts() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        write(&f.root, "com/x/lib/1.0/lib-1.0.pom", b"pom");
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar.sha1", b"sha");
        write(&f.root, "com/x/lib/maven-metadata.xml", b"<metadata/>");

        let stats = scan_repository(&f.ctx, ScanMode::Full).unwrap();
        assert_eq!(stats.scanned_files, 4);
        assert_eq!(stats.added, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(
            uinfos(&f.ctx),
            vec!["com.x|lib|1.0|NA|jar", "com.x|lib|1.0|NA|pom"]
        );
    }

    #[test]
    fn test_full_scan_replaces_previous_contents() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        scan_repository(&f.ctx, ScanMode::Full).unwrap();

        std::fs::remove_file(f.root.join("com/x/lib/1.0/lib-1.0.jar")).unwrap();
        write(&f.root, "com/x/lib/2.0/lib-2.0.jar", b"jar");
        scan_repository(&f.ctx, ScanMode::Full).unwrap();

        assert_eq!(uinfos(&f.ctx), vec!["com.x|lib|2.0|NA|jar"]);
    }

    #[test]
    fn test_incremental_scan_reconciles() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        write(&f.root, "com/x/lib/1.1/lib-1.1.jar", b"jar");
        scan_repository(&f.ctx, ScanMode::Full).unwrap();

        std::fs::remove_file(f.root.join("com/x/lib/1.1/lib-1.1.jar")).unwrap();
        write(&f.root, "com/x/lib/2.0/lib-2.0.jar", b"jar");

        let stats = scan_repository(&f.ctx, ScanMode::Incremental).unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(
            uinfos(&f.ctx),
            vec!["com.x|lib|1.0|NA|jar", "com.x|lib|2.0|NA|jar"]
        );
    }

    #[test]
    fn test_incremental_scan_updates_changed_files() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        scan_repository(&f.ctx, ScanMode::Full).unwrap();

        let path = f.root.join("com/x/lib/1.0/lib-1.0.jar");
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(86_400))
            .unwrap();

        let stats = scan_repository(&f.ctx, ScanMode::Incremental).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(ArtifactSearcher::new(&f.ctx).count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_coordinates_are_counted() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-2.0.jar", b"jar");
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");

        let stats = scan_repository(&f.ctx, ScanMode::Full).unwrap();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.added, 1);
        assert!(stats.has_errors());
    }

    #[test]
    fn test_hidden_and_index_dirs_are_skipped() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        write(&f.root, ".indexer/com/x/lib/1.0/lib-1.0.pom", b"pom");
        write(&f.root, ".cache/com/y/z/1.0/z-1.0.jar", b"jar");

        let stats = scan_repository(&f.ctx, ScanMode::Full).unwrap();
        assert_eq!(stats.scanned_files, 1);
        assert_eq!(uinfos(&f.ctx), vec!["com.x|lib|1.0|NA|jar"]);
    }

    #[test]
    fn test_missing_root_fails_without_changes() {
        let f = fixture();
        write(&f.root, "com/x/lib/1.0/lib-1.0.jar", b"jar");
        scan_repository(&f.ctx, ScanMode::Full).unwrap();

        std::fs::remove_dir_all(&f.root).unwrap();
        let result = scan_repository(&f.ctx, ScanMode::Full);
        assert!(matches!(result, Err(SearchError::Walk(_))));
        assert_eq!(uinfos(&f.ctx), vec!["com.x|lib|1.0|NA|jar"]);
    }
}
