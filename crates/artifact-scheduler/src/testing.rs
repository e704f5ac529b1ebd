//! In-memory collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use artifact_indexing::{
    BoxError, ContextProvider, DescriptorExtractor, ExecutorConfig, IndexEngine, IndexPublisher,
    IndexingTaskExecutor,
};
use artifact_types::{
    ArtifactDescriptor, ArtifactQuery, ArtifactRecord, ContextId, ManagedRepository, ScanMode,
    ScanStats,
};

/// Records adds and scans. Each entry in `scan_failures` fails one scan;
/// extracting a `.panic` file panics.
#[derive(Default)]
pub(crate) struct Fake {
    pub added: Mutex<Vec<String>>,
    pub scans: Mutex<Vec<(ContextId, ScanMode)>>,
    pub scan_failures: Mutex<VecDeque<()>>,
    pub contexts_created: Mutex<u32>,
    pub refuse_contexts: bool,
}

impl ContextProvider for Fake {
    fn create_context(&self, _repository: &ManagedRepository) -> Result<ContextId, BoxError> {
        if self.refuse_contexts {
            return Err("index directory is locked".into());
        }
        *self.contexts_created.lock().unwrap() += 1;
        Ok(ContextId::new(1))
    }

    fn index_directory(&self, _context: ContextId) -> Option<PathBuf> {
        Some(PathBuf::from("/index"))
    }

    fn update_timestamp(&self, _context: ContextId, _persist: bool) -> Result<(), BoxError> {
        Ok(())
    }
}

impl DescriptorExtractor for Fake {
    fn extract(&self, _context: ContextId, file: &Path) -> Result<Option<ArtifactRecord>, BoxError> {
        let name = file.to_string_lossy().to_string();
        if name.ends_with(".txt") {
            return Ok(None);
        }
        if name.ends_with(".panic") {
            panic!("extractor crashed on {}", name);
        }
        Ok(Some(ArtifactRecord::new(
            ArtifactDescriptor::new("com.x", name.clone(), "1.0"),
            name,
        )))
    }
}

impl IndexEngine for Fake {
    fn add_entry(&self, _context: ContextId, record: &ArtifactRecord) -> Result<(), BoxError> {
        self.added.lock().unwrap().push(record.file_name.clone());
        Ok(())
    }

    fn delete_entry(&self, _context: ContextId, _descriptor: &ArtifactDescriptor) -> Result<(), BoxError> {
        Ok(())
    }

    fn search(
        &self,
        _context: ContextId,
        _query: &ArtifactQuery,
        _limit: usize,
    ) -> Result<Vec<ArtifactDescriptor>, BoxError> {
        Ok(Vec::new())
    }

    fn scan(&self, context: ContextId, mode: ScanMode) -> Result<ScanStats, BoxError> {
        self.scans.lock().unwrap().push((context, mode));
        if self.scan_failures.lock().unwrap().pop_front().is_some() {
            return Err("disk unavailable".into());
        }
        Ok(ScanStats::new())
    }

    fn optimize(&self, _context: ContextId) -> Result<(), BoxError> {
        Ok(())
    }
}

impl IndexPublisher for Fake {
    fn pack(&self, _context: ContextId, _target: &Path) -> Result<(), BoxError> {
        Ok(())
    }
}

pub(crate) fn executor(fake: &Arc<Fake>) -> Arc<IndexingTaskExecutor> {
    Arc::new(IndexingTaskExecutor::new(
        fake.clone(),
        fake.clone(),
        fake.clone(),
        fake.clone(),
        ExecutorConfig::default(),
    ))
}

pub(crate) fn repository() -> Arc<ManagedRepository> {
    Arc::new(ManagedRepository::new("internal", "/srv/repo"))
}
