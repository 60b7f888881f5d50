//! Index builder: walks a source tree, dispatches to parsers, runs
//! global enrichment, and persists through hybrid storage.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rayon::prelude::*;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::config::IndexConfig;
use crate::error::{RepoContextError, Result};
use crate::graph::enrich;
use crate::model::FileContext;
use crate::parsing::ParserRegistry;
use crate::store::HybridStorage;

/// Summary of one `build_index` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStatistics {
    pub files_processed: usize,
    pub functions_indexed: usize,
    pub types_indexed: usize,
    pub variables_indexed: usize,
    pub constants_indexed: usize,
    pub calls_indexed: usize,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub duration: Duration,
}

/// Walks a source tree and persists every parseable file through
/// `HybridStorage`.
pub struct IndexBuilder {
    registry: Arc<ParserRegistry>,
    storage: HybridStorage,
    closed: AtomicBool,
}

impl IndexBuilder {
    pub fn new(storage: HybridStorage, registry: Arc<ParserRegistry>) -> Self {
        Self {
            registry,
            storage,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(RepoContextError::not_initialized("index builder has been closed"))
        } else {
            Ok(())
        }
    }

    /// Full walk-parse-enrich-store cycle.
    #[instrument(skip(self, config))]
    pub fn build_index(&self, config: &IndexConfig) -> Result<IndexStatistics> {
        self.ensure_open()?;
        let start_time = SystemTime::now();

        let root = config.root.canonicalize().map_err(|e| {
            RepoContextError::invalid_path(format!("root does not exist: {}", e))
        })?;

        let candidates = collect_candidate_paths(&root);

        let parsed: Vec<FileContext> = candidates
            .par_iter()
            .filter_map(|path| self.parse_one(path).transpose())
            .collect::<Result<Vec<_>>>()?;

        let enriched = if config.enrich {
            enrich(parsed)
        } else {
            parsed
        };

        let mut stats = IndexStatistics {
            files_processed: 0,
            functions_indexed: 0,
            types_indexed: 0,
            variables_indexed: 0,
            constants_indexed: 0,
            calls_indexed: 0,
            start_time,
            end_time: start_time,
            duration: Duration::default(),
        };

        for fc in enriched {
            accumulate(&mut stats, &fc);
            self.storage.store_file_context(fc)?;
        }

        stats.end_time = SystemTime::now();
        stats.duration = stats
            .end_time
            .duration_since(stats.start_time)
            .unwrap_or_default();

        info!(
            files = stats.files_processed,
            functions = stats.functions_indexed,
            "build_index complete"
        );

        Ok(stats)
    }

    /// Parse and store one file without running global enrichment
    /// (suitable for incremental updates).
    #[instrument(skip(self))]
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_open()?;
        let path = path.as_ref();
        if let Some(fc) = self.parse_one(path)? {
            self.storage.store_file_context(fc)?;
        }
        Ok(())
    }

    /// Parse one candidate path, returning `None` for unknown
    /// extensions (skipped, not an error).
    fn parse_one(&self, path: &Path) -> Result<Option<FileContext>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let extension = match extension {
            Some(ext) => ext,
            None => return Ok(None),
        };

        let parser = match self.registry.lookup(&extension) {
            Some(parser) => parser,
            None => return Ok(None),
        };

        let bytes = std::fs::read(path)?;
        let path_str = path.to_string_lossy().to_string();
        let fc = parser.parse_file(&path_str, &bytes)?;
        Ok(Some(fc))
    }

    /// Release resources. Idempotent; tolerant of being called more than
    /// once.
    pub fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.storage.close()
    }
}

/// Recursively walk `root`, rejecting any entry whose canonicalized path
/// escapes the canonicalized root (path-traversal inputs are skipped
/// silently).
fn collect_candidate_paths(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match path.canonicalize() {
            Ok(canonical) if canonical.starts_with(root) => out.push(path.to_path_buf()),
            _ => continue,
        }
    }
    out
}

fn accumulate(stats: &mut IndexStatistics, fc: &FileContext) {
    stats.files_processed += 1;
    stats.functions_indexed += fc.functions.len();
    stats.types_indexed += fc.types.len();
    stats.variables_indexed += fc.variables.len();
    stats.constants_indexed += fc.constants.len();
    stats.calls_indexed += fc.functions.iter().map(|f| f.calls.len()).sum::<usize>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::Function;
    use sha2::{Digest, Sha256};
    use tempfile::tempdir;

    struct GoStubParser;

    impl crate::parsing::LanguageParser for GoStubParser {
        fn parse_file(&self, path: &str, bytes: &[u8]) -> Result<FileContext> {
            let checksum = format!("{:x}", Sha256::digest(bytes));
            let mut fc = FileContext::new(path, "go", checksum);
            let text = String::from_utf8_lossy(bytes);
            if text.contains("func main") {
                let mut f = Function::new("main", "func main()", 1, 1);
                f.calls = vec!["helper".to_string()];
                fc.functions.push(f);
            }
            Ok(fc)
        }

        fn supported_extensions(&self) -> &[&str] {
            &["go"]
        }

        fn language_name(&self) -> &'static str {
            "go"
        }
    }

    fn builder_with_stub(root: &Path) -> IndexBuilder {
        let storage = HybridStorage::initialize(root).unwrap();
        let registry = Arc::new(ParserRegistry::new());
        registry.register(Arc::new(GoStubParser));
        IndexBuilder::new(storage, registry)
    }

    #[test]
    fn build_index_on_empty_repository_yields_zeroed_statistics() {
        let dir = tempdir().unwrap();
        let builder = builder_with_stub(dir.path());
        let stats = builder.build_index(&IndexConfig::new(dir.path())).unwrap();

        assert_eq!(stats.files_processed, 0);
        assert_eq!(stats.functions_indexed, 0);
    }

    #[test]
    fn build_index_parses_and_stores_matching_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\nfunc main(){}\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "not code").unwrap();

        let builder = builder_with_stub(dir.path());
        let stats = builder.build_index(&IndexConfig::new(dir.path())).unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.functions_indexed, 1);
        assert_eq!(stats.calls_indexed, 1);
    }

    #[test]
    fn process_file_skips_global_enrichment() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("main.go");
        std::fs::write(&file_path, "package main\nfunc main(){}\n").unwrap();

        let builder = builder_with_stub(dir.path());
        builder.process_file(&file_path).unwrap();

        let entries = builder.storage.query_by_name("main").unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn closed_builder_rejects_further_operations() {
        let dir = tempdir().unwrap();
        let builder = builder_with_stub(dir.path());
        builder.close().unwrap();

        let err = builder.build_index(&IndexConfig::new(dir.path())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotInitialized);
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let builder = builder_with_stub(dir.path());
        builder.close().unwrap();
        builder.close().unwrap();
    }
}
