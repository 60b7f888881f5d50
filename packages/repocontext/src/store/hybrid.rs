//! Hybrid storage orchestrator: ties the chunk store, the relational
//! index, and the manifest together behind replace-or-insert semantics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::chunking::{ChunkingStrategy, FileChunkingStrategy};
use crate::error::{RepoContextError, Result};
use crate::model::{CallRelation, FileContext, IndexEntry, ManifestChunkEntry, TypeDef};

use super::chunk_store::ChunkStore;
use super::manifest::ManifestStore;
use super::relational::RelationalIndex;

const SEPARATOR_START: &str = "// --- Function body starts ---";
const SEPARATOR_END: &str = "// --- Function body ends ---";

/// The body of a function plus surrounding context lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionImplementation {
    pub name: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub body: String,
    pub context: String,
}

/// Orchestrates the chunk blob store, the relational index, and the manifest.
pub struct HybridStorage {
    root: PathBuf,
    chunk_store: ChunkStore,
    relational: RelationalIndex,
    manifest: ManifestStore,
    strategy: Arc<dyn ChunkingStrategy>,
}

impl HybridStorage {
    /// Initialize storage rooted at `<root>/.repocontext/`.
    #[instrument(skip(root), fields(root = %root.as_ref().display()))]
    pub fn initialize(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let base_dir = root.join(".repocontext");
        fs::create_dir_all(&base_dir)?;

        let chunks_dir = base_dir.join("chunks");
        let chunk_store = ChunkStore::new(&chunks_dir)?;
        let relational = RelationalIndex::open(base_dir.join("index.db"))?;
        let manifest = ManifestStore::new(&base_dir)?;

        // Loads or creates manifest.json with defaults.
        let initial = manifest.load()?;
        manifest.save(&initial)?;

        debug!(base_dir = %base_dir.display(), "hybrid storage initialized");

        Ok(Self {
            root,
            chunk_store,
            relational,
            manifest,
            strategy: Arc::new(FileChunkingStrategy),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace-or-insert a single file's parsed context.
    #[instrument(skip(self, fc), fields(path = %fc.path))]
    pub fn store_file_context(&self, fc: FileContext) -> Result<()> {
        self.delete_file(&fc.path)?;

        let chunks = self.strategy.create(vec![fc]);
        for chunk in &chunks {
            self.chunk_store.save(chunk)?;
            self.relational
                .insert_chunk(&chunk.id, &chunk.files, chunk.token_count, chunk.created_at)?;

            let mut entries = Vec::new();
            let mut relations = Vec::new();
            for file_data in &chunk.file_data {
                emit_entries_and_relations(file_data, &chunk.id, &mut entries, &mut relations);
            }
            self.relational.insert_entries(&entries)?;
            self.relational.insert_call_relations(&relations)?;

            let mut manifest = self.manifest.load()?;
            let size = fs::metadata(self.chunk_blob_path(&chunk.id))
                .map(|m| m.len())
                .unwrap_or(0);
            manifest.chunks.insert(
                chunk.id.clone(),
                ManifestChunkEntry {
                    files: chunk.files.clone(),
                    size,
                    token_count: chunk.token_count,
                    updated_at: Utc::now(),
                },
            );
            manifest.touch();
            self.manifest.save(&manifest)?;
        }

        Ok(())
    }

    fn chunk_blob_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(".repocontext").join("chunks").join(format!("{}.bin", chunk_id))
    }

    /// Remove any prior chunk owning `path`, cascaded. Missing is not an
    /// error; a decode failure on the candidate chunk is treated as a
    /// best-effort skip.
    #[instrument(skip(self))]
    pub fn delete_file(&self, path: &str) -> Result<()> {
        let chunk_id = match self.relational.find_chunk_owning_file(path)? {
            Some(id) => id,
            None => return Ok(()),
        };

        if let Err(e) = self.chunk_store.load(&chunk_id) {
            warn!(chunk_id = %chunk_id, error = %e, "skipping unreadable candidate chunk during delete_file");
        }

        self.chunk_store.delete(&chunk_id)?;
        self.relational.delete_chunk(&chunk_id)?;

        let mut manifest = self.manifest.load()?;
        manifest.chunks.remove(&chunk_id);
        manifest.touch();
        self.manifest.save(&manifest)?;

        Ok(())
    }

    pub fn query_by_name(&self, name: &str) -> Result<Vec<IndexEntry>> {
        self.relational.query_by_name(name)
    }

    pub fn query_by_names(&self, names: &[String]) -> Result<Vec<IndexEntry>> {
        self.relational.query_by_names(names)
    }

    pub fn query_by_type(&self, entry_type: &str) -> Result<Vec<IndexEntry>> {
        self.relational.query_by_type(entry_type)
    }

    pub fn query_by_types(&self, types: &[String]) -> Result<Vec<IndexEntry>> {
        self.relational.query_by_types(types)
    }

    pub fn query_in_file(&self, file: &str) -> Result<Vec<IndexEntry>> {
        self.relational.query_in_file(file)
    }

    pub fn query_calls_from(&self, caller: &str) -> Result<Vec<CallRelation>> {
        self.relational.query_calls_from(caller)
    }

    pub fn query_calls_to(&self, callee: &str) -> Result<Vec<CallRelation>> {
        self.relational.query_calls_to(callee)
    }

    pub fn distinct_files(&self) -> Result<Vec<String>> {
        self.relational.distinct_files()
    }

    pub fn load_chunk(&self, chunk_id: &str) -> Result<crate::model::SemanticChunk> {
        self.chunk_store.load(chunk_id)
    }

    /// Function-body extraction with surrounding context lines.
    pub fn get_function_implementation(&self, name: &str, context_lines: u32) -> Result<FunctionImplementation> {
        let entries = self.relational.query_by_name(name)?;
        let entry = entries
            .into_iter()
            .find(|e| e.entry_type == "function")
            .ok_or_else(|| RepoContextError::not_found(format!("function '{}' not found", name)))?;

        let source = match fs::read_to_string(self.root.join(&entry.file)) {
            Ok(s) => s,
            Err(_) => return Ok(placeholder_implementation(&entry)),
        };
        let lines: Vec<&str> = source.lines().collect();

        if entry.start_line < 1
            || entry.end_line < entry.start_line
            || entry.end_line as usize > lines.len()
        {
            return Ok(placeholder_implementation(&entry));
        }

        let start_idx = (entry.start_line - 1) as usize;
        let end_idx = entry.end_line as usize;
        let body = lines[start_idx..end_idx].join("\n");

        let before_start = entry.start_line.saturating_sub(context_lines).max(1) as usize;
        let before: Vec<String> = (before_start..entry.start_line as usize)
            .filter_map(|n| lines.get(n - 1).map(|l| format!("{}: {}", n, l)))
            .collect();

        let after_end = (entry.end_line + context_lines).min(lines.len() as u32) as usize;
        let after: Vec<String> = ((entry.end_line as usize + 1)..=after_end)
            .filter_map(|n| lines.get(n - 1).map(|l| format!("{}: {}", n, l)))
            .collect();

        let mut context_parts = Vec::new();
        if !before.is_empty() {
            context_parts.push(before.join("\n"));
            context_parts.push(SEPARATOR_START.to_string());
        }
        context_parts.push(SEPARATOR_END.to_string());
        if !after.is_empty() {
            context_parts.push(after.join("\n"));
        }

        Ok(FunctionImplementation {
            name: entry.name,
            file: entry.file,
            start_line: entry.start_line,
            end_line: entry.end_line,
            body,
            context: context_parts.join("\n"),
        })
    }

    pub fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn placeholder_implementation(entry: &IndexEntry) -> FunctionImplementation {
    FunctionImplementation {
        name: entry.name.clone(),
        file: entry.file.clone(),
        start_line: entry.start_line,
        end_line: entry.end_line,
        body: format!("// body unavailable: invalid line range [{}, {}]", entry.start_line, entry.end_line),
        context: "// no context available".to_string(),
    }
}

/// Index-entry and call-relation emission rules.
fn emit_entries_and_relations(
    fc: &FileContext,
    chunk_id: &str,
    entries: &mut Vec<IndexEntry>,
    relations: &mut Vec<CallRelation>,
) {
    for f in &fc.functions {
        entries.push(IndexEntry {
            name: f.name.clone(),
            entry_type: "function".to_string(),
            file: fc.path.clone(),
            start_line: f.start_line,
            end_line: f.end_line,
            chunk_id: chunk_id.to_string(),
            signature: f.signature.clone(),
        });

        for site in f.resolved_call_sites() {
            relations.push(CallRelation {
                caller: f.name.clone(),
                callee: site.name,
                file: fc.path.clone(),
                line: site.line,
                caller_file: fc.path.clone(),
            });
        }
    }

    for t in &fc.types {
        entries.push(IndexEntry {
            name: t.name.clone(),
            entry_type: t.kind.as_str().to_string(),
            file: fc.path.clone(),
            start_line: t.start_line,
            end_line: t.end_line,
            chunk_id: chunk_id.to_string(),
            signature: type_signature(t),
        });
    }

    for v in &fc.variables {
        entries.push(IndexEntry {
            name: v.name.clone(),
            entry_type: "variable".to_string(),
            file: fc.path.clone(),
            start_line: v.start_line.unwrap_or(1),
            end_line: v.end_line.unwrap_or(v.start_line.unwrap_or(1)),
            chunk_id: chunk_id.to_string(),
            signature: v.type_name.clone().unwrap_or_default(),
        });
    }

    for c in &fc.constants {
        entries.push(IndexEntry {
            name: c.name.clone(),
            entry_type: "constant".to_string(),
            file: fc.path.clone(),
            start_line: c.start_line.unwrap_or(1),
            end_line: c.end_line.unwrap_or(c.start_line.unwrap_or(1)),
            chunk_id: chunk_id.to_string(),
            signature: c.type_name.clone().unwrap_or_default(),
        });
    }
}

fn type_signature(t: &TypeDef) -> String {
    if t.embedded.is_empty() {
        t.name.clone()
    } else {
        format!("{}({})", t.name, t.embedded.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Function;
    use tempfile::tempdir;

    fn go_file(path: &str, functions: Vec<Function>) -> FileContext {
        let mut fc = FileContext::new(path, "go", "deadbeef");
        fc.functions = functions;
        fc
    }

    #[test]
    fn store_file_context_emits_entries_and_relations() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();

        let mut main_fn = Function::new("main", "func main()", 1, 3);
        main_fn.calls = vec!["createUser".to_string()];
        storage.store_file_context(go_file("main.go", vec![main_fn])).unwrap();

        let entries = storage.query_by_name("main").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, "function");

        let relations = storage.query_calls_from("main").unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].callee, "createUser");
    }

    #[test]
    fn replace_on_write_removes_stale_entries() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();

        let foo = Function::new("foo", "func foo()", 1, 1);
        let bar = Function::new("bar", "func bar()", 2, 2);
        storage.store_file_context(go_file("u.go", vec![foo.clone(), bar])).unwrap();
        assert_eq!(storage.query_by_name("bar").unwrap().len(), 1);

        storage.store_file_context(go_file("u.go", vec![foo])).unwrap();
        assert!(storage.query_by_name("bar").unwrap().is_empty());

        let remaining_ids: Vec<String> = storage.chunk_store.list().unwrap();
        assert_eq!(remaining_ids.len(), 1);
    }

    #[test]
    fn delete_file_on_missing_path_is_a_no_op() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();
        storage.delete_file("does-not-exist.go").unwrap();
    }

    #[test]
    fn get_function_implementation_extracts_body_with_context() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();

        let source = "package main\n\nfunc greet() {\n\tprintln(\"hi\")\n}\n\nfunc other() {}\n";
        fs::write(dir.path().join("main.go"), source).unwrap();

        let greet = Function::new("greet", "func greet()", 3, 5);
        storage.store_file_context(go_file("main.go", vec![greet])).unwrap();

        let implementation = storage.get_function_implementation("greet", 1).unwrap();
        assert!(implementation.body.contains("println"));
        assert!(implementation.context.contains(SEPARATOR_END));
    }

    #[test]
    fn get_function_implementation_returns_placeholder_on_invalid_range() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();

        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        let broken = Function::new("broken", "func broken()", 50, 60);
        storage.store_file_context(go_file("main.go", vec![broken])).unwrap();

        let implementation = storage.get_function_implementation("broken", 2).unwrap();
        assert!(implementation.body.contains("unavailable"));
    }

    #[test]
    fn get_function_implementation_missing_function_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = HybridStorage::initialize(dir.path()).unwrap();
        let err = storage.get_function_implementation("nope", 1).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
    }
}
