//! Content-addressed binary blob store.
//!
//! Grounded on `codegraph-ir`'s own file-backed chunk persistence idea
//! (features/chunking/infrastructure/chunk_store.rs keeps chunks in
//! memory with a file index; here the same file→chunk relationship is
//! persisted to disk as one blob per chunk) and on
//! `codegraph-storage`'s `SqliteSnapshotStore` placeholder, which this
//! module actually implements for the blob half of the hybrid store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RepoContextError, Result};
use crate::model::SemanticChunk;

/// Scoped, owner-only-permissions store of `SemanticChunk` blobs under a
/// base directory.
pub struct ChunkStore {
    base_dir: PathBuf,
}

impl ChunkStore {
    /// Open (creating on first use) a chunk store rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn blob_path(&self, chunk_id: &str) -> Result<PathBuf> {
        validate_chunk_id(chunk_id)?;
        let path = self.base_dir.join(format!("{}.bin", chunk_id));

        // Path-traversal defense: the resolved path must remain inside
        // base_dir even after validate_chunk_id's syntactic check.
        let resolved_parent = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.base_dir.clone());
        if resolved_parent != self.base_dir {
            return Err(RepoContextError::invalid_path(format!(
                "chunk id '{}' escapes chunk store base directory",
                chunk_id
            )));
        }
        Ok(path)
    }

    /// Serialize and atomically write a chunk to `{base}/{chunk_id}.bin`.
    pub fn save(&self, chunk: &SemanticChunk) -> Result<()> {
        let path = self.blob_path(&chunk.id)?;
        let bytes = rmp_serde::to_vec_named(chunk)?;

        let tmp_path = path.with_extension("bin.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        set_owner_only(&path)?;
        Ok(())
    }

    /// Load and decode a chunk by ID.
    pub fn load(&self, chunk_id: &str) -> Result<SemanticChunk> {
        let path = self.blob_path(chunk_id)?;
        if !path.exists() {
            return Err(RepoContextError::not_found(format!(
                "chunk '{}' not found",
                chunk_id
            )));
        }
        let bytes = fs::read(&path)?;
        let chunk: SemanticChunk = rmp_serde::from_slice(&bytes)
            .map_err(|e| RepoContextError::corrupt(format!("chunk '{}' decode failed: {}", chunk_id, e)))?;
        Ok(chunk)
    }

    /// Remove a chunk's blob. Missing is not an error.
    pub fn delete(&self, chunk_id: &str) -> Result<()> {
        let path = self.blob_path(chunk_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Enumerate known chunk IDs. Missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("bin") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }
}

/// Validate a caller-provided chunk ID before it ever touches the
/// filesystem: non-empty, no `..`, `/`, `\`.
fn validate_chunk_id(chunk_id: &str) -> Result<()> {
    if chunk_id.is_empty() {
        return Err(RepoContextError::invalid_chunk_id("chunk id must not be empty"));
    }
    if chunk_id.contains("..") || chunk_id.contains('/') || chunk_id.contains('\\') {
        return Err(RepoContextError::invalid_chunk_id(format!(
            "chunk id '{}' contains a path-traversal sequence",
            chunk_id
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileContext;
    use tempfile::tempdir;

    fn sample_chunk(id: &str) -> SemanticChunk {
        SemanticChunk::new(id, vec![FileContext::new("a.go", "go", "hash")], 10)
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        let chunk = sample_chunk("chunk-abc");

        store.save(&chunk).unwrap();
        let loaded = store.load("chunk-abc").unwrap();

        assert_eq!(loaded.id, chunk.id);
        assert_eq!(loaded.files, chunk.files);
        assert_eq!(loaded.token_count, chunk.token_count);
    }

    #[test]
    fn load_missing_chunk_returns_not_found() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        let err = store.load("does-not-exist").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn load_corrupt_blob_returns_corrupt() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("broken.bin"), b"not a valid chunk").unwrap();

        let err = store.load("broken").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Corrupt);
    }

    #[test]
    fn delete_missing_chunk_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        store.delete("never-existed").unwrap();
    }

    #[test]
    fn list_reflects_saved_chunks() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        store.save(&sample_chunk("chunk-1")).unwrap();
        store.save(&sample_chunk("chunk-2")).unwrap();

        let mut ids = store.list().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["chunk-1".to_string(), "chunk-2".to_string()]);
    }

    #[test]
    fn list_on_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist-yet");
        // constructing the store creates the dir, so remove it again to
        // exercise the missing-directory path of list().
        let store = ChunkStore::new(&missing).unwrap();
        fs::remove_dir_all(&missing).unwrap();
        assert_eq!(store.list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn rejects_chunk_id_with_path_traversal() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        let err = store.load("../../etc/passwd").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidChunkId);
    }

    #[test]
    fn rejects_chunk_id_with_slash() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        let err = store.load("nested/chunk").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidChunkId);
    }

    #[test]
    fn rejects_empty_chunk_id() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(dir.path()).unwrap();
        let err = store.load("").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidChunkId);
    }

    #[test]
    fn saved_blob_has_owner_only_permissions() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir = tempdir().unwrap();
            let store = ChunkStore::new(dir.path()).unwrap();
            store.save(&sample_chunk("chunk-perm")).unwrap();
            let meta = fs::metadata(dir.path().join("chunk-perm.bin")).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }
}
