//! Manifest persistence: `manifest.json` listing every known chunk and
//! its summary metadata.
//!
//! Grounded on the same load-or-create, atomic-rewrite idiom as
//! `chunk_store.rs`; kept as a thin sibling rather than folded into it
//! because the manifest is JSON (human-inspectable) while chunk blobs
//! are MessagePack (compact, not meant to be read by hand).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Manifest;

pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;
        Ok(Self {
            path: base_dir.join("manifest.json"),
        })
    }

    /// Load the manifest, creating a fresh empty one on first use.
    pub fn load(&self) -> Result<Manifest> {
        if !self.path.exists() {
            return Ok(Manifest::new());
        }
        let bytes = fs::read(&self.path)?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        Ok(manifest)
    }

    /// Atomically overwrite the manifest file.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ManifestChunkEntry;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn load_without_existing_file_yields_fresh_manifest() {
        let dir = tempdir().unwrap();
        let store = ManifestStore::new(dir.path()).unwrap();
        let manifest = store.load().unwrap();
        assert!(manifest.chunks.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ManifestStore::new(dir.path()).unwrap();
        let mut manifest = Manifest::new();
        manifest.chunks.insert(
            "chunk-1".to_string(),
            ManifestChunkEntry {
                files: vec!["a.go".to_string()],
                size: 99,
                token_count: 5,
                updated_at: Utc::now(),
            },
        );

        store.save(&manifest).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.chunks.len(), 1);
        assert_eq!(loaded.chunks["chunk-1"].files, vec!["a.go".to_string()]);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempdir().unwrap();
        let store = ManifestStore::new(dir.path()).unwrap();

        store.save(&Manifest::new()).unwrap();
        let mut second = Manifest::new();
        second.chunks.insert(
            "chunk-2".to_string(),
            ManifestChunkEntry {
                files: vec!["b.go".to_string()],
                size: 1,
                token_count: 1,
                updated_at: Utc::now(),
            },
        );
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.chunks.len(), 1);
        assert!(loaded.chunks.contains_key("chunk-2"));
    }
}
