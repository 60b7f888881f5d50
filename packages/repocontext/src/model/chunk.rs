//! Durable chunk and manifest types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file_context::FileContext;

/// The durable archive of rich per-file data referenced by one or more
/// `IndexEntry` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticChunk {
    pub id: String,
    pub files: Vec<String>,
    pub file_data: Vec<FileContext>,
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

impl SemanticChunk {
    pub fn new(id: impl Into<String>, file_data: Vec<FileContext>, token_count: u32) -> Self {
        let files = file_data.iter().map(|fc| fc.path.clone()).collect();
        Self {
            id: id.into(),
            files,
            file_data,
            token_count,
            created_at: Utc::now(),
        }
    }
}

/// Per-chunk summary tracked in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestChunkEntry {
    pub files: Vec<String>,
    pub size: u64,
    pub token_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// The manifest naming all known chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub chunks: HashMap<String, ManifestChunkEntry>,
    pub updated_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            version: "1.0.0".to_string(),
            chunks: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_chunk_collects_file_paths() {
        let fc = FileContext::new("a.go", "go", "deadbeef");
        let chunk = SemanticChunk::new("chunk-1", vec![fc], 42);
        assert_eq!(chunk.files, vec!["a.go".to_string()]);
        assert_eq!(chunk.token_count, 42);
    }

    #[test]
    fn manifest_new_has_version_and_empty_chunks() {
        let manifest = Manifest::new();
        assert_eq!(manifest.version, "1.0.0");
        assert!(manifest.chunks.is_empty());
    }

    #[test]
    fn manifest_json_round_trips() {
        let mut manifest = Manifest::new();
        manifest.chunks.insert(
            "chunk-1".to_string(),
            ManifestChunkEntry {
                files: vec!["a.go".to_string()],
                size: 128,
                token_count: 10,
                updated_at: Utc::now(),
            },
        );
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunks.len(), 1);
    }
}
