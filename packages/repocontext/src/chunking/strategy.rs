//! Chunking strategy: maps `FileContext`s to `SemanticChunk`s.
//!
//! Grounded on `codegraph-ir`'s chunking feature slice
//! (features/chunking/{domain,infrastructure}), generalized into a trait
//! so hybrid storage never needs to change when a new grouping policy
//! is introduced.

use crate::model::{FileContext, SemanticChunk};

use super::chunk_id::chunk_id_for_files;
use super::token_estimate::estimate_chunk_tokens;

/// A policy for grouping parsed files into durable chunks.
pub trait ChunkingStrategy: Send + Sync {
    /// Group the given file contexts into chunks. The default strategy
    /// emits exactly one chunk per input file; alternative strategies
    /// (e.g. token-budget-bounded grouping) may combine several files
    /// into a single chunk.
    fn create(&self, files: Vec<FileContext>) -> Vec<SemanticChunk>;
}

/// Default strategy: exactly one chunk per input file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileChunkingStrategy;

impl ChunkingStrategy for FileChunkingStrategy {
    fn create(&self, files: Vec<FileContext>) -> Vec<SemanticChunk> {
        files
            .into_iter()
            .map(|fc| {
                let id = chunk_id_for_files(std::slice::from_ref(&fc.path));
                let token_count = estimate_chunk_tokens(std::slice::from_ref(&fc));
                SemanticChunk::new(id, vec![fc], token_count)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_chunk_per_file() {
        let files = vec![
            FileContext::new("a.go", "go", "hash-a"),
            FileContext::new("b.go", "go", "hash-b"),
        ];
        let chunks = FileChunkingStrategy.create(files);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].files, vec!["a.go".to_string()]);
        assert_eq!(chunks[1].files, vec!["b.go".to_string()]);
    }

    #[test]
    fn chunk_id_is_deterministic_across_calls() {
        let files = vec![FileContext::new("a.go", "go", "hash-a")];
        let chunk1 = FileChunkingStrategy.create(files.clone());
        let chunk2 = FileChunkingStrategy.create(files);
        assert_eq!(chunk1[0].id, chunk2[0].id);
    }
}
