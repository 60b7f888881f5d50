//! Chunking strategy: file→chunk mapping, deterministic chunk IDs,
//! token estimation.

mod chunk_id;
mod strategy;
mod token_estimate;

pub use chunk_id::{chunk_id_for_file, chunk_id_for_files, is_filesystem_safe};
pub use strategy::{ChunkingStrategy, FileChunkingStrategy};
pub use token_estimate::{entity_tokens, estimate_chunk_tokens, estimate_file_tokens, word_count};
