//! Hybrid storage: content-addressed chunk blobs, a relational index, a
//! manifest, and the orchestrator tying them together.

mod chunk_store;
mod hybrid;
mod manifest;
mod relational;

pub use chunk_store::ChunkStore;
pub use hybrid::{FunctionImplementation, HybridStorage};
pub use manifest::ManifestStore;
pub use relational::{PreparedStatementCache, QueryKind, RelationalIndex};
