//! Data model: entities, serialization shape, and invariants.
//!
//! The types below are the serializable shapes that the storage and
//! query layers are built against.

mod chunk;
mod entry;
mod file_context;

pub use chunk::{Manifest, ManifestChunkEntry, SemanticChunk};
pub use entry::{CallRelation, IndexEntry, EXTERNAL_FILE};
pub use file_context::{
    CallSite, Constant, Export, FileContext, Function, Import, ResolvedCall, TypeDef, TypeKind,
    Variable,
};
