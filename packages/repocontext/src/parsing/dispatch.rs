//! Parser dispatch contract (RFC-107).
//!
//! Grounded on `codegraph-ir`'s `Parser` port
//! (features/parsing/ports/parser.rs) and `LanguageId`
//! (features/parsing/ports/language_plugin.rs): a small trait contract
//! plus an extension-keyed lookup table, generalized here to bind every
//! extension a parser declares and to return `FileContext` directly
//! rather than an intermediate tree. Concrete language parsers are
//! external collaborators; only the contract and registry live here.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::model::FileContext;

/// A source-language parser. Implementations are free to wrap a native
/// in-process parser or a subprocess-driven extractor; no inheritance
/// hierarchy is required, just this contract.
///
/// `parse_file` may be invoked concurrently across threads; any
/// per-parser initialization (e.g., locating a subprocess executable)
/// must be protected by the implementation internally.
pub trait LanguageParser: Send + Sync {
    /// Parse `bytes` read from `path` into a `FileContext`. Implementations
    /// must populate `path`, `language`, `checksum` (SHA-256 hex of
    /// `bytes`), `mtime`, and the entity lists. Fails with `ParseError`
    /// on syntax errors and `ParserUnavailable` if a required external
    /// tool cannot be found.
    fn parse_file(&self, path: &str, bytes: &[u8]) -> Result<FileContext>;

    /// File extensions this parser handles, without the leading dot
    /// (e.g. `"go"`).
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable language name (e.g. `"go"`, `"python"`).
    fn language_name(&self) -> &'static str;
}

/// Extension → parser registry. Populated once during initialization;
/// lookups afterward are read-only and concurrency-safe.
#[derive(Default)]
pub struct ParserRegistry {
    by_extension: RwLock<HashMap<String, std::sync::Arc<dyn LanguageParser>>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            by_extension: RwLock::new(HashMap::new()),
        }
    }

    /// Register `parser`, binding every extension it declares. A later
    /// registration for the same extension replaces the earlier one.
    pub fn register(&self, parser: std::sync::Arc<dyn LanguageParser>) {
        let mut map = self.by_extension.write();
        for ext in parser.supported_extensions() {
            map.insert(ext.to_lowercase(), parser.clone());
        }
    }

    /// Look up the parser bound to `extension` (case-insensitive,
    /// without the leading dot). `None` if no parser claims it;
    /// callers skip such files.
    pub fn lookup(&self, extension: &str) -> Option<std::sync::Arc<dyn LanguageParser>> {
        self.by_extension.read().get(&extension.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_extension.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
