//! repocontext — a repository code-context index.
//!
//! Parses a heterogeneous source tree, extracts semantic entities
//! (functions, types, variables, constants, imports, calls) with source
//! spans, derives a repository-wide call graph that distinguishes
//! intra-file from cross-file edges, and stores the result in a hybrid
//! index: a relational store for fast lookups, content-addressed binary
//! chunks for the rich per-file detail, and a manifest tying the two
//! together. A query engine then serves name/type/pattern/file search
//! and bounded call-graph traversal, with results budgeted for LLM
//! consumption.
//!
//! Language-specific parsing is out of scope here — only the
//! [`parsing::LanguageParser`] dispatch contract is provided; concrete
//! parsers are external collaborators that implement it.
//!
//! ```rust,ignore
//! use repocontext::config::IndexConfig;
//! use repocontext::indexing::IndexBuilder;
//! use repocontext::parsing::ParserRegistry;
//! use repocontext::store::HybridStorage;
//! use std::sync::Arc;
//!
//! let storage = HybridStorage::initialize("/path/to/repo")?;
//! let registry = Arc::new(ParserRegistry::new());
//! let mut builder = IndexBuilder::new(storage, registry);
//! let stats = builder.build_index(&IndexConfig::new("/path/to/repo"))?;
//! # Ok::<(), repocontext::error::RepoContextError>(())
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod model;
pub mod parsing;
pub mod query;
pub mod store;

pub use error::{ErrorKind, RepoContextError, Result};
