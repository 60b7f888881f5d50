//! Query engine: pattern detection/matching, entity and call-graph
//! search, token-budgeted output formatting.

mod engine;
mod format;
mod options;
mod pattern;

pub use engine::{CallGraphNode, CallGraphResult, QueryEngine, ResultEntry, SearchResult};
pub use format::format_results;
pub use options::{OutputFormat, QueryOptions};
pub use pattern::{detect_pattern_kind, glob_match, matches_pattern, PatternKind, RegexCache, RegexMode};
