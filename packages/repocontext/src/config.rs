//! Configuration structs for the index builder and query engine.
//!
//! Grounded on `codegraph-ir`'s `DetectorConfig`
//! (features/clone_detection/domain/detector_config.rs): a plain,
//! `Copy`-able struct with named-preset constructors and a `Default`
//! impl, rather than a separate builder type.

/// Configuration for `IndexBuilder::build_index` / `process_file`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Root directory to walk.
    pub root: std::path::PathBuf,
    /// Run global enrichment after a full walk. `process_file` always
    /// skips this regardless of this flag.
    pub enrich: bool,
}

impl IndexConfig {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            root: root.into(),
            enrich: true,
        }
    }

    pub fn without_enrichment(mut self) -> Self {
        self.enrich = false;
        self
    }
}

/// Default knobs applied to a query when the caller does not supply
/// per-call options, and the token-cost constants `QueryEngine` charges
/// against a result's budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    pub default_max_depth: u32,
    pub default_max_tokens: i64,
    pub entry_token_overhead: u32,
    pub call_graph_entry_overhead: u32,
    pub metadata_overhead: u32,
    /// How pattern search handles a regex using lookaround this engine
    /// cannot natively express: `false` rewrites with a best-effort
    /// approximation, `true` rejects with `UnsupportedRegex`.
    pub regex_strict_mode: bool,
}

impl QueryConfig {
    pub fn new(default_max_depth: u32, default_max_tokens: i64) -> Self {
        Self {
            default_max_depth,
            default_max_tokens,
            ..Self::default()
        }
    }

    pub fn with_strict_regex(mut self) -> Self {
        self.regex_strict_mode = true;
        self
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 1,
            default_max_tokens: 0,
            entry_token_overhead: 2,
            call_graph_entry_overhead: 3,
            metadata_overhead: 10,
            regex_strict_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_config_defaults_to_enrichment_on() {
        let config = IndexConfig::new("/repo");
        assert!(config.enrich);
        assert_eq!(config.root, std::path::PathBuf::from("/repo"));
    }

    #[test]
    fn index_config_without_enrichment_disables_it() {
        let config = IndexConfig::new("/repo").without_enrichment();
        assert!(!config.enrich);
    }

    #[test]
    fn query_config_default_values() {
        let config = QueryConfig::default();
        assert_eq!(config.default_max_depth, 1);
        assert_eq!(config.default_max_tokens, 0);
        assert!(!config.regex_strict_mode);
    }

    #[test]
    fn query_config_new_overrides_depth_and_tokens() {
        let config = QueryConfig::new(3, 500);
        assert_eq!(config.default_max_depth, 3);
        assert_eq!(config.default_max_tokens, 500);
        assert_eq!(config.entry_token_overhead, 2);
    }

    #[test]
    fn with_strict_regex_sets_flag_without_touching_other_fields() {
        let config = QueryConfig::new(3, 500).with_strict_regex();
        assert!(config.regex_strict_mode);
        assert_eq!(config.default_max_depth, 3);
    }
}
