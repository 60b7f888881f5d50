//! Query engine: exact/type/pattern/file-scope search, bounded
//! call-graph traversal, token-budgeted results.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::error::Result;
use crate::model::IndexEntry;
use crate::store::HybridStorage;

use super::options::QueryOptions;
use super::pattern::{matches_pattern, RegexCache, RegexMode};

const RECOGNIZED_TYPE_KINDS: &[&str] = &["struct", "interface", "class", "enum", "alias", "type"];

/// One matched entity, optionally carrying its owning chunk's raw data
/// when attached by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_token_count: Option<u32>,
}

impl From<IndexEntry> for ResultEntry {
    fn from(entry: IndexEntry) -> Self {
        Self {
            name: entry.name,
            entry_type: entry.entry_type,
            file: entry.file,
            start_line: entry.start_line,
            end_line: entry.end_line,
            signature: entry.signature,
            chunk_token_count: None,
        }
    }
}

/// One node reached while walking the call graph outward from a root
/// function. `chunk_data` is attached opportunistically via
/// `query_by_name`; a lookup failure leaves it `None` rather than
/// failing the traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub name: String,
    pub file: String,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_data: Option<serde_json::Value>,
}

/// Callers and callees of a function up to the requested depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphResult {
    pub root: String,
    pub callers: Vec<CallGraphNode>,
    pub callees: Vec<CallGraphNode>,
}

/// The outcome of any `QueryEngine` search, ready for `format_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub search_type: String,
    pub entries: Vec<ResultEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_graph: Option<CallGraphResult>,
    pub token_count: u32,
    pub truncated: bool,
}

/// Reads through `HybridStorage`; owns the regex cache used by pattern
/// search and the token-cost/default-option knobs from `QueryConfig`.
pub struct QueryEngine {
    storage: HybridStorage,
    regex_cache: RegexCache,
    config: QueryConfig,
}

impl QueryEngine {
    /// Construct an engine with `QueryConfig::default()` knobs.
    pub fn new(storage: HybridStorage) -> Self {
        Self::with_config(storage, QueryConfig::default())
    }

    pub fn with_config(storage: HybridStorage, config: QueryConfig) -> Self {
        Self {
            storage,
            regex_cache: RegexCache::new(),
            config,
        }
    }

    /// The options used by every `search_*`/`get_call_graph` entry
    /// point when the caller doesn't supply its own, seeded from
    /// `self.config`'s `default_max_depth`/`default_max_tokens`.
    fn default_options(&self) -> QueryOptions {
        QueryOptions {
            max_depth: self.config.default_max_depth as i64,
            max_tokens: self.config.default_max_tokens,
            ..QueryOptions::default()
        }
    }

    pub fn search_by_name(&self, name: &str) -> Result<SearchResult> {
        self.search_by_name_with_options(name, &self.default_options())
    }

    pub fn search_by_name_with_options(&self, name: &str, options: &QueryOptions) -> Result<SearchResult> {
        let entries = self.storage.query_by_name(name)?;
        self.finish_entry_search(name, "name", entries, options)
    }

    pub fn search_by_type(&self, type_name: &str) -> Result<SearchResult> {
        self.search_by_type_with_options(type_name, &self.default_options())
    }

    pub fn search_by_type_with_options(&self, type_name: &str, options: &QueryOptions) -> Result<SearchResult> {
        let entries = self.storage.query_by_type(type_name)?;
        self.finish_entry_search(type_name, "type", entries, options)
    }

    pub fn search_in_file(&self, file: &str) -> Result<SearchResult> {
        self.search_in_file_with_options(file, &self.default_options())
    }

    pub fn search_in_file_with_options(&self, file: &str, options: &QueryOptions) -> Result<SearchResult> {
        let mut entries = self.storage.query_in_file(file)?;
        if entries.is_empty() {
            // Fall back to basename equality so callers can pass either a
            // repo-relative path or a bare filename.
            let all_files = self.storage.distinct_files()?;
            if let Some(full) = all_files.into_iter().find(|f| basename(f) == basename(file)) {
                entries = self.storage.query_in_file(&full)?;
            }
        }
        self.finish_entry_search(file, "file", entries, options)
    }

    /// Glob/regex search over function, variable, and constant names,
    /// plus recognised type kinds when `options.include_types` is set.
    pub fn search_by_pattern(&self, pattern: &str) -> Result<SearchResult> {
        self.search_by_pattern_with_options(pattern, &self.default_options())
    }

    pub fn search_by_pattern_with_options(&self, pattern: &str, options: &QueryOptions) -> Result<SearchResult> {
        let mut kinds: Vec<&str> = vec!["function", "variable", "constant"];
        if options.include_types {
            kinds.extend_from_slice(RECOGNIZED_TYPE_KINDS);
        }

        let regex_mode = if self.config.regex_strict_mode {
            RegexMode::Strict
        } else {
            RegexMode::Lenient
        };

        let mut matched = Vec::new();
        for kind in kinds {
            let candidates = match self.storage.query_by_type(kind) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for entry in candidates {
                if matches_pattern(pattern, &entry.name, &self.regex_cache, regex_mode)? {
                    matched.push(entry);
                }
            }
        }

        self.finish_entry_search(pattern, "pattern", matched, options)
    }

    fn finish_entry_search(
        &self,
        query: &str,
        search_type: &str,
        entries: Vec<IndexEntry>,
        options: &QueryOptions,
    ) -> Result<SearchResult> {
        let mut result_entries: Vec<ResultEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            let chunk_id = entry.chunk_id.clone();
            let mut result_entry: ResultEntry = entry.into();
            if let Ok(chunk) = self.storage.load_chunk(&chunk_id) {
                result_entry.chunk_token_count = Some(chunk.token_count);
            }
            result_entries.push(result_entry);
        }

        let (kept, truncated) = self.apply_token_budget(result_entries, options.max_tokens);
        let token_count = kept.iter().map(|e| self.entry_token_cost(e)).sum::<u32>() + self.config.metadata_overhead;

        Ok(SearchResult {
            query: query.to_string(),
            search_type: search_type.to_string(),
            entries: kept,
            call_graph: None,
            token_count,
            truncated,
        })
    }

    pub fn get_call_graph(&self, name: &str) -> Result<SearchResult> {
        self.get_call_graph_with_options(name, &self.default_options())
    }

    /// Bounded recursive traversal of `callers_of`/`callees_of` through
    /// the relational index, depth-limited by `options.max_depth`.
    pub fn get_call_graph_with_options(&self, name: &str, options: &QueryOptions) -> Result<SearchResult> {
        let max_depth = options.effective_max_depth();

        let mut callers = Vec::new();
        if options.include_callers {
            let mut visited = HashSet::new();
            visited.insert(name.to_string());
            self.walk_callers(name, 1, max_depth, &mut visited, &mut callers)?;
        }

        let mut callees = Vec::new();
        if options.include_callees {
            let mut visited = HashSet::new();
            visited.insert(name.to_string());
            self.walk_callees(name, 1, max_depth, &mut visited, &mut callees)?;
        }

        let call_graph = CallGraphResult {
            root: name.to_string(),
            callers,
            callees,
        };

        let node_count = call_graph.callers.len() + call_graph.callees.len();
        let token_count = node_count as u32 * self.config.call_graph_entry_overhead + self.config.metadata_overhead;

        Ok(SearchResult {
            query: name.to_string(),
            search_type: "call_graph".to_string(),
            entries: Vec::new(),
            call_graph: Some(call_graph),
            token_count,
            truncated: false,
        })
    }

    /// Loads the chunk owning `name`'s first function entry,
    /// opportunistically: any lookup or decode failure yields `None`
    /// rather than failing the traversal.
    fn chunk_data_for(&self, name: &str) -> Option<serde_json::Value> {
        let entry = self
            .storage
            .query_by_name(name)
            .ok()?
            .into_iter()
            .find(|e| e.entry_type == "function")?;
        let chunk = self.storage.load_chunk(&entry.chunk_id).ok()?;
        serde_json::to_value(&chunk).ok()
    }

    fn walk_callers(
        &self,
        name: &str,
        depth: u32,
        max_depth: u32,
        visited: &mut HashSet<String>,
        out: &mut Vec<CallGraphNode>,
    ) -> Result<()> {
        if depth > max_depth {
            return Ok(());
        }
        for relation in self.storage.query_calls_to(name)? {
            if !visited.insert(relation.caller.clone()) {
                continue;
            }
            out.push(CallGraphNode {
                name: relation.caller.clone(),
                file: relation.caller_file.clone(),
                depth,
                chunk_data: self.chunk_data_for(&relation.caller),
            });
            self.walk_callers(&relation.caller, depth + 1, max_depth, visited, out)?;
            visited.remove(&relation.caller);
        }
        Ok(())
    }

    fn walk_callees(
        &self,
        name: &str,
        depth: u32,
        max_depth: u32,
        visited: &mut HashSet<String>,
        out: &mut Vec<CallGraphNode>,
    ) -> Result<()> {
        if depth > max_depth {
            return Ok(());
        }
        for relation in self.storage.query_calls_from(name)? {
            if !visited.insert(relation.callee.clone()) {
                continue;
            }
            out.push(CallGraphNode {
                name: relation.callee.clone(),
                file: relation.file.clone(),
                depth,
                chunk_data: self.chunk_data_for(&relation.callee),
            });
            self.walk_callees(&relation.callee, depth + 1, max_depth, visited, out)?;
            visited.remove(&relation.callee);
        }
        Ok(())
    }

    fn entry_token_cost(&self, entry: &ResultEntry) -> u32 {
        word_count(&entry.name) + word_count(&entry.signature) + self.config.entry_token_overhead
            + entry.chunk_token_count.unwrap_or(0)
    }

    /// Enumeration-order truncation once the running cost exceeds
    /// `max_tokens`; `max_tokens <= 0` means unbounded.
    fn apply_token_budget(&self, entries: Vec<ResultEntry>, max_tokens: i64) -> (Vec<ResultEntry>, bool) {
        if max_tokens <= 0 {
            return (entries, false);
        }
        let budget = max_tokens as u32;
        let mut kept = Vec::new();
        let mut running = self.config.metadata_overhead;
        let mut truncated = false;
        for entry in entries {
            let cost = self.entry_token_cost(&entry);
            if running + cost > budget {
                truncated = true;
                break;
            }
            running += cost;
            kept.push(entry);
        }
        (kept, truncated)
    }
}

fn word_count(s: &str) -> u32 {
    s.split_whitespace().count() as u32
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
