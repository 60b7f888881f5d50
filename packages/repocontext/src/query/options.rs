//! Query options: every public query operation has a default and a
//! `with_options` form governed by this struct.

/// Output shape requested from `format_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// `get_call_graph*`: include the `callers_of` traversal.
    pub include_callers: bool,
    /// `get_call_graph*`: include the `callees_of` traversal.
    pub include_callees: bool,
    /// Pattern search: include recognised type-kind entities
    /// (`struct`/`interface`/`class`/`enum`/`alias`/`type`) alongside
    /// the basic three (`function`/`variable`/`constant`).
    pub include_types: bool,
    /// Call-graph traversal depth. Non-positive values fall back to 1.
    pub max_depth: i64,
    /// Token budget for the whole result. `<= 0` means unbounded.
    pub max_tokens: i64,
    pub format: OutputFormat,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            include_callers: true,
            include_callees: true,
            include_types: true,
            max_depth: 1,
            max_tokens: 0,
            format: OutputFormat::Json,
        }
    }
}

impl QueryOptions {
    /// `max_depth` normalised: non-positive values default to 1.
    pub fn effective_max_depth(&self) -> u32 {
        if self.max_depth <= 0 {
            1
        } else {
            self.max_depth as u32
        }
    }
}
