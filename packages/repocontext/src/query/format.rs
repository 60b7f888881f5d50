//! Result formatting: JSON for programmatic consumers, a compact text
//! block for terminal/LLM-prompt consumption.

use std::fmt::Write as _;

use crate::error::Result;

use super::engine::SearchResult;
use super::options::OutputFormat;

pub fn format_results(result: &SearchResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &SearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "query: {} ({}) | tokens: {}{}",
        result.query,
        result.search_type,
        result.token_count,
        if result.truncated { " | truncated" } else { "" }
    );

    for (i, entry) in result.entries.iter().enumerate() {
        let _ = write!(out, "{}. {}:{}-{}", i + 1, entry.file, entry.start_line, entry.end_line);
        if !entry.signature.is_empty() {
            let _ = write!(out, " — {}", entry.signature);
        }
        let _ = writeln!(out);
    }

    if let Some(graph) = &result.call_graph {
        let _ = writeln!(out, "\nCallers:");
        if graph.callers.is_empty() {
            let _ = writeln!(out, "  (none)");
        } else {
            for node in &graph.callers {
                let _ = writeln!(out, "  {} ({}) depth {}", node.name, node.file, node.depth);
            }
        }

        let _ = writeln!(out, "Callees:");
        if graph.callees.is_empty() {
            let _ = writeln!(out, "  (none)");
        } else {
            for node in &graph.callees {
                let _ = writeln!(out, "  {} ({}) depth {}", node.name, node.file, node.depth);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::engine::{CallGraphNode, CallGraphResult, ResultEntry};

    fn sample_result() -> SearchResult {
        SearchResult {
            query: "Handle*".to_string(),
            search_type: "pattern".to_string(),
            entries: vec![ResultEntry {
                name: "HandleUserLogin".to_string(),
                entry_type: "function".to_string(),
                file: "auth.go".to_string(),
                start_line: 10,
                end_line: 20,
                signature: "func HandleUserLogin()".to_string(),
                chunk_token_count: None,
            }],
            call_graph: None,
            token_count: 15,
            truncated: false,
        }
    }

    #[test]
    fn json_format_round_trips_through_serde() {
        let result = sample_result();
        let rendered = format_results(&result, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["query"], "Handle*");
    }

    #[test]
    fn text_format_lists_entries_and_header() {
        let result = sample_result();
        let rendered = format_results(&result, OutputFormat::Text).unwrap();
        assert!(rendered.contains("query: Handle*"));
        assert!(rendered.contains("auth.go:10-20"));
        assert!(rendered.contains("HandleUserLogin"));
    }

    #[test]
    fn text_format_shows_none_for_empty_call_graph_sections() {
        let mut result = sample_result();
        result.call_graph = Some(CallGraphResult {
            root: "main".to_string(),
            callers: Vec::new(),
            callees: vec![CallGraphNode {
                name: "helper".to_string(),
                file: "util.go".to_string(),
                depth: 1,
                chunk_data: None,
            }],
        });
        let rendered = format_results(&result, OutputFormat::Text).unwrap();
        assert!(rendered.contains("Callers:\n  (none)"));
        assert!(rendered.contains("helper (util.go) depth 1"));
    }
}
