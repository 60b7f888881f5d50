//! Row-level projections stored in the relational index.

use serde::{Deserialize, Serialize};

/// The flat row-form projection of any named entity.
///
/// `entry_type` is `"function"`, a type kind verbatim (`"struct"`,
/// `"interface"`, ...), `"variable"`, or `"constant"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub chunk_id: String,
    pub signature: String,
}

/// One call-graph edge: `caller` (in `caller_file`) calls `callee`, found
/// in `file` (or `"external"` when unresolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRelation {
    pub caller: String,
    pub callee: String,
    pub file: String,
    pub line: u32,
    pub caller_file: String,
}

pub const EXTERNAL_FILE: &str = "external";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_entry_serializes_type_field_renamed() {
        let entry = IndexEntry {
            name: "createUser".into(),
            entry_type: "function".into(),
            file: "user.go".into(),
            start_line: 1,
            end_line: 5,
            chunk_id: "chunk-1".into(),
            signature: "func createUser()".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"function\""));
    }
}
