//! Per-file parsed representation and the enrichment-added call-site
//! views layered onto `Function` by the global enrichment pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: String,
    pub language: String,
    /// SHA-256 hex digest of the file's bytes.
    pub checksum: String,
    pub mtime: DateTime<Utc>,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub exports: Vec<Export>,
}

impl FileContext {
    pub fn new(path: impl Into<String>, language: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            checksum: checksum.into(),
            mtime: Utc::now(),
            functions: Vec::new(),
            types: Vec::new(),
            variables: Vec::new(),
            constants: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Total number of named entities this file contributes to the index.
    pub fn entity_count(&self) -> usize {
        self.functions.len()
            + self.types.len()
            + self.variables.len()
            + self.constants.len()
    }
}

/// A single call site, used when a parser can report per-call-site lines
/// (`local_calls_with_metadata`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub call_type: Option<String>,
}

/// A call resolved to a specific file, used in `cross_file_calls` /
/// `cross_file_callers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCall {
    pub name: String,
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub call_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub signature: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub returns: Vec<String>,
    /// Raw per-call-site metadata from the parser, when available.
    #[serde(default)]
    pub local_calls_with_metadata: Vec<CallSite>,
    /// Legacy, possibly-ambiguous call name list (always populated by parsers,
    /// even when `local_calls_with_metadata` is also present).
    #[serde(default)]
    pub calls: Vec<String>,
    #[serde(default)]
    pub called_by: Vec<String>,

    // --- populated by global enrichment (§4.6); absent before enrichment ---
    #[serde(default)]
    pub local_calls: Vec<String>,
    #[serde(default)]
    pub cross_file_calls: Vec<ResolvedCall>,
    #[serde(default)]
    pub local_callers: Vec<String>,
    #[serde(default)]
    pub cross_file_callers: Vec<ResolvedCall>,
}

impl Function {
    pub fn new(name: impl Into<String>, signature: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            start_line,
            end_line,
            parameters: Vec::new(),
            returns: Vec::new(),
            local_calls_with_metadata: Vec::new(),
            calls: Vec::new(),
            called_by: Vec::new(),
            local_calls: Vec::new(),
            cross_file_calls: Vec::new(),
            local_callers: Vec::new(),
            cross_file_callers: Vec::new(),
        }
    }

    /// Call sites to resolve during enrichment: prefers
    /// `local_calls_with_metadata`, falls back to `calls[]` with the
    /// function's own start line.
    pub fn resolved_call_sites(&self) -> Vec<CallSite> {
        if !self.local_calls_with_metadata.is_empty() {
            self.local_calls_with_metadata.clone()
        } else {
            self.calls
                .iter()
                .map(|name| CallSite {
                    name: name.clone(),
                    line: self.start_line,
                    call_type: None,
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Struct,
    Interface,
    Class,
    Enum,
    Alias,
    Type,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Class => "class",
            TypeKind::Enum => "enum",
            TypeKind::Alias => "alias",
            TypeKind::Type => "type",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    /// Base types / interfaces this type embeds or inherits from.
    #[serde(default)]
    pub embedded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}
