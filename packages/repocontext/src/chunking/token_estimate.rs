//! Cheap token estimation for chunks and query results.

use crate::model::FileContext;

/// Fixed overhead charged per entity, approximating punctuation/braces
/// a real tokenizer would also count.
const ENTITY_OVERHEAD: u32 = 2;

/// Token count estimate for an empty file — never zero, so an empty file
/// still costs something against a token budget.
const EMPTY_FILE_TOKENS: u32 = 1;

/// Roughly count "words" the way a subword tokenizer would split on
/// non-identifier boundaries: whitespace and punctuation.
pub fn word_count(text: &str) -> u32 {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .count() as u32
}

/// Estimate the token cost of one entity from its name and signature.
pub fn entity_tokens(name: &str, signature: &str) -> u32 {
    word_count(name) + word_count(signature) + ENTITY_OVERHEAD
}

/// Estimate the token count for a whole file context: sum over every
/// entity of (tokens in name) + (tokens in signature) + per-entity
/// overhead. Empty files estimate to a small non-negative constant.
pub fn estimate_file_tokens(fc: &FileContext) -> u32 {
    let mut total = 0u32;
    for f in &fc.functions {
        total += entity_tokens(&f.name, &f.signature);
    }
    for t in &fc.types {
        total += entity_tokens(&t.name, t.kind.as_str());
    }
    for v in &fc.variables {
        total += entity_tokens(&v.name, v.type_name.as_deref().unwrap_or(""));
    }
    for c in &fc.constants {
        total += entity_tokens(&c.name, c.type_name.as_deref().unwrap_or(""));
    }

    if total == 0 {
        EMPTY_FILE_TOKENS
    } else {
        total
    }
}

/// Estimate the total token count across a set of file contexts
/// contributing to one chunk.
pub fn estimate_chunk_tokens(files: &[FileContext]) -> u32 {
    files.iter().map(estimate_file_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Function, TypeDef, TypeKind};

    #[test]
    fn empty_file_estimates_to_small_constant() {
        let fc = FileContext::new("empty.go", "go", "deadbeef");
        assert_eq!(estimate_file_tokens(&fc), EMPTY_FILE_TOKENS);
    }

    #[test]
    fn non_empty_file_sums_entity_costs() {
        let mut fc = FileContext::new("a.go", "go", "deadbeef");
        fc.functions.push(Function::new("createUser", "func createUser()", 1, 5));
        let expected = entity_tokens("createUser", "func createUser()");
        assert_eq!(estimate_file_tokens(&fc), expected);
    }

    #[test]
    fn word_count_splits_on_punctuation() {
        assert_eq!(word_count("func createUser(name string) error"), 5);
    }

    #[test]
    fn type_entities_use_kind_as_signature() {
        let mut fc = FileContext::new("a.go", "go", "deadbeef");
        fc.types.push(TypeDef {
            name: "User".into(),
            kind: TypeKind::Struct,
            start_line: 1,
            end_line: 3,
            fields: vec![],
            methods: vec![],
            embedded: vec![],
        });
        assert_eq!(estimate_file_tokens(&fc), entity_tokens("User", "struct"));
    }
}
