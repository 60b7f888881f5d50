//! Deterministic, filesystem-safe chunk IDs.
//!
//! Grounded on `codegraph-ir`'s `ChunkIdGenerator`
//! (features/chunking/domain/chunk_id_generator.rs): same idea of a
//! stable textual ID derived from identifying context, swapped here for
//! a content hash so the same path always yields the same ID across
//! process restarts without a shared "seen" set.

use sha2::{Digest, Sha256};

/// Characters forbidden in a chunk ID (`/\:*?"<>|`), because the ID
/// doubles as a filesystem path segment (`{base}/{chunk_id}.bin`).
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Derive a deterministic chunk ID for a set of contributing file paths.
///
/// Same path(s) in the same order always yield the same ID; distinct
/// path sets yield distinct IDs with overwhelming probability (SHA-256).
pub fn chunk_id_for_files(paths: &[String]) -> String {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(path.as_bytes());
        hasher.update([0u8]); // separator, avoids "ab"+"c" colliding with "a"+"bc"
    }
    let digest = hasher.finalize();
    format!("chunk-{:x}", digest)
}

/// Convenience for the default one-chunk-per-file strategy.
pub fn chunk_id_for_file(path: &str) -> String {
    chunk_id_for_files(std::slice::from_ref(&path.to_string()))
}

/// True if `id` is safe to use as a single path segment under the chunk
/// store's base directory (no separators, no reserved characters).
pub fn is_filesystem_safe(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|c| FORBIDDEN.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_yields_same_id() {
        assert_eq!(chunk_id_for_file("src/main.go"), chunk_id_for_file("src/main.go"));
    }

    #[test]
    fn different_paths_yield_different_ids() {
        assert_ne!(chunk_id_for_file("src/main.go"), chunk_id_for_file("src/user.go"));
    }

    #[test]
    fn id_is_filesystem_safe() {
        let id = chunk_id_for_file("src/weird path/file.go");
        assert!(is_filesystem_safe(&id));
    }

    #[test]
    fn multi_file_chunk_id_is_order_sensitive_but_deterministic() {
        let a = chunk_id_for_files(&["a.go".to_string(), "b.go".to_string()]);
        let b = chunk_id_for_files(&["a.go".to_string(), "b.go".to_string()]);
        assert_eq!(a, b);

        let concatenation_collision = chunk_id_for_files(&["ab".to_string()]);
        let split = chunk_id_for_files(&["a".to_string(), "b".to_string()]);
        assert_ne!(concatenation_collision, split);
    }

    #[test]
    fn rejects_forbidden_characters() {
        assert!(!is_filesystem_safe("chunk/with/slash"));
        assert!(!is_filesystem_safe(""));
        assert!(!is_filesystem_safe("chunk:with:colon"));
    }
}
