//! Pattern detection and matching: glob vs regex auto-detection, brace
//! expansion, character classes, and a thread-safe compiled-regex cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

use crate::error::{RepoContextError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Glob,
    Regex,
}

/// How an engine handles regex features it cannot natively express
/// (negative lookbehind, lookahead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexMode {
    /// Rewrite unsupported constructs with a best-effort approximation.
    Lenient,
    /// Reject patterns using unsupported constructs with `UnsupportedRegex`.
    Strict,
}

const HEURISTIC_CHARS: &[char] = &['(', ')', '^', '$', '+', '|', '\\'];
const HEURISTIC_MARKERS: &[&str] = &["(?", ".+", ".*", ".?", "\\d", "\\w", "\\s", "\\p{", "\\b"];

/// Deterministic, syntactic-only classification of a search pattern.
pub fn detect_pattern_kind(pattern: &str) -> PatternKind {
    if is_explicit_regex(pattern) {
        return PatternKind::Regex;
    }
    if pattern.chars().any(|c| HEURISTIC_CHARS.contains(&c)) {
        return PatternKind::Regex;
    }
    if HEURISTIC_MARKERS.iter().any(|m| pattern.contains(m)) {
        return PatternKind::Regex;
    }
    if has_braced_quantifier(pattern) {
        return PatternKind::Regex;
    }
    PatternKind::Glob
}

fn is_explicit_regex(pattern: &str) -> bool {
    pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/')
}

/// True if `pattern` contains a `{...}` group whose content is a regex
/// repetition quantifier (`{3}`, `{2,4}`, `{2,}`, `{,4}`) rather than a
/// glob brace-alternation (`{a,b,c}`).
fn has_braced_quantifier(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = pattern[i + 1..].find('}') {
                let inside = &pattern[i + 1..i + 1 + end];
                if is_quantifier_body(inside) {
                    return true;
                }
                i = i + 1 + end + 1;
                continue;
            }
        }
        i += 1;
    }
    false
}

fn is_quantifier_body(inside: &str) -> bool {
    if inside.is_empty() {
        return false;
    }
    let mut seen_digit = false;
    let mut comma_count = 0;
    for c in inside.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            ',' => comma_count += 1,
            _ => return false,
        }
    }
    seen_digit && comma_count <= 1
}

// --- glob matching -------------------------------------------------

/// Match `name` against a glob `pattern`: `*`, `?`, `[...]`, `[!...]`,
/// and brace expansion `{a,b,c}` (outermost group only).
/// Malformed patterns fall back to exact equality.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    match find_outermost_braces(pattern) {
        BraceSearch::None => glob_match_no_braces(pattern, name),
        BraceSearch::Empty => false,
        BraceSearch::Malformed => pattern == name,
        BraceSearch::Group { prefix, alternatives, suffix } => alternatives
            .iter()
            .any(|alt| glob_match_no_braces(&format!("{}{}{}", prefix, alt, suffix), name)),
    }
}

enum BraceSearch<'a> {
    None,
    Empty,
    Malformed,
    Group {
        prefix: &'a str,
        alternatives: Vec<&'a str>,
        suffix: &'a str,
    },
}

fn find_outermost_braces(pattern: &str) -> BraceSearch<'_> {
    match pattern.find('{') {
        None => BraceSearch::None,
        Some(start) => match pattern[start + 1..].find('}') {
            None => BraceSearch::Malformed,
            Some(end_rel) => {
                let end = start + 1 + end_rel;
                let inside = &pattern[start + 1..end];
                if inside.is_empty() {
                    return BraceSearch::Empty;
                }
                BraceSearch::Group {
                    prefix: &pattern[..start],
                    alternatives: inside.split(',').collect(),
                    suffix: &pattern[end + 1..],
                }
            }
        },
    }
}

fn glob_match_no_braces(pattern: &str, name: &str) -> bool {
    match glob_to_regex(pattern) {
        Some(translated) => Regex::new(&translated).map(|re| re.is_match(name)).unwrap_or(pattern == name),
        None => pattern == name,
    }
}

fn glob_to_regex(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push_str(".*");
                i += 1;
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => {
                let close = chars[i + 1..].iter().position(|&c| c == ']').map(|p| p + i + 1)?;
                out.push('[');
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    out.push('^');
                    j += 1;
                }
                while j < close {
                    if chars[j] == '\\' {
                        out.push('\\');
                    }
                    out.push(chars[j]);
                    j += 1;
                }
                out.push(']');
                i = close + 1;
            }
            c if is_regex_special(c) => {
                out.push('\\');
                out.push(c);
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out.push('$');
    Some(out)
}

fn is_regex_special(c: char) -> bool {
    matches!(c, '.' | '+' | '(' | ')' | '|' | '^' | '$' | '\\' | '{' | '}')
}

// --- regex matching --------------------------------------------------

/// Reader/writer-locked cache of compiled regexes keyed by the cleaned
/// pattern text.
#[derive(Default)]
pub struct RegexCache {
    cache: RwLock<HashMap<String, Arc<Regex>>>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_compile(&self, cleaned: &str) -> Option<Arc<Regex>> {
        if let Some(re) = self.cache.read().get(cleaned) {
            return Some(re.clone());
        }
        let mut guard = self.cache.write();
        if let Some(re) = guard.get(cleaned) {
            return Some(re.clone());
        }
        let compiled = Regex::new(cleaned).ok()?;
        let arc = Arc::new(compiled);
        guard.insert(cleaned.to_string(), arc.clone());
        Some(arc)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strip explicit `/…/` delimiters if present.
fn strip_delimiters(pattern: &str) -> &str {
    if is_explicit_regex(pattern) {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    }
}

/// Rewrite (lenient) or reject (strict) lookaround constructs this
/// engine cannot express: positive lookahead `(?=X)` → `.*X`; negative
/// lookbehind/lookahead are dropped entirely.
fn rewrite_unsupported(pattern: &str, mode: RegexMode) -> std::result::Result<String, ()> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '(' && i + 1 < chars.len() && chars[i + 1] == '?' {
            if let Some((kind, prefix_len)) = lookaround_kind(&chars[i..]) {
                if mode == RegexMode::Strict {
                    return Err(());
                }
                let start = i + prefix_len;
                let close = find_unescaped_close_paren(&chars, start).ok_or(())?;
                let inner: String = chars[start..close].iter().collect();
                match kind {
                    LookaroundKind::PositiveLookahead => {
                        out.push_str(".*");
                        out.push_str(&inner);
                    }
                    LookaroundKind::NegativeLookahead | LookaroundKind::NegativeLookbehind => {
                        // dropped entirely
                    }
                }
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    Ok(out)
}

#[derive(Clone, Copy)]
enum LookaroundKind {
    PositiveLookahead,
    NegativeLookahead,
    NegativeLookbehind,
}

fn lookaround_kind(chars: &[char]) -> Option<(LookaroundKind, usize)> {
    let s: String = chars.iter().take(4).collect();
    if s.starts_with("(?=") {
        Some((LookaroundKind::PositiveLookahead, 3))
    } else if s.starts_with("(?!") {
        Some((LookaroundKind::NegativeLookahead, 3))
    } else if s.starts_with("(?<!") {
        Some((LookaroundKind::NegativeLookbehind, 4))
    } else {
        None
    }
}

fn find_unescaped_close_paren(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0;
    let mut j = start;
    while j < chars.len() {
        match chars[j] {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(j),
            ')' => depth -= 1,
            _ => {}
        }
        j += 1;
    }
    None
}

/// Test `name` against `pattern`, auto-detecting glob vs regex.
///
/// Regex compilation failure (after any lenient rewrite) falls back to
/// exact equality rather than surfacing an error; strict mode instead
/// returns `UnsupportedRegex` when a construct must be rejected.
pub fn matches_pattern(pattern: &str, name: &str, cache: &RegexCache, mode: RegexMode) -> Result<bool> {
    match detect_pattern_kind(pattern) {
        PatternKind::Glob => Ok(glob_match(pattern, name)),
        PatternKind::Regex => {
            let body = strip_delimiters(pattern);
            match rewrite_unsupported(body, mode) {
                Ok(cleaned) => match cache.get_or_compile(&cleaned) {
                    Some(re) => Ok(re.is_match(name)),
                    None => Ok(pattern == name),
                },
                Err(()) => {
                    if mode == RegexMode::Strict {
                        Err(RepoContextError::unsupported_regex(format!(
                            "pattern '{}' uses a construct unsupported in strict mode",
                            pattern
                        )))
                    } else {
                        Ok(pattern == name)
                    }
                }
            }
        }
    }
}
