//! Content tokenization.
//!
//! Text is lowercased, stripped of punctuation and split on whitespace.
//! Tokens of two characters or fewer and common English stop words are
//! dropped. Non-string node content is flattened to text first.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Tokens shorter than this many characters are dropped.
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now", "old", "see",
    "two", "who", "did", "get", "let", "say", "she", "too", "use", "that", "with", "have",
    "this", "will", "your", "from", "they", "been", "were", "said", "each", "which", "their",
    "there", "what", "about", "would", "these", "other", "into", "more", "some", "than",
    "then", "them", "only", "also", "when", "where", "while", "over", "such", "very", "just",
    "being", "those", "should", "could", "does", "because", "between", "after", "before",
];

/// Tokenize free text into a sorted, de-duplicated token set.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Flatten node content to text: strings as-is, other scalars via their
/// display form, arrays and objects by joining their scalar leaves with
/// spaces. `null` yields an empty string.
pub fn content_text(content: &Value) -> String {
    let mut parts = Vec::new();
    collect_leaves(content, &mut parts);
    parts.join(" ")
}

fn collect_leaves(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => parts.push(s.clone()),
        Value::Bool(b) => parts.push(b.to_string()),
        Value::Number(n) => parts.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_leaves(item, parts)),
        Value::Object(map) => map.values().for_each(|item| collect_leaves(item, parts)),
    }
}

/// Tokens of a node's content.
pub fn tokenize_content(content: &Value) -> BTreeSet<String> {
    tokenize(&content_text(content))
}
