//! Search-text normalization and query-term handling.
//!
//! All substring matching in the corpus happens over a normalized
//! representation: NFKD-decomposed, combining marks dropped, lowercased,
//! whitespace collapsed. Query terms go through the same normalization so
//! `Gerência` and `gerencia` meet in the middle.

pub mod preset;

pub use preset::{evaluate, Preset, SearchDoc};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::extract::DocumentFields;

/// Strips diacritics while preserving case and spacing.
pub fn fold_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalizes text for substring matching: strip accents, lowercase,
/// collapse whitespace runs, trim. Total for any input, including empty.
pub fn normalize_for_match(text: &str) -> String {
    fold_accents(text)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the single normalized blob stored per document: the raw text plus
/// the textual extracted fields, so field values are searchable even when
/// OCR mangled their surroundings.
pub fn search_text(raw_text: &str, fields: &DocumentFields) -> String {
    let mut blob = raw_text.to_string();
    for part in fields.textual_parts() {
        blob.push(' ');
        blob.push_str(part);
    }
    normalize_for_match(&blob)
}

/// Splits a free-text query into normalized phrase terms.
///
/// `;` delimits phrases when present; otherwise commas/whitespace do.
/// Terms are normalized like the corpus, empties dropped, duplicates
/// removed preserving first-seen order.
pub fn split_terms(raw: &str) -> Vec<String> {
    let parts: Vec<&str> = if raw.contains(';') {
        raw.split(';').collect()
    } else {
        raw.split(|c: char| c == ',' || c.is_whitespace()).collect()
    };

    let mut seen = Vec::new();
    for part in parts {
        let normalized = normalize_for_match(part);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        seen.push(normalized);
    }
    seen
}

/// Returns an ellipsized window of `text` (already normalized) around the
/// earliest match of any term, for search result display. Empty when no
/// term matches.
pub fn build_snippet(text: &str, terms: &[String], max_len: usize) -> String {
    if text.is_empty() || terms.is_empty() {
        return String::new();
    }

    let mut match_index = None;
    let mut match_term = "";
    for term in terms {
        if let Some(idx) = text.find(term.as_str()) {
            if match_index.map_or(true, |best| idx < best) {
                match_index = Some(idx);
                match_term = term;
            }
        }
    }
    let Some(match_index) = match_index else {
        return String::new();
    };

    let radius = max_len / 2;
    let mut start = match_index.saturating_sub(radius);
    let mut end = (match_index + match_term.len() + radius).min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end += 1;
    }

    let mut snippet = text[start..end].trim().to_string();
    if start > 0 {
        snippet = format!("...{}", snippet);
    }
    if end < text.len() {
        snippet.push_str("...");
    }
    snippet
}
