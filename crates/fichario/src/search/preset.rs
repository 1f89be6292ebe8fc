//! Saved filter presets and query-time evaluation over committed documents.

use serde::{Deserialize, Serialize};

use super::normalize_for_match;

/// A named, reusable filter: phrase terms plus optional numeric ranges.
/// Presets describe a filter; they own no documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub id: i64,
    pub owner: String,
    pub name: String,
    /// Phrase terms, all of which must match (AND).
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub age_min: Option<u32>,
    #[serde(default)]
    pub age_max: Option<u32>,
    #[serde(default)]
    pub experience_min: Option<u32>,
    #[serde(default)]
    pub experience_max: Option<u32>,
}

/// Snapshot of a committed document's searchable state.
#[derive(Debug, Clone)]
pub struct SearchDoc {
    pub id: String,
    pub search_text: String,
    pub age_years: Option<u32>,
    pub experience_years: Option<u32>,
}

impl Preset {
    /// Whether a document satisfies every phrase term and every active
    /// numeric range. A document missing a field is excluded by any range
    /// filter on that field; absence never matches.
    pub fn matches(&self, doc: &SearchDoc) -> bool {
        for term in &self.terms {
            let normalized = normalize_for_match(term);
            if normalized.is_empty() {
                continue;
            }
            if !doc.search_text.contains(&normalized) {
                return false;
            }
        }

        in_range(doc.age_years, self.age_min, self.age_max)
            && in_range(doc.experience_years, self.experience_min, self.experience_max)
    }

    /// Whether any range filter or term is set at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.age_min.is_none()
            && self.age_max.is_none()
            && self.experience_min.is_none()
            && self.experience_max.is_none()
    }
}

fn in_range(value: Option<u32>, min: Option<u32>, max: Option<u32>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Whether a document's normalized text contains every term. Terms must
/// already be normalized (see [`split_terms`](super::split_terms)).
pub fn matches_terms(doc: &SearchDoc, terms: &[String]) -> bool {
    terms.iter().all(|t| doc.search_text.contains(t.as_str()))
}

/// Applies a preset over a corpus of committed documents, returning the ids
/// of matching documents in corpus order.
pub fn evaluate(preset: &Preset, corpus: &[SearchDoc]) -> Vec<String> {
    corpus
        .iter()
        .filter(|doc| preset.matches(doc))
        .map(|doc| doc.id.clone())
        .collect()
}
