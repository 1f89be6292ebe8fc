//! Rule-based field extraction.

pub mod record;
pub mod rules;
pub mod value;

pub use record::{DocumentFields, Field, FieldValue};
pub use rules::{default_rules, FieldRule, RuleKind, ValueParser};
pub use value::Amount;

use crate::error::ConfigError;
use crate::search::fold_accents;

/// Applies the extraction rule table to raw document text.
///
/// Extraction never fails as a whole: a field whose rules all miss is simply
/// absent from the result.
pub struct FieldExtractor {
    rules: Vec<FieldRule>,
}

impl FieldExtractor {
    /// Builds an extractor with the default rule table.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            rules: default_rules()?,
        })
    }

    /// Builds an extractor with a custom rule table.
    pub fn with_rules(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn extract(&self, raw_text: &str) -> DocumentFields {
        // Labels in scanned documents lose their accents unpredictably;
        // matching happens over accent-folded text.
        let folded = fold_accents(raw_text);

        let mut fields = DocumentFields::default();
        for rule in &self.rules {
            if fields.is_set(rule.field) {
                continue;
            }
            if let Some(value) = rule.apply(&folded) {
                fields.set(rule.field, value);
            }
        }
        fields
    }
}
