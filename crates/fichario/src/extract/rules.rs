//! The declarative extraction rule table.
//!
//! Each rule is a (field, pattern, parser) row. Rules for a field are tried
//! in declared order and the first one whose parser accepts a capture wins.
//! Adding a field means adding rows here, nothing else.

use regex::Regex;

use crate::error::ConfigError;
use crate::extract::record::{Field, FieldValue};
use crate::extract::value;

/// How a rule's pattern is applied to the text.
#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    /// First capture the parser accepts wins.
    First,
    /// Concatenate all capture groups of a match into one raw value
    /// (grouped digit lines split by separators).
    JoinGroups,
    /// Parse every capture on lines containing one of the context words and
    /// keep the largest amount.
    MaxOnContextLines(&'static [&'static str]),
    /// Parse every capture in the whole text and keep the largest amount.
    Max,
}

/// The normalizer applied to a rule's raw capture.
#[derive(Debug, Clone, Copy)]
pub enum ValueParser {
    Date,
    Amount,
    Phone,
    Age,
    ExperienceYears,
    Cpf,
    Cnpj,
    /// Digit run whose length must be one of the given values.
    DigitString(&'static [usize]),
    /// Labeled document identifier; rejects short values and values whose
    /// digits form a valid CPF/CNPJ (those belong to other fields).
    DocNumber,
}

impl ValueParser {
    pub fn parse(&self, raw: &str) -> Option<FieldValue> {
        match self {
            ValueParser::Date => value::parse_date(raw).map(FieldValue::Text),
            ValueParser::Amount => value::Amount::parse(raw).map(FieldValue::Amount),
            ValueParser::Phone => value::parse_phone(raw).map(FieldValue::Text),
            ValueParser::Age => value::parse_age(raw).map(FieldValue::Integer),
            ValueParser::ExperienceYears => {
                value::parse_experience_years(raw).map(FieldValue::Integer)
            }
            ValueParser::Cpf => value::parse_cpf(raw).map(FieldValue::Text),
            ValueParser::Cnpj => value::parse_cnpj(raw).map(FieldValue::Text),
            ValueParser::DigitString(lengths) => {
                let digits = value::only_digits(raw);
                lengths
                    .contains(&digits.len())
                    .then(|| FieldValue::Text(digits))
            }
            ValueParser::DocNumber => {
                let cleaned = raw.trim().trim_matches([':', '-', ' ']).to_string();
                if cleaned.len() < 5 {
                    return None;
                }
                let digits = value::only_digits(&cleaned);
                if digits.len() < 5 {
                    return None;
                }
                if value::is_valid_cpf(&digits) || value::is_valid_cnpj(&digits) {
                    return None;
                }
                Some(FieldValue::Text(cleaned))
            }
        }
    }
}

pub struct FieldRule {
    pub field: Field,
    kind: RuleKind,
    pattern: Regex,
    capture: usize,
    parser: ValueParser,
}

impl FieldRule {
    pub fn new(
        field: Field,
        kind: RuleKind,
        pattern: &str,
        capture: usize,
        parser: ValueParser,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            field: field.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            field,
            kind,
            pattern,
            capture,
            parser,
        })
    }

    /// Applies the rule to (accent-folded) text.
    pub fn apply(&self, text: &str) -> Option<FieldValue> {
        match self.kind {
            RuleKind::First => self.pattern.captures_iter(text).find_map(|caps| {
                let raw = caps.get(self.capture)?.as_str();
                self.parser.parse(raw)
            }),
            RuleKind::JoinGroups => self.pattern.captures_iter(text).find_map(|caps| {
                let joined: String = (1..caps.len())
                    .filter_map(|i| caps.get(i))
                    .map(|m| m.as_str())
                    .collect();
                self.parser.parse(&joined)
            }),
            RuleKind::MaxOnContextLines(context) => {
                let mut best: Option<value::Amount> = None;
                for line in text.lines() {
                    let lower = line.to_lowercase();
                    if !context.iter().any(|word| lower.contains(word)) {
                        continue;
                    }
                    self.fold_max_amounts(line, &mut best);
                }
                best.map(FieldValue::Amount)
            }
            RuleKind::Max => {
                let mut best: Option<value::Amount> = None;
                self.fold_max_amounts(text, &mut best);
                best.map(FieldValue::Amount)
            }
        }
    }

    fn fold_max_amounts(&self, text: &str, best: &mut Option<value::Amount>) {
        for caps in self.pattern.captures_iter(text) {
            let Some(raw) = caps.get(self.capture) else {
                continue;
            };
            if let Some(FieldValue::Amount(amount)) = self.parser.parse(raw.as_str()) {
                if best.map_or(true, |b| amount > b) {
                    *best = Some(amount);
                }
            }
        }
    }
}

const AMOUNT_CONTEXT: &[&str] = &["valor", "total", "a pagar", "pagar", "documento"];

const GENERIC_AMOUNT: &str = r"([0-9]{1,3}(?:\.[0-9]{3})*,[0-9]{2})";
const DATE: &str = r"([0-3]?\d[./-][01]?\d[./-](?:\d{4}|\d{2}))";
const LABELED_ID: &str = r"([0-9A-Z/.\-]{4,})";
const DIGIT_RUN: &str = r"(?:\d[ .\-]?){43,47}\d";

/// The built-in rule table covering the full field set.
pub fn default_rules() -> Result<Vec<FieldRule>, ConfigError> {
    use Field::*;
    use RuleKind::*;
    use ValueParser as P;

    let rules = [
        (
            DueDate,
            First,
            format!(r"(?i)\b(?:vencimento|vcto|vencto)\D{{0,20}}{DATE}"),
            1,
            P::Date,
        ),
        (
            IssueDate,
            First,
            format!(r"(?i)\bemissao\D{{0,20}}{DATE}"),
            1,
            P::Date,
        ),
        (
            Amount,
            First,
            r"(?i)\b(?:valor(?: do documento)?|valor cobrado|valor a pagar|total)\b\D{0,20}([0-9.]+,[0-9]{2})".to_string(),
            1,
            P::Amount,
        ),
        (
            Amount,
            MaxOnContextLines(AMOUNT_CONTEXT),
            GENERIC_AMOUNT.to_string(),
            1,
            P::Amount,
        ),
        (Amount, Max, GENERIC_AMOUNT.to_string(), 1, P::Amount),
        (
            Interest,
            First,
            r"(?i)\bjuros\b\D{0,20}([0-9.]+,[0-9]{2})".to_string(),
            1,
            P::Amount,
        ),
        (
            Fine,
            First,
            r"(?i)\bmulta\b\D{0,20}([0-9.]+,[0-9]{2})".to_string(),
            1,
            P::Amount,
        ),
        (
            DigitableLine,
            JoinGroups,
            r"\b(\d{5})\.(\d{5})\s+(\d{5})\.(\d{6})\s+(\d{5})\.(\d{6})\s+(\d)\s+(\d{14})\b"
                .to_string(),
            0,
            P::DigitString(&[47]),
        ),
        (
            DigitableLine,
            JoinGroups,
            r"\b(\d{12})[\s.]+(\d{12})[\s.]+(\d{12})[\s.]+(\d{12})\b".to_string(),
            0,
            P::DigitString(&[48]),
        ),
        (
            DigitableLine,
            First,
            DIGIT_RUN.to_string(),
            0,
            P::DigitString(&[47, 48]),
        ),
        (Barcode, First, DIGIT_RUN.to_string(), 0, P::DigitString(&[44])),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\bnosso numero\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\bnumero do documento\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\bdocumento\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            r"(?i)\bnumero da conta\b\D{0,10}(\d{6,})".to_string(),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\brps\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\bnfs-e\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            DocumentNumber,
            First,
            format!(r"(?i)\bfatura\b\D{{0,10}}{LABELED_ID}"),
            1,
            P::DocNumber,
        ),
        (
            Cpf,
            First,
            r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b|\b\d{11}\b".to_string(),
            0,
            P::Cpf,
        ),
        (
            Cnpj,
            First,
            r"\b\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}\b|\b\d{14}\b".to_string(),
            0,
            P::Cnpj,
        ),
        (
            ContactPhone,
            First,
            r"(?i)\b(?:telefone|celular|whatsapp|fone|tel|contato)\b\D{0,5}(\+?\d[\d ().\-]{8,18}\d)"
                .to_string(),
            1,
            P::Phone,
        ),
        (
            ContactPhone,
            First,
            r"\(?\d{2}\)?\s*9\s?\d{4}[-. ]?\d{4}\b".to_string(),
            0,
            P::Phone,
        ),
        (
            AgeYears,
            First,
            r"(?i)\bidade\b\D{0,10}(\d{1,3})".to_string(),
            1,
            P::Age,
        ),
        (
            AgeYears,
            First,
            r"(?i)\b(\d{1,3})\s+anos de idade\b".to_string(),
            1,
            P::Age,
        ),
        (
            ExperienceYears,
            First,
            r"(?i)\b(\d{1,2})\s+anos? de experiencia\b".to_string(),
            1,
            P::ExperienceYears,
        ),
        (
            ExperienceYears,
            First,
            r"(?i)\bexperiencia\b\D{0,20}(\d{1,2})\s+anos?\b".to_string(),
            1,
            P::ExperienceYears,
        ),
    ];

    rules
        .into_iter()
        .map(|(field, kind, pattern, capture, parser)| {
            FieldRule::new(field, kind, &pattern, capture, parser)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::value::Amount;

    #[test]
    fn test_default_rules_compile() {
        let rules = default_rules().unwrap();
        assert!(rules.len() > 20);
    }

    #[test]
    fn test_first_rule_stops_at_first_valid_capture() {
        // Two CPF-shaped numbers; the first has bad check digits.
        let rule = FieldRule::new(
            Field::Cpf,
            RuleKind::First,
            r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b",
            0,
            ValueParser::Cpf,
        )
        .unwrap();

        let text = "CPF 529.982.247-24 ou 529.982.247-25";
        assert_eq!(
            rule.apply(text),
            Some(FieldValue::Text("529.982.247-25".to_string()))
        );
    }

    #[test]
    fn test_join_groups_assembles_digit_line() {
        let rule = FieldRule::new(
            Field::DigitableLine,
            RuleKind::JoinGroups,
            r"\b(\d{5})\.(\d{5})\s+(\d{5})\.(\d{6})\s+(\d{5})\.(\d{6})\s+(\d)\s+(\d{14})\b",
            0,
            ValueParser::DigitString(&[47]),
        )
        .unwrap();

        let text = "23793.38128 60007.827136 95000.063305 9 84410000026035";
        match rule.apply(text) {
            Some(FieldValue::Text(digits)) => {
                assert_eq!(digits.len(), 47);
                assert!(digits.starts_with("2379338128"));
            }
            other => panic!("Expected joined digit line, got {:?}", other),
        }
    }

    #[test]
    fn test_max_on_context_lines_picks_largest() {
        let rule = FieldRule::new(
            Field::Amount,
            RuleKind::MaxOnContextLines(AMOUNT_CONTEXT),
            GENERIC_AMOUNT,
            1,
            ValueParser::Amount,
        )
        .unwrap();

        let text = "Desconto 10,00\nTotal a pagar 150,00 ou 25,00\nOutro 999,99";
        assert_eq!(
            rule.apply(text),
            Some(FieldValue::Amount(Amount::parse("150,00").unwrap()))
        );
    }

    #[test]
    fn test_doc_number_parser_rejects_cpf() {
        let parser = ValueParser::DocNumber;
        assert_eq!(parser.parse("52998224725"), None);
        assert_eq!(
            parser.parse("1234/5678"),
            Some(FieldValue::Text("1234/5678".to_string()))
        );
        assert_eq!(parser.parse("12-3"), None);
    }

    #[test]
    fn test_digit_string_length_gate() {
        let parser = ValueParser::DigitString(&[44]);
        let digits44 = "1".repeat(44);
        assert_eq!(parser.parse(&digits44), Some(FieldValue::Text(digits44.clone())));
        assert_eq!(parser.parse(&"1".repeat(47)), None);
    }
}
