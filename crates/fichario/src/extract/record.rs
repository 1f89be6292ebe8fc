//! The typed extraction result.

use serde::{Deserialize, Serialize};

use super::value::Amount;

/// Every field the rule table knows about, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DueDate,
    IssueDate,
    Amount,
    Interest,
    Fine,
    DigitableLine,
    Barcode,
    DocumentNumber,
    Cpf,
    Cnpj,
    ContactPhone,
    AgeYears,
    ExperienceYears,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::DueDate,
        Field::IssueDate,
        Field::Amount,
        Field::Interest,
        Field::Fine,
        Field::DigitableLine,
        Field::Barcode,
        Field::DocumentNumber,
        Field::Cpf,
        Field::Cnpj,
        Field::ContactPhone,
        Field::AgeYears,
        Field::ExperienceYears,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::DueDate => "due_date",
            Field::IssueDate => "issue_date",
            Field::Amount => "amount",
            Field::Interest => "interest",
            Field::Fine => "fine",
            Field::DigitableLine => "digitable_line",
            Field::Barcode => "barcode",
            Field::DocumentNumber => "document_number",
            Field::Cpf => "cpf",
            Field::Cnpj => "cnpj",
            Field::ContactPhone => "contact_phone",
            Field::AgeYears => "age_years",
            Field::ExperienceYears => "experience_years",
        }
    }
}

/// A typed value produced by a rule's parser.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Amount(Amount),
    Integer(u32),
}

/// Extracted fields for one document. A field that did not match is absent
/// from the serialized record; no key is ever serialized as null.
///
/// Serialization is deterministic (fixed field order, no timestamps), so
/// re-extracting unchanged text with unchanged rules yields a byte-identical
/// record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digitable_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
}

impl DocumentFields {
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::DueDate => self.due_date.is_some(),
            Field::IssueDate => self.issue_date.is_some(),
            Field::Amount => self.amount.is_some(),
            Field::Interest => self.interest.is_some(),
            Field::Fine => self.fine.is_some(),
            Field::DigitableLine => self.digitable_line.is_some(),
            Field::Barcode => self.barcode.is_some(),
            Field::DocumentNumber => self.document_number.is_some(),
            Field::Cpf => self.cpf.is_some(),
            Field::Cnpj => self.cnpj.is_some(),
            Field::ContactPhone => self.contact_phone.is_some(),
            Field::AgeYears => self.age_years.is_some(),
            Field::ExperienceYears => self.experience_years.is_some(),
        }
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::DueDate, FieldValue::Text(v)) => self.due_date = Some(v),
            (Field::IssueDate, FieldValue::Text(v)) => self.issue_date = Some(v),
            (Field::Amount, FieldValue::Amount(v)) => self.amount = Some(v),
            (Field::Interest, FieldValue::Amount(v)) => self.interest = Some(v),
            (Field::Fine, FieldValue::Amount(v)) => self.fine = Some(v),
            (Field::DigitableLine, FieldValue::Text(v)) => self.digitable_line = Some(v),
            (Field::Barcode, FieldValue::Text(v)) => self.barcode = Some(v),
            (Field::DocumentNumber, FieldValue::Text(v)) => self.document_number = Some(v),
            (Field::Cpf, FieldValue::Text(v)) => self.cpf = Some(v),
            (Field::Cnpj, FieldValue::Text(v)) => self.cnpj = Some(v),
            (Field::ContactPhone, FieldValue::Text(v)) => self.contact_phone = Some(v),
            (Field::AgeYears, FieldValue::Integer(v)) => self.age_years = Some(v),
            (Field::ExperienceYears, FieldValue::Integer(v)) => self.experience_years = Some(v),
            // A rule whose parser kind does not line up with its field is a
            // table authoring mistake; drop the value rather than panic.
            (field, value) => {
                tracing::warn!(field = field.name(), ?value, "mismatched field value dropped");
            }
        }
    }

    /// Textual field values that feed the normalized search blob.
    pub fn textual_parts(&self) -> Vec<&str> {
        [
            self.document_number.as_deref(),
            self.cpf.as_deref(),
            self.cnpj.as_deref(),
            self.contact_phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|&f| !self.is_set(f))
    }
}
