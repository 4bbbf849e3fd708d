use serde::Serialize;

use crate::pipeline::parser::{FieldValue, ParsedRecord};
use crate::pipeline::schema::RecordSchema;

/// Why a required field did not count as present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Violation {
    /// Field absent from the row, or an empty text token
    Missing(String),
    /// Integer field whose token did not start with a number, including an empty token
    NotANumber(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Missing(field) => write!(f, "missing {}", field),
            Violation::NotANumber(field) => write!(f, "{} is not a number", field),
        }
    }
}

/// A row excluded from the batch, with every violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: usize,
    pub violations: Vec<Violation>,
}

/// Checks every required field of `schema` against `record`.
pub fn check(record: &ParsedRecord, schema: &RecordSchema) -> Result<(), Vec<Violation>> {
    let violations: Vec<Violation> = schema
        .required_fields()
        .filter_map(|spec| match record.get(spec.name) {
            Some(FieldValue::NotANumber) => Some(Violation::NotANumber(spec.name.to_string())),
            Some(value) if value.is_present() => None,
            _ => Some(Violation::Missing(spec.name.to_string())),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// A record is accepted iff every required field is present, non-empty and not NaN.
pub fn is_accepted(record: &ParsedRecord, schema: &RecordSchema) -> bool {
    check(record, schema).is_ok()
}
