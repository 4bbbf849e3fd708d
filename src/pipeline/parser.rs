//! Delimited-text parser for bulk imports.
//!
//! The format is deliberately minimal: lines are split on `\n`, fields on `,`,
//! and every token is trimmed. There is no quoting or escaping, so a comma
//! inside a value always starts a new field.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::observability::metrics;
use crate::pipeline::schema::{FieldKind, RecordSchema};

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// An Integer column whose token was empty or did not start with a number.
    NotANumber,
}

impl FieldValue {
    /// Whether the value satisfies a `required` constraint.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Integer(_) | FieldValue::Boolean(_) => true,
            FieldValue::NotANumber => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::NotANumber => f.write_str("NaN"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::NotANumber => serializer.serialize_none(),
        }
    }
}

/// One parsed row: field values keyed by lower-cased header name, in header order.
///
/// Columns for which the row had no token are absent rather than empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    line: usize,
    fields: Vec<(String, FieldValue)>,
}

impl ParsedRecord {
    pub fn new(line: usize) -> Self {
        Self { line, fields: Vec::new() }
    }

    /// 1-based line of the source text this record came from.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Text value of a field, or `None` when absent or not text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Sets a field. A repeated name replaces the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ParsedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parses `raw_text` into records, coercing columns the schema declares.
///
/// The first line (after trimming the whole text) is the header. Blank lines
/// are skipped. No record is dropped here; see [`crate::pipeline::validate`].
pub fn parse(raw_text: &str, schema: &RecordSchema) -> Vec<ParsedRecord> {
    let trimmed = raw_text.trim();
    // Keep reported line numbers relative to the untrimmed input
    let leading = &raw_text[..raw_text.len() - raw_text.trim_start().len()];
    let line_offset = leading.matches('\n').count();

    let mut lines = trimmed.split('\n');
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(',').map(|h| h.trim().to_lowercase()).collect(),
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // header is line 1 of the trimmed text
        let line_no = line_offset + idx + 2;
        let values: Vec<&str> = line.split(',').map(str::trim).collect();

        let mut record = ParsedRecord::new(line_no);
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = coerce(schema.kind_of(header), values.get(i).copied()) {
                record.insert(header.clone(), value);
            }
        }
        records.push(record);
    }

    metrics::parser::rows_parsed(records.len() as u64);
    records
}

fn coerce(kind: FieldKind, token: Option<&str>) -> Option<FieldValue> {
    match kind {
        FieldKind::Boolean => Some(FieldValue::Boolean(token.map(parse_bool).unwrap_or(false))),
        FieldKind::Integer => token.map(|t| match parse_leading_int(t) {
            Some(n) => FieldValue::Integer(n),
            None => FieldValue::NotANumber,
        }),
        FieldKind::Text => token.map(|t| FieldValue::Text(t.to_string())),
    }
}

/// `true` iff the token is "true" in any case, or exactly "1".
pub fn parse_bool(token: &str) -> bool {
    token.eq_ignore_ascii_case("true") || token == "1"
}

/// Base-10 integer from the leading digits of `token` (optional sign).
/// Trailing characters are ignored; no digits or i64 overflow gives `None`.
pub fn parse_leading_int(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let sign_len = match token.as_bytes().first() {
        Some(b'-') | Some(b'+') => 1,
        _ => 0,
    };
    let digits = &token[sign_len..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // parse sign and digits together so i64::MIN fits
    token[..sign_len + end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_single_row() {
        let records = parse(
            "student_id,full_name,class_id\nHS001,Nguyen Van A,10A1\n",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("student_id"), Some("HS001"));
        assert_eq!(records[0].text("full_name"), Some("Nguyen Van A"));
        assert_eq!(records[0].text("class_id"), Some("10A1"));
        assert_eq!(records[0].line(), 2);
    }

    #[test]
    fn test_header_is_trimmed_and_lowercased_values_are_not() {
        let records = parse(
            " Student_ID , FULL_NAME,class_id\r\n  hs002 , Tran Thi B ,10A2\r\n",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("student_id"), Some("hs002"));
        assert_eq!(records[0].text("full_name"), Some("Tran Thi B"));
        assert_eq!(records[0].text("class_id"), Some("10A2"));
    }

    #[test]
    fn test_header_order_differs_from_schema() {
        let records = parse(
            "class_id,student_id,full_name\n10A1,HS003,Le Minh C",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records[0].text("student_id"), Some("HS003"));
        assert_eq!(records[0].text("class_id"), Some("10A1"));
        let order: Vec<_> = records[0].fields().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["class_id", "student_id", "full_name"]);
    }

    #[test]
    fn test_short_rows_leave_fields_absent() {
        let records = parse(
            "student_id,check_date,attendance,discipline_score,teacher_note\nHS001,2024-01-15",
            &RecordSchema::behavior_checkin(),
        );
        let r = &records[0];
        assert_eq!(r.text("check_date"), Some("2024-01-15"));
        assert_eq!(r.get("discipline_score"), None);
        assert_eq!(r.get("teacher_note"), None);
        // boolean columns are never absent
        assert_eq!(r.get("attendance"), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn test_empty_token_stays_empty_text() {
        let records = parse(
            "student_id,full_name,class_id\nHS001,,10A1",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records[0].text("full_name"), Some(""));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let records = parse(
            "\n\nstudent_id,full_name,class_id\n\n   \nHS001,A,10A1\n\nHS002,B,10A1\n\n",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line(), 6);
        assert_eq!(records[1].line(), 8);
    }

    #[test]
    fn test_header_only_and_empty_input() {
        let schema = RecordSchema::student_roster();
        assert!(parse("student_id,full_name,class_id\n", &schema).is_empty());
        assert!(parse("student_id,full_name,class_id\n\n  \n", &schema).is_empty());
        assert!(parse("", &schema).is_empty());
    }

    #[test]
    fn test_comma_inside_value_splits_field() {
        let records = parse(
            "student_id,full_name,class_id\nHS001,Nguyen, Van A,10A1",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records[0].text("full_name"), Some("Nguyen"));
        assert_eq!(records[0].text("class_id"), Some("Van A"));
    }

    #[test]
    fn test_boolean_coercion() {
        for token in ["true", "True", "TRUE", "1"] {
            assert!(parse_bool(token), "{token}");
        }
        for token in ["false", "0", "no", "yes", "", "01"] {
            assert!(!parse_bool(token), "{token}");
        }
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(parse_leading_int("10"), Some(10));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("12abc"), Some(12));
        assert_eq!(parse_leading_int("3.7"), Some(3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("99999999999999999999"), None);
        assert_eq!(parse_leading_int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_leading_int("9223372036854775807x"), Some(i64::MAX));
        assert_eq!(parse_leading_int("9223372036854775808"), None);
        assert_eq!(parse_leading_int("+-3"), None);

        let records = parse(
            "student_id,check_date,discipline_score\nHS001,2024-01-15,ten",
            &RecordSchema::behavior_checkin(),
        );
        assert_eq!(records[0].get("discipline_score"), Some(&FieldValue::NotANumber));
    }

    #[test]
    fn test_duplicate_header_later_column_wins() {
        let records = parse(
            "student_id,full_name,student_id\nHS001,A,HS999",
            &RecordSchema::student_roster(),
        );
        assert_eq!(records[0].text("student_id"), Some("HS999"));
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_serializes_in_header_order_with_typed_values() {
        let records = parse(
            "student_id,check_date,attendance,discipline_score,teacher_note,extra\nHS001,2024-01-15,true,x,Tot,keep",
            &RecordSchema::behavior_checkin(),
        );
        let json = serde_json::to_string(&records[0]).unwrap();
        assert_eq!(
            json,
            r#"{"student_id":"HS001","check_date":"2024-01-15","attendance":true,"discipline_score":null,"teacher_note":"Tot","extra":"keep"}"#
        );
    }
}
