use serde::Serialize;
use tracing::{debug, warn};

use crate::observability::metrics;
use crate::pipeline::parser::{parse, ParsedRecord};
use crate::pipeline::schema::RecordSchema;
use crate::pipeline::validate::{check, RowRejection};

/// The accepted records of one uploaded file, in file order.
///
/// A batch is always built in one go from a whole file and never mutated
/// afterwards; a new file produces a new batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportBatch {
    records: Vec<ParsedRecord>,
    #[serde(skip)]
    dropped: Vec<RowRejection>,
}

impl ImportBatch {
    /// `filter(parse(text, schema), is_accepted)`, remembering why rows were dropped.
    pub fn from_text(raw_text: &str, schema: &RecordSchema) -> Self {
        let mut records = Vec::new();
        let mut dropped = Vec::new();

        for record in parse(raw_text, schema) {
            match check(&record, schema) {
                Ok(()) => records.push(record),
                Err(violations) => {
                    debug!(line = record.line(), ?violations, "row dropped");
                    dropped.push(RowRejection { line: record.line(), violations });
                }
            }
        }

        if !dropped.is_empty() {
            warn!(
                schema = schema.name(),
                accepted = records.len(),
                dropped = dropped.len(),
                "rows dropped during validation"
            );
        }
        metrics::validator::rows_accepted(records.len() as u64);
        metrics::validator::rows_dropped(dropped.len() as u64);

        Self { records, dropped }
    }

    pub fn records(&self) -> &[ParsedRecord] {
        &self.records
    }

    pub fn dropped(&self) -> &[RowRejection] {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn preview(&self, limit: usize) -> Preview<'_> {
        let shown = &self.records[..self.records.len().min(limit)];
        Preview { records: shown, remaining: self.records.len() - shown.len() }
    }
}

/// The first few records of a batch plus how many were left out.
#[derive(Debug, Clone, Copy)]
pub struct Preview<'a> {
    pub records: &'a [ParsedRecord],
    pub remaining: usize,
}
