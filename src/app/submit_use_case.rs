use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::ports::HttpClientPort;
use crate::constants;
use crate::error::{ImportError, Result};
use crate::observability::metrics;
use crate::pipeline::validate::check;
use crate::pipeline::{FieldValue, ImportPipeline, ParsedRecord, RecordSchema};
use crate::types::{ResponseShape, SubmissionResult};

/// Sends record batches to an ingestion endpoint and interprets the reply.
///
/// The whole batch travels as one JSON array; there is no chunking and no
/// partial retry. A non-2xx reply rejects the batch as a unit; any 2xx reply
/// accepts it, whatever the body holds.
#[derive(Clone)]
pub struct BatchSubmitter {
    http: Arc<dyn HttpClientPort>,
}

impl BatchSubmitter {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }

    #[instrument(skip(self, records, pipeline), fields(pipeline = pipeline.name, records = records.len()))]
    pub async fn submit(&self, records: &[ParsedRecord], pipeline: &ImportPipeline) -> Result<SubmissionResult> {
        if records.is_empty() {
            return Err(ImportError::EmptyBatch);
        }
        let body = serde_json::to_vec(records)?;
        let started = Instant::now();
        let outcome = self.post(&pipeline.endpoint, body, pipeline.response).await;
        metrics::submit::duration(pipeline.name, started.elapsed().as_secs_f64());

        match &outcome {
            Ok(result) => {
                metrics::submit::success(pipeline.name, records.len());
                if let Some(creds) = result.credentials() {
                    if creds.len() != records.len() {
                        warn!(submitted = records.len(), returned = creds.len(), "credential count differs from batch size");
                    }
                }
                info!("batch accepted");
            }
            Err(e) => {
                metrics::submit::error(pipeline.name, error_kind(e));
                warn!(error = %e, "batch rejected");
            }
        }
        outcome
    }

    /// Validates and sends a single record, e.g. one behavior entry typed by a teacher.
    #[instrument(skip(self, record, schema), fields(schema = schema.name()))]
    pub async fn submit_one(&self, record: &ParsedRecord, schema: &RecordSchema, path: &str) -> Result<Value> {
        if let Err(violations) = check(record, schema) {
            let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
            return Err(ImportError::InvalidRecord(reasons.join(", ")));
        }
        let body = serde_json::to_vec(record)?;
        match self.post(path, body, ResponseShape::Acknowledgement).await? {
            SubmissionResult::Acknowledged(value) => Ok(value),
            SubmissionResult::Credentials(credentials) => Ok(serde_json::to_value(credentials)?),
        }
    }

    async fn post(&self, path: &str, body: Vec<u8>, shape: ResponseShape) -> Result<SubmissionResult> {
        let resp = self.http.post_json(path, body).await?;
        if !resp.is_success() {
            return Err(ImportError::RemoteRejection {
                status: resp.status,
                message: rejection_message(&resp.bytes),
            });
        }
        Ok(SubmissionResult::from_body(shape, &resp.bytes))
    }
}

fn error_kind(e: &ImportError) -> &'static str {
    match e {
        ImportError::Network(_) => "network",
        ImportError::RemoteRejection { .. } => "rejected",
        _ => "other",
    }
}

/// Human-readable reason from an error body: a `detail`, `message` or `error`
/// string in JSON, else short plain text, else the generic fallback.
pub fn rejection_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return message_from_json(&value).unwrap_or_else(|| constants::MSG_SUBMIT_FAILED.to_string());
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    // HTML error pages from proxies are not worth showing
    if text.is_empty() || text.starts_with('<') {
        constants::MSG_SUBMIT_FAILED.to_string()
    } else {
        text.to_string()
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => ["detail", "message", "error", "msg"]
            .iter()
            .find_map(|key| map.get(*key).and_then(message_from_json)),
        Value::Array(items) => {
            let messages: Vec<String> = items.iter().filter_map(message_from_json).collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// A single behavior check-in entered by hand.
#[derive(Debug, Clone)]
pub struct BehaviorEntry {
    pub student_id: String,
    pub check_date: NaiveDate,
    pub attendance: bool,
    pub discipline_score: i64,
    pub teacher_note: String,
}

impl BehaviorEntry {
    /// Builds the same record shape the bulk parser produces for this schema.
    pub fn to_record(&self) -> ParsedRecord {
        let mut record = ParsedRecord::new(0);
        record.insert("student_id", FieldValue::Text(self.student_id.trim().to_string()));
        record.insert("check_date", FieldValue::Text(self.check_date.format("%Y-%m-%d").to_string()));
        record.insert("attendance", FieldValue::Boolean(self.attendance));
        record.insert("discipline_score", FieldValue::Integer(self.discipline_score));
        record.insert("teacher_note", FieldValue::Text(self.teacher_note.clone()));
        record
    }
}
