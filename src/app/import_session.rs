//! Import session controller.
//!
//! Drives one import use case through
//! `Idle -> FileLoaded -> Previewing -> Submitting -> {Succeeded, Failed}`.
//! State lives behind a mutex that is never held across an await, and every
//! change is published on a watch channel for observers (CLI output, UI).
//!
//! Each file selection bumps a generation counter. Work that completes for an
//! older generation (a slow file read, a submission overtaken by a new file or
//! a reset) is discarded instead of overwriting newer state.

use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::submit_use_case::BatchSubmitter;
use crate::constants;
use crate::error::Result;
use crate::pipeline::{ImportBatch, ImportPipeline};
use crate::types::SubmissionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionStatus {
    #[default]
    Idle,
    FileLoaded,
    Previewing,
    Submitting,
    Succeeded,
    Failed,
}

/// Read-only view of a session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub file_name: Option<String>,
    pub batch: ImportBatch,
    pub result: Option<SubmissionResult>,
    pub error_message: Option<String>,
}

impl SessionSnapshot {
    pub fn can_submit(&self) -> bool {
        matches!(self.status, SessionStatus::Previewing | SessionStatus::Failed) && !self.batch.is_empty()
    }
}

/// Identifies one file selection; see [`ImportSession::select_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTicket {
    generation: u64,
}

struct Inner {
    generation: u64,
    state: SessionSnapshot,
}

pub struct ImportSession {
    id: Uuid,
    pipeline: ImportPipeline,
    submitter: BatchSubmitter,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl ImportSession {
    pub fn new(pipeline: ImportPipeline, submitter: BatchSubmitter) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            id: Uuid::new_v4(),
            pipeline,
            submitter,
            inner: Mutex::new(Inner { generation: 0, state: SessionSnapshot::default() }),
            state_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pipeline(&self) -> &ImportPipeline {
        &self.pipeline
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Starts a new file selection, discarding any previous batch and result.
    pub fn select_file(&self, file_name: &str) -> FileTicket {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = SessionSnapshot {
            status: SessionStatus::FileLoaded,
            file_name: Some(file_name.to_string()),
            ..SessionSnapshot::default()
        };
        debug!(session = %self.id, file = file_name, generation = inner.generation, "file selected");
        let ticket = FileTicket { generation: inner.generation };
        self.publish(&inner);
        ticket
    }

    /// Parses and validates the text of the selected file.
    ///
    /// Returns `false` when `ticket` belongs to a superseded selection; the
    /// text is then ignored. An empty batch keeps the session at `FileLoaded`
    /// with an error message.
    pub fn complete_file(&self, ticket: FileTicket, text: &str) -> bool {
        let batch = ImportBatch::from_text(text, &self.pipeline.schema);

        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            debug!(session = %self.id, stale = ticket.generation, current = inner.generation, "stale parse discarded");
            return false;
        }
        if batch.is_empty() {
            warn!(session = %self.id, dropped = batch.dropped().len(), "no valid records");
            inner.state.status = SessionStatus::FileLoaded;
            inner.state.error_message = Some(constants::MSG_NO_VALID_RECORDS.to_string());
        } else {
            info!(session = %self.id, accepted = batch.len(), dropped = batch.dropped().len(), "file parsed");
            inner.state.status = SessionStatus::Previewing;
            inner.state.error_message = None;
        }
        inner.state.batch = batch;
        self.publish(&inner);
        true
    }

    /// Records that the selected file could not be read.
    pub fn fail_file(&self, ticket: FileTicket, message: &str) {
        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            return;
        }
        inner.state.status = SessionStatus::FileLoaded;
        inner.state.batch = ImportBatch::default();
        inner.state.error_message = Some(message.to_string());
        self.publish(&inner);
    }

    /// Selects a file whose text is already in memory.
    pub fn on_file_selected(&self, file_name: &str, text: &str) {
        let ticket = self.select_file(file_name);
        self.complete_file(ticket, text);
    }

    /// Selects a file on disk and reads it. Invalid UTF-8 is replaced, not rejected.
    pub async fn load_file(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let ticket = self.select_file(&name);
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                self.complete_file(ticket, &String::from_utf8_lossy(&bytes));
                Ok(())
            }
            Err(e) => {
                self.fail_file(ticket, &format!("Failed to read file: {}", e));
                Err(e.into())
            }
        }
    }

    /// Sends the current batch.
    ///
    /// A no-op (`Ok(None)`) while a submission is in flight or when there is
    /// nothing to send. On failure the batch is kept so the call can be
    /// repeated. A result that arrives after a new file selection or a reset
    /// is returned to the caller but not stored.
    pub async fn confirm_submit(&self) -> Result<Option<SubmissionResult>> {
        let (generation, records) = {
            let mut inner = self.lock();
            let status = inner.state.status;
            match status {
                SessionStatus::Submitting => {
                    debug!(session = %self.id, "submission already in flight");
                    return Ok(None);
                }
                _ if !inner.state.can_submit() => {
                    if inner.state.batch.is_empty() {
                        inner.state.error_message = Some(constants::MSG_SELECT_VALID_FILE.to_string());
                        self.publish(&inner);
                    }
                    return Ok(None);
                }
                _ => {}
            }
            inner.state.status = SessionStatus::Submitting;
            inner.state.error_message = None;
            inner.state.result = None;
            self.publish(&inner);
            (inner.generation, inner.state.batch.records().to_vec())
        };

        let span = info_span!("submit", session = %self.id, pipeline = self.pipeline.name, records = records.len());
        let outcome = self.submitter.submit(&records, &self.pipeline).instrument(span).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            warn!(session = %self.id, "submission finished after the session moved on; result not stored");
            return outcome.map(Some);
        }
        match outcome {
            Ok(result) => {
                inner.state.status = SessionStatus::Succeeded;
                inner.state.batch = ImportBatch::default();
                inner.state.file_name = None;
                inner.state.result = Some(result.clone());
                self.publish(&inner);
                Ok(Some(result))
            }
            Err(e) => {
                inner.state.status = SessionStatus::Failed;
                inner.state.error_message = Some(e.user_message());
                self.publish(&inner);
                Err(e)
            }
        }
    }

    /// Leaves `Failed` for `Previewing`, keeping the batch.
    pub fn dismiss_error(&self) {
        let mut inner = self.lock();
        if inner.state.status == SessionStatus::Failed {
            inner.state.status = SessionStatus::Previewing;
            inner.state.error_message = None;
            self.publish(&inner);
        }
    }

    /// Back to `Idle`. Also supersedes an in-flight submission.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = SessionSnapshot::default();
        self.publish(&inner);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // the snapshot is replaced wholesale on every change, so a poisoned lock is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
    }
}
