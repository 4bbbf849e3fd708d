//! Read-only teacher views: the student roster and submitted check-ins.
//!
//! The API returns full lists; filtering happens locally, the same way for
//! every caller.

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::app::ports::HttpClientPort;
use crate::app::submit_use_case::rejection_message;
use crate::error::{ImportError, Result};
use crate::types::{CheckinEntry, StudentSummary};

/// Filters for the student roster. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub class_id: Option<String>,
    pub risk_level: Option<String>,
    /// Case-insensitive substring of the name or student id
    pub search: Option<String>,
}

impl StudentFilter {
    pub fn matches(&self, s: &StudentSummary) -> bool {
        exact(&self.class_id, Some(&s.class_id))
            && exact(&self.risk_level, s.risk_level.as_ref())
            && contains(&self.search, &[&s.full_name, &s.student_id])
    }
}

/// Filters for check-ins. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CheckinFilter {
    pub class_id: Option<String>,
    /// Case-insensitive substring of the student name or id
    pub search: Option<String>,
    pub sentiment: Option<String>,
}

impl CheckinFilter {
    pub fn matches(&self, c: &CheckinEntry) -> bool {
        exact(&self.class_id, Some(&c.class_id))
            && exact(&self.sentiment, c.ai_sentiment.as_ref())
            && contains(&self.search, &[&c.student_name, &c.student_id])
    }
}

#[instrument(skip(http, filter))]
pub async fn list_students(http: &dyn HttpClientPort, path: &str, filter: &StudentFilter) -> Result<Vec<StudentSummary>> {
    let all: Vec<StudentSummary> = fetch_list(http, path).await?;
    let total = all.len();
    let students: Vec<_> = all.into_iter().filter(|s| filter.matches(s)).collect();
    debug!(total, shown = students.len(), "students listed");
    Ok(students)
}

#[instrument(skip(http, filter))]
pub async fn list_checkins(http: &dyn HttpClientPort, path: &str, filter: &CheckinFilter) -> Result<Vec<CheckinEntry>> {
    let all: Vec<CheckinEntry> = fetch_list(http, path).await?;
    let total = all.len();
    let checkins: Vec<_> = all.into_iter().filter(|c| filter.matches(c)).collect();
    debug!(total, shown = checkins.len(), "check-ins listed");
    Ok(checkins)
}

async fn fetch_list<T: DeserializeOwned>(http: &dyn HttpClientPort, path: &str) -> Result<Vec<T>> {
    let resp = http.get(path).await?;
    if !resp.is_success() {
        return Err(ImportError::RemoteRejection {
            status: resp.status,
            message: rejection_message(&resp.bytes),
        });
    }
    serde_json::from_slice(&resp.bytes)
        .map_err(|e| ImportError::InvalidResponse(format!("{}: {}", path, e)))
}

fn exact(wanted: &Option<String>, actual: Option<&String>) -> bool {
    match wanted.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(w) => actual.map(|a| a == w).unwrap_or(false),
    }
}

fn contains(needle: &Option<String>, haystacks: &[&String]) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => {
            let n = n.to_lowercase();
            haystacks.iter().any(|h| h.to_lowercase().contains(&n))
        }
    }
}
