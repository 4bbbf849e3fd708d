use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Login credentials generated by the API for one provisioned student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCredential {
    pub student_id: String,
    pub full_name: String,
    #[serde(alias = "generated_username")]
    pub username: String,
    #[serde(alias = "generated_password")]
    pub password: String,
}

/// What a successful ingestion endpoint returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Any JSON body; kept verbatim
    Acknowledgement,
    /// A JSON array of [`StudentCredential`], one per submitted record
    Credentials,
}

/// Outcome of a successful batch submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubmissionResult {
    Acknowledged(Value),
    Credentials(Vec<StudentCredential>),
}

impl SubmissionResult {
    /// Interprets a 2xx response body. Never fails: the server has already
    /// accepted the batch, so a body that does not match `shape` is kept as an
    /// acknowledgement. An empty body is `null`; a non-JSON body is kept as text.
    pub fn from_body(shape: ResponseShape, body: &[u8]) -> Self {
        let value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(body).unwrap_or_else(|e| {
                warn!(error = %e, "success body is not JSON; kept as text");
                Value::String(String::from_utf8_lossy(body).trim().to_string())
            })
        };

        match shape {
            ResponseShape::Acknowledgement => SubmissionResult::Acknowledged(value),
            ResponseShape::Credentials => match serde_json::from_value(value.clone()) {
                Ok(credentials) => SubmissionResult::Credentials(credentials),
                Err(e) => {
                    warn!(error = %e, "success body is not a credential list; kept as acknowledgement");
                    SubmissionResult::Acknowledged(value)
                }
            },
        }
    }

    pub fn credentials(&self) -> Option<&[StudentCredential]> {
        match self {
            SubmissionResult::Credentials(c) => Some(c),
            SubmissionResult::Acknowledged(_) => None,
        }
    }
}

/// One row of `GET /teacher/students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub full_name: String,
    #[serde(default)]
    pub class_id: String,
    /// Traffic-light label assigned by the API, e.g. "Xanh", "Vàng", "Đỏ"
    #[serde(default)]
    pub risk_level: Option<String>,
}

/// One row of `GET /teacher/checkins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinEntry {
    #[serde(default)]
    pub form_id: Value,
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub class_id: String,
    /// 1 (very sad) to 5 (very happy)
    #[serde(default)]
    pub mood_rating: Option<i64>,
    #[serde(default)]
    pub original_feedback: Option<String>,
    #[serde(default)]
    pub ai_sentiment: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CheckinEntry {
    pub fn mood_label(&self) -> &'static str {
        match self.mood_rating {
            Some(1) => "very sad",
            Some(2) => "sad",
            Some(3) => "neutral",
            Some(4) => "happy",
            Some(5) => "very happy",
            _ => "unknown",
        }
    }
}

/// Body of `POST /auth/register-teacher`.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherRegistration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

/// Body of `POST /auth/change-password`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}
