use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote rejection ({status}): {message}")]
    RemoteRejection { status: u16, message: String },

    #[error("Unexpected response from API: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No valid records found in CSV file")]
    EmptyBatch,

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),
}

impl ImportError {
    /// Message shown to the user when a submission fails.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::RemoteRejection { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Transport and remote failures leave the batch intact for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ImportError::Network(_) | ImportError::RemoteRejection { .. } | ImportError::InvalidResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
