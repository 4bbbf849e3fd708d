//! Import metrics.
//!
//! Recorded through the `metrics` facade; they are no-ops unless the host
//! process installs a recorder.

use std::fmt;

/// All metric names used by the import client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Parser metrics
    ParserRowsParsed,

    // Validator metrics
    ValidatorRowsAccepted,
    ValidatorRowsDropped,

    // Submission metrics
    SubmitRequestsSuccess,
    SubmitRequestsError,
    SubmitDuration,
    SubmitBatchSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ParserRowsParsed => "wellbeing_parser_rows_parsed_total",
            MetricName::ValidatorRowsAccepted => "wellbeing_validator_rows_accepted_total",
            MetricName::ValidatorRowsDropped => "wellbeing_validator_rows_dropped_total",
            MetricName::SubmitRequestsSuccess => "wellbeing_submit_requests_success_total",
            MetricName::SubmitRequestsError => "wellbeing_submit_requests_error_total",
            MetricName::SubmitDuration => "wellbeing_submit_duration_seconds",
            MetricName::SubmitBatchSize => "wellbeing_submit_batch_size",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod parser {
    use super::MetricName;

    pub fn rows_parsed(count: u64) {
        ::metrics::counter!(MetricName::ParserRowsParsed.as_str()).increment(count);
    }
}

pub mod validator {
    use super::MetricName;

    pub fn rows_accepted(count: u64) {
        ::metrics::counter!(MetricName::ValidatorRowsAccepted.as_str()).increment(count);
    }

    pub fn rows_dropped(count: u64) {
        ::metrics::counter!(MetricName::ValidatorRowsDropped.as_str()).increment(count);
    }
}

pub mod submit {
    use super::MetricName;

    /// Record a successful batch submission
    pub fn success(pipeline: &'static str, batch_size: usize) {
        ::metrics::counter!(MetricName::SubmitRequestsSuccess.as_str(), "pipeline" => pipeline).increment(1);
        ::metrics::histogram!(MetricName::SubmitBatchSize.as_str(), "pipeline" => pipeline)
            .record(batch_size as f64);
    }

    /// Record a failed batch submission
    pub fn error(pipeline: &'static str, kind: &'static str) {
        ::metrics::counter!(MetricName::SubmitRequestsError.as_str(), "pipeline" => pipeline, "kind" => kind)
            .increment(1);
    }

    pub fn duration(pipeline: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::SubmitDuration.as_str(), "pipeline" => pipeline).record(secs);
    }
}
