// Tabular record import: parse -> validate -> batch -> submit

pub mod batch;
pub mod export;
pub mod parser;
pub mod schema;
pub mod validate;

pub use batch::{ImportBatch, Preview};
pub use parser::{parse, FieldValue, ParsedRecord};
pub use schema::{FieldKind, FieldSpec, RecordSchema};
pub use validate::{is_accepted, RowRejection, Violation};

use crate::config::ApiConfig;
use crate::constants;
use crate::types::ResponseShape;

/// One import use case: what the file must contain and where the batch goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPipeline {
    pub name: &'static str,
    pub schema: RecordSchema,
    /// Endpoint path relative to the API base URL
    pub endpoint: String,
    pub response: ResponseShape,
}

impl ImportPipeline {
    pub fn behavior_checkins(api: &ApiConfig) -> Self {
        Self {
            name: constants::BEHAVIOR_PIPELINE,
            schema: RecordSchema::behavior_checkin(),
            endpoint: api.behavior_bulk_path.clone(),
            response: ResponseShape::Acknowledgement,
        }
    }

    pub fn student_roster(api: &ApiConfig) -> Self {
        Self {
            name: constants::ROSTER_PIPELINE,
            schema: RecordSchema::student_roster(),
            endpoint: api.roster_bulk_path.clone(),
            response: ResponseShape::Credentials,
        }
    }
}
