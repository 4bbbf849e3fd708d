/// Default API location and endpoint paths.
/// The deployed API expects the trailing slash on the teacher endpoints.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const LOGIN_PATH: &str = "/auth/login";
pub const BEHAVIOR_BULK_PATH: &str = "/teacher/submit-behavior-bulk/";
pub const ROSTER_BULK_PATH: &str = "/teacher/create-students-bulk/";
pub const BEHAVIOR_SINGLE_PATH: &str = "/teacher/submit-behavior/";
pub const REGISTER_TEACHER_PATH: &str = "/auth/register-teacher";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
pub const STUDENTS_PATH: &str = "/teacher/students";
pub const CHECKINS_PATH: &str = "/teacher/checkins";

/// Environment variable that overrides `api.base_url` from config.toml
pub const BASE_URL_ENV: &str = "WELLBEING_API_URL";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_SESSION_FILE: &str = ".wellbeing-session.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CREDENTIALS_FILE: &str = "student-credentials.csv";

/// Number of records shown in an import preview
pub const PREVIEW_LIMIT: usize = 5;

// Password rules enforced before any request is sent
pub const TEACHER_PASSWORD_MIN_LEN: usize = 8;
pub const NEW_PASSWORD_MIN_LEN: usize = 6;

// User-facing messages
pub const MSG_NO_VALID_RECORDS: &str = "No valid records found in CSV file";
pub const MSG_SELECT_VALID_FILE: &str = "Please select a valid CSV file";
pub const MSG_SUBMIT_FAILED: &str = "Failed to submit data";
pub const MSG_TEACHER_CREATED: &str = "Teacher account created";
pub const MSG_PASSWORD_CHANGED: &str = "Password changed";

// Pipeline names
pub const BEHAVIOR_PIPELINE: &str = "behavior";
pub const ROSTER_PIPELINE: &str = "roster";

