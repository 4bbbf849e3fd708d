pub mod ports;
pub mod auth_use_case;
pub mod directory_use_case;
pub mod submit_use_case;
pub mod import_session;

pub use directory_use_case::{CheckinFilter, StudentFilter};
pub use import_session::{ImportSession, SessionSnapshot, SessionStatus};
pub use submit_use_case::{BatchSubmitter, BehaviorEntry};
