//! Teacher-side import client for the school well-being tracking API.
//!
//! Bulk CSV imports (behavior check-ins, student rosters) are parsed against a
//! typed schema, validated, previewed and submitted as one batch to the
//! remote ingestion endpoints.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

// Layered boundaries: use cases over ports, with concrete adapters in infra
pub mod app;
pub mod infra;

pub mod observability;
