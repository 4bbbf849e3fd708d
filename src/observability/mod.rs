// Observability: metrics facade for the import pipeline

pub mod metrics;
