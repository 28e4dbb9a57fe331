pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod types;

// Application use cases and the file adapters behind their ports
pub mod app;
pub mod infra;
