pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod pipeline;

// Domain data shapes shared across stages
pub mod domain;
