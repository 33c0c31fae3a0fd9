pub mod analyzers;
pub mod charts;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod source;
