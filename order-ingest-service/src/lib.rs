//! Order stream ingestion pipeline.
//!
//! Consumes an append-only order stream from Redis, validates each record,
//! and materializes it into keyed storage. A second binary taps the same
//! stream read-only for live diagnostics.

pub mod broker;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
