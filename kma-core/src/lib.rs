//! Core library for the `kma` CLI.
//!
//! This crate defines:
//! - The KMA response envelope and its validation
//! - Reshaping of observation and forecast records into tables
//! - An HTTP client for the observation and forecast endpoints
//! - Configuration & credentials handling for binaries
//!
//! It is used by `kma-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod query;
pub mod reshape;
pub mod retry;
pub mod table;
pub mod validate;

pub use client::{ClientConfig, Fetch, HttpFetcher, KmaClient};
pub use config::{Config, RetrySettings};
pub use envelope::{ApiEnvelope, Record};
pub use error::{ApiFault, KmaError, TransportError};
pub use query::{ForecastQuery, ObservationQuery};
pub use reshape::{ForecastRecord, ForecastTable, to_forecast_table, to_table};
pub use retry::RetryConfig;
pub use table::{Row, Table};
pub use validate::validate;
