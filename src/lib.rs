//! Latencia - per-region latency and uptime summaries
//!
//! This library turns one static batch of telemetry records into per-region
//! statistics (mean and p95 latency, mean uptime, threshold breaches), even
//! when the producer's field names are only conventional.
//!
//! Pipeline: [`loader`] → [`schema`] → [`aggregate`], driven by [`engine`].

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod request;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;

pub use aggregate::{RegionAggregator, RegionReport, RegionStatistics};
pub use dataset::{Dataset, Value};
pub use engine::MetricsEngine;
pub use error::{LoadError, MetricsError, SchemaError};
pub use request::MetricsRequest;
pub use schema::{ResolvedSchema, SchemaResolver};
