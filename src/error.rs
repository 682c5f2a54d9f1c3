//! Error taxonomy for telemetry metrics
//!
//! Only two failures are fatal to a request: the dataset could not be loaded
//! ([`LoadError`]) or a required field could not be located ([`SchemaError`]).
//! Bad values and empty regions never surface here; aggregation absorbs them.

use std::path::PathBuf;
use thiserror::Error;

/// A required field could not be located in the dataset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no region field")]
    NoRegionField,

    #[error("no latency field")]
    NoLatencyField,
}

/// The telemetry source is missing or unreadable
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Telemetry file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read telemetry file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV telemetry: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed JSON telemetry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported telemetry record #{record}: expected a JSON object")]
    UnsupportedRecord { record: usize },

    #[error("Telemetry source is empty: {}", .0.display())]
    Empty(PathBuf),
}

/// A field rule pack failed validation
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rule pack {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule pack: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Rule #{index} must set exactly one of `contains` or `exact`")]
    AmbiguousMatcher { index: usize },

    #[error("Rule #{index} has an empty pattern")]
    EmptyPattern { index: usize },

    #[error("Rule pack has no rule for required role `{0}`")]
    MissingRole(&'static str),
}

/// Request-fatal failure surfaced by the metrics engine
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl MetricsError {
    /// Client-input class errors (the request or the dataset shape is unsupported)
    ///
    /// Load failures are server/configuration class.
    pub fn is_client_error(&self) -> bool {
        match self {
            MetricsError::Schema(_) | MetricsError::InvalidRequest(_) => true,
            MetricsError::Load(_) => false,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, MetricsError>;
