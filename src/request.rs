//! Metrics request body
//!
//! `{"regions": ["EU", "US"], "threshold_ms": 150}`

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};

/// Threshold used when a request omits `threshold_ms`
pub const DEFAULT_THRESHOLD_MS: f64 = 180.0;

fn default_threshold_ms() -> f64 {
    DEFAULT_THRESHOLD_MS
}

/// Regions to report on (order preserved) and the breach threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRequest {
    #[serde(default)]
    pub regions: Vec<String>,

    /// Latency threshold in milliseconds; breaches are strictly greater
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: f64,
}

impl MetricsRequest {
    pub fn new<I, S>(regions: I, threshold_ms: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            threshold_ms,
        }
    }

    /// Parse and validate a JSON request body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let request: MetricsRequest = serde_json::from_slice(body)
            .map_err(|e| MetricsError::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Reject thresholds the aggregator cannot compare against
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_ms.is_finite() {
            return Err(MetricsError::InvalidRequest(format!(
                "threshold_ms must be finite, got {}",
                self.threshold_ms
            )));
        }
        Ok(())
    }
}
