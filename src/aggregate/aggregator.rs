use crate::aggregate::stats::{count_breaches, mean, percentile_higher, present_values, round_to};
use crate::dataset::Dataset;
use crate::schema::{ResolvedSchema, TelemetryColumns};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Quantile reported as `p95_latency`
pub const P95: f64 = 0.95;

/// Decimal places for latency figures
pub const LATENCY_PLACES: i32 = 3;

/// Decimal places for the uptime fraction
pub const UPTIME_PLACES: i32 = 6;

/// Summary statistics for one requested region
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStatistics {
    pub avg_latency: f64,
    pub p95_latency: f64,
    pub avg_uptime: f64,
    pub breaches: u64,
}

impl RegionStatistics {
    /// Emitted when a region has no usable latency data
    pub const NO_DATA: RegionStatistics = RegionStatistics {
        avg_latency: 0.0,
        p95_latency: 0.0,
        avg_uptime: 0.0,
        breaches: 0,
    };

    /// Compute statistics from already-filtered samples
    ///
    /// Returns [`RegionStatistics::NO_DATA`] when `latencies` is empty.
    pub fn from_samples(latencies: &[f64], uptimes: &[f64], threshold_ms: f64) -> Self {
        let (Some(avg_latency), Some(p95_latency)) =
            (mean(latencies), percentile_higher(latencies, P95))
        else {
            return Self::NO_DATA;
        };

        Self {
            avg_latency: round_to(avg_latency, LATENCY_PLACES),
            p95_latency: round_to(p95_latency, LATENCY_PLACES),
            avg_uptime: mean(uptimes).map_or(0.0, |u| round_to(u, UPTIME_PLACES)),
            breaches: count_breaches(latencies, threshold_ms),
        }
    }
}

/// Per-region results in request order
///
/// Duplicated regions keep one entry per occurrence. Serializes as a JSON
/// object keyed by the region string exactly as requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionReport {
    entries: Vec<(String, RegionStatistics)>,
}

impl RegionReport {
    pub fn push(&mut self, region: impl Into<String>, stats: RegionStatistics) {
        self.entries.push((region.into(), stats));
    }

    /// First entry for a region (exact key)
    pub fn get(&self, region: &str) -> Option<&RegionStatistics> {
        self.entries
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, stats)| stats)
    }

    pub fn entries(&self) -> &[(String, RegionStatistics)] {
        &self.entries
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RegionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (region, stats) in &self.entries {
            map.serialize_entry(region, stats)?;
        }
        map.end()
    }
}

/// Computes per-region statistics over coerced telemetry columns
#[derive(Debug, Clone, Copy)]
pub struct RegionAggregator {
    threshold_ms: f64,
}

impl RegionAggregator {
    pub fn new(threshold_ms: f64) -> Self {
        Self { threshold_ms }
    }

    pub fn threshold_ms(&self) -> f64 {
        self.threshold_ms
    }

    /// Aggregate a raw dataset through its resolved schema
    pub fn aggregate_dataset(
        &self,
        dataset: &Dataset,
        schema: &ResolvedSchema,
        regions: &[String],
    ) -> RegionReport {
        self.aggregate(&schema.columns(dataset), regions)
    }

    /// Statistics for each requested region, in request order
    ///
    /// Region matching is case-insensitive. Never fails: regions without
    /// matching rows, or whose latencies are all missing, get
    /// [`RegionStatistics::NO_DATA`].
    pub fn aggregate(&self, columns: &TelemetryColumns, regions: &[String]) -> RegionReport {
        let region_keys: Vec<Option<String>> = columns
            .region
            .iter()
            .map(|r| r.as_deref().map(str::to_lowercase))
            .collect();

        let mut report = RegionReport::default();
        for region in regions {
            let target = region.to_lowercase();
            let rows: Vec<usize> = region_keys
                .iter()
                .enumerate()
                .filter(|(_, key)| key.as_deref() == Some(target.as_str()))
                .map(|(i, _)| i)
                .collect();

            let latencies = present_values(rows.iter().filter_map(|&i| columns.latency.get(i)));
            let uptimes = present_values(rows.iter().filter_map(|&i| columns.uptime.get(i)));

            if latencies.is_empty() {
                tracing::debug!(
                    "Region {:?}: {} matching rows, no usable latency",
                    region,
                    rows.len()
                );
            } else {
                tracing::debug!(
                    "Region {:?}: {} rows, {} latency samples, {} uptime samples",
                    region,
                    rows.len(),
                    latencies.len(),
                    uptimes.len()
                );
            }

            report.push(
                region.clone(),
                RegionStatistics::from_samples(&latencies, &uptimes, self.threshold_ms),
            );
        }
        report
    }
}
