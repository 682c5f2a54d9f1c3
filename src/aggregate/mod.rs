// Per-region latency and uptime aggregation
//
// Consumes coerced telemetry columns plus the request's region list and
// threshold. Degenerate regions (no rows, or no usable latency) yield the
// all-zero RegionStatistics::NO_DATA instead of an error, so one sparse
// region never aborts a batch.
//
// Latency figures are rounded to 3 decimals and uptime to 6, only at output.

mod aggregator;
mod stats;

pub use aggregator::{
    RegionAggregator, RegionReport, RegionStatistics, LATENCY_PLACES, P95, UPTIME_PLACES,
};
pub use stats::{count_breaches, mean, percentile_higher, present_values, round_to};
