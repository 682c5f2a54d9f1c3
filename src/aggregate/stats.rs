// Statistical reductions over latency/uptime samples
//
// Every reduction operates on already-filtered samples: callers strip
// missing values with `present_values` first, so nothing here sees a gap.
// All arithmetic is full f64 precision; rounding is applied by the caller at
// output time.

use std::cmp::Ordering;

/// Drop missing values, keeping sample order
pub fn present_values<'a, I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    values.into_iter().filter_map(|v| *v).collect()
}

/// Arithmetic mean, `None` for an empty sample
///
/// Stays finite for any finite input: when the plain sum overflows, each
/// sample is scaled by 1/n before summing.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        Some(sum / n)
    } else {
        Some(values.iter().map(|v| v / n).sum())
    }
}

/// Percentile with "higher" interpolation
///
/// Sorts ascending, computes rank = q × (n − 1) and takes the sample at
/// ceil(rank). No interpolation between neighbours: the result is always one
/// of the input samples.
///
/// # Example
/// ```
/// use latencia::aggregate::percentile_higher;
///
/// let p95 = percentile_higher(&[10.0, 20.0, 30.0, 40.0, 50.0], 0.95);
/// assert_eq!(p95, Some(50.0)); // rank 3.8 -> index 4
/// ```
pub fn percentile_higher(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let index = (rank.ceil() as usize).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Count samples strictly above the threshold
pub fn count_breaches(values: &[f64], threshold: f64) -> u64 {
    values.iter().filter(|&&v| v > threshold).count() as u64
}

/// Largest magnitude below which an f64 can still carry a fractional part
const FRACTION_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// Round half away from zero to `places` decimals
///
/// Values too large to hold that many decimals are already exact at that
/// precision and come back unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= FRACTION_LIMIT {
        return value;
    }
    scaled.round() / factor
}
