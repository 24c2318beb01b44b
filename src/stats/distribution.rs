//! Order statistics over the raw values observed in one cycle. These
//! cannot be computed from the running aggregate alone, which is why the
//! raw sample list is retained for the cycle.
//!
//! Each function sorts an internal copy; the input order is never mutated.

/// Median of the values: middle element for odd lengths, average of the
/// two middle elements for even lengths. `None` on empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// The value with strictly the highest frequency. `None` when two or more
/// values tie for highest frequency, or on empty input.
pub fn mode(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);

    let mut best_value = sorted[0];
    let mut best_len = 0usize;
    let mut unique = true;

    let mut run_value = sorted[0];
    let mut run_len = 0usize;
    for &v in &sorted {
        if v == run_value {
            run_len += 1;
        } else {
            run_value = v;
            run_len = 1;
        }
        if run_len > best_len {
            best_value = run_value;
            best_len = run_len;
            unique = true;
        } else if run_len == best_len && run_value != best_value {
            unique = false;
        }
    }

    if unique { Some(best_value) } else { None }
}

/// Nearest-rank 95th percentile: `index = floor(n * 0.95)` into the sorted
/// values, clamped to `n - 1`. Always an element of the input, never
/// interpolated. `None` on empty input.
pub fn percentile_95(values: &[f64]) -> Option<f64> {
    percentile(values, 95.0)
}

pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let index = (sorted.len() as f64 * (pct / 100.0)) as usize;
    Some(sorted[index.min(sorted.len() - 1)])
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}
