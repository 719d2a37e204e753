use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub mean: f64,
    pub stdev: f64,
}

/// Spread over the interior of a weekly series.
///
/// The first and last weeks are usually partial (the period starts and ends
/// mid-week) so they are left out. Returns `None` when fewer than three
/// weeks exist, leaving nothing in the interior.
#[must_use]
pub fn interior_spread(values: &[f64]) -> Option<Spread> {
    if values.len() < 3 {
        return None;
    }
    spread(&values[1..values.len() - 1])
}

/// Mean and population standard deviation; `None` for an empty slice.
#[must_use]
pub fn spread(values: &[f64]) -> Option<Spread> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(Spread {
        mean,
        stdev: var.sqrt(),
    })
}
