//! Weighted statistics across realizations.

use hz_core::weights_sum_to_one;

use crate::error::{AggResult, AggregationError};

pub(crate) fn check_weights(weights: &[f64]) -> AggResult<()> {
    if weights.is_empty() {
        return Err(AggregationError::Empty { what: "realizations" });
    }
    if !weights_sum_to_one(weights.iter().copied()) {
        return Err(AggregationError::WeightSum {
            sum: weights.iter().sum(),
        });
    }
    Ok(())
}

/// Weighted average; weights must sum to one.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> AggResult<f64> {
    if values.len() != weights.len() {
        return Err(AggregationError::ShapeMismatch {
            what: format!("{} values for {} weights", values.len(), weights.len()),
        });
    }
    check_weights(weights)?;
    Ok(values.iter().zip(weights).map(|(v, w)| v * w).sum())
}

/// Weighted quantile as the inverse of the weighted empirical CDF: the
/// smallest sorted value whose cumulative weight reaches `q`. Zero-weight
/// values never decide the result.
///
/// With fixed weights the result never decreases when every input value
/// does not decrease, so quantiles of non-increasing curves stay
/// non-increasing. Values are sorted stably, so equal values keep their
/// input (realization) order.
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> AggResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AggregationError::InvalidQuantile(q));
    }
    if values.len() != weights.len() {
        return Err(AggregationError::ShapeMismatch {
            what: format!("{} values for {} weights", values.len(), weights.len()),
        });
    }
    check_weights(weights)?;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut cumulative = 0.0;
    let mut last = order[order.len() - 1];
    for &i in order.iter().filter(|&&i| weights[i] > 0.0) {
        cumulative += weights[i];
        last = i;
        if cumulative >= q - CUMULATIVE_EPSILON {
            return Ok(values[i]);
        }
    }
    Ok(values[last])
}

/// Slack for rounding in the running weight sum.
const CUMULATIVE_EPSILON: f64 = 1e-12;
