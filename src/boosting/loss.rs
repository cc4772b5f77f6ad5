//! Logistic loss for labels in `{-1, +1}`.

use crate::core::error::{CartError, Result};
use crate::core::types::{Label, Score};

use ndarray::ArrayView1;
use rayon::prelude::*;

/// Log-odds prior `ln((1+ȳ)/(1-ȳ))` of a mean label `ȳ`.
///
/// A single-class set has no finite prior and is rejected.
pub fn calc_bias(mean_label: f64) -> Result<Score> {
    if !(mean_label > -1.0 && mean_label < 1.0) {
        return Err(CartError::dataset(format!(
            "mean label {} leaves no finite prior; both classes must be present",
            mean_label
        )));
    }
    Ok(((1.0 + mean_label) / (1.0 - mean_label)).ln() as Score)
}

/// Negative gradient of the logistic loss, `y / (1 + exp(y·F))`.
#[inline]
pub fn residual(y: Label, score: Score) -> Score {
    y / (1.0 + (y * score).exp())
}

/// `ln(1 + exp(-y·F))` without overflow for large margins.
#[inline]
pub fn logloss(y: Label, score: Score) -> f64 {
    let z = -(y as f64) * score as f64;
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Residuals of every instance.
pub fn residuals(labels: ArrayView1<'_, Label>, scores: &[Score]) -> Vec<Score> {
    labels
        .as_slice()
        .map(|ys| {
            ys.par_iter()
                .zip(scores.par_iter())
                .map(|(&y, &f)| residual(y, f))
                .collect::<Vec<Score>>()
        })
        .unwrap_or_else(|| {
            labels
                .iter()
                .zip(scores)
                .map(|(&y, &f)| residual(y, f))
                .collect()
        })
}

/// Mean logistic loss; `0` for an empty set.
pub fn mean_logloss(labels: ArrayView1<'_, Label>, scores: &[Score]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f64 = labels
        .iter()
        .zip(scores)
        .map(|(&y, &f)| logloss(y, f))
        .sum();
    total / scores.len() as f64
}

/// Probability of the positive class for a raw score.
#[inline]
pub fn sigmoid(score: Score) -> Score {
    1.0 / (1.0 + (-score).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_bias() {
        assert_relative_eq!(calc_bias(0.0).unwrap(), 0.0);
        // ȳ = 0.5 means three positives per negative
        assert_relative_eq!(calc_bias(0.5).unwrap(), 3.0f32.ln(), epsilon = 1e-6);
        assert!(calc_bias(1.0).is_err());
        assert!(calc_bias(-1.0).is_err());
        assert!(calc_bias(f64::NAN).is_err());
    }

    #[test]
    fn test_residual_at_zero_score() {
        assert_relative_eq!(residual(1.0, 0.0), 0.5);
        assert_relative_eq!(residual(-1.0, 0.0), -0.5);
        // confident and correct leaves almost nothing to fit
        assert!(residual(1.0, 20.0).abs() < 1e-8);
        assert_relative_eq!(residual(-1.0, 200.0), -1.0);
    }

    #[test]
    fn test_logloss_is_stable() {
        assert_relative_eq!(logloss(1.0, 0.0), std::f64::consts::LN_2);
        assert_relative_eq!(logloss(-1.0, 1000.0), 1000.0, epsilon = 1e-9);
        assert!(logloss(1.0, 1000.0) < 1e-300);
    }

    #[test]
    fn test_vector_helpers() {
        let labels = array![1.0f32, -1.0, 1.0];
        let scores = [0.0f32, 0.0, 0.0];
        assert_eq!(residuals(labels.view(), &scores), vec![0.5, -0.5, 0.5]);
        assert_relative_eq!(mean_logloss(labels.view(), &scores), std::f64::consts::LN_2);
        assert_eq!(mean_logloss(labels.view(), &[]), 0.0);
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
