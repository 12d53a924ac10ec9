//! Model validation
//!
//! Recomputes predictions from the CATEGORY weights, spreading each
//! category's weight evenly across its member features (w_cat / size).
//! The per-feature structure is discarded on purpose: production scoring
//! only ever sees category weights, so validation measures the model that
//! actually ships, not the finer one the optimizer briefly knew.

use serde::{Deserialize, Serialize};

use crate::calibrator::EmpiricalWeights;
use crate::features::{FeatureCategory, FeatureVector};
use crate::TrainingSample;

/// Per-station validation vectors, index-aligned with the training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
    /// Signed errors, predicted - actual
    pub errors: Vec<f64>,
    pub station_names: Vec<String>,
}

/// Fit statistics plus the per-station report.
#[derive(Debug, Clone)]
pub struct Validation {
    pub report: ValidationReport,
    pub rmse: f64,
    /// 100 - mean absolute error, reported as-is (negative for bad fits)
    pub accuracy: f64,
    pub correlation_coefficient: f64,
}

/// Score every training sample with the calibrated category weights and
/// summarize the fit.
pub fn validate(
    samples: &[TrainingSample],
    feature_vectors: &[FeatureVector],
    weights: &EmpiricalWeights,
) -> Validation {
    let predicted: Vec<f64> = feature_vectors
        .iter()
        .map(|fv| predict(fv, weights))
        .collect();
    let actual: Vec<f64> = samples.iter().map(|s| s.success_score).collect();
    let errors: Vec<f64> = predicted
        .iter()
        .zip(&actual)
        .map(|(p, a)| p - a)
        .collect();
    let station_names: Vec<String> = samples.iter().map(|s| s.station.name.clone()).collect();

    let n = samples.len() as f64;
    let (rmse, accuracy) = if n > 0.0 {
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let mean_abs = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        (rmse, 100.0 - mean_abs)
    } else {
        (0.0, 0.0)
    };
    let correlation_coefficient = pearson(&predicted, &actual);

    Validation {
        report: ValidationReport {
            predicted,
            actual,
            errors,
            station_names,
        },
        rmse,
        accuracy,
        correlation_coefficient,
    }
}

/// Prediction with evenly redistributed category weights.
pub fn predict(fv: &FeatureVector, weights: &EmpiricalWeights) -> f64 {
    let mut sum = 0.0;
    for cat in FeatureCategory::ALL {
        let member_weight = weights.get(cat) / cat.size() as f64;
        sum += member_weight * fv.category(cat).iter().sum::<f64>();
    }
    100.0 * sum
}

/// Pearson correlation coefficient, 0.0 when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom > 0.0 {
        cov / denom
    } else {
        0.0
    }
}
