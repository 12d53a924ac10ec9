//! Empirical weight calibration
//!
//! Confidence-weighted batch gradient descent on a linear model over the 19
//! raw features, with the weight vector projected back onto the simplex
//! (|w| / Σ|w|) after every step. The projection is part of the fitted
//! model: running it once at the end converges somewhere else entirely.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::features::{self, FeatureCategory, FeatureVector};
use crate::training::TrainingSet;
use crate::validator::{self, ValidationReport};
use crate::{
    Result, SuitabilityError, TrainingSample, CALIBRATION_ITERATIONS, FEATURE_COUNT, LEARNING_RATE,
};

/// Gradient descent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub iterations: usize,
    pub learning_rate: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            iterations: CALIBRATION_ITERATIONS,
            learning_rate: LEARNING_RATE,
        }
    }
}

/// Calibrated category weights. Always nonnegative; always sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmpiricalWeights {
    pub technical: f64,
    pub geographical: f64,
    pub economic: f64,
    pub orbital: f64,
    pub weather: f64,
    pub infrastructure: f64,
    pub market: f64,
    pub competition: f64,
}

impl EmpiricalWeights {
    pub fn get(&self, cat: FeatureCategory) -> f64 {
        match cat {
            FeatureCategory::Technical => self.technical,
            FeatureCategory::Geographical => self.geographical,
            FeatureCategory::Economic => self.economic,
            FeatureCategory::Orbital => self.orbital,
            FeatureCategory::Weather => self.weather,
            FeatureCategory::Infrastructure => self.infrastructure,
            FeatureCategory::Market => self.market,
            FeatureCategory::Competition => self.competition,
        }
    }

    pub fn sum(&self) -> f64 {
        FeatureCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// How the calibration run was fed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub sample_count: usize,
    pub iterations: usize,
    pub learning_rate: f64,
    pub mean_confidence: f64,
    /// Stations whose orbital metrics came from the latitude estimate
    pub estimated_metric_count: usize,
    /// True when the ROI-only degraded set was used
    pub degraded: bool,
    pub calibrated_at: String,
}

/// Everything one calibration run produces. Replaced wholesale by the next
/// run; fields are never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub weights: EmpiricalWeights,
    /// 100 - mean absolute error. Negative for a fit worse than 100 points
    /// of mean error; reported as-is.
    pub accuracy: f64,
    pub rmse: f64,
    pub correlation_coefficient: f64,
    pub validation: ValidationReport,
    pub training: TrainingMetrics,
}

/// Fit weights to a training set and validate the result.
pub fn calibrate(set: &TrainingSet, config: &CalibrationConfig) -> Result<CalibrationResult> {
    if set.samples.is_empty() {
        return Err(SuitabilityError::NoStations);
    }

    let feature_vectors: Vec<FeatureVector> = set
        .samples
        .iter()
        .map(features::station_features)
        .collect();

    info!(
        samples = set.samples.len(),
        iterations = config.iterations,
        learning_rate = config.learning_rate,
        "calibrating empirical weights"
    );

    let raw = descend(&set.samples, &feature_vectors, config);
    let weights = aggregate_categories(&raw);

    let validation = validator::validate(&set.samples, &feature_vectors, &weights);

    info!(
        accuracy = validation.accuracy,
        rmse = validation.rmse,
        correlation = validation.correlation_coefficient,
        "calibration complete"
    );

    let mean_confidence = set
        .samples
        .iter()
        .map(|s| s.confidence_level)
        .sum::<f64>()
        / set.samples.len() as f64;

    Ok(CalibrationResult {
        weights,
        accuracy: validation.accuracy,
        rmse: validation.rmse,
        correlation_coefficient: validation.correlation_coefficient,
        validation: validation.report,
        training: TrainingMetrics {
            sample_count: set.samples.len(),
            iterations: config.iterations,
            learning_rate: config.learning_rate,
            mean_confidence,
            estimated_metric_count: set.estimated_count,
            degraded: set.degraded,
            calibrated_at: Utc::now().to_rfc3339(),
        },
    })
}

/// Batch gradient descent over the raw 19-weight vector.
fn descend(
    samples: &[TrainingSample],
    feature_vectors: &[FeatureVector],
    config: &CalibrationConfig,
) -> [f64; FEATURE_COUNT] {
    let n = samples.len() as f64;
    let mut weights = [1.0 / FEATURE_COUNT as f64; FEATURE_COUNT];

    for iteration in 0..config.iterations {
        let mut gradient = [0.0f64; FEATURE_COUNT];

        for (sample, fv) in samples.iter().zip(feature_vectors) {
            let predicted: f64 = 100.0
                * fv.as_slice()
                    .iter()
                    .zip(&weights)
                    .map(|(f, w)| f * w)
                    .sum::<f64>();
            // Confidence discounts the residual AND the gradient contribution
            let error = (predicted - sample.success_score) * sample.confidence_level;
            for (g, f) in gradient.iter_mut().zip(fv.as_slice()) {
                *g += error * f * sample.confidence_level;
            }
        }

        for (w, g) in weights.iter_mut().zip(&gradient) {
            *w -= config.learning_rate * g / n;
        }

        // Hard projection back onto the simplex, every step
        normalize_weights(&mut weights);

        if iteration % 200 == 0 {
            debug!(iteration, "calibration sweep");
        }
    }

    weights
}

/// Simplex projection: w = |w| / Σ|w|. A degenerate all-zero vector resets
/// to uniform rather than dividing by zero.
fn normalize_weights(weights: &mut [f64; FEATURE_COUNT]) {
    let total: f64 = weights.iter().map(|w| w.abs()).sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w = w.abs() / total;
        }
    } else {
        *weights = [1.0 / FEATURE_COUNT as f64; FEATURE_COUNT];
    }
}

/// Sum raw weights into their categories per the fixed layout.
fn aggregate_categories(raw: &[f64; FEATURE_COUNT]) -> EmpiricalWeights {
    let sum_of = |cat: FeatureCategory| -> f64 { raw[cat.span()].iter().sum() };
    EmpiricalWeights {
        technical: sum_of(FeatureCategory::Technical),
        geographical: sum_of(FeatureCategory::Geographical),
        economic: sum_of(FeatureCategory::Economic),
        orbital: sum_of(FeatureCategory::Orbital),
        weather: sum_of(FeatureCategory::Weather),
        infrastructure: sum_of(FeatureCategory::Infrastructure),
        market: sum_of(FeatureCategory::Market),
        competition: sum_of(FeatureCategory::Competition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrbitalMetrics, ReferenceStation};
    use proptest::prelude::*;

    fn make_station(id: u32, lat: f64, lon: f64, margin: f64, roi: f64) -> ReferenceStation {
        ReferenceStation {
            id: format!("GS-{id:03}"),
            name: format!("Station {id}"),
            latitude: lat,
            longitude: lon,
            country: Some("US".to_string()),
            antenna_size_m: 9.0 + id as f64,
            g_t_db: 30.0 + id as f64,
            capacity_gbps: 40.0 + 10.0 * id as f64,
            monthly_revenue_usd: 60_000.0 + 20_000.0 * id as f64,
            profit_margin_pct: margin,
            customer_count: 10 + 5 * id,
            churn_rate_pct: 4.0 + id as f64,
            roi_pct: roi,
            operator: "Intelsat".to_string(),
        }
    }

    fn make_set() -> TrainingSet {
        let coords = [
            (40.0, -74.0),
            (51.5, -0.1),
            (1.35, 103.8),
            (-33.9, 151.2),
            (35.7, 139.7),
            (19.4, -99.1),
        ];
        let samples = coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon))| {
                let station = make_station(i as u32, lat, lon, 12.0 + 3.0 * i as f64, 15.0);
                let metrics = OrbitalMetrics::estimate_for_latitude(lat);
                TrainingSample {
                    success_score: crate::training::success_score(&station, &metrics),
                    confidence_level: crate::training::confidence_level(&station),
                    station,
                    metrics,
                }
            })
            .collect();
        TrainingSet {
            samples,
            estimated_count: 6,
            degraded: false,
        }
    }

    #[test]
    fn test_weights_on_simplex() {
        let result = calibrate(&make_set(), &CalibrationConfig::default()).unwrap();
        let w = result.weights;
        for cat in FeatureCategory::ALL {
            assert!(w.get(cat) >= 0.0, "{cat:?} weight negative");
        }
        assert!((w.sum() - 1.0).abs() < 1e-6, "sum {}", w.sum());
    }

    #[test]
    fn test_deterministic() {
        let set = make_set();
        let a = calibrate(&set, &CalibrationConfig::default()).unwrap();
        let b = calibrate(&set, &CalibrationConfig::default()).unwrap();
        assert_eq!(a.weights.technical, b.weights.technical);
        assert_eq!(a.rmse, b.rmse);
        assert_eq!(a.correlation_coefficient, b.correlation_coefficient);
    }

    #[test]
    fn test_zero_iterations_keeps_uniform() {
        let config = CalibrationConfig {
            iterations: 0,
            learning_rate: LEARNING_RATE,
        };
        let result = calibrate(&make_set(), &config).unwrap();
        // Uniform raw weights aggregate to size/19 per category
        assert!((result.weights.technical - 3.0 / 19.0).abs() < 1e-9);
        assert!((result.weights.weather - 2.0 / 19.0).abs() < 1e-9);
        assert!((result.weights.competition - 1.0 / 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_targets_fit_exactly() {
        // Targets manufactured as 100 * Σ f_j / 19: the uniform starting
        // vector is already the optimum, so descent must hold it and the
        // validator must reproduce the targets.
        let mut set = make_set();
        for sample in &mut set.samples {
            let fv = features::station_features(sample);
            sample.success_score =
                100.0 * fv.as_slice().iter().sum::<f64>() / FEATURE_COUNT as f64;
            sample.confidence_level = 1.0;
        }

        let result = calibrate(&set, &CalibrationConfig::default()).unwrap();
        assert!(result.rmse < 1e-6, "rmse {}", result.rmse);
        assert!(
            result.correlation_coefficient > 0.95,
            "correlation {}",
            result.correlation_coefficient
        );
        assert!(result.accuracy > 99.0, "accuracy {}", result.accuracy);
    }

    #[test]
    fn test_result_carries_training_metrics() {
        let result = calibrate(&make_set(), &CalibrationConfig::default()).unwrap();
        assert_eq!(result.training.sample_count, 6);
        assert_eq!(result.training.iterations, CALIBRATION_ITERATIONS);
        assert!(!result.training.degraded);
        assert!(result.training.mean_confidence > 0.0);
        assert!(!result.training.calibrated_at.is_empty());
        assert_eq!(result.validation.predicted.len(), 6);
        assert_eq!(result.validation.station_names.len(), 6);
    }

    #[test]
    fn test_empty_set_is_error() {
        let set = TrainingSet {
            samples: Vec::new(),
            estimated_count: 0,
            degraded: false,
        };
        assert!(matches!(
            calibrate(&set, &CalibrationConfig::default()),
            Err(SuitabilityError::NoStations)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn prop_simplex_invariant(
            margins in proptest::collection::vec(0.0f64..60.0, 3..8),
            iterations in 1usize..50,
        ) {
            let samples: Vec<TrainingSample> = margins
                .iter()
                .enumerate()
                .map(|(i, &margin)| {
                    let station = make_station(i as u32, 10.0 * i as f64 - 20.0, 5.0 * i as f64, margin, 10.0);
                    let metrics = OrbitalMetrics::estimate_for_latitude(station.latitude);
                    TrainingSample {
                        success_score: crate::training::success_score(&station, &metrics),
                        confidence_level: crate::training::confidence_level(&station),
                        station,
                        metrics,
                    }
                })
                .collect();
            let set = TrainingSet { samples, estimated_count: 0, degraded: false };
            let config = CalibrationConfig { iterations, learning_rate: LEARNING_RATE };

            let result = calibrate(&set, &config).unwrap();
            prop_assert!((result.weights.sum() - 1.0).abs() < 1e-6);
            for cat in FeatureCategory::ALL {
                prop_assert!(result.weights.get(cat) >= 0.0);
            }
        }
    }
}
