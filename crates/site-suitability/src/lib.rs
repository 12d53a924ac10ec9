//! Ground Station Site Suitability
//!
//! Calibrates an empirical scoring model from the outcomes of operating
//! stations, validates it statistically, and applies it to arbitrary
//! coordinates for expansion planning. A distance-weighted interpolator
//! gives a model-free second opinion from raw station outcomes.
//!
//! # Calibrated Scoring Model (8-Category Empirical Weights)
//!
//! ```text
//! Score(p) = 100 · Σ_c w_c · f_c(p)
//! ```
//!
//! Category weights are not hand-tuned: they are learned by
//! confidence-weighted gradient descent over 19 per-station features,
//! then aggregated per category.
//!
//! | Category       | Raw features | Point heuristic at (lat, lon) |
//! |----------------|--------------|-------------------------------|
//! | Technical      | 3            | neutral 0.5 unless overridden |
//! | Geographical   | 3            | latitude factor               |
//! | Economic       | 3            | developed-region lookup       |
//! | Orbital        | 3            | equator-favoring access       |
//! | Weather        | 2            | latitude-band factor          |
//! | Infrastructure | 2            | country score (default 70)    |
//! | Market         | 2            | neutral 0.5 unless overridden |
//! | Competition    | 1            | regional headroom             |
//!
//! # Regression Target
//!
//! ```text
//! Success(s) = 100 · (0.40·profitability + 0.25·utilization
//!            + 0.20·orbital + 0.10·market + 0.05·reliability)
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub mod calibrator;
pub mod features;
pub mod heuristics;
pub mod idw;
pub mod loader;
pub mod model;
pub mod report;
pub mod scorer;
pub mod training;
pub mod validator;

pub use calibrator::{CalibrationConfig, CalibrationResult, EmpiricalWeights, TrainingMetrics};
pub use features::{FeatureCategory, FeatureVector, PointFeatures, PointOverrides};
pub use idw::{IdwEstimate, IdwParams};
pub use model::SuitabilityModel;
pub use orbital_visibility::{OrbitalMetrics, SiteLocation, VisibilityCalculator};
pub use scorer::{LocationScore, ScoreComponents};
pub use training::TrainingSetBuilder;
pub use validator::ValidationReport;

/// Number of raw regression features across all categories
pub const FEATURE_COUNT: usize = 19;

/// Gradient descent sweeps per calibration
pub const CALIBRATION_ITERATIONS: usize = 1000;

/// Gradient descent step size (9 decimal precision)
pub const LEARNING_RATE: f64 = 0.010000000;

/// Model-score confidence e-folding distance in km (9 decimal precision)
pub const SCORE_CONFIDENCE_DECAY_KM: f64 = 500.000000000;

/// IDW confidence e-folding distance in km (9 decimal precision)
pub const IDW_CONFIDENCE_DECAY_KM: f64 = 1000.000000000;

/// Floor for model-score confidence
pub const MIN_SCORE_CONFIDENCE: f64 = 0.100000000;

/// Confidence reported when IDW finds no neighbors in range
pub const NO_NEIGHBOR_CONFIDENCE: f64 = 0.300000000;

/// Names returned with a model score
pub const NEAREST_STATION_COUNT: usize = 3;

/// Names returned with an IDW estimate
pub const IDW_SOURCE_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum SuitabilityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No reference stations provided")]
    NoStations,
    #[error("Weights not calibrated; call calibrate_weights() first")]
    NotCalibrated,
    #[error("Training set not built; call calibrate_weights() first")]
    TrainingSetNotBuilt,
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

pub type Result<T> = std::result::Result<T, SuitabilityError>;

/// An operating station whose outcome anchors the regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceStation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    // Technical plant
    pub antenna_size_m: f64,
    /// Gain-to-noise-temperature, dB/K
    pub g_t_db: f64,
    pub capacity_gbps: f64,

    // Commercial outcome
    pub monthly_revenue_usd: f64,
    pub profit_margin_pct: f64,
    pub customer_count: u32,
    pub churn_rate_pct: f64,
    pub roi_pct: f64,
    pub operator: String,
}

impl ReferenceStation {
    pub fn site(&self) -> SiteLocation {
        SiteLocation::new(self.latitude, self.longitude)
    }
}

/// One station's derived outcome, confidence, and orbital metrics.
/// Built once per calibration; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub station: ReferenceStation,
    pub metrics: OrbitalMetrics,
    /// Synthetic 0-100 outcome used as the regression target
    pub success_score: f64,
    /// Per-sample trust in (0, 1], weights the gradient
    pub confidence_level: f64,
}

/// Haversine distance between two points in km (9 decimal precision)
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R: f64 = 6371.000000000; // Earth radius in km

    let lat1_rad = lat1 * PI / 180.000000000;
    let lat2_rad = lat2 * PI / 180.000000000;
    let dlat = (lat2 - lat1) * PI / 180.000000000;
    let dlon = (lon2 - lon1) * PI / 180.000000000;

    let a = (dlat / 2.000000000).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.000000000).sin().powi(2);
    let c = 2.000000000 * a.sqrt().atan2((1.000000000 - a).sqrt());

    R * c
}
