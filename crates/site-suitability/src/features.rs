//! Feature extraction
//!
//! Two deliberately different pipelines feed the model. The TRAINING
//! pipeline extracts 19 normalized features per reference station from its
//! plant, commercials, and orbital metrics. The POINT pipeline reduces an
//! arbitrary coordinate to 8 category-level heuristics, one per calibrated
//! weight, because a bare coordinate has no plant or book of business to
//! measure. Keep them asymmetric: collapsing training extraction to 8
//! values would destroy the per-feature structure the calibrator fits.
//!
//! Features are normalized against nominal commercial baselines and are
//! allowed to exceed 1.0 for above-baseline stations; the regression sees
//! the real ratio, not a clamped one.

use serde::{Deserialize, Serialize};

use crate::heuristics;
use crate::{TrainingSample, FEATURE_COUNT};

/// Neutral value for point categories with nothing to measure
pub const NEUTRAL_POINT_FEATURE: f64 = 0.5;

// Normalization baselines (9 decimal precision)
const BASELINE_ANTENNA_M: f64 = 15.000000000;
const BASELINE_G_T_DB: f64 = 40.000000000;
/// Monthly revenue per Gbps considered fully capacity-efficient, USD
const BASELINE_REVENUE_PER_GBPS: f64 = 2000.000000000;
const BASELINE_MONTHLY_REVENUE_USD: f64 = 100000.000000000;
const BASELINE_MARGIN_PCT: f64 = 30.000000000;
const BASELINE_ROI_PCT: f64 = 25.000000000;
const BASELINE_DAILY_PASSES: f64 = 15.000000000;
const BASELINE_CUSTOMERS: f64 = 50.000000000;
const BASELINE_CAPACITY_GBPS: f64 = 100.000000000;

/// Weight categories, in raw-feature layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    Technical,
    Geographical,
    Economic,
    Orbital,
    Weather,
    Infrastructure,
    Market,
    Competition,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 8] = [
        FeatureCategory::Technical,
        FeatureCategory::Geographical,
        FeatureCategory::Economic,
        FeatureCategory::Orbital,
        FeatureCategory::Weather,
        FeatureCategory::Infrastructure,
        FeatureCategory::Market,
        FeatureCategory::Competition,
    ];

    /// Contiguous slot range in the 19-feature layout.
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            FeatureCategory::Technical => 0..3,
            FeatureCategory::Geographical => 3..6,
            FeatureCategory::Economic => 6..9,
            FeatureCategory::Orbital => 9..12,
            FeatureCategory::Weather => 12..14,
            FeatureCategory::Infrastructure => 14..16,
            FeatureCategory::Market => 16..18,
            FeatureCategory::Competition => 18..19,
        }
    }

    pub fn size(&self) -> usize {
        self.span().len()
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureCategory::Technical => "technical",
            FeatureCategory::Geographical => "geographical",
            FeatureCategory::Economic => "economic",
            FeatureCategory::Orbital => "orbital",
            FeatureCategory::Weather => "weather",
            FeatureCategory::Infrastructure => "infrastructure",
            FeatureCategory::Market => "market",
            FeatureCategory::Competition => "competition",
        }
    }
}

/// One station's 19 normalized regression features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The features belonging to one category.
    pub fn category(&self, cat: FeatureCategory) -> &[f64] {
        &self.0[cat.span()]
    }
}

/// Training-pipeline extraction: station plant, commercials, geography, and
/// measured orbital metrics, in the fixed 19-slot layout.
pub fn station_features(sample: &TrainingSample) -> FeatureVector {
    let s = &sample.station;
    let m = &sample.metrics;

    let revenue_per_gbps = if s.capacity_gbps > 0.0 {
        s.monthly_revenue_usd / s.capacity_gbps
    } else {
        0.0
    };

    FeatureVector([
        // Technical
        s.antenna_size_m / BASELINE_ANTENNA_M,
        s.g_t_db / BASELINE_G_T_DB,
        revenue_per_gbps / BASELINE_REVENUE_PER_GBPS,
        // Geographical
        s.latitude.abs() / 90.0,
        heuristics::population_density_factor(s.latitude, s.longitude),
        heuristics::urban_proximity_factor(s.latitude, s.longitude),
        // Economic
        s.monthly_revenue_usd / BASELINE_MONTHLY_REVENUE_USD,
        s.profit_margin_pct / BASELINE_MARGIN_PCT,
        s.roi_pct / BASELINE_ROI_PCT,
        // Orbital
        m.daily_passes / BASELINE_DAILY_PASSES,
        m.average_elevation_deg / 90.0,
        m.gap_coverage_pct / 100.0,
        // Weather
        m.weather_reliability_pct / 100.0,
        heuristics::weather_factor(s.latitude),
        // Infrastructure
        heuristics::infrastructure_score(s.country.as_deref()) / 100.0,
        (s.capacity_gbps / BASELINE_CAPACITY_GBPS).min(1.0),
        // Market
        s.customer_count as f64 / BASELINE_CUSTOMERS,
        1.0 - (s.churn_rate_pct / 100.0).clamp(0.0, 1.0),
        // Competition
        heuristics::competition_headroom(s.latitude, s.longitude),
    ])
}

/// Category-level features for a bare coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointFeatures {
    pub technical: f64,
    pub geographical: f64,
    pub economic: f64,
    pub orbital: f64,
    pub weather: f64,
    pub infrastructure: f64,
    pub market: f64,
    pub competition: f64,
}

impl PointFeatures {
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
}

/// Caller-supplied attributes for a prospective site. Set fields replace
/// the corresponding point heuristic with the training-style formula;
/// unset fields keep the heuristic default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antenna_size_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g_t_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_monthly_revenue_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_customer_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Point-pipeline extraction: 8 coarse values from coordinate heuristics,
/// upgraded where the caller measured something.
pub fn point_features(lat: f64, lon: f64, overrides: Option<&PointOverrides>) -> PointFeatures {
    let technical = overrides
        .and_then(|o| match (o.antenna_size_m, o.g_t_db) {
            (Some(a), Some(g)) => {
                Some((a / BASELINE_ANTENNA_M + g / BASELINE_G_T_DB) / 2.0)
            }
            (Some(a), None) => Some(a / BASELINE_ANTENNA_M),
            (None, Some(g)) => Some(g / BASELINE_G_T_DB),
            (None, None) => None,
        })
        .unwrap_or(NEUTRAL_POINT_FEATURE);

    let economic = overrides
        .and_then(|o| o.expected_monthly_revenue_usd)
        .map(|r| r / BASELINE_MONTHLY_REVENUE_USD)
        .unwrap_or_else(|| heuristics::economic_activity_factor(lat, lon));

    let market = overrides
        .and_then(|o| o.expected_customer_count)
        .map(|c| c as f64 / BASELINE_CUSTOMERS)
        .unwrap_or(NEUTRAL_POINT_FEATURE);

    let country = overrides.and_then(|o| o.country.as_deref());

    PointFeatures {
        technical,
        geographical: lat.abs() / 90.0,
        economic,
        orbital: heuristics::orbital_access_factor(lat),
        weather: heuristics::weather_factor(lat),
        infrastructure: heuristics::infrastructure_score(country) / 100.0,
        market,
        competition: heuristics::competition_headroom(lat, lon),
    }
}
