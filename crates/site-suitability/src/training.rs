//! Training set construction
//!
//! Turns reference stations into regression samples: a synthetic 0-100
//! success score as the target, a confidence weight for the gradient, and
//! per-station orbital metrics fetched concurrently with independent
//! fallback. A failed lookup degrades one station to a latitude estimate;
//! a dead visibility source degrades the whole set to the ROI-only path.

use std::sync::Arc;

use tracing::{error, info, warn};

use orbital_visibility::{OrbitalMetrics, VisibilityCalculator};

use crate::{ReferenceStation, Result, SuitabilityError, TrainingSample};

// Success-score composition (9 decimal precision). Sums to 1.0.
pub const W_PROFITABILITY: f64 = 0.400000000;
pub const W_UTILIZATION: f64 = 0.250000000;
pub const W_ORBITAL: f64 = 0.200000000;
pub const W_MARKET: f64 = 0.100000000;
pub const W_RELIABILITY: f64 = 0.050000000;

/// Operators whose reported commercials we trust at full weight
pub const TOP_TIER_OPERATORS: &[&str] = &[
    "Intelsat", "SES", "Eutelsat", "Telesat", "Viasat", "KSAT", "SSC", "Speedcast",
];

/// ROI multiplier for the degraded training path (9 decimal precision)
const DEGRADED_ROI_SCALE: f64 = 4.000000000;
/// Flat confidence assigned to degraded samples
const DEGRADED_CONFIDENCE: f64 = 0.700000000;

/// Synthetic 0-100 outcome for a station given its orbital metrics.
/// Each component is clamped to [0,1] before weighting so one runaway
/// input cannot dominate the target.
pub fn success_score(station: &ReferenceStation, metrics: &OrbitalMetrics) -> f64 {
    let profitability = (station.profit_margin_pct / 30.0).clamp(0.0, 1.0);
    let utilization = (metrics.utilization_score_pct / 100.0).clamp(0.0, 1.0);
    let orbital = ((metrics.daily_passes / 15.0
        + metrics.average_elevation_deg / 90.0
        + metrics.gap_coverage_pct / 100.0)
        / 3.0)
        .clamp(0.0, 1.0);
    let market = (0.6 * (station.customer_count as f64 / 50.0)
        + 0.4 * (1.0 - (station.churn_rate_pct / 100.0).clamp(0.0, 1.0)))
    .clamp(0.0, 1.0);
    let reliability = (metrics.weather_reliability_pct / 100.0).clamp(0.0, 1.0);

    (100.0
        * (W_PROFITABILITY * profitability
            + W_UTILIZATION * utilization
            + W_ORBITAL * orbital
            + W_MARKET * market
            + W_RELIABILITY * reliability))
        .clamp(0.0, 100.0)
}

/// Per-sample trust in (0, 1]: the product of four independent factors.
/// Multiplicative on purpose: any single doubt discounts the whole sample.
pub fn confidence_level(station: &ReferenceStation) -> f64 {
    let data_completeness = if station.monthly_revenue_usd > 0.0 {
        1.0
    } else {
        0.7
    };
    let operator_reliability = if is_top_tier_operator(&station.operator) {
        1.0
    } else {
        0.8
    };
    let station_class = if station.antenna_size_m > 10.0 { 1.0 } else { 0.9 };
    let location_certainty = if station.country.is_some() { 1.0 } else { 0.8 };

    data_completeness * operator_reliability * station_class * location_certainty
}

pub fn is_top_tier_operator(operator: &str) -> bool {
    let op = operator.to_ascii_lowercase();
    TOP_TIER_OPERATORS
        .iter()
        .any(|tier| op.contains(&tier.to_ascii_lowercase()))
}

/// Built samples plus how they were sourced.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub samples: Vec<TrainingSample>,
    /// Stations whose metrics came from the latitude estimate
    pub estimated_count: usize,
    /// True when the ROI-only degraded path produced the set
    pub degraded: bool,
}

/// Builds the immutable training set consumed by the calibrator, scorer,
/// and interpolator.
pub struct TrainingSetBuilder {
    stations: Vec<ReferenceStation>,
    calculator: Option<Arc<dyn VisibilityCalculator>>,
}

impl TrainingSetBuilder {
    pub fn new(stations: Vec<ReferenceStation>) -> Self {
        Self {
            stations,
            calculator: None,
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn VisibilityCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    /// Build one sample per station. Visibility lookups run concurrently;
    /// a failed lookup falls back to the latitude estimate for that station
    /// only. If every lookup fails the whole set degrades to the ROI path.
    pub async fn build(&self) -> Result<TrainingSet> {
        if self.stations.is_empty() {
            return Err(SuitabilityError::NoStations);
        }

        let Some(calculator) = &self.calculator else {
            info!(
                stations = self.stations.len(),
                "no visibility source configured; using latitude estimates"
            );
            let samples = self
                .stations
                .iter()
                .map(|s| {
                    make_sample(
                        s.clone(),
                        OrbitalMetrics::estimate_for_latitude(s.latitude),
                    )
                })
                .collect();
            return Ok(TrainingSet {
                samples,
                estimated_count: self.stations.len(),
                degraded: false,
            });
        };

        let sites: Vec<_> = self.stations.iter().map(|s| s.site()).collect();
        let results = calculator.station_performance(&sites).await;

        if results.iter().all(|r| r.is_err()) {
            error!(
                stations = self.stations.len(),
                "visibility source failed for every station; building degraded set"
            );
            return self.build_degraded();
        }

        let mut estimated_count = 0usize;
        let samples = self
            .stations
            .iter()
            .zip(results)
            .map(|(station, result)| {
                let metrics = match result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(
                            station = %station.id,
                            error = %e,
                            "visibility lookup failed; using latitude estimate"
                        );
                        estimated_count += 1;
                        OrbitalMetrics::estimate_for_latitude(station.latitude)
                    }
                };
                make_sample(station.clone(), metrics)
            })
            .collect();

        info!(
            samples = self.stations.len(),
            estimated = estimated_count,
            "training set built"
        );
        Ok(TrainingSet {
            samples,
            estimated_count,
            degraded: false,
        })
    }

    /// ROI-only degraded set: success approximated as 4x ROI, confidence
    /// pinned at 0.7, metrics estimated from latitude. A documented
    /// approximation for running with the enrichment pipeline down, not a
    /// path to silently improve.
    pub fn build_degraded(&self) -> Result<TrainingSet> {
        if self.stations.is_empty() {
            return Err(SuitabilityError::NoStations);
        }

        let samples = self
            .stations
            .iter()
            .map(|station| TrainingSample {
                success_score: (station.roi_pct * DEGRADED_ROI_SCALE).clamp(0.0, 100.0),
                confidence_level: DEGRADED_CONFIDENCE,
                metrics: OrbitalMetrics::estimate_for_latitude(station.latitude),
                station: station.clone(),
            })
            .collect();

        Ok(TrainingSet {
            estimated_count: self.stations.len(),
            degraded: true,
            samples,
        })
    }
}

fn make_sample(station: ReferenceStation, metrics: OrbitalMetrics) -> TrainingSample {
    TrainingSample {
        success_score: success_score(&station, &metrics),
        confidence_level: confidence_level(&station),
        station,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_visibility::{MetricsFuture, SiteLocation, VisibilityError};

    fn make_station(id: &str, lat: f64, lon: f64) -> ReferenceStation {
        ReferenceStation {
            id: id.to_string(),
            name: format!("Station {id}"),
            latitude: lat,
            longitude: lon,
            country: Some("US".to_string()),
            antenna_size_m: 13.0,
            g_t_db: 35.0,
            capacity_gbps: 80.0,
            monthly_revenue_usd: 150_000.0,
            profit_margin_pct: 24.0,
            customer_count: 35,
            churn_rate_pct: 5.0,
            roi_pct: 18.0,
            operator: "Intelsat".to_string(),
        }
    }

    fn nominal_metrics() -> OrbitalMetrics {
        OrbitalMetrics {
            daily_passes: 12.0,
            average_elevation_deg: 45.0,
            gap_coverage_pct: 88.0,
            weather_reliability_pct: 80.0,
            utilization_score_pct: 65.0,
        }
    }

    /// Fails for southern-hemisphere sites, succeeds elsewhere.
    struct FlakySource;

    impl VisibilityCalculator for FlakySource {
        fn site_performance(&self, site: SiteLocation) -> MetricsFuture<'_> {
            Box::pin(async move {
                if site.latitude_deg < 0.0 {
                    Err(VisibilityError::SourceUnavailable("test outage".to_string()))
                } else {
                    Ok(OrbitalMetrics {
                        daily_passes: 14.0,
                        average_elevation_deg: 50.0,
                        gap_coverage_pct: 90.0,
                        weather_reliability_pct: 85.0,
                        utilization_score_pct: 70.0,
                    })
                }
            })
        }
    }

    /// Fails for everything.
    struct DeadSource;

    impl VisibilityCalculator for DeadSource {
        fn site_performance(&self, _site: SiteLocation) -> MetricsFuture<'_> {
            Box::pin(async move {
                Err(VisibilityError::SourceUnavailable("total outage".to_string()))
            })
        }
    }

    #[test]
    fn test_success_score_weights_sum_to_one() {
        let sum = W_PROFITABILITY + W_UTILIZATION + W_ORBITAL + W_MARKET + W_RELIABILITY;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_success_score_in_range() {
        let station = make_station("GS-1", 40.0, -74.0);
        let score = success_score(&station, &nominal_metrics());
        assert!(score > 0.0 && score <= 100.0, "score {score}");
    }

    #[test]
    fn test_success_score_components_saturate() {
        let mut station = make_station("GS-1", 40.0, -74.0);
        // 90% margin saturates the profitability term at the 30% baseline
        station.profit_margin_pct = 90.0;
        let saturated = success_score(&station, &nominal_metrics());
        station.profit_margin_pct = 30.0;
        let at_baseline = success_score(&station, &nominal_metrics());
        assert!((saturated - at_baseline).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_factor_product() {
        let station = make_station("GS-1", 40.0, -74.0);
        // All four factors at full trust
        assert!((confidence_level(&station) - 1.0).abs() < 1e-9);

        let mut doubtful = station.clone();
        doubtful.monthly_revenue_usd = 0.0;
        doubtful.operator = "Joe's Dishes".to_string();
        doubtful.antenna_size_m = 6.0;
        doubtful.country = None;
        // 0.7 * 0.8 * 0.9 * 0.8
        assert!((confidence_level(&doubtful) - 0.4032).abs() < 1e-9);
    }

    #[test]
    fn test_top_tier_operator_matching() {
        assert!(is_top_tier_operator("Intelsat"));
        assert!(is_top_tier_operator("SES S.A."));
        assert!(is_top_tier_operator("eutelsat communications"));
        assert!(!is_top_tier_operator("Joe's Dishes"));
    }

    #[tokio::test]
    async fn test_build_with_partial_outage() {
        let builder = TrainingSetBuilder::new(vec![
            make_station("GS-N", 40.0, -74.0),
            make_station("GS-S", -33.9, 151.2),
        ])
        .with_calculator(Arc::new(FlakySource));

        let set = builder.build().await.unwrap();
        assert_eq!(set.samples.len(), 2);
        assert_eq!(set.estimated_count, 1);
        assert!(!set.degraded);
        // Both samples still carry full-formula scores and confidences
        for sample in &set.samples {
            assert!(sample.success_score > 0.0 && sample.success_score <= 100.0);
            assert!(sample.confidence_level > 0.0 && sample.confidence_level <= 1.0);
        }
    }

    #[tokio::test]
    async fn test_build_degrades_when_source_dead() {
        let stations = vec![
            make_station("GS-1", 40.0, -74.0),
            make_station("GS-2", 51.5, -0.1),
        ];
        let builder = TrainingSetBuilder::new(stations).with_calculator(Arc::new(DeadSource));

        let set = builder.build().await.unwrap();
        assert!(set.degraded);
        for sample in &set.samples {
            // ROI 18% * 4 = 72
            assert!((sample.success_score - 72.0).abs() < 1e-9);
            assert!((sample.confidence_level - 0.7).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_build_without_calculator_estimates() {
        let builder = TrainingSetBuilder::new(vec![make_station("GS-1", 10.0, 20.0)]);
        let set = builder.build().await.unwrap();
        assert_eq!(set.estimated_count, 1);
        assert!(!set.degraded);
        let estimate = OrbitalMetrics::estimate_for_latitude(10.0);
        assert_eq!(set.samples[0].metrics.daily_passes, estimate.daily_passes);
    }

    #[tokio::test]
    async fn test_build_empty_is_error() {
        let builder = TrainingSetBuilder::new(Vec::new());
        assert!(matches!(
            builder.build().await,
            Err(SuitabilityError::NoStations)
        ));
    }
}
