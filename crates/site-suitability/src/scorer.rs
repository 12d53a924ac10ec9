//! Location scoring
//!
//! Applies the calibrated category weights to point-pipeline features of an
//! arbitrary coordinate. The score is absolute (0-100); confidence decays
//! with distance to the nearest reference station, because the heuristics
//! were calibrated against those neighborhoods and extrapolate from there.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibrator::EmpiricalWeights;
use crate::features::{self, FeatureCategory, PointOverrides};
use crate::{
    haversine_km, TrainingSample, MIN_SCORE_CONFIDENCE, NEAREST_STATION_COUNT,
    SCORE_CONFIDENCE_DECAY_KM,
};

/// Per-category contributions: point feature x category weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub technical: f64,
    pub geographical: f64,
    pub economic: f64,
    pub orbital: f64,
    pub weather: f64,
    pub infrastructure: f64,
    pub market: f64,
    pub competition: f64,
}

impl ScoreComponents {
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

/// A scored location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationScore {
    pub latitude: f64,
    pub longitude: f64,
    /// Investment suitability, 0-100
    pub score: f64,
    /// Trust in the score, [0.1, 1]
    pub confidence: f64,
    pub components: ScoreComponents,
    /// Nearest reference stations by name, ascending distance
    pub nearest_stations: Vec<String>,
    pub nearest_distance_km: f64,
}

/// Score one coordinate against the calibrated weights.
pub fn score_location(
    samples: &[TrainingSample],
    weights: &EmpiricalWeights,
    lat: f64,
    lon: f64,
    overrides: Option<&PointOverrides>,
) -> LocationScore {
    let point = features::point_features(lat, lon, overrides);

    let components = ScoreComponents {
        technical: weights.technical * point.technical,
        geographical: weights.geographical * point.geographical,
        economic: weights.economic * point.economic,
        orbital: weights.orbital * point.orbital,
        weather: weights.weather * point.weather,
        infrastructure: weights.infrastructure * point.infrastructure,
        market: weights.market * point.market,
        competition: weights.competition * point.competition,
    };

    let raw: f64 = FeatureCategory::ALL.iter().map(|c| components.get(*c)).sum();
    let score = (100.0 * raw).clamp(0.0, 100.0);

    let mut by_distance: Vec<(f64, &str)> = samples
        .iter()
        .map(|s| {
            (
                haversine_km(lat, lon, s.station.latitude, s.station.longitude),
                s.station.name.as_str(),
            )
        })
        .collect();
    by_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let nearest_distance_km = by_distance
        .first()
        .map(|(d, _)| *d)
        .unwrap_or(f64::INFINITY);
    let confidence = (-nearest_distance_km / SCORE_CONFIDENCE_DECAY_KM)
        .exp()
        .max(MIN_SCORE_CONFIDENCE);
    let nearest_stations = by_distance
        .iter()
        .take(NEAREST_STATION_COUNT)
        .map(|(_, name)| name.to_string())
        .collect();

    debug!(
        "Scored ({:.4}, {:.4}): {:.1} (confidence {:.2})",
        lat, lon, score, confidence
    );

    LocationScore {
        latitude: lat,
        longitude: lon,
        score,
        confidence,
        components,
        nearest_stations,
        nearest_distance_km,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrbitalMetrics, ReferenceStation};

    fn make_sample(name: &str, lat: f64, lon: f64) -> TrainingSample {
        TrainingSample {
            station: ReferenceStation {
                id: name.to_string(),
                name: name.to_string(),
                latitude: lat,
                longitude: lon,
                country: Some("US".to_string()),
                antenna_size_m: 12.0,
                g_t_db: 33.0,
                capacity_gbps: 60.0,
                monthly_revenue_usd: 90_000.0,
                profit_margin_pct: 20.0,
                customer_count: 28,
                churn_rate_pct: 6.0,
                roi_pct: 14.0,
                operator: "SES".to_string(),
            },
            metrics: OrbitalMetrics::estimate_for_latitude(lat),
            success_score: 70.0,
            confidence_level: 0.9,
        }
    }

    fn uniform_weights() -> EmpiricalWeights {
        EmpiricalWeights {
            technical: 3.0 / 19.0,
            geographical: 3.0 / 19.0,
            economic: 3.0 / 19.0,
            orbital: 3.0 / 19.0,
            weather: 2.0 / 19.0,
            infrastructure: 2.0 / 19.0,
            market: 2.0 / 19.0,
            competition: 1.0 / 19.0,
        }
    }

    #[test]
    fn test_score_in_bounds() {
        let samples = vec![make_sample("Ashburn", 39.0, -77.5)];
        let weights = uniform_weights();
        for &(lat, lon) in &[(0.0, 0.0), (40.0, -74.0), (-33.9, 151.2), (65.0, 25.0)] {
            let scored = score_location(&samples, &weights, lat, lon, None);
            assert!(
                (0.0..=100.0).contains(&scored.score),
                "score {} at ({lat}, {lon})",
                scored.score
            );
            assert!((MIN_SCORE_CONFIDENCE..=1.0).contains(&scored.confidence));
        }
    }

    #[test]
    fn test_confidence_decays_with_distance() {
        let samples = vec![make_sample("Ashburn", 39.0, -77.5)];
        let weights = uniform_weights();

        // On top of the station: full confidence
        let near = score_location(&samples, &weights, 39.0, -77.5, None);
        assert!((near.confidence - 1.0).abs() < 1e-9);
        assert!(near.nearest_distance_km < 1e-6);

        // Across an ocean: clamped to the floor
        let far = score_location(&samples, &weights, -35.0, 140.0, None);
        assert!((far.confidence - MIN_SCORE_CONFIDENCE).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_stations_ascending() {
        let samples = vec![
            make_sample("Perth", -31.9, 115.9),
            make_sample("London", 51.5, -0.1),
            make_sample("Madrid", 40.4, -3.7),
            make_sample("Tokyo", 35.7, 139.7),
        ];
        let scored = score_location(&samples, &uniform_weights(), 48.9, 2.3, None);
        // From Paris: London, then Madrid, then Tokyo
        assert_eq!(scored.nearest_stations, vec!["London", "Madrid", "Tokyo"]);
        assert_eq!(scored.nearest_stations.len(), NEAREST_STATION_COUNT);
    }

    #[test]
    fn test_components_sum_to_score() {
        let samples = vec![make_sample("Ashburn", 39.0, -77.5)];
        let weights = uniform_weights();
        let scored = score_location(&samples, &weights, 45.0, 7.0, None);
        let total: f64 = FeatureCategory::ALL
            .iter()
            .map(|c| scored.components.get(*c))
            .sum();
        assert!((scored.score - 100.0 * total).abs() < 1e-9);
    }

    #[test]
    fn test_overrides_move_the_score() {
        let samples = vec![make_sample("Ashburn", 39.0, -77.5)];
        let weights = uniform_weights();

        let plain = score_location(&samples, &weights, 39.5, -76.0, None);
        let upgraded = score_location(
            &samples,
            &weights,
            39.5,
            -76.0,
            Some(&PointOverrides {
                antenna_size_m: Some(18.0),
                ..Default::default()
            }),
        );
        // 18m against the 15m baseline beats the neutral 0.5
        assert!(upgraded.score > plain.score);
        assert!(upgraded.components.technical > plain.components.technical);
    }
}
