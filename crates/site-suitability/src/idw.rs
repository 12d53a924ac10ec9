//! Inverse-distance-weighted interpolation
//!
//! A second opinion independent of the calibrated model: interpolates the
//! raw success scores of nearby reference stations, so a query next to a
//! station returns approximately that station's real outcome. No features,
//! no weights; just distance and measured results.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    haversine_km, TrainingSample, IDW_CONFIDENCE_DECAY_KM, IDW_SOURCE_LIMIT,
    NO_NEIGHBOR_CONFIDENCE,
};

/// Substituted for 1/d^p when the query sits exactly on a station
const ZERO_DISTANCE_WEIGHT: f64 = 1e10;

/// Interpolation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IdwParams {
    /// Distance exponent
    pub power: f64,
    /// Neighborhood radius, km
    pub max_distance_km: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.000000000,
            max_distance_km: 5000.000000000,
        }
    }
}

/// An interpolated outcome estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdwEstimate {
    pub latitude: f64,
    pub longitude: f64,
    /// Interpolated success score, 0-100
    pub value: f64,
    /// Weighted station confidence, decayed by distance to the nearest
    pub confidence: f64,
    /// Contributing stations, ascending distance, capped
    pub source_stations: Vec<String>,
    /// Infinity when no station is in range
    pub nearest_distance_km: f64,
}

/// Interpolate the success score at a coordinate from stations within range.
pub fn interpolate(
    samples: &[TrainingSample],
    lat: f64,
    lon: f64,
    params: IdwParams,
) -> IdwEstimate {
    let mut neighbors: Vec<(f64, &TrainingSample)> = samples
        .iter()
        .filter_map(|s| {
            let d = haversine_km(lat, lon, s.station.latitude, s.station.longitude);
            (d <= params.max_distance_km).then_some((d, s))
        })
        .collect();
    neighbors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    if neighbors.is_empty() {
        // Out of range of every station: fall back to the global mean with
        // fixed low confidence and explicitly empty provenance.
        let value = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.success_score).sum::<f64>() / samples.len() as f64
        };
        debug!(
            "No IDW neighbors within {} km of ({:.4}, {:.4})",
            params.max_distance_km, lat, lon
        );
        return IdwEstimate {
            latitude: lat,
            longitude: lon,
            value,
            confidence: NO_NEIGHBOR_CONFIDENCE,
            source_stations: Vec::new(),
            nearest_distance_km: f64::INFINITY,
        };
    }

    let mut weight_sum = 0.0;
    let mut value_sum = 0.0;
    let mut confidence_sum = 0.0;
    for &(d, sample) in &neighbors {
        let w = if d == 0.0 {
            ZERO_DISTANCE_WEIGHT
        } else {
            1.0 / d.powf(params.power)
        };
        weight_sum += w;
        value_sum += w * sample.success_score;
        confidence_sum += w * sample.confidence_level;
    }

    let nearest_distance_km = neighbors[0].0;
    let value = value_sum / weight_sum;
    let confidence =
        (confidence_sum / weight_sum) * (-nearest_distance_km / IDW_CONFIDENCE_DECAY_KM).exp();
    let source_stations = neighbors
        .iter()
        .take(IDW_SOURCE_LIMIT)
        .map(|(_, s)| s.station.name.clone())
        .collect();

    IdwEstimate {
        latitude: lat,
        longitude: lon,
        value,
        confidence,
        source_stations,
        nearest_distance_km,
    }
}
