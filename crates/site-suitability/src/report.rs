//! Grid evaluation and GeoJSON export

use crate::features::{FeatureCategory, PointOverrides};
use crate::model::SuitabilityModel;
use crate::scorer::LocationScore;
use crate::{Result, SuitabilityError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rectangular lat/lon mesh, inclusive of both bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub step_deg: f64,
}

impl GridSpec {
    pub fn validate(&self) -> Result<()> {
        if !(self.step_deg > 0.0 && self.step_deg.is_finite()) {
            return Err(SuitabilityError::InvalidCoordinates(format!(
                "grid step must be positive, got {}",
                self.step_deg
            )));
        }
        if self.lat_min > self.lat_max || self.lon_min > self.lon_max {
            return Err(SuitabilityError::InvalidCoordinates(format!(
                "grid bounds inverted: lat {}..{}, lon {}..{}",
                self.lat_min, self.lat_max, self.lon_min, self.lon_max
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat_min) || !(-90.0..=90.0).contains(&self.lat_max) {
            return Err(SuitabilityError::InvalidCoordinates(format!(
                "grid latitude out of range: {}..{}",
                self.lat_min, self.lat_max
            )));
        }
        Ok(())
    }

    /// Enumerate grid points row-major, south to north, west to east
    pub fn points(&self) -> Vec<(f64, f64)> {
        let mut points = Vec::new();
        let mut lat = self.lat_min;
        // Epsilon keeps the inclusive upper bound stable under f64 stepping
        while lat <= self.lat_max + 1e-9 {
            let mut lon = self.lon_min;
            while lon <= self.lon_max + 1e-9 {
                points.push((lat, lon));
                lon += self.step_deg;
            }
            lat += self.step_deg;
        }
        points
    }
}

/// Score every point of the grid against a calibrated model
pub fn score_grid(
    model: &SuitabilityModel,
    spec: &GridSpec,
    overrides: Option<&PointOverrides>,
) -> Result<Vec<LocationScore>> {
    spec.validate()?;

    let points = spec.points();
    info!("Scoring {} grid points", points.len());

    let mut scores = Vec::with_capacity(points.len());
    for (lat, lon) in points {
        scores.push(model.score_location(lat, lon, overrides)?);
    }
    Ok(scores)
}

/// Export scored grid points to GeoJSON
pub fn grid_to_geojson(scores: &[LocationScore], spec: &GridSpec) -> serde_json::Value {
    let features: Vec<serde_json::Value> = scores
        .iter()
        .map(|s| {
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [s.longitude, s.latitude]
                },
                "properties": {
                    "score": s.score,
                    "confidence": s.confidence,
                    "technical": s.components.get(FeatureCategory::Technical),
                    "geographical": s.components.get(FeatureCategory::Geographical),
                    "economic": s.components.get(FeatureCategory::Economic),
                    "orbital": s.components.get(FeatureCategory::Orbital),
                    "weather": s.components.get(FeatureCategory::Weather),
                    "infrastructure": s.components.get(FeatureCategory::Infrastructure),
                    "market": s.components.get(FeatureCategory::Market),
                    "competition": s.components.get(FeatureCategory::Competition),
                    "nearest_stations": s.nearest_stations,
                    "nearest_distance_km": s.nearest_distance_km
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
        "metadata": {
            "point_count": scores.len(),
            "step_deg": spec.step_deg,
            "bounds": [spec.lon_min, spec.lat_min, spec.lon_max, spec.lat_max],
            "generated_at": chrono::Utc::now().to_rfc3339()
        }
    })
}
