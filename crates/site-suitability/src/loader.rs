//! Reference station loading from JSON files

use crate::{ReferenceStation, Result, SuitabilityError};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Validate latitude is in valid range
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && lon.is_finite()
}

/// Sanitize ID to prevent injection (alphanumeric, dash, underscore only)
fn sanitize_id(id: String) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(128) // Max length
        .collect()
}

/// Sanitize name (allow more chars but still limit)
fn sanitize_name(name: String) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || " -_.,()&'".contains(*c))
        .take(256)
        .collect()
}

/// Clamp a raw metric to a finite non-negative value
fn sanitize_metric(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => default,
    }
}

/// Raw reference station from JSON
#[derive(Debug, Deserialize)]
struct RawReferenceStation {
    id: Option<String>,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country: Option<String>,
    antenna_size_m: Option<f64>,
    g_t_db: Option<f64>,
    capacity_gbps: Option<f64>,
    monthly_revenue_usd: Option<f64>,
    profit_margin_pct: Option<f64>,
    customer_count: Option<u32>,
    churn_rate_pct: Option<f64>,
    roi_pct: Option<f64>,
    operator: Option<String>,
}

impl RawReferenceStation {
    fn into_station(self, index: usize, lat: f64, lon: f64) -> ReferenceStation {
        ReferenceStation {
            id: sanitize_id(self.id.unwrap_or_else(|| format!("rs-{}", index))),
            name: sanitize_name(self.name.unwrap_or_else(|| "Unknown".to_string())),
            latitude: lat,
            longitude: lon,
            country: self.country.map(sanitize_name).filter(|c| !c.is_empty()),
            antenna_size_m: sanitize_metric(self.antenna_size_m, 0.0),
            g_t_db: sanitize_metric(self.g_t_db, 0.0),
            capacity_gbps: sanitize_metric(self.capacity_gbps, 0.0),
            monthly_revenue_usd: sanitize_metric(self.monthly_revenue_usd, 0.0),
            // Margin and ROI may legitimately be negative; only reject non-finite
            profit_margin_pct: self.profit_margin_pct.filter(|v| v.is_finite()).unwrap_or(0.0),
            customer_count: self.customer_count.unwrap_or(0),
            churn_rate_pct: sanitize_metric(self.churn_rate_pct, 0.0),
            roi_pct: self.roi_pct.filter(|v| v.is_finite()).unwrap_or(0.0),
            operator: sanitize_name(self.operator.unwrap_or_else(|| "Unknown".to_string())),
        }
    }
}

/// Load reference stations from JSON file
///
/// Accepts either a bare array of stations or an object with a `stations`
/// field. Entries with missing or out-of-range coordinates are skipped; an
/// empty result is an error because calibration cannot proceed without data.
pub fn load_reference_stations(path: impl AsRef<Path>) -> Result<Vec<ReferenceStation>> {
    let path = path.as_ref();
    info!("Loading reference stations from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let raw: serde_json::Value = serde_json::from_reader(reader)?;
    let rows: Vec<RawReferenceStation> = if let Some(stations) = raw.get("stations") {
        serde_json::from_value(stations.clone())?
    } else if raw.is_array() {
        serde_json::from_value(raw)?
    } else {
        return Err(SuitabilityError::NoStations);
    };

    let mut stations = Vec::new();
    let mut skipped = 0;

    for (i, row) in rows.into_iter().enumerate() {
        let lat = match row.latitude {
            Some(l) if is_valid_latitude(l) => l,
            Some(_) => {
                skipped += 1;
                continue; // Invalid latitude range
            }
            None => {
                skipped += 1;
                continue;
            }
        };
        let lon = match row.longitude {
            Some(l) if is_valid_longitude(l) => l,
            Some(_) => {
                skipped += 1;
                continue; // Invalid longitude range
            }
            None => {
                skipped += 1;
                continue;
            }
        };

        stations.push(row.into_station(i, lat, lon));
    }

    info!(
        "Loaded {} reference stations ({} skipped for bad coords)",
        stations.len(),
        skipped
    );

    if stations.is_empty() {
        return Err(SuitabilityError::NoStations);
    }

    Ok(stations)
}
