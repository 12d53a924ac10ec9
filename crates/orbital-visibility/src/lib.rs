//! Orbital Visibility Library
//!
//! Site-level pass metrics for the HALO constellation (12 MEO satellites at
//! 10,500 km): daily pass counts, pass elevation statistics, coverage
//! continuity, weather reliability, and a contact-capacity utilization proxy
//! for candidate ground-station sites.
//!
//! Consumers treat this crate as an async data source. [`VisibilityCalculator`]
//! is the seam behind which a live ephemeris service, a cached lookup table,
//! or the built-in [`WalkerVisibilityModel`] simulation can sit. When no
//! source is reachable at all, [`OrbitalMetrics::estimate_for_latitude`]
//! provides a coarse latitude-only approximation.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod walker;

pub use walker::{WalkerShell, WalkerVisibilityModel};

#[derive(Error, Debug)]
pub enum VisibilityError {
    #[error("Invalid site coordinates: lat={latitude}, lon={longitude}")]
    InvalidSite { latitude: f64, longitude: f64 },
    #[error("Visibility source unavailable: {0}")]
    SourceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, VisibilityError>;

/// A candidate or existing ground-station site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl SiteLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && self.latitude_deg.abs() <= 90.0
            && self.longitude_deg.abs() <= 180.0
    }
}

/// Pass and coverage metrics for one site over a representative day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrbitalMetrics {
    /// Passes per day above the tracking mask, summed across the shell.
    pub daily_passes: f64,
    /// Mean of per-pass peak elevations, degrees.
    pub average_elevation_deg: f64,
    /// Percentage of the day with at least one satellite in view.
    pub gap_coverage_pct: f64,
    /// Percentage of time local weather permits optical operation.
    pub weather_reliability_pct: f64,
    /// Percentage of theoretical contact capacity the site could keep busy.
    pub utilization_score_pct: f64,
}

impl OrbitalMetrics {
    /// Coarse latitude-only estimate, used when no visibility source is
    /// reachable. For an inclined MEO shell the broad trend is that
    /// low-latitude sites get more frequent, higher passes; the estimate is
    /// monotone in |latitude| so downstream ordering stays sane even when
    /// every site falls back at once.
    pub fn estimate_for_latitude(latitude_deg: f64) -> Self {
        let band = 1.0 - (latitude_deg.abs() / 90.0).clamp(0.0, 1.0);
        Self {
            daily_passes: 6.0 + 8.0 * band,
            average_elevation_deg: 25.0 + 30.0 * band,
            gap_coverage_pct: 70.0 + 25.0 * band,
            weather_reliability_pct: weather_reliability_for_latitude(latitude_deg),
            utilization_score_pct: 50.0 + 25.0 * band,
        }
    }
}

/// Fraction of the year weather permits optical operation, by latitude band.
/// Subtropical arid belts score best, tropics and high latitudes worst.
pub fn weather_reliability_for_latitude(latitude_deg: f64) -> f64 {
    let abs_lat = latitude_deg.abs();
    if abs_lat > 15.0 && abs_lat < 35.0 {
        90.0 // Subtropical arid - best
    } else if abs_lat < 15.0 {
        70.0 // Tropical - cloudy
    } else if abs_lat < 55.0 {
        80.0 // Temperate - variable
    } else {
        60.0 // High latitude - poor
    }
}

/// Boxed future returned by per-site visibility lookups.
pub type MetricsFuture<'a> = Pin<Box<dyn Future<Output = Result<OrbitalMetrics>> + Send + 'a>>;

/// Async source of per-site orbital metrics.
///
/// Implementations may call a live ephemeris service, read a cache, or run
/// the in-process Walker simulation. Per-site failures are independent: the
/// batch entry point yields one `Result` per site and leaves degradation
/// policy to the caller.
pub trait VisibilityCalculator: Send + Sync {
    /// Metrics for a single site.
    fn site_performance(&self, site: SiteLocation) -> MetricsFuture<'_>;

    /// Metrics for many sites, resolved concurrently.
    fn station_performance<'a>(
        &'a self,
        sites: &'a [SiteLocation],
    ) -> Pin<Box<dyn Future<Output = Vec<Result<OrbitalMetrics>>> + Send + 'a>> {
        Box::pin(async move {
            futures::future::join_all(sites.iter().map(|s| self.site_performance(*s))).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_estimate_monotone_toward_equator() {
        let equator = OrbitalMetrics::estimate_for_latitude(0.0);
        let mid = OrbitalMetrics::estimate_for_latitude(45.0);
        let polar = OrbitalMetrics::estimate_for_latitude(80.0);

        assert!(equator.daily_passes > mid.daily_passes);
        assert!(mid.daily_passes > polar.daily_passes);
        assert!(equator.average_elevation_deg > polar.average_elevation_deg);
        assert!(equator.gap_coverage_pct > polar.gap_coverage_pct);
    }

    #[test]
    fn test_estimate_symmetric_in_hemisphere() {
        let north = OrbitalMetrics::estimate_for_latitude(35.0);
        let south = OrbitalMetrics::estimate_for_latitude(-35.0);
        assert_eq!(north.daily_passes, south.daily_passes);
        assert_eq!(north.gap_coverage_pct, south.gap_coverage_pct);
    }

    #[test]
    fn test_weather_bands() {
        // Subtropical arid beats tropics and high latitudes
        assert!(weather_reliability_for_latitude(25.0) > weather_reliability_for_latitude(5.0));
        assert!(weather_reliability_for_latitude(25.0) > weather_reliability_for_latitude(65.0));
        // Temperate sits between
        assert_eq!(weather_reliability_for_latitude(45.0), 80.0);
    }

    #[test]
    fn test_site_validity() {
        assert!(SiteLocation::new(51.5, -0.1).is_valid());
        assert!(!SiteLocation::new(91.0, 0.0).is_valid());
        assert!(!SiteLocation::new(0.0, 181.0).is_valid());
        assert!(!SiteLocation::new(f64::NAN, 0.0).is_valid());
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let model = WalkerVisibilityModel::new(WalkerShell::halo());
        let sites = vec![SiteLocation::new(0.0, 0.0), SiteLocation::new(45.0, 10.0)];

        let batch = model.station_performance(&sites).await;
        assert_eq!(batch.len(), 2);

        let single = model.site_performance(sites[0]).await.unwrap();
        let from_batch = batch[0].as_ref().unwrap();
        assert_eq!(single.daily_passes, from_batch.daily_passes);
        assert_eq!(single.gap_coverage_pct, from_batch.gap_coverage_pct);
    }

    proptest! {
        #[test]
        fn prop_estimate_in_range(lat in -90.0f64..=90.0) {
            let m = OrbitalMetrics::estimate_for_latitude(lat);
            prop_assert!(m.daily_passes >= 6.0 && m.daily_passes <= 14.0);
            prop_assert!(m.average_elevation_deg >= 25.0 && m.average_elevation_deg <= 55.0);
            prop_assert!(m.gap_coverage_pct >= 70.0 && m.gap_coverage_pct <= 95.0);
            prop_assert!(m.weather_reliability_pct >= 60.0 && m.weather_reliability_pct <= 90.0);
            prop_assert!(m.utilization_score_pct >= 50.0 && m.utilization_score_pct <= 75.0);
        }
    }
}
