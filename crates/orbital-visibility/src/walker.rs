//! Walker Delta Shell Visibility Model
//!
//! Deterministic one-day simulation of an inclined Walker constellation on
//! circular orbits. Positions come from two-body circular propagation plus
//! Earth rotation; passes come from AOS/LOS edges over a fixed sampling
//! cadence. Accurate enough for comparing candidate sites against each
//! other, which is all the suitability pipeline needs.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    weather_reliability_for_latitude, MetricsFuture, OrbitalMetrics, Result, SiteLocation,
    VisibilityCalculator, VisibilityError,
};

const EARTH_RADIUS_KM: f64 = 6378.137;
const EARTH_MU_KM3_S2: f64 = 398_600.4418;
/// Sidereal rotation rate, rad/s.
const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Walker Delta shell parameters (i: t/p/f).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WalkerShell {
    pub total_satellites: u32,
    pub planes: u32,
    pub phasing: u32,
    pub altitude_km: f64,
    pub inclination_deg: f64,
}

impl WalkerShell {
    /// The HALO MEO shell: 55 deg, 12/3/4 at 10,500 km.
    pub fn halo() -> Self {
        WalkerShell {
            total_satellites: 12,
            planes: 3,
            phasing: 4,
            altitude_km: 10_500.0,
            inclination_deg: 55.0,
        }
    }

    pub fn satellites_per_plane(&self) -> u32 {
        self.total_satellites / self.planes
    }

    pub fn plane_spacing_deg(&self) -> f64 {
        360.0 / self.planes as f64
    }

    pub fn in_plane_spacing_deg(&self) -> f64 {
        360.0 / self.satellites_per_plane() as f64
    }

    /// Circular two-body orbital period, seconds.
    pub fn period_s(&self) -> f64 {
        let a = EARTH_RADIUS_KM + self.altitude_km;
        2.0 * PI * (a.powi(3) / EARTH_MU_KM3_S2).sqrt()
    }
}

/// One satellite slot: ascending node plus epoch argument of latitude.
#[derive(Debug, Clone, Copy)]
struct ShellSlot {
    raan_rad: f64,
    phase0_rad: f64,
}

/// In-process [`VisibilityCalculator`] backed by a Walker shell simulation.
#[derive(Debug, Clone)]
pub struct WalkerVisibilityModel {
    shell: WalkerShell,
    min_elevation_deg: f64,
    time_step_s: f64,
}

impl WalkerVisibilityModel {
    pub fn new(shell: WalkerShell) -> Self {
        Self {
            shell,
            min_elevation_deg: 10.0,
            time_step_s: 60.0,
        }
    }

    /// Override the tracking mask (degrees above horizon).
    pub fn with_mask(mut self, min_elevation_deg: f64) -> Self {
        self.min_elevation_deg = min_elevation_deg;
        self
    }

    fn slots(&self) -> Vec<ShellSlot> {
        let per_plane = self.shell.satellites_per_plane();
        // Walker phasing: slot offset between adjacent planes is f * 360 / t.
        let phase_step_rad =
            self.shell.phasing as f64 * 360.0 / self.shell.total_satellites as f64 * DEG_TO_RAD;

        (0..self.shell.total_satellites)
            .map(|sat| {
                let plane = sat / per_plane;
                let slot = sat % per_plane;
                ShellSlot {
                    raan_rad: plane as f64 * self.shell.plane_spacing_deg() * DEG_TO_RAD,
                    phase0_rad: slot as f64 * self.shell.in_plane_spacing_deg() * DEG_TO_RAD
                        + plane as f64 * phase_step_rad,
                }
            })
            .collect()
    }

    /// Sub-satellite point (degrees) for a slot at `t` seconds after epoch.
    fn subsatellite_at(&self, slot: ShellSlot, t: f64) -> (f64, f64) {
        let inc = self.shell.inclination_deg * DEG_TO_RAD;
        let mean_motion = 2.0 * PI / self.shell.period_s();
        let u = slot.phase0_rad + mean_motion * t;

        // Circular orbit in ECI, rotated by inclination and RAAN
        let x = u.cos() * slot.raan_rad.cos() - u.sin() * inc.cos() * slot.raan_rad.sin();
        let y = u.cos() * slot.raan_rad.sin() + u.sin() * inc.cos() * slot.raan_rad.cos();
        let z = u.sin() * inc.sin();

        let lat_deg = z.asin() * RAD_TO_DEG;
        // Earth rotation carries the ground eastward under the orbit
        let lon_rad = y.atan2(x) - EARTH_ROTATION_RAD_S * t;
        let lon_deg = normalize_longitude(lon_rad * RAD_TO_DEG);

        (lat_deg, lon_deg)
    }

    /// Simulate one day of the shell over `site` and summarize.
    pub fn metrics_for(&self, site: SiteLocation) -> Result<OrbitalMetrics> {
        if !site.is_valid() {
            return Err(VisibilityError::InvalidSite {
                latitude: site.latitude_deg,
                longitude: site.longitude_deg,
            });
        }

        let slots = self.slots();
        let steps = (SECONDS_PER_DAY / self.time_step_s) as usize;

        let mut passes = 0u32;
        let mut peak_elevations: Vec<f64> = Vec::new();
        let mut covered_steps = 0usize;
        let mut visible_sat_steps = 0usize;

        // Per-satellite AOS/LOS state for pass edge detection
        let mut in_view = vec![false; slots.len()];
        let mut peak = vec![0.0f64; slots.len()];

        for step in 0..steps {
            let t = step as f64 * self.time_step_s;
            let mut visible_now = 0usize;

            for (i, &slot) in slots.iter().enumerate() {
                let (sub_lat, sub_lon) = self.subsatellite_at(slot, t);
                let elevation =
                    elevation_deg(site, sub_lat, sub_lon, self.shell.altitude_km);
                let visible = elevation >= self.min_elevation_deg;

                if visible {
                    visible_now += 1;
                    if !in_view[i] {
                        // AOS - start of pass
                        in_view[i] = true;
                        peak[i] = elevation;
                    } else if elevation > peak[i] {
                        peak[i] = elevation;
                    }
                } else if in_view[i] {
                    // LOS - end of pass
                    in_view[i] = false;
                    passes += 1;
                    peak_elevations.push(peak[i]);
                }
            }

            if visible_now > 0 {
                covered_steps += 1;
            }
            visible_sat_steps += visible_now;
        }

        // Flush passes still in progress at end of the day
        for (i, &still) in in_view.iter().enumerate() {
            if still {
                passes += 1;
                peak_elevations.push(peak[i]);
            }
        }

        let average_elevation_deg = if peak_elevations.is_empty() {
            0.0
        } else {
            peak_elevations.iter().sum::<f64>() / peak_elevations.len() as f64
        };
        let coverage_fraction = covered_steps as f64 / steps as f64;
        let mean_visible = visible_sat_steps as f64 / steps as f64;
        // Utilization proxy: continuous coverage scaled by how many satellites
        // a dual-antenna site could actually serve at once.
        let utilization = coverage_fraction * (mean_visible / 2.0).min(1.0) * 100.0;

        debug!(
            lat = site.latitude_deg,
            lon = site.longitude_deg,
            passes,
            coverage_pct = coverage_fraction * 100.0,
            "walker visibility simulated"
        );

        Ok(OrbitalMetrics {
            daily_passes: passes as f64,
            average_elevation_deg,
            gap_coverage_pct: coverage_fraction * 100.0,
            weather_reliability_pct: weather_reliability_for_latitude(site.latitude_deg),
            utilization_score_pct: utilization,
        })
    }
}

impl VisibilityCalculator for WalkerVisibilityModel {
    fn site_performance(&self, site: SiteLocation) -> MetricsFuture<'_> {
        Box::pin(async move { self.metrics_for(site) })
    }
}

fn normalize_longitude(mut lon_deg: f64) -> f64 {
    while lon_deg > 180.0 {
        lon_deg -= 360.0;
    }
    while lon_deg < -180.0 {
        lon_deg += 360.0;
    }
    lon_deg
}

/// Elevation of a satellite above a site's horizon, degrees. ECEF vectors on
/// a spherical Earth rotated into the site's East-North-Up frame.
fn elevation_deg(site: SiteLocation, sat_lat_deg: f64, sat_lon_deg: f64, sat_alt_km: f64) -> f64 {
    let gs_lat = site.latitude_deg * DEG_TO_RAD;
    let gs_lon = site.longitude_deg * DEG_TO_RAD;
    let sat_lat = sat_lat_deg * DEG_TO_RAD;
    let sat_lon = sat_lon_deg * DEG_TO_RAD;

    // Ground station ECEF
    let gs_x = EARTH_RADIUS_KM * gs_lat.cos() * gs_lon.cos();
    let gs_y = EARTH_RADIUS_KM * gs_lat.cos() * gs_lon.sin();
    let gs_z = EARTH_RADIUS_KM * gs_lat.sin();

    // Satellite ECEF from its sub-satellite point
    let sat_r = EARTH_RADIUS_KM + sat_alt_km;
    let sat_x = sat_r * sat_lat.cos() * sat_lon.cos();
    let sat_y = sat_r * sat_lat.cos() * sat_lon.sin();
    let sat_z = sat_r * sat_lat.sin();

    let dx = sat_x - gs_x;
    let dy = sat_y - gs_y;
    let dz = sat_z - gs_z;

    // East-North-Up rotation
    let sin_lat = gs_lat.sin();
    let cos_lat = gs_lat.cos();
    let sin_lon = gs_lon.sin();
    let cos_lon = gs_lon.cos();

    let east = -sin_lon * dx + cos_lon * dy;
    let north = -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz;
    let up = cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz;

    let horiz_range = (east * east + north * north).sqrt();
    up.atan2(horiz_range) * RAD_TO_DEG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halo_preset() {
        let shell = WalkerShell::halo();
        assert_eq!(shell.satellites_per_plane(), 4);
        assert_eq!(shell.plane_spacing_deg(), 120.0);
        assert_eq!(shell.in_plane_spacing_deg(), 90.0);
        // MEO at 10,500 km orbits in roughly six hours
        let period = shell.period_s();
        assert!(period > 21_000.0 && period < 22_500.0, "period {period}");
    }

    #[test]
    fn test_elevation_overhead_and_antipode() {
        let site = SiteLocation::new(34.0, -118.0);
        // Directly overhead
        let up = elevation_deg(site, 34.0, -118.0, 10_500.0);
        assert!(up > 89.0, "overhead elevation {up}");
        // Opposite side of Earth
        let down = elevation_deg(site, -34.0, 62.0, 10_500.0);
        assert!(down < 0.0, "antipodal elevation {down}");
    }

    #[test]
    fn test_metrics_in_range() {
        let model = WalkerVisibilityModel::new(WalkerShell::halo());
        for lat in [0.0, 25.0, 45.0, 70.0] {
            let m = model
                .metrics_for(SiteLocation::new(lat, 15.0))
                .unwrap();
            assert!(m.daily_passes > 0.0, "no passes at lat {lat}");
            assert!(m.average_elevation_deg > 0.0 && m.average_elevation_deg <= 90.0);
            assert!(m.gap_coverage_pct >= 0.0 && m.gap_coverage_pct <= 100.0);
            assert!(m.utilization_score_pct >= 0.0 && m.utilization_score_pct <= 100.0);
            assert!(m.weather_reliability_pct >= 60.0 && m.weather_reliability_pct <= 90.0);
        }
    }

    #[test]
    fn test_deterministic() {
        let model = WalkerVisibilityModel::new(WalkerShell::halo());
        let site = SiteLocation::new(40.0, -3.7);
        let a = model.metrics_for(site).unwrap();
        let b = model.metrics_for(site).unwrap();
        assert_eq!(a.daily_passes, b.daily_passes);
        assert_eq!(a.average_elevation_deg, b.average_elevation_deg);
        assert_eq!(a.gap_coverage_pct, b.gap_coverage_pct);
    }

    #[test]
    fn test_invalid_site_rejected() {
        let model = WalkerVisibilityModel::new(WalkerShell::halo());
        let err = model.metrics_for(SiteLocation::new(99.0, 0.0)).unwrap_err();
        assert!(matches!(err, VisibilityError::InvalidSite { .. }));
    }

    #[test]
    fn test_raised_mask_reduces_visibility() {
        let site = SiteLocation::new(10.0, 10.0);
        let low = WalkerVisibilityModel::new(WalkerShell::halo())
            .metrics_for(site)
            .unwrap();
        let high = WalkerVisibilityModel::new(WalkerShell::halo())
            .with_mask(40.0)
            .metrics_for(site)
            .unwrap();
        assert!(high.gap_coverage_pct <= low.gap_coverage_pct);
    }
}
