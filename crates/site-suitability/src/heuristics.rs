//! Coarse geographic heuristics
//!
//! Table-driven proxies used where no measured value exists: regional
//! economic activity, country-level infrastructure quality, metro-anchored
//! population and urban proximity, latitude-banded weather, and regional
//! competition headroom.
//!
//! These are deliberately coarse. The calibration pipeline only needs
//! features that rank sites sensibly against each other; swapping in real
//! GIS layers tightens the numbers without changing any signature here.

use crate::haversine_km;

/// Infrastructure score for countries absent from the table
pub const DEFAULT_INFRASTRUCTURE_SCORE: f64 = 70.0;

/// Neutral competition headroom outside any keyed region
pub const DEFAULT_COMPETITION_HEADROOM: f64 = 0.5;

/// Economic activity for coordinates outside every developed-region box
pub const DEFAULT_ECONOMIC_ACTIVITY: f64 = 0.4;

/// Developed-region bounding boxes (lat_min, lat_max, lon_min, lon_max, score).
/// Simplified lookup - production should use proper GIS layers.
const ECONOMIC_REGIONS: &[(f64, f64, f64, f64, f64)] = &[
    // North America
    (24.5, 49.5, -125.0, -66.0, 0.9),
    // Europe
    (36.0, 60.0, -10.0, 30.0, 0.85),
    // East Asia (Japan, Korea, coastal China)
    (20.0, 46.0, 100.0, 146.0, 0.8),
];

/// Regional competition headroom boxes (lat_min, lat_max, lon_min, lon_max,
/// headroom). Higher means fewer incumbent teleports competing for traffic.
const COMPETITION_REGIONS: &[(f64, f64, f64, f64, f64)] = &[
    // Saturated markets
    (24.5, 49.5, -125.0, -66.0, 0.35), // North America
    (36.0, 60.0, -10.0, 30.0, 0.40),   // Europe
    (20.0, 46.0, 100.0, 146.0, 0.45),  // East Asia
    // Underserved regions
    (-35.0, 15.0, -20.0, 52.0, 0.80),  // Africa
    (-56.0, 12.0, -82.0, -34.0, 0.70), // South America
    (-47.0, -10.0, 112.0, 179.0, 0.65), // Oceania
];

/// Country infrastructure quality, 0-100 (code, name, score).
/// Roughly tracks grid reliability, fiber availability, and logistics.
const COUNTRY_INFRASTRUCTURE: &[(&str, &str, f64)] = &[
    ("US", "United States", 95.0),
    ("SG", "Singapore", 94.0),
    ("DE", "Germany", 93.0),
    ("CH", "Switzerland", 93.0),
    ("JP", "Japan", 92.0),
    ("NL", "Netherlands", 92.0),
    ("KR", "South Korea", 91.0),
    ("GB", "United Kingdom", 90.0),
    ("DK", "Denmark", 90.0),
    ("SE", "Sweden", 90.0),
    ("CA", "Canada", 89.0),
    ("NO", "Norway", 89.0),
    ("AU", "Australia", 88.0),
    ("FR", "France", 88.0),
    ("FI", "Finland", 88.0),
    ("IE", "Ireland", 88.0),
    ("NZ", "New Zealand", 85.0),
    ("AE", "United Arab Emirates", 85.0),
    ("IL", "Israel", 84.0),
    ("ES", "Spain", 82.0),
    ("IT", "Italy", 80.0),
    ("CZ", "Czech Republic", 80.0),
    ("PT", "Portugal", 78.0),
    ("PL", "Poland", 78.0),
    ("SA", "Saudi Arabia", 75.0),
    ("GR", "Greece", 72.0),
    ("MY", "Malaysia", 72.0),
    ("CL", "Chile", 70.0),
    ("TR", "Turkey", 68.0),
    ("BR", "Brazil", 65.0),
    ("TH", "Thailand", 65.0),
    ("MX", "Mexico", 62.0),
    ("AR", "Argentina", 60.0),
    ("IN", "India", 60.0),
    ("ZA", "South Africa", 60.0),
    ("VN", "Vietnam", 58.0),
    ("ID", "Indonesia", 55.0),
    ("PH", "Philippines", 55.0),
    ("EG", "Egypt", 55.0),
    ("KE", "Kenya", 50.0),
    ("NG", "Nigeria", 45.0),
];

/// Metro anchors for population and urban-proximity fields
/// (name, lat, lon, metro population in millions).
const METRO_ANCHORS: &[(&str, f64, f64, f64)] = &[
    ("Tokyo", 35.6762, 139.6503, 37.4),
    ("Delhi", 28.7041, 77.1025, 32.9),
    ("Shanghai", 31.2304, 121.4737, 29.2),
    ("Sao Paulo", -23.5505, -46.6333, 22.6),
    ("Mexico City", 19.4326, -99.1332, 22.3),
    ("Cairo", 30.0444, 31.2357, 21.8),
    ("Beijing", 39.9042, 116.4074, 21.3),
    ("Mumbai", 19.0760, 72.8777, 21.2),
    ("New York", 40.7128, -74.0060, 18.9),
    ("Jakarta", -6.2088, 106.8456, 11.1),
    ("Lagos", 6.5244, 3.3792, 15.9),
    ("Istanbul", 41.0082, 28.9784, 15.8),
    ("Los Angeles", 34.0522, -118.2437, 12.5),
    ("Moscow", 55.7558, 37.6173, 12.6),
    ("Seoul", 37.5665, 126.9780, 9.9),
    ("London", 51.5074, -0.1278, 9.6),
    ("Paris", 48.8566, 2.3522, 11.2),
    ("Johannesburg", -26.2041, 28.0473, 6.0),
    ("Singapore", 1.3521, 103.8198, 6.0),
    ("Sydney", -33.8688, 151.2093, 5.4),
    ("Frankfurt", 50.1109, 8.6821, 2.7),
    ("Dubai", 25.2048, 55.2708, 3.6),
];

/// Economic activity factor at a coordinate, 0-1.
pub fn economic_activity_factor(lat: f64, lon: f64) -> f64 {
    for &(lat_min, lat_max, lon_min, lon_max, score) in ECONOMIC_REGIONS {
        if lat >= lat_min && lat <= lat_max && lon >= lon_min && lon <= lon_max {
            return score;
        }
    }
    DEFAULT_ECONOMIC_ACTIVITY
}

/// Competition headroom at a coordinate, 0-1. Higher = less contested.
pub fn competition_headroom(lat: f64, lon: f64) -> f64 {
    for &(lat_min, lat_max, lon_min, lon_max, headroom) in COMPETITION_REGIONS {
        if lat >= lat_min && lat <= lat_max && lon >= lon_min && lon <= lon_max {
            return headroom;
        }
    }
    DEFAULT_COMPETITION_HEADROOM
}

/// Country infrastructure score, 0-100. Accepts ISO alpha-2 codes or full
/// names, case-insensitively; unknown or missing countries get the default.
pub fn infrastructure_score(country: Option<&str>) -> f64 {
    let Some(country) = country else {
        return DEFAULT_INFRASTRUCTURE_SCORE;
    };
    let needle = country.trim();
    for &(code, name, score) in COUNTRY_INFRASTRUCTURE {
        if needle.eq_ignore_ascii_case(code) || needle.eq_ignore_ascii_case(name) {
            return score;
        }
    }
    DEFAULT_INFRASTRUCTURE_SCORE
}

/// Population density field, 0-1: decayed contributions of the three
/// nearest metro anchors, scaled by metro population.
pub fn population_density_factor(lat: f64, lon: f64) -> f64 {
    let mut contributions: Vec<f64> = METRO_ANCHORS
        .iter()
        .map(|&(_, m_lat, m_lon, pop_m)| {
            let d = haversine_km(lat, lon, m_lat, m_lon);
            (pop_m / 30.0).min(1.0) * (-d / 1000.0).exp()
        })
        .collect();
    contributions.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    contributions.iter().take(3).sum::<f64>().clamp(0.0, 1.0)
}

/// Urban proximity, 0-1: decay on the distance to the nearest metro anchor.
pub fn urban_proximity_factor(lat: f64, lon: f64) -> f64 {
    let nearest = METRO_ANCHORS
        .iter()
        .map(|&(_, m_lat, m_lon, _)| haversine_km(lat, lon, m_lat, m_lon))
        .fold(f64::INFINITY, f64::min);
    (-nearest / 500.0).exp()
}

/// Latitude-banded weather quality, 0-1. Same banding as the visibility
/// crate's reliability model: subtropical arid best, tropics and high
/// latitudes worst.
pub fn weather_factor(latitude: f64) -> f64 {
    let abs_lat = latitude.abs();
    if abs_lat > 15.0 && abs_lat < 35.0 {
        0.9 // Subtropical arid - best
    } else if abs_lat < 15.0 {
        0.6 // Tropical - cloudy
    } else if abs_lat < 55.0 {
        0.75 // Temperate - variable
    } else {
        0.5 // High latitude - poor
    }
}

/// Equator-favoring orbital access proxy, 0.4-1.0. Point-pipeline stand-in
/// for a real visibility run.
pub fn orbital_access_factor(latitude: f64) -> f64 {
    0.4 + 0.6 * (1.0 - (latitude.abs() / 90.0).clamp(0.0, 1.0))
}
