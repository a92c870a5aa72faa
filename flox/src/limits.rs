// Centralized ingestion limits to harden against untrusted snapshots

// Snapshot size caps
pub const MAX_NODES: usize = 200_000;
pub const MAX_FLOWS: usize = 300_000;

// Numeric bounds
pub const LAT_MAX: f64 = 90.0;
pub const LNG_MAX: f64 = 540.0; // wrapped longitudes from panned web maps
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;

#[inline]
pub fn in_lat_bounds(lat: f64) -> bool { lat.is_finite() && lat.abs() <= LAT_MAX }

#[inline]
pub fn in_lng_bounds(lng: f64) -> bool { lng.is_finite() && lng.abs() <= LNG_MAX }

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn valid_value(v: f64) -> bool { v.is_finite() }
