//! Angle reduction shared by every pipeline in the crate.
//!
//! Tropical longitudes from either ephemeris tier and every house cusp pass
//! through [`normalize`] so that all published angles live in `[0, 360)`.

/// Values closer than this to 360 collapse to 0.
pub const WRAP_TOLERANCE: f64 = 1e-10;

/// Normalize degrees to [0, 360).
pub fn normalize(degrees: f64) -> f64 {
    let reduced = degrees.rem_euclid(360.0);
    if reduced >= 360.0 - WRAP_TOLERANCE {
        0.0
    } else {
        reduced
    }
}

/// Convert a tropical longitude to sidereal.
pub fn to_sidereal(tropical: f64, ayanamsa: f64) -> f64 {
    normalize(tropical - ayanamsa)
}

/// Shortest arc between two longitudes, in [0, 180].
pub fn separation(a: f64, b: f64) -> f64 {
    let diff = normalize(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Signed difference `a - b` folded into (-180, 180].
pub fn signed_difference(a: f64, b: f64) -> f64 {
    let diff = normalize(a - b);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Whether `value` is a finite angle already reduced to [0, 360).
pub fn is_normalized(value: f64) -> bool {
    value.is_finite() && (0.0..360.0).contains(&value)
}
