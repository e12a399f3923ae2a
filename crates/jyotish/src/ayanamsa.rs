//! Lahiri ayanamsa with tiered sources.

use serde::{Deserialize, Serialize};

use crate::ephemeris::{EphemerisHandle, EphemerisSource};
use crate::error::EphemerisError;
use crate::time::centuries_since_j2000;

/// Lahiri ayanamsa at J2000.0, degrees.
pub const LAHIRI_J2000: f64 = 23.853;
/// Accepted range for the modern era.
pub const VALID_RANGE: std::ops::RangeInclusive<f64> = 15.0..=30.0;

/// Precession rate used by the linear fallback, degrees per century.
const LINEAR_RATE: f64 = 1.396_971_3;

/// Ayanamsa and the tier that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ayanamsa {
    pub degrees: f64,
    pub source: EphemerisSource,
}

/// Lahiri polynomial in T plus the node-dependent nutation term.
pub fn lahiri_polynomial(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    let precession = 5_028.796_195 * t + 1.105_434_8 * t * t + 0.000_079_64 * t * t * t;
    let node = (125.044_52 - 1_934.136_261 * t).to_radians();
    LAHIRI_J2000 + precession / 3600.0 - 0.004_778 * node.sin()
}

/// Straight-line precession, clamped into the valid range.
pub fn linear_fallback(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    let value = LAHIRI_J2000 + LINEAR_RATE * t;
    if value.is_finite() {
        value.clamp(*VALID_RANGE.start(), *VALID_RANGE.end())
    } else {
        LAHIRI_J2000
    }
}

#[derive(Debug, Clone, Default)]
pub struct AyanamsaCalculator {
    primary: Option<EphemerisHandle>,
}

impl AyanamsaCalculator {
    pub fn new(primary: Option<EphemerisHandle>) -> Self {
        Self { primary }
    }

    /// Primary sidereal offset, then the Lahiri polynomial, then the
    /// linear fallback. Always returns a value inside [`VALID_RANGE`].
    pub fn ayanamsa(&self, jd: f64) -> Ayanamsa {
        if let Some(primary) = &self.primary {
            let checked = primary.ayanamsa(jd).and_then(|value| {
                if VALID_RANGE.contains(&value) {
                    Ok(value)
                } else {
                    Err(EphemerisError::AyanamsaOutOfRange { value })
                }
            });
            match checked {
                Ok(degrees) => return Ayanamsa { degrees, source: EphemerisSource::Primary },
                Err(e) => log::debug!("Primary ayanamsa rejected at JD {jd}: {e}"),
            }
        }

        let value = lahiri_polynomial(jd);
        if VALID_RANGE.contains(&value) {
            return Ayanamsa { degrees: value, source: EphemerisSource::AnalyticalFallback };
        }

        let degrees = linear_fallback(jd);
        log::warn!("Lahiri polynomial gave {value} at JD {jd}; using linear ayanamsa {degrees:.4}");
        Ayanamsa { degrees, source: EphemerisSource::Emergency }
    }
}
