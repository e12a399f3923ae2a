//! Greenwich and local sidereal time.
//!
//! GMST follows Meeus eq. 12.4. Apparent sidereal time adds the equation of
//! the equinoxes, Δψ·cos(ε), taken from [`NutationModel`]; when that model
//! fails the mean value is used unchanged.

use serde::{Deserialize, Serialize};

use crate::angle::normalize;
use crate::nutation::NutationModel;
use crate::time::{centuries_since_j2000, J2000};

/// Local sidereal time in degrees, with a note of which formula produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalSiderealTime {
    pub degrees: f64,
    /// false when the nutation model failed and GMST was used bare
    pub equinox_corrected: bool,
}

/// Greenwich Mean Sidereal Time in degrees, [0, 360).
pub fn greenwich_mean_sidereal_time(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    normalize(
        280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SiderealTimeCalculator {
    nutation: NutationModel,
}

impl SiderealTimeCalculator {
    pub fn new(nutation: NutationModel) -> Self {
        Self { nutation }
    }

    /// Apparent sidereal time at Greenwich, or GMST if nutation fails.
    pub fn greenwich_sidereal_time(&self, jd: f64) -> LocalSiderealTime {
        let gmst = greenwich_mean_sidereal_time(jd);
        let correction = self.nutation.nutation(jd).and_then(|n| {
            let eps = self.nutation.mean_obliquity(jd)? + n.delta_epsilon;
            Ok(n.delta_psi * eps.to_radians().cos())
        });
        match correction {
            Ok(equation_of_equinoxes) => LocalSiderealTime {
                degrees: normalize(gmst + equation_of_equinoxes),
                equinox_corrected: true,
            },
            Err(e) => {
                log::warn!("Sidereal time falling back to GMST: {e}");
                LocalSiderealTime {
                    degrees: gmst,
                    equinox_corrected: false,
                }
            }
        }
    }

    /// Local sidereal time for an east-positive longitude.
    pub fn local_sidereal_time(&self, jd: f64, longitude: f64) -> LocalSiderealTime {
        let greenwich = self.greenwich_sidereal_time(jd);
        LocalSiderealTime {
            degrees: normalize(greenwich.degrees + longitude),
            ..greenwich
        }
    }
}
