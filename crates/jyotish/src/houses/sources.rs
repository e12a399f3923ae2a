use crate::angle::normalize;
use crate::ephemeris::{EphemerisHandle, EphemerisSource, GeoLocation};
use crate::error::HouseError;
use crate::houses::placidus;
use crate::houses::{HouseCandidate, HouseRequest, HouseSystem};
use crate::nutation::NutationModel;
use crate::sidereal::SiderealTimeCalculator;

/// Latitude beyond which no formula-based house is attempted.
pub const POLE_LIMIT: f64 = 89.99;

/// One tier of the house fallback chain
pub trait HouseSource: Send + Sync {
    fn tier(&self) -> EphemerisSource;

    /// Candidate house system in sidereal degrees.
    fn houses(&self, request: &HouseRequest) -> Result<HouseCandidate, HouseError>;
}

fn require_location(request: &HouseRequest) -> Result<GeoLocation, HouseError> {
    match request.location {
        Some(loc) if loc.lat.is_finite() && loc.lon.is_finite() => Ok(loc),
        _ => Err(HouseError::Skipped { reason: "no usable location".to_string() }),
    }
}

/// True obliquity, or mean obliquity with a note when nutation fails.
fn obliquity(nutation: &NutationModel, jd: f64, notes: &mut Vec<String>) -> Result<f64, HouseError> {
    match nutation.true_obliquity(jd) {
        Ok(eps) => Ok(eps),
        Err(e) => {
            notes.push(format!("true obliquity unavailable ({e}), using mean obliquity"));
            nutation
                .mean_obliquity(jd)
                .map_err(|e| HouseError::Skipped { reason: e.to_string() })
        }
    }
}

/// Placidus cusps from the primary ephemeris
pub struct PrimaryHouses {
    handle: EphemerisHandle,
}

impl PrimaryHouses {
    pub fn new(handle: EphemerisHandle) -> Self {
        Self { handle }
    }
}

impl HouseSource for PrimaryHouses {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::Primary
    }

    fn houses(&self, request: &HouseRequest) -> Result<HouseCandidate, HouseError> {
        let location = require_location(request)?;
        let raw = self.handle.houses(request.jd, location)?;
        let system = HouseSystem::from_cusps(raw.ascendant, raw.mc, raw.cusps, EphemerisSource::Primary)
            .to_sidereal(request.ayanamsa);
        Ok(HouseCandidate { system, notes: Vec::new(), gmst_fallback: false })
    }
}

/// Spherical-trigonometry Placidus approximation
pub struct PlacidusApproximation {
    sidereal: SiderealTimeCalculator,
    nutation: NutationModel,
    apply_refraction: bool,
}

impl PlacidusApproximation {
    pub fn new(sidereal: SiderealTimeCalculator, apply_refraction: bool) -> Self {
        Self {
            sidereal,
            nutation: NutationModel::new(),
            apply_refraction,
        }
    }
}

impl HouseSource for PlacidusApproximation {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::AnalyticalFallback
    }

    fn houses(&self, request: &HouseRequest) -> Result<HouseCandidate, HouseError> {
        let location = require_location(request)?;
        let mut notes = Vec::new();
        let eps = obliquity(&self.nutation, request.jd, &mut notes)?;

        // Semi-arcs are undefined inside the polar circles.
        if location.lat.abs() > 90.0 - eps {
            return Err(HouseError::Skipped {
                reason: format!("latitude {} inside polar circle", location.lat),
            });
        }

        let lst = self.sidereal.local_sidereal_time(request.jd, location.lon);
        let mut ascendant = placidus::ascendant(lst.degrees, location.lat, eps);
        if self.apply_refraction {
            ascendant += placidus::refraction_shift(lst.degrees, location.lat, eps);
        }
        if let Ok(n) = self.nutation.nutation(request.jd) {
            ascendant += n.delta_psi;
        }
        let mc = placidus::midheaven(lst.degrees, eps);
        let intermediate = placidus::intermediate_cusps(lst.degrees, location.lat, eps);

        let system = HouseSystem::quadrant(ascendant, mc, intermediate, EphemerisSource::AnalyticalFallback)
            .to_sidereal(request.ayanamsa);
        Ok(HouseCandidate {
            system,
            notes,
            gmst_fallback: !lst.equinox_corrected,
        })
    }
}

/// Equal houses from the formula ascendant
pub struct EqualHouses {
    sidereal: SiderealTimeCalculator,
    nutation: NutationModel,
}

impl EqualHouses {
    pub fn new(sidereal: SiderealTimeCalculator) -> Self {
        Self {
            sidereal,
            nutation: NutationModel::new(),
        }
    }
}

impl HouseSource for EqualHouses {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::AnalyticalFallback
    }

    fn houses(&self, request: &HouseRequest) -> Result<HouseCandidate, HouseError> {
        let location = require_location(request)?;
        if location.lat.abs() >= POLE_LIMIT {
            return Err(HouseError::Skipped {
                reason: format!("latitude {} too close to the pole", location.lat),
            });
        }
        let mut notes = vec!["equal houses used in place of Placidus".to_string()];
        let eps = obliquity(&self.nutation, request.jd, &mut notes)?;
        let lst = self.sidereal.local_sidereal_time(request.jd, location.lon);
        let ascendant = placidus::ascendant(lst.degrees, location.lat, eps);
        let mc = placidus::midheaven(lst.degrees, eps);
        let system = HouseSystem::equal(ascendant, mc, EphemerisSource::AnalyticalFallback)
            .to_sidereal(request.ayanamsa);
        Ok(HouseCandidate {
            system,
            notes,
            gmst_fallback: !lst.equinox_corrected,
        })
    }
}

/// Ascendant estimated from the civil clock, equal houses
#[derive(Debug, Clone, Copy, Default)]
pub struct EmergencyHouses;

impl HouseSource for EmergencyHouses {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::Emergency
    }

    fn houses(&self, request: &HouseRequest) -> Result<HouseCandidate, HouseError> {
        let hours = request.clock_hours;
        if !hours.is_finite() {
            return Err(HouseError::Skipped { reason: format!("clock time {hours} unusable") });
        }
        // The Sun rises near 06:00 local time and climbs 15 degrees per hour.
        let ascendant = match request.sun_sidereal {
            Some(sun) => normalize(sun + (hours - 6.0) * 15.0),
            None => normalize(hours * 15.0),
        };
        let system = HouseSystem::equal(ascendant, ascendant - 90.0, EphemerisSource::Emergency);
        Ok(HouseCandidate {
            system,
            notes: vec!["ascendant estimated from civil clock time".to_string()],
            gmst_fallback: false,
        })
    }
}
