//! House cusps with a Placidus -> Equal -> Emergency fallback chain.
//!
//! Each tier is a [`HouseSource`]. [`HouseCuspCalculator`] tries them in
//! order, runs the quality gate on every candidate and keeps the first one
//! that passes, recording the rejections for the quality report.

pub mod placidus;
pub mod sources;

use serde::{Deserialize, Serialize};

use crate::angle::normalize;
use crate::chart::validator::ChartValidator;
use crate::ephemeris::{EphemerisHandle, EphemerisSource, GeoLocation};
use crate::error::HouseError;
use crate::sidereal::SiderealTimeCalculator;

pub use sources::{EmergencyHouses, EqualHouses, HouseSource, PlacidusApproximation, PrimaryHouses};

/// How the intermediate cusps were divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseMethod {
    Placidus,
    Equal,
}

/// Angles and twelve cusps, sidereal degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseSystem {
    pub ascendant: f64,
    pub mc: f64,
    pub descendant: f64,
    pub ic: f64,
    /// Cusps 1..12
    pub cusps: [f64; 12],
    pub method: HouseMethod,
    pub source: EphemerisSource,
}

impl HouseSystem {
    /// Quadrant houses. Cusps 1, 4, 7 and 10 are taken from the angles;
    /// `intermediate` holds cusps 11, 12, 2, 3 and their opposites are
    /// derived.
    pub fn quadrant(ascendant: f64, mc: f64, intermediate: [f64; 4], source: EphemerisSource) -> Self {
        let ascendant = normalize(ascendant);
        let mc = normalize(mc);
        let descendant = normalize(ascendant + 180.0);
        let ic = normalize(mc + 180.0);
        let [c11, c12, c2, c3] = intermediate.map(normalize);
        let cusps = [
            ascendant,
            c2,
            c3,
            ic,
            normalize(c11 + 180.0),
            normalize(c12 + 180.0),
            descendant,
            normalize(c2 + 180.0),
            normalize(c3 + 180.0),
            mc,
            c11,
            c12,
        ];
        Self {
            ascendant,
            mc,
            descendant,
            ic,
            cusps,
            method: HouseMethod::Placidus,
            source,
        }
    }

    /// Quadrant houses from a full set of cusps; the angles still win.
    pub fn from_cusps(ascendant: f64, mc: f64, cusps: [f64; 12], source: EphemerisSource) -> Self {
        Self::quadrant(ascendant, mc, [cusps[10], cusps[11], cusps[1], cusps[2]], source)
    }

    /// Equal houses of 30 degrees from the ascendant.
    pub fn equal(ascendant: f64, mc: f64, source: EphemerisSource) -> Self {
        let ascendant = normalize(ascendant);
        let mc = normalize(mc);
        let cusps = std::array::from_fn(|i| normalize(ascendant + 30.0 * i as f64));
        Self {
            ascendant,
            mc,
            descendant: normalize(ascendant + 180.0),
            ic: normalize(mc + 180.0),
            cusps,
            method: HouseMethod::Equal,
            source,
        }
    }

    /// Cusp `n`, one-based and periodic in 12.
    pub fn cusp(&self, n: usize) -> f64 {
        self.cusps[(n + 11) % 12]
    }

    /// Shift every angle by `-ayanamsa`. Derived angles and cusps are
    /// rebuilt from the shifted ones so oppositions stay exact.
    pub fn to_sidereal(&self, ayanamsa: f64) -> Self {
        let shift = |x: f64| normalize(x - ayanamsa);
        let (ascendant, mc) = (shift(self.ascendant), shift(self.mc));
        match self.method {
            HouseMethod::Placidus => Self::quadrant(
                ascendant,
                mc,
                [self.cusp(11), self.cusp(12), self.cusp(2), self.cusp(3)].map(shift),
                self.source,
            ),
            HouseMethod::Equal => Self::equal(ascendant, mc, self.source),
        }
    }
}

/// Inputs to one house calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseRequest {
    pub jd: f64,
    pub location: Option<GeoLocation>,
    pub ayanamsa: f64,
    /// Sidereal Sun, used only by the emergency tier
    pub sun_sidereal: Option<f64>,
    /// Local civil clock time in hours, used only by the emergency tier
    pub clock_hours: f64,
}

/// A tier's candidate before gating
#[derive(Debug, Clone, PartialEq)]
pub struct HouseCandidate {
    pub system: HouseSystem,
    pub notes: Vec<String>,
    /// Sidereal time was computed without the equation of the equinoxes
    pub gmst_fallback: bool,
}

/// Accepted house system and the trail that led to it
#[derive(Debug, Clone, PartialEq)]
pub struct HouseOutcome {
    pub system: HouseSystem,
    pub warnings: Vec<String>,
    pub rejected: Vec<(EphemerisSource, HouseError)>,
    pub gmst_fallback: bool,
}

pub struct HouseCuspCalculator {
    tiers: Vec<Box<dyn HouseSource>>,
}

impl HouseCuspCalculator {
    pub fn new(primary: Option<EphemerisHandle>, sidereal: SiderealTimeCalculator, apply_refraction: bool) -> Self {
        let mut tiers: Vec<Box<dyn HouseSource>> = Vec::with_capacity(4);
        if let Some(handle) = primary {
            tiers.push(Box::new(PrimaryHouses::new(handle)));
        }
        tiers.push(Box::new(PlacidusApproximation::new(sidereal, apply_refraction)));
        tiers.push(Box::new(EqualHouses::new(sidereal)));
        tiers.push(Box::new(EmergencyHouses));
        Self { tiers }
    }

    /// Use an explicit tier list.
    pub fn with_tiers(tiers: Vec<Box<dyn HouseSource>>) -> Self {
        Self { tiers }
    }

    /// First candidate that passes the quality gate, all in sidereal degrees.
    pub fn calculate(&self, request: &HouseRequest) -> Result<HouseOutcome, HouseError> {
        let mut rejected = Vec::new();
        for tier in &self.tiers {
            let gated = tier
                .houses(request)
                .and_then(|c| ChartValidator::check_houses(&c.system).map(|w| (c, w)));
            match gated {
                Ok((candidate, gate_warnings)) => {
                    let mut warnings = candidate.notes;
                    warnings.extend(gate_warnings);
                    log::debug!("Houses accepted from {:?} tier", tier.tier());
                    return Ok(HouseOutcome {
                        system: candidate.system,
                        warnings,
                        rejected,
                        gmst_fallback: candidate.gmst_fallback,
                    });
                }
                Err(e) => {
                    log::debug!("{:?} house tier rejected: {e}", tier.tier());
                    rejected.push((tier.tier(), e));
                }
            }
        }
        Err(rejected
            .pop()
            .map(|(_, e)| e)
            .unwrap_or(HouseError::Skipped { reason: "no house tiers configured".to_string() }))
    }
}

impl std::fmt::Debug for HouseCuspCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HouseCuspCalculator")
            .field("tiers", &self.tiers.iter().map(|t| t.tier()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_angles_are_exact() {
        let h = HouseSystem::quadrant(100.0, 10.0, [40.0, 70.0, 130.0, 160.0], EphemerisSource::Primary);
        assert_eq!(h.cusp(1), h.ascendant);
        assert_eq!(h.cusp(10), h.mc);
        assert_eq!(h.descendant, 280.0);
        assert_eq!(h.ic, 190.0);
        assert_eq!(h.cusp(5), 220.0);
        assert_eq!(h.cusp(13), h.cusp(1));
    }

    #[test]
    fn equal_houses_step_by_thirty() {
        let h = HouseSystem::equal(350.0, 260.0, EphemerisSource::AnalyticalFallback);
        assert_eq!(h.cusps[1], 20.0);
        assert_eq!(h.cusp(12), 320.0);
        assert_eq!(h.descendant, 170.0);
    }

    #[test]
    fn sidereal_shift_keeps_oppositions() {
        let h = HouseSystem::quadrant(10.0, 280.0, [300.0, 330.0, 40.0, 70.0], EphemerisSource::Primary)
            .to_sidereal(23.85);
        assert!((normalize(h.ascendant + 180.0) - h.descendant).abs() < 1e-9);
        assert!((normalize(h.mc + 180.0) - h.ic).abs() < 1e-9);
    }
}
