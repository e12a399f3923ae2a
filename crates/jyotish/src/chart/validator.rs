//! Quality gate and chart scoring.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::angle::{is_normalized, normalize, separation};
use crate::ayanamsa::Ayanamsa;
use crate::chart::natal::SiderealPosition;
use crate::ephemeris::{Body, EphemerisSource};
use crate::error::{EphemerisError, HouseError};
use crate::houses::{HouseMethod, HouseOutcome, HouseSystem};

/// Ascendants this close to 0 degrees are treated as degenerate.
pub const DEGENERATE_ASCENDANT: f64 = 0.001;
pub const MIN_VALID_CUSPS: usize = 10;
/// Expected ascendant to midheaven separation for most latitudes.
pub const ANGLE_SEPARATION: RangeInclusive<f64> = 60.0..=120.0;
/// Positions within this many degrees of 0 count toward a zero cluster.
pub const ZERO_TOLERANCE: f64 = 0.0001;
/// More than this many zero positions triggers the retry.
pub const ZERO_CLUSTER_LIMIT: usize = 2;

pub const FALLBACK_WARNING: &str = "chart computed using mathematical fallback, not precise ephemeris";

/// A quantity that could not be produced by any tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFailure {
    pub quantity: String,
    pub reason: String,
}

/// Summary attached to every delivered chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0-100, informational only
    pub score: u8,
    pub warnings: Vec<String>,
    pub critical_failures: Vec<CriticalFailure>,
    /// Number of quantities produced by each tier
    pub source_mix: BTreeMap<EphemerisSource, usize>,
    pub missing: Vec<String>,
    /// Zero-cluster retries performed (0 or 1)
    pub retries: u32,
}

/// Everything the validator looks at once a chart is assembled
#[derive(Debug)]
pub struct Assessment<'a> {
    pub positions: &'a BTreeMap<Body, SiderealPosition>,
    pub body_failures: &'a [(Body, Vec<EphemerisError>)],
    pub ayanamsa: Ayanamsa,
    pub houses: Result<&'a HouseOutcome, &'a HouseError>,
    pub retries: u32,
    pub zero_cluster: usize,
}

pub struct ChartValidator;

impl ChartValidator {
    /// Gate applied to every house tier candidate. Returns non-fatal
    /// warnings on acceptance.
    pub fn check_houses(houses: &HouseSystem) -> Result<Vec<String>, HouseError> {
        if houses.source != EphemerisSource::Emergency
            && separation(houses.ascendant, 0.0) < DEGENERATE_ASCENDANT
        {
            return Err(HouseError::DegenerateAscendant { ascendant: houses.ascendant });
        }
        if !houses.ascendant.is_finite() || !houses.mc.is_finite() {
            return Err(HouseError::DegenerateAscendant { ascendant: houses.ascendant });
        }
        let valid = houses.cusps.iter().filter(|c| is_normalized(**c)).count();
        if valid < MIN_VALID_CUSPS {
            return Err(HouseError::TooFewValidCusps { valid });
        }

        let mut warnings = Vec::new();
        let span = separation(houses.ascendant, houses.mc);
        if !ANGLE_SEPARATION.contains(&span) {
            warnings.push(format!("ascendant-midheaven separation {span:.2} outside 60-120"));
        }
        let out_of_order = (0..12)
            .filter(|&i| {
                let step = normalize(houses.cusps[(i + 1) % 12] - houses.cusps[i]);
                !(step > 0.0 && step < 180.0)
            })
            .count();
        if out_of_order > 0 {
            warnings.push(format!("{out_of_order} cusp(s) out of zodiacal order"));
        }
        Ok(warnings)
    }

    /// Bodies sitting on 0 degrees.
    pub fn zero_cluster(positions: &BTreeMap<Body, SiderealPosition>) -> usize {
        positions
            .values()
            .filter(|p| separation(p.longitude, 0.0) <= ZERO_TOLERANCE)
            .count()
    }

    pub fn needs_retry(positions: &BTreeMap<Body, SiderealPosition>) -> bool {
        Self::zero_cluster(positions) > ZERO_CLUSTER_LIMIT
    }

    /// Sun, Moon and Ascendant that are absent.
    pub fn missing_core(positions: &BTreeMap<Body, SiderealPosition>, has_ascendant: bool) -> Vec<String> {
        let mut missing: Vec<String> = [Body::Sun, Body::Moon]
            .into_iter()
            .filter(|b| !positions.contains_key(b))
            .map(|b| b.name().to_string())
            .collect();
        if !has_ascendant {
            missing.push("ascendant".to_string());
        }
        missing
    }

    pub fn assess(a: &Assessment<'_>) -> QualityReport {
        let mut warnings = Vec::new();
        let mut critical_failures = Vec::new();
        let mut missing = Vec::new();
        let mut source_mix: BTreeMap<EphemerisSource, usize> = BTreeMap::new();
        let mut penalty: u32 = 0;

        for position in a.positions.values() {
            *source_mix.entry(position.source).or_default() += 1;
            // Nodes are analytical by construction.
            if position.source != EphemerisSource::Primary && !position.body.is_node() {
                penalty += 3;
            }
        }
        if a.positions
            .values()
            .any(|p| p.source == EphemerisSource::AnalyticalFallback && !p.body.is_node())
        {
            warnings.push(FALLBACK_WARNING.to_string());
        }

        for (body, errors) in a.body_failures {
            let reason = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            critical_failures.push(CriticalFailure { quantity: body.name().to_string(), reason });
            missing.push(body.name().to_string());
            penalty += 10;
        }

        *source_mix.entry(a.ayanamsa.source).or_default() += 1;
        match a.ayanamsa.source {
            EphemerisSource::Primary => {}
            EphemerisSource::AnalyticalFallback => penalty += 2,
            EphemerisSource::Emergency => {
                penalty += 10;
                warnings.push(format!("ayanamsa from linear fallback ({:.4})", a.ayanamsa.degrees));
            }
        }

        match a.houses {
            Ok(outcome) => {
                *source_mix.entry(outcome.system.source).or_default() += 1;
                penalty += match outcome.system.source {
                    EphemerisSource::Primary => 0,
                    EphemerisSource::AnalyticalFallback => 5,
                    EphemerisSource::Emergency => 20,
                };
                if outcome.system.method == HouseMethod::Equal {
                    penalty += 5;
                }
                if outcome.gmst_fallback {
                    penalty += 5;
                    warnings.push("sidereal time fell back to GMST without equinox correction".to_string());
                }
                for (tier, error) in &outcome.rejected {
                    warnings.push(format!("{tier:?} houses rejected: {error}"));
                }
                warnings.extend(outcome.warnings.iter().cloned());
            }
            Err(error) => {
                critical_failures.push(CriticalFailure {
                    quantity: "ascendant".to_string(),
                    reason: error.to_string(),
                });
                missing.push("ascendant".to_string());
                penalty += 25;
            }
        }

        if a.retries > 0 {
            warnings.push(format!("zero-degree cluster triggered {} retry", a.retries));
        }
        if a.zero_cluster > ZERO_CLUSTER_LIMIT {
            penalty += 10;
            warnings.push(format!("{} bodies remain at 0 degrees after retry", a.zero_cluster));
        }

        penalty += warnings.len() as u32;
        QualityReport {
            score: 100u32.saturating_sub(penalty) as u8,
            warnings,
            critical_failures,
            source_mix,
            missing,
            retries: a.retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn houses(ascendant: f64, mc: f64, source: EphemerisSource) -> HouseSystem {
        HouseSystem::equal(ascendant, mc, source)
    }

    #[test]
    fn degenerate_ascendant_rejected_unless_emergency() {
        let h = houses(0.0005, 270.0, EphemerisSource::AnalyticalFallback);
        assert!(matches!(ChartValidator::check_houses(&h), Err(HouseError::DegenerateAscendant { .. })));
        let h = houses(0.0005, 270.0, EphemerisSource::Emergency);
        assert!(ChartValidator::check_houses(&h).is_ok());
    }

    #[test]
    fn too_few_cusps_rejected() {
        let mut h = houses(100.0, 10.0, EphemerisSource::Primary);
        h.cusps[2] = f64::NAN;
        h.cusps[5] = f64::INFINITY;
        h.cusps[8] = f64::NAN;
        assert_eq!(
            ChartValidator::check_houses(&h),
            Err(HouseError::TooFewValidCusps { valid: 9 })
        );
    }

    #[test]
    fn wide_angle_separation_is_only_a_warning() {
        let h = houses(100.0, 330.0, EphemerisSource::Primary);
        let warnings = ChartValidator::check_houses(&h).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn out_of_order_cusps_are_flagged() {
        let mut h = houses(100.0, 10.0, EphemerisSource::Primary);
        h.cusps.swap(1, 2);
        let warnings = ChartValidator::check_houses(&h).unwrap();
        assert!(warnings.iter().any(|w| w.contains("out of zodiacal order")));
    }

    #[test]
    fn missing_core_lists_absent_quantities() {
        let positions = BTreeMap::new();
        assert_eq!(
            ChartValidator::missing_core(&positions, true),
            vec!["sun".to_string(), "moon".to_string()]
        );
    }
}
