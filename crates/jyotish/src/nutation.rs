//! Truncated IAU 1980 nutation series and ecliptic obliquity.
//!
//! Fundamental arguments and the leading 13 periodic terms follow Meeus,
//! "Astronomical Algorithms" (2nd ed), Chapter 22. Amplitudes are tabulated
//! in units of 0.0001 arcsecond.

use serde::{Deserialize, Serialize};

use crate::angle::normalize;
use crate::error::ModelError;
use crate::time::centuries_since_j2000;

/// 0.0001 arcsecond expressed in degrees.
const TENTH_MAS_TO_DEG: f64 = 1.0 / 36_000_000.0;

/// Magnitude above which a nutation component is logged as anomalous.
pub const NUTATION_ANOMALY_DEG: f64 = 0.1;

/// Delaunay arguments in degrees: elongation D, Sun anomaly M, Moon anomaly M',
/// Moon argument of latitude F, ascending node Ω.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalArguments {
    pub elongation: f64,
    pub sun_anomaly: f64,
    pub moon_anomaly: f64,
    pub moon_latitude: f64,
    pub node: f64,
}

impl FundamentalArguments {
    pub fn at(t: f64) -> Self {
        let t2 = t * t;
        let t3 = t2 * t;
        Self {
            elongation: normalize(
                297.85036 + 445_267.111_480 * t - 0.001_914_2 * t2 + t3 / 189_474.0,
            ),
            sun_anomaly: normalize(
                357.52772 + 35_999.050_340 * t - 0.000_160_3 * t2 - t3 / 300_000.0,
            ),
            moon_anomaly: normalize(
                134.96298 + 477_198.867_398 * t + 0.008_697_2 * t2 + t3 / 56_250.0,
            ),
            moon_latitude: normalize(
                93.27191 + 483_202.017_538 * t - 0.003_682_5 * t2 + t3 / 327_270.0,
            ),
            node: normalize(125.04452 - 1_934.136_261 * t + 0.002_070_8 * t2 + t3 / 450_000.0),
        }
    }

    fn combine(&self, m: &[i8; 5]) -> f64 {
        (m[0] as f64 * self.elongation
            + m[1] as f64 * self.sun_anomaly
            + m[2] as f64 * self.moon_anomaly
            + m[3] as f64 * self.moon_latitude
            + m[4] as f64 * self.node)
            .to_radians()
    }
}

/// One periodic term: argument multipliers (D, M, M', F, Ω),
/// Δψ sine amplitude and rate, Δε cosine amplitude and rate.
struct NutationTerm {
    multipliers: [i8; 5],
    psi: (f64, f64),
    eps: (f64, f64),
}

#[rustfmt::skip]
const NUTATION_TERMS: [NutationTerm; 13] = [
    NutationTerm { multipliers: [ 0,  0,  0, 0, 1], psi: (-171_996.0, -174.2), eps: (92_025.0,  8.9) },
    NutationTerm { multipliers: [-2,  0,  0, 2, 2], psi: ( -13_187.0,   -1.6), eps: ( 5_736.0, -3.1) },
    NutationTerm { multipliers: [ 0,  0,  0, 2, 2], psi: (  -2_274.0,   -0.2), eps: (   977.0, -0.5) },
    NutationTerm { multipliers: [ 0,  0,  0, 0, 2], psi: (   2_062.0,    0.2), eps: (  -895.0,  0.5) },
    NutationTerm { multipliers: [ 0,  1,  0, 0, 0], psi: (   1_426.0,   -3.4), eps: (    54.0, -0.1) },
    NutationTerm { multipliers: [ 0,  0,  1, 0, 0], psi: (     712.0,    0.1), eps: (    -7.0,  0.0) },
    NutationTerm { multipliers: [-2,  1,  0, 2, 2], psi: (    -517.0,    1.2), eps: (   224.0, -0.6) },
    NutationTerm { multipliers: [ 0,  0,  0, 2, 1], psi: (    -386.0,   -0.4), eps: (   200.0,  0.0) },
    NutationTerm { multipliers: [ 0,  0,  1, 2, 2], psi: (    -301.0,    0.0), eps: (   129.0, -0.1) },
    NutationTerm { multipliers: [-2, -1,  0, 2, 2], psi: (     217.0,   -0.5), eps: (   -95.0,  0.3) },
    NutationTerm { multipliers: [-2,  0,  1, 0, 0], psi: (    -158.0,    0.0), eps: (     0.0,  0.0) },
    NutationTerm { multipliers: [-2,  0,  0, 2, 1], psi: (     129.0,    0.1), eps: (   -70.0,  0.0) },
    NutationTerm { multipliers: [ 0,  0, -1, 2, 2], psi: (     123.0,    0.0), eps: (   -53.0,  0.0) },
];

/// Nutation in longitude and obliquity, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutation {
    pub delta_psi: f64,
    pub delta_epsilon: f64,
}

/// Stateless nutation/obliquity model
#[derive(Debug, Clone, Copy, Default)]
pub struct NutationModel;

impl NutationModel {
    pub fn new() -> Self {
        Self
    }

    /// Nutation in longitude (Δψ) and obliquity (Δε) at `jd`.
    pub fn nutation(&self, jd: f64) -> Result<Nutation, ModelError> {
        if !jd.is_finite() {
            return Err(ModelError::NonFiniteInput { model: "nutation", jd });
        }
        let t = centuries_since_j2000(jd);
        let args = FundamentalArguments::at(t);

        let (mut psi, mut eps) = (0.0, 0.0);
        for term in &NUTATION_TERMS {
            let arg = args.combine(&term.multipliers);
            psi += (term.psi.0 + term.psi.1 * t) * arg.sin();
            eps += (term.eps.0 + term.eps.1 * t) * arg.cos();
        }
        let nutation = Nutation {
            delta_psi: psi * TENTH_MAS_TO_DEG,
            delta_epsilon: eps * TENTH_MAS_TO_DEG,
        };

        if !nutation.delta_psi.is_finite() || !nutation.delta_epsilon.is_finite() {
            return Err(ModelError::NonFiniteOutput { model: "nutation", jd });
        }
        if nutation.delta_psi.abs() >= NUTATION_ANOMALY_DEG
            || nutation.delta_epsilon.abs() >= NUTATION_ANOMALY_DEG
        {
            log::warn!(
                "Anomalous nutation at JD {jd}: dpsi={:.6} deg, deps={:.6} deg",
                nutation.delta_psi,
                nutation.delta_epsilon
            );
        }
        Ok(nutation)
    }

    /// Mean obliquity of the ecliptic (Meeus 22.2), degrees.
    pub fn mean_obliquity(&self, jd: f64) -> Result<f64, ModelError> {
        if !jd.is_finite() {
            return Err(ModelError::NonFiniteInput { model: "obliquity", jd });
        }
        let t = centuries_since_j2000(jd);
        let arcsec = 46.8150 * t + 0.000_59 * t * t - 0.001_813 * t * t * t;
        Ok(23.439_291_111 - arcsec / 3600.0)
    }

    /// Mean obliquity plus Δε.
    pub fn true_obliquity(&self, jd: f64) -> Result<f64, ModelError> {
        Ok(self.mean_obliquity(jd)? + self.nutation(jd)?.delta_epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeus_example_22a() {
        // 1987-04-10 0h TD: dpsi = -3.788", deps = +9.443", eps0 = 23°26'27.407"
        let model = NutationModel::new();
        let jd = 2_446_895.5;
        let n = model.nutation(jd).unwrap();
        assert!((n.delta_psi * 3600.0 + 3.788).abs() < 0.5, "dpsi {}", n.delta_psi * 3600.0);
        assert!((n.delta_epsilon * 3600.0 - 9.443).abs() < 0.5, "deps {}", n.delta_epsilon * 3600.0);
        let eps0 = model.mean_obliquity(jd).unwrap();
        assert!((eps0 - 23.440_946).abs() < 1e-5, "eps0 {eps0}");
    }

    #[test]
    fn modern_era_bounds() {
        let model = NutationModel::new();
        let mut jd = 2_415_020.5;
        while jd < 2_488_070.5 {
            let n = model.nutation(jd).unwrap();
            assert!(n.delta_psi.abs() < 0.1 && n.delta_epsilon.abs() < 0.1);
            jd += 97.3;
        }
    }

    #[test]
    fn true_obliquity_near_mean() {
        let model = NutationModel::new();
        let mean = model.mean_obliquity(2_451_545.0).unwrap();
        let truth = model.true_obliquity(2_451_545.0).unwrap();
        assert!((mean - 23.439_291).abs() < 1e-5);
        assert!((truth - mean).abs() < 0.003);
    }

    #[test]
    fn non_finite_input_errors() {
        assert!(NutationModel::new().nutation(f64::NAN).is_err());
        assert!(NutationModel::new().mean_obliquity(f64::INFINITY).is_err());
    }
}
