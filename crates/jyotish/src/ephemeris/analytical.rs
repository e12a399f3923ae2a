//! Closed-form fallback ephemeris.
//!
//! Every body starts from a mean-longitude polynomial in Julian centuries T
//! and adds a few periodic terms:
//! - Sun: equation of center in its own anomaly (Meeus ch. 25).
//! - Moon: the leading terms of the lunar theory, mixing its anomaly with
//!   the Sun's anomaly, elongation and argument of latitude (Meeus ch. 47).
//! - Planets: Keplerian mean elements (Standish, J2000 ecliptic) with a
//!   four-term equation of center, projected geocentrically against the
//!   Earth-Moon barycenter and precessed to the equinox of date.
//! - Rahu: the mean ascending node polynomial, no periodic terms.
//!
//! Accuracy is a fraction of a degree for the Sun, Moon and inner planets
//! and around a degree for the outer planets between 1800 and 2200.

use crate::angle::{normalize, signed_difference};
use crate::ephemeris::types::{Body, EphemerisSource, TropicalPosition};
use crate::error::EphemerisError;
use crate::time::centuries_since_j2000;

/// Half-width of the central difference used for speeds, days.
const SPEED_STEP_DAYS: f64 = 0.05;

/// Evaluate `c[0] + c[1]·T + c[2]·T² + ...`.
fn polynomial(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Mean longitude of the Sun, geometric, equinox of date.
const SUN_MEAN_LONGITUDE: [f64; 3] = [280.466_46, 36_000.769_83, 0.000_303_2];
const SUN_MEAN_ANOMALY: [f64; 3] = [357.529_11, 35_999.050_29, -0.000_153_7];

const MOON_MEAN_LONGITUDE: [f64; 3] = [218.316_447_7, 481_267.881_234_21, -0.001_578_6];
const MOON_ELONGATION: [f64; 3] = [297.850_192_1, 445_267.111_403_4, -0.001_881_9];
const MOON_SUN_ANOMALY: [f64; 3] = [357.529_109_2, 35_999.050_290_9, -0.000_153_6];
const MOON_ANOMALY: [f64; 3] = [134.963_396_4, 477_198.867_505_5, 0.008_741_4];
const MOON_LATITUDE_ARGUMENT: [f64; 3] = [93.272_095_0, 483_202.017_523_3, -0.003_653_9];

/// Mean longitude of the ascending lunar node (Meeus 47.7).
const MEAN_NODE: [f64; 5] = [
    125.044_547_9,
    -1_934.136_289_1,
    0.002_075_4,
    1.0 / 467_441.0,
    -1.0 / 60_616_000.0,
];

/// Lunar longitude terms: (D, M, M', F) multipliers and amplitude in degrees.
#[rustfmt::skip]
const MOON_TERMS: [([i8; 4], f64); 8] = [
    ([0,  0, 1, 0],  6.288_774),
    ([2,  0,-1, 0],  1.274_027),
    ([2,  0, 0, 0],  0.658_314),
    ([0,  0, 2, 0],  0.213_618),
    ([0,  1, 0, 0], -0.185_116),
    ([0,  0, 0, 2], -0.114_332),
    ([2,  0,-2, 0],  0.058_793),
    ([2, -1,-1, 0],  0.057_066),
];

/// Keplerian mean elements and their rates per century:
/// semi-major axis (AU), eccentricity, inclination, mean longitude,
/// longitude of perihelion, longitude of ascending node (degrees).
#[derive(Debug, Clone, Copy)]
struct Elements {
    a: [f64; 2],
    e: [f64; 2],
    i: [f64; 2],
    l: [f64; 2],
    perihelion: [f64; 2],
    node: [f64; 2],
}

#[rustfmt::skip]
const EARTH_MOON: Elements = Elements {
    a: [1.000_002_61, 0.000_005_62], e: [0.016_711_23, -0.000_043_92],
    i: [-0.000_015_31, -0.012_946_68], l: [100.464_571_66, 35_999.372_449_81],
    perihelion: [102.937_681_93, 0.323_273_64], node: [0.0, 0.0],
};

#[rustfmt::skip]
const PLANET_ELEMENTS: [(Body, Elements); 8] = [
    (Body::Mercury, Elements {
        a: [0.387_099_27, 0.000_000_37], e: [0.205_635_93, 0.000_019_06],
        i: [7.004_979_02, -0.005_947_49], l: [252.250_323_50, 149_472.674_111_75],
        perihelion: [77.457_796_28, 0.160_476_89], node: [48.330_765_93, -0.125_340_81],
    }),
    (Body::Venus, Elements {
        a: [0.723_335_66, 0.000_003_90], e: [0.006_776_72, -0.000_041_07],
        i: [3.394_676_05, -0.000_788_90], l: [181.979_099_50, 58_517.815_387_29],
        perihelion: [131.602_467_18, 0.002_683_29], node: [76.679_842_55, -0.277_694_18],
    }),
    (Body::Mars, Elements {
        a: [1.523_710_34, 0.000_018_47], e: [0.093_394_10, 0.000_078_82],
        i: [1.849_691_42, -0.008_131_31], l: [-4.553_432_05, 19_140.302_684_99],
        perihelion: [-23.943_629_59, 0.444_410_88], node: [49.559_538_91, -0.292_573_43],
    }),
    (Body::Jupiter, Elements {
        a: [5.202_887_00, -0.000_116_07], e: [0.048_386_24, -0.000_132_53],
        i: [1.304_396_95, -0.001_837_14], l: [34.396_440_51, 3_034.746_127_75],
        perihelion: [14.728_479_83, 0.212_526_68], node: [100.473_909_09, 0.204_691_06],
    }),
    (Body::Saturn, Elements {
        a: [9.536_675_94, -0.001_250_60], e: [0.053_861_79, -0.000_509_91],
        i: [2.485_991_87, 0.001_936_09], l: [49.954_244_23, 1_222.493_622_01],
        perihelion: [92.598_878_31, -0.418_972_16], node: [113.662_424_48, -0.288_677_94],
    }),
    (Body::Uranus, Elements {
        a: [19.189_164_64, -0.001_961_76], e: [0.047_257_44, -0.000_043_97],
        i: [0.772_637_83, -0.002_429_39], l: [313.238_104_51, 428.482_027_85],
        perihelion: [170.954_276_30, 0.408_052_81], node: [74.016_925_03, 0.042_405_89],
    }),
    (Body::Neptune, Elements {
        a: [30.069_922_76, 0.000_262_91], e: [0.008_590_48, 0.000_051_05],
        i: [1.770_043_47, 0.000_353_72], l: [-55.120_029_69, 218.459_453_25],
        perihelion: [44.964_762_27, -0.322_414_64], node: [131.784_225_74, -0.005_086_64],
    }),
    (Body::Pluto, Elements {
        a: [39.482_116_75, -0.000_315_96], e: [0.248_827_30, 0.000_051_70],
        i: [17.140_012_06, 0.000_048_18], l: [238.929_038_33, 145.207_805_15],
        perihelion: [224.068_916_29, -0.040_629_42], node: [110.303_936_84, -0.011_834_82],
    }),
];

fn elements_for(body: Body) -> Option<&'static Elements> {
    PLANET_ELEMENTS
        .iter()
        .find(|(b, _)| *b == body)
        .map(|(_, el)| el)
}

/// Equation of center to fourth order in eccentricity, degrees.
fn equation_of_center(e: f64, mean_anomaly: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    let (e2, e3, e4) = (e * e, e * e * e, e * e * e * e);
    let c = (2.0 * e - e3 / 4.0) * m.sin()
        + (1.25 * e2 - 11.0 / 24.0 * e4) * (2.0 * m).sin()
        + (13.0 / 12.0 * e3) * (3.0 * m).sin()
        + (103.0 / 96.0 * e4) * (4.0 * m).sin();
    c.to_degrees()
}

/// Heliocentric ecliptic rectangular coordinates (AU), J2000 frame.
fn heliocentric(el: &Elements, t: f64) -> [f64; 3] {
    let a = el.a[0] + el.a[1] * t;
    let e = el.e[0] + el.e[1] * t;
    let inclination = (el.i[0] + el.i[1] * t).to_radians();
    let mean_longitude = el.l[0] + el.l[1] * t;
    let perihelion = el.perihelion[0] + el.perihelion[1] * t;
    let node = el.node[0] + el.node[1] * t;

    let mean_anomaly = normalize(mean_longitude - perihelion);
    let true_anomaly = mean_anomaly + equation_of_center(e, mean_anomaly);
    let r = a * (1.0 - e * e) / (1.0 + e * true_anomaly.to_radians().cos());

    let u = (true_anomaly + perihelion - node).to_radians();
    let node = node.to_radians();
    [
        r * (node.cos() * u.cos() - node.sin() * u.sin() * inclination.cos()),
        r * (node.sin() * u.cos() + node.cos() * u.sin() * inclination.cos()),
        r * u.sin() * inclination.sin(),
    ]
}

/// General precession in longitude since J2000.0, degrees.
fn precession(t: f64) -> f64 {
    (5_028.796_195 * t + 1.105_434_8 * t * t) / 3600.0
}

/// Nutation in longitude plus annual aberration, low precision.
fn apparent_correction(t: f64) -> f64 {
    let node = polynomial(&MEAN_NODE[..2], t).to_radians();
    -0.005_69 - 0.004_78 * node.sin()
}

/// Stateless analytical ephemeris
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticalEphemeris;

impl AnalyticalEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// The mean-longitude polynomial a body's series is built on.
    /// Heliocentric for planets, geocentric for the Sun, Moon and Rahu.
    pub fn mean_longitude(&self, body: Body, t: f64) -> Option<f64> {
        let value = match body {
            Body::Sun => polynomial(&SUN_MEAN_LONGITUDE, t),
            Body::Moon => polynomial(&MOON_MEAN_LONGITUDE, t),
            Body::Rahu => polynomial(&MEAN_NODE, t),
            Body::Ketu => return None,
            planet => {
                let el = elements_for(planet)?;
                el.l[0] + el.l[1] * t
            }
        };
        Some(normalize(value))
    }

    fn sun(&self, t: f64) -> f64 {
        let m = polynomial(&SUN_MEAN_ANOMALY, t).to_radians();
        let center = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
            + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
            + 0.000_289 * (3.0 * m).sin();
        polynomial(&SUN_MEAN_LONGITUDE, t) + center + apparent_correction(t)
    }

    fn moon(&self, t: f64) -> f64 {
        let args = [
            polynomial(&MOON_ELONGATION, t),
            polynomial(&MOON_SUN_ANOMALY, t),
            polynomial(&MOON_ANOMALY, t),
            polynomial(&MOON_LATITUDE_ARGUMENT, t),
        ];
        // Terms in the Sun's anomaly shrink with Earth's eccentricity.
        let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;
        let perturbation: f64 = MOON_TERMS
            .iter()
            .map(|(m, amplitude)| {
                let arg: f64 = m.iter().zip(args.iter()).map(|(k, a)| *k as f64 * a).sum();
                let scale = e.powi(m[1].unsigned_abs() as i32);
                amplitude * scale * arg.to_radians().sin()
            })
            .sum();
        polynomial(&MOON_MEAN_LONGITUDE, t) + perturbation + apparent_correction(t)
    }

    fn planet(&self, el: &Elements, t: f64) -> f64 {
        let p = heliocentric(el, t);
        let earth = heliocentric(&EARTH_MOON, t);
        let longitude = (p[1] - earth[1]).atan2(p[0] - earth[0]).to_degrees();
        longitude + precession(t) + apparent_correction(t)
    }

    fn longitude_at(&self, jd: f64, body: Body) -> Result<f64, EphemerisError> {
        let t = centuries_since_j2000(jd);
        let raw = match body {
            Body::Sun => self.sun(t),
            Body::Moon => self.moon(t),
            Body::Rahu => polynomial(&MEAN_NODE, t),
            Body::Ketu => return Err(EphemerisError::DerivedBody { body }),
            planet => {
                let el = elements_for(planet).ok_or_else(|| EphemerisError::CalculationFailed {
                    body,
                    jd,
                    message: "no analytical series".to_string(),
                })?;
                self.planet(el, t)
            }
        };
        if !raw.is_finite() {
            return Err(EphemerisError::RejectedValue { body, jd, value: raw });
        }
        Ok(normalize(raw))
    }

    /// Tropical longitude and central-difference speed.
    pub fn tropical_longitude(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        let longitude = self.longitude_at(jd, body)?;
        let before = self.longitude_at(jd - SPEED_STEP_DAYS, body)?;
        let after = self.longitude_at(jd + SPEED_STEP_DAYS, body)?;
        Ok(TropicalPosition {
            longitude,
            speed: signed_difference(after, before) / (2.0 * SPEED_STEP_DAYS),
            source: EphemerisSource::AnalyticalFallback,
        })
    }
}
