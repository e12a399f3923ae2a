//! Spherical-trigonometry house formulas.
//!
//! All inputs and outputs are tropical degrees. `ramc` is the right
//! ascension of the meridian, i.e. local sidereal time in degrees.

use crate::angle::normalize;

/// Apparent lift of the horizon by refraction, degrees (34').
const HORIZON_REFRACTION: f64 = 34.0 / 60.0;
/// Largest refraction shift applied to the ascendant.
pub const MAX_REFRACTION_SHIFT: f64 = 2.0;
/// Fixed number of semi-arc refinement passes for intermediate cusps.
const SEMI_ARC_PASSES: usize = 2;

/// Ecliptic longitude rising on the eastern horizon.
pub fn ascendant(ramc: f64, latitude: f64, obliquity: f64) -> f64 {
    let (r, phi, eps) = (ramc.to_radians(), latitude.to_radians(), obliquity.to_radians());
    let y = r.cos();
    let x = -(r.sin() * eps.cos()) - phi.tan() * eps.sin();
    normalize(y.atan2(x).to_degrees())
}

/// Ecliptic longitude culminating on the meridian.
pub fn midheaven(ramc: f64, obliquity: f64) -> f64 {
    let (r, eps) = (ramc.to_radians(), obliquity.to_radians());
    normalize(r.sin().atan2(r.cos() * eps.cos()).to_degrees())
}

/// Shift of the ascendant caused by horizon refraction, capped at
/// [`MAX_REFRACTION_SHIFT`]. Grows as the ecliptic meets the horizon at a
/// shallower angle, which happens at higher latitudes.
pub fn refraction_shift(ramc: f64, latitude: f64, obliquity: f64) -> f64 {
    let (r, phi, eps) = (ramc.to_radians(), latitude.to_radians(), obliquity.to_radians());
    let cos_angle = eps.cos() * phi.sin() - eps.sin() * phi.cos() * r.sin();
    let sin_angle = (1.0 - cos_angle * cos_angle).max(0.0).sqrt();
    if sin_angle < 1e-6 {
        return MAX_REFRACTION_SHIFT;
    }
    (HORIZON_REFRACTION / sin_angle).min(MAX_REFRACTION_SHIFT)
}

fn longitude_from_right_ascension(ra: f64, obliquity: f64) -> f64 {
    let (a, eps) = (ra.to_radians(), obliquity.to_radians());
    normalize(a.sin().atan2(a.cos() * eps.cos()).to_degrees())
}

fn declination(longitude: f64, obliquity: f64) -> f64 {
    (obliquity.to_radians().sin() * longitude.to_radians().sin()).asin()
}

/// Ascensional difference, degrees; clamped where the body is circumpolar.
fn ascensional_difference(latitude: f64, declination: f64) -> f64 {
    let x = latitude.to_radians().tan() * declination.tan();
    x.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Cusp dividing a semi-arc. `fraction` of the diurnal semi-arc east of
/// the meridian when `above` is true, otherwise of the nocturnal semi-arc
/// west of the lower meridian.
fn semi_arc_cusp(ramc: f64, latitude: f64, obliquity: f64, fraction: f64, above: bool) -> f64 {
    let offset = |ad: f64| {
        if above {
            fraction * (90.0 + ad)
        } else {
            180.0 - fraction * (90.0 - ad)
        }
    };
    let mut ra = ramc + offset(0.0);
    for _ in 0..SEMI_ARC_PASSES {
        let lon = longitude_from_right_ascension(ra, obliquity);
        let ad = ascensional_difference(latitude, declination(lon, obliquity));
        ra = ramc + offset(ad);
    }
    longitude_from_right_ascension(ra, obliquity)
}

/// Cusps 11, 12, 2, 3 in that order.
pub fn intermediate_cusps(ramc: f64, latitude: f64, obliquity: f64) -> [f64; 4] {
    [
        semi_arc_cusp(ramc, latitude, obliquity, 1.0 / 3.0, true),
        semi_arc_cusp(ramc, latitude, obliquity, 2.0 / 3.0, true),
        semi_arc_cusp(ramc, latitude, obliquity, 2.0 / 3.0, false),
        semi_arc_cusp(ramc, latitude, obliquity, 1.0 / 3.0, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::separation;

    const EPS: f64 = 23.4393;

    #[test]
    fn equator_at_zero_ramc() {
        // RAMC 0 at the equator: MC 0 Aries, ascendant 90 (Cancer).
        assert!(separation(midheaven(0.0, EPS), 0.0) < 1e-9);
        assert!(separation(ascendant(0.0, 0.0, EPS), 90.0) < 1e-9);
    }

    #[test]
    fn meridian_is_quadrant_symmetric() {
        for ramc in [0.0, 90.0, 180.0, 270.0] {
            assert!(separation(midheaven(ramc, EPS), ramc) < 1e-9);
        }
    }

    #[test]
    fn ascendant_leads_midheaven_by_a_quadrant_on_average() {
        let lat = 40.0;
        for step in 0..24 {
            let ramc = step as f64 * 15.0;
            let asc = ascendant(ramc, lat, EPS);
            let mc = midheaven(ramc, EPS);
            let span = normalize(asc - mc);
            assert!(span > 40.0 && span < 140.0, "ramc {ramc}: span {span}");
        }
    }

    #[test]
    fn intermediate_cusps_fall_between_angles() {
        let (ramc, lat) = (123.0, 28.6);
        let asc = ascendant(ramc, lat, EPS);
        let mc = midheaven(ramc, EPS);
        let [c11, c12, c2, c3] = intermediate_cusps(ramc, lat, EPS);
        let ic = normalize(mc + 180.0);
        assert!(normalize(c11 - mc) < normalize(c12 - mc));
        assert!(normalize(c12 - mc) < normalize(asc - mc));
        assert!(normalize(c2 - asc) < normalize(c3 - asc));
        assert!(normalize(c3 - asc) < normalize(ic - asc));
    }

    #[test]
    fn equator_cusps_are_nearly_equal_in_right_ascension() {
        // At the equator every semi-arc is 90 degrees.
        let [c11, ..] = intermediate_cusps(0.0, 0.0, EPS);
        let expected = longitude_from_right_ascension(30.0, EPS);
        assert!(separation(c11, expected) < 1e-9);
    }

    #[test]
    fn refraction_is_capped() {
        assert!(refraction_shift(0.0, 0.0, EPS) < 1.0);
        assert!(refraction_shift(90.0, 66.0, EPS) <= MAX_REFRACTION_SHIFT);
    }
}
