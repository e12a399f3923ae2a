use std::path::{Path, PathBuf};
use std::sync::Mutex;

use swisseph::swe::{calc_ut, houses_ex, set_ephe_path};
use swisseph::{AscMc, Cusp};

use crate::angle::normalize;
use crate::ephemeris::types::{Body, EphemerisSource, GeoLocation, RawHouses, TropicalPosition};
use crate::error::EphemerisError;

// Swiss Ephemeris flag bits
const FLG_SWIEPH: i32 = 2;
const FLG_SIDEREAL: i32 = 64;
const FLG_SPEED: i32 = 256;

const PLACIDUS: u8 = b'P';

/// Lahiri minus Fagan/Bradley at J2000.0. Both share the same precession
/// model, so the difference is constant; it rebases the library's default
/// sidereal mode onto Lahiri.
const LAHIRI_FROM_FAGAN_BRADLEY: f64 = 23.853 - 24.736;

/// A precise ephemeris able to serve the primary tier
pub trait PrimaryEphemeris: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Geocentric tropical longitude with speed
    fn tropical_longitude(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError>;

    /// Lahiri ayanamsa in degrees
    fn ayanamsa(&self, jd: f64) -> Result<f64, EphemerisError>;

    /// Placidus cusps and angles, tropical
    fn houses(&self, jd: f64, location: GeoLocation) -> Result<RawHouses, EphemerisError>;
}

/// Swiss Ephemeris planet codes
fn swiss_code(body: Body) -> Option<i32> {
    match body {
        Body::Sun => Some(0),
        Body::Moon => Some(1),
        Body::Mercury => Some(2),
        Body::Venus => Some(3),
        Body::Mars => Some(4),
        Body::Jupiter => Some(5),
        Body::Saturn => Some(6),
        Body::Uranus => Some(7),
        Body::Neptune => Some(8),
        Body::Pluto => Some(9),
        Body::Rahu | Body::Ketu => None,
    }
}

// The C library keeps global state (data path, file handles); every call
// into it goes through this lock.
static SWISS_LOCK: Mutex<()> = Mutex::new(());

/// Swiss Ephemeris adapter implementation
pub struct SwissEphemerisAdapter {
    ephemeris_path: PathBuf,
}

/// The directory as the `&str` the binding hands to C. Interior NUL bytes
/// and non-UTF-8 paths cannot cross that boundary.
fn ephe_path_arg(path: &Path) -> Result<&str, EphemerisError> {
    let rejected = |message: &str| EphemerisError::FileNotFound {
        path: path.display().to_string(),
        message: message.to_string(),
    };
    let text = path.to_str().ok_or_else(|| rejected("Ephemeris path is not valid UTF-8"))?;
    if text.contains('\0') {
        return Err(rejected("Ephemeris path contains a NUL byte"));
    }
    Ok(text)
}

impl SwissEphemerisAdapter {
    /// Open the adapter on a data directory
    pub fn new(ephemeris_path: &Path) -> Result<Self, EphemerisError> {
        let arg = ephe_path_arg(ephemeris_path)?;
        if !ephemeris_path.exists() {
            return Err(EphemerisError::FileNotFound {
                path: ephemeris_path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed.".to_string(),
            });
        }
        {
            let _guard = SWISS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
            set_ephe_path(arg);
        }
        log::debug!("Swiss Ephemeris data path set to {arg}");
        Ok(Self {
            ephemeris_path: ephemeris_path.to_path_buf(),
        })
    }

    pub fn ephemeris_path(&self) -> &Path {
        &self.ephemeris_path
    }

    fn raw_longitude(&self, jd: f64, body: Body, flags: i32) -> Result<(f64, f64), EphemerisError> {
        let code = swiss_code(body).ok_or(EphemerisError::DerivedBody { body })?;
        let _guard = SWISS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let result = calc_ut(jd, code as u32, flags as u32).map_err(|e| {
            EphemerisError::CalculationFailed {
                body,
                jd,
                message: format!("Swiss Ephemeris error: {}", e),
            }
        })?;
        let out = result.out;
        Ok((out[0], out[3]))
    }
}

impl PrimaryEphemeris for SwissEphemerisAdapter {
    fn describe(&self) -> String {
        format!("Swiss Ephemeris ({})", self.ephemeris_path.display())
    }

    fn tropical_longitude(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        let (longitude, speed) = self.raw_longitude(jd, body, FLG_SWIEPH | FLG_SPEED)?;
        Ok(TropicalPosition {
            longitude,
            speed,
            source: EphemerisSource::Primary,
        })
    }

    fn ayanamsa(&self, jd: f64) -> Result<f64, EphemerisError> {
        let (tropical, _) = self.raw_longitude(jd, Body::Sun, FLG_SWIEPH)?;
        let (sidereal, _) = self.raw_longitude(jd, Body::Sun, FLG_SWIEPH | FLG_SIDEREAL)?;
        Ok(normalize(tropical - sidereal) + LAHIRI_FROM_FAGAN_BRADLEY)
    }

    fn houses(&self, jd: f64, location: GeoLocation) -> Result<RawHouses, EphemerisError> {
        let _guard = SWISS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let (c, a) = houses_ex(jd, FLG_SWIEPH, location.lat, location.lon, PLACIDUS as i32);
        let armc = a[2];
        let vertex = a[3];
        let cusps = Cusp::from_array(c);
        let ascmc = AscMc::from_array(a);

        let values = [
            cusps.first, cusps.second, cusps.third, cusps.fourth,
            cusps.fifth, cusps.sixth, cusps.seventh, cusps.eighth,
            cusps.ninth, cusps.tenth, cusps.eleventh, cusps.twelfth,
        ];
        if values.iter().all(|v| *v == 0.0) {
            return Err(EphemerisError::HouseCalculationFailed {
                message: format!("Swiss house routine returned no cusps at JD {jd}"),
            });
        }
        Ok(RawHouses {
            cusps: values,
            ascendant: ascmc.ascendant,
            mc: ascmc.mc,
            armc,
            vertex,
        })
    }
}
