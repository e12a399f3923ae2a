//! Natal chart assembly.
//!
//! One body pass computes the ayanamsa and every body at a Julian Day.
//! If the pass lands more than two bodies on 0 degrees it is repeated once
//! at a nudged Julian Day and the second pass is kept. Houses and the
//! quality report are built from the kept pass.

use std::collections::BTreeMap;

use chrono::{Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::angle::{normalize, to_sidereal};
use crate::ayanamsa::{Ayanamsa, AyanamsaCalculator};
use crate::chart::validator::{Assessment, ChartValidator, QualityReport};
use crate::ephemeris::{
    Body, EphemerisHandle, EphemerisProvider, EphemerisSource, GeoLocation, TropicalPosition,
};
use crate::error::{ChartError, EphemerisError};
use crate::houses::{HouseCuspCalculator, HouseRequest, HouseSystem};
use crate::settings::EngineSettings;
use crate::sidereal::SiderealTimeCalculator;
use crate::time::{julian_day_from_utc, BirthInput, TimeConverter};

/// Sidereal longitude of one body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiderealPosition {
    pub body: Body,
    /// Degrees in [0, 360)
    pub longitude: f64,
    /// Degrees per day
    pub speed: f64,
    pub retrograde: bool,
    pub source: EphemerisSource,
}

impl SiderealPosition {
    pub fn from_tropical(body: Body, tropical: &TropicalPosition, ayanamsa: f64) -> Self {
        Self {
            body,
            longitude: to_sidereal(tropical.longitude, ayanamsa),
            speed: tropical.speed,
            retrograde: tropical.speed < 0.0,
            source: tropical.source,
        }
    }

    /// Ketu: the point opposite Rahu, sharing its speed and source.
    pub fn ketu_from_rahu(rahu: &SiderealPosition) -> Self {
        Self {
            body: Body::Ketu,
            longitude: normalize(rahu.longitude + 180.0),
            ..*rahu
        }
    }
}

/// Finished natal chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub input: BirthInput,
    /// Julian Day (UT) the positions were computed for
    pub julian_day: f64,
    pub ayanamsa: Ayanamsa,
    pub positions: BTreeMap<Body, SiderealPosition>,
    /// Absent only when every house tier failed
    pub houses: Option<HouseSystem>,
    pub quality: QualityReport,
}

impl NatalChart {
    pub fn position(&self, body: Body) -> Option<&SiderealPosition> {
        self.positions.get(&body)
    }

    pub fn ascendant(&self) -> Option<f64> {
        self.houses.as_ref().map(|h| h.ascendant)
    }
}

/// Positions only, for a moment with no place attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkySnapshot {
    pub julian_day: f64,
    pub ayanamsa: Ayanamsa,
    pub positions: BTreeMap<Body, SiderealPosition>,
}

struct BodyPass {
    jd: f64,
    ayanamsa: Ayanamsa,
    positions: BTreeMap<Body, SiderealPosition>,
    failures: Vec<(Body, Vec<EphemerisError>)>,
}

/// Chart engine wiring every component together
#[derive(Debug)]
pub struct ChartEngine {
    settings: EngineSettings,
    time: TimeConverter,
    provider: EphemerisProvider,
    ayanamsa: AyanamsaCalculator,
    houses: HouseCuspCalculator,
}

impl ChartEngine {
    /// Opens the shared primary ephemeris when enabled; a failed probe
    /// leaves the engine in analytical mode.
    pub fn new(settings: EngineSettings) -> Self {
        let primary = match settings.open_primary() {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::info!("Chart engine running without primary ephemeris: {e}");
                None
            }
        };
        Self::with_primary(settings, primary)
    }

    /// Use an explicit primary source (or none).
    pub fn with_primary(settings: EngineSettings, primary: Option<EphemerisHandle>) -> Self {
        let houses = HouseCuspCalculator::new(
            primary.clone(),
            SiderealTimeCalculator::default(),
            settings.apply_refraction,
        );
        Self::with_parts(
            settings,
            EphemerisProvider::new(primary.clone()),
            AyanamsaCalculator::new(primary),
            houses,
        )
    }

    /// Assemble from explicitly configured components.
    pub fn with_parts(
        settings: EngineSettings,
        provider: EphemerisProvider,
        ayanamsa: AyanamsaCalculator,
        houses: HouseCuspCalculator,
    ) -> Self {
        Self {
            settings,
            time: TimeConverter::new(),
            provider,
            ayanamsa,
            houses,
        }
    }

    pub fn analytical_only() -> Self {
        Self::with_primary(EngineSettings::analytical_only(), None)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn has_primary(&self) -> bool {
        self.provider.has_primary()
    }

    fn body_pass(&self, jd: f64) -> BodyPass {
        let ayanamsa = self.ayanamsa.ayanamsa(jd);
        let mut positions = BTreeMap::new();
        let mut failures = Vec::new();

        for body in Body::COMPUTED {
            match self.provider.position(jd, body) {
                Ok(tropical) => {
                    positions.insert(body, SiderealPosition::from_tropical(body, &tropical, ayanamsa.degrees));
                }
                Err(errors) => {
                    log::warn!("{body} omitted at JD {jd}: no tier produced a position");
                    failures.push((body, errors));
                }
            }
        }

        match positions.get(&Body::Rahu).map(SiderealPosition::ketu_from_rahu) {
            Some(ketu) => {
                positions.insert(Body::Ketu, ketu);
            }
            None => failures.push((Body::Ketu, vec![EphemerisError::DerivedBody { body: Body::Ketu }])),
        }

        BodyPass { jd, ayanamsa, positions, failures }
    }

    /// Build a natal chart; fails only on invalid input or when two or
    /// more of Sun, Moon and Ascendant are missing.
    pub fn compute(&self, input: &BirthInput) -> Result<NatalChart, ChartError> {
        input.validate()?;
        let jd = self.time.to_julian_day(input.datetime, &input.timezone)?;

        let mut pass = self.body_pass(jd);
        let mut retries = 0;
        if ChartValidator::needs_retry(&pass.positions) {
            log::warn!(
                "{} bodies at 0 degrees at JD {jd}, retrying once",
                ChartValidator::zero_cluster(&pass.positions)
            );
            retries = 1;
            pass = self.body_pass(jd + self.settings.retry_epsilon_days);
        }
        let zero_cluster = ChartValidator::zero_cluster(&pass.positions);

        let request = HouseRequest {
            jd: pass.jd,
            location: Some(GeoLocation { lat: input.latitude, lon: input.longitude }),
            ayanamsa: pass.ayanamsa.degrees,
            sun_sidereal: pass.positions.get(&Body::Sun).map(|p| p.longitude),
            clock_hours: clock_hours(input),
        };
        let houses = self.houses.calculate(&request);

        let missing = ChartValidator::missing_core(&pass.positions, houses.is_ok());
        if missing.len() >= 2 {
            return Err(ChartError::Unusable { missing });
        }

        let quality = ChartValidator::assess(&Assessment {
            positions: &pass.positions,
            body_failures: &pass.failures,
            ayanamsa: pass.ayanamsa,
            houses: houses.as_ref(),
            retries,
            zero_cluster,
        });
        if !quality.critical_failures.is_empty() {
            log::warn!("Chart delivered with critical failures: {:?}", quality.missing);
        }

        Ok(NatalChart {
            input: input.clone(),
            julian_day: pass.jd,
            ayanamsa: pass.ayanamsa,
            positions: pass.positions,
            houses: houses.ok().map(|o| o.system),
            quality,
        })
    }

    /// Sidereal positions at `jd`, no houses.
    pub fn sky_at(&self, jd: f64) -> SkySnapshot {
        let pass = self.body_pass(jd);
        SkySnapshot {
            julian_day: pass.jd,
            ayanamsa: pass.ayanamsa,
            positions: pass.positions,
        }
    }

    pub fn sky_now(&self) -> SkySnapshot {
        self.sky_at(julian_day_from_utc(Utc::now()))
    }
}

fn clock_hours(input: &BirthInput) -> f64 {
    let t = input.datetime.time();
    t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn delhi_j2000() -> BirthInput {
        let dt = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        BirthInput::new(dt, 28.6139, 77.2090, "UTC")
    }

    #[test]
    fn analytical_chart_is_complete() {
        let chart = ChartEngine::analytical_only().compute(&delhi_j2000()).unwrap();
        assert_eq!(chart.positions.len(), 12);
        assert_eq!(chart.quality.retries, 0);
        assert!(chart.quality.score > 0);
        let houses = chart.houses.as_ref().unwrap();
        assert_eq!(houses.cusp(1), houses.ascendant);
        assert_eq!(houses.cusp(10), houses.mc);
    }

    #[test]
    fn ketu_mirrors_rahu() {
        let chart = ChartEngine::analytical_only().compute(&delhi_j2000()).unwrap();
        let rahu = chart.position(Body::Rahu).unwrap();
        let ketu = chart.position(Body::Ketu).unwrap();
        assert_eq!(ketu.longitude, normalize(rahu.longitude + 180.0));
        assert_eq!(ketu.source, rahu.source);
    }

    #[test]
    fn invalid_latitude_is_rejected() {
        let mut input = delhi_j2000();
        input.latitude = 91.0;
        assert!(matches!(
            ChartEngine::analytical_only().compute(&input),
            Err(ChartError::InvalidInput { .. })
        ));
    }

    #[test]
    fn clock_hours_include_minutes() {
        let mut input = delhi_j2000();
        input.datetime = input.datetime.with_minute(30).unwrap();
        assert!((clock_hours(&input) - 12.5).abs() < 1e-12);
    }
}
