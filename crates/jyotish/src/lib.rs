//! Sidereal natal chart engine.
//!
//! Civil birth time is converted to a Julian Day, planetary longitudes come
//! from a precise ephemeris when one is installed and from closed-form
//! series otherwise, and houses fall back from Placidus through equal
//! houses to a clock-based emergency ascendant. Every quantity records the
//! tier that produced it, and each chart carries a [`QualityReport`].

pub mod angle;
pub mod aspects;
pub mod ayanamsa;
pub mod chart;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod nutation;
pub mod settings;
pub mod sidereal;
pub mod time;

pub use aspects::{AspectKind, TransitAnalyzer, TransitAspect};
pub use ayanamsa::{Ayanamsa, AyanamsaCalculator};
pub use chart::{ChartCache, ChartEngine, NatalChart, QualityReport, SiderealPosition, SkySnapshot, TransitCache};
pub use ephemeris::{Body, EphemerisHandle, EphemerisProvider, EphemerisSource, GeoLocation};
pub use error::{ChartError, EphemerisError, HouseError, InitError, ModelError, TimeError};
pub use houses::{HouseCuspCalculator, HouseMethod, HouseSystem};
pub use settings::EngineSettings;
pub use time::{BirthInput, TimeConverter};
