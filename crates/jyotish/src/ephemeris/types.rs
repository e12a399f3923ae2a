use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Tracked chart bodies, in chart order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Rahu,
    Ketu,
}

impl Body {
    pub const ALL: [Body; 12] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::Rahu,
        Body::Ketu,
    ];

    /// Bodies that are looked up in an ephemeris (Ketu is derived from Rahu).
    pub const COMPUTED: [Body; 11] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::Rahu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
            Body::Rahu => "rahu",
            Body::Ketu => "ketu",
        }
    }

    /// Lunar nodes are computed analytically only.
    pub fn is_node(self) -> bool {
        matches!(self, Body::Rahu | Body::Ketu)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which tier produced a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemerisSource {
    Primary,
    AnalyticalFallback,
    Emergency,
}

/// Tropical ecliptic longitude from one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TropicalPosition {
    /// Longitude in degrees (0-360)
    pub longitude: f64,
    /// Speed in longitude (degrees per day)
    pub speed: f64,
    pub source: EphemerisSource,
}

/// Tropical house output of the primary house routine
#[derive(Debug, Clone, PartialEq)]
pub struct RawHouses {
    /// Cusps 1..12, tropical degrees
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub mc: f64,
    pub armc: f64,
    pub vertex: f64,
}
