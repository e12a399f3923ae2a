use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ephemeris::Body;

/// Angular relationship between a transiting and a natal longitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectKind {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
    Neutral,
}

impl AspectKind {
    /// Exact angle for this aspect (0, 60, 90, 120, 180)
    pub fn exact_angle(self) -> Option<f64> {
        match self {
            AspectKind::Conjunction => Some(0.0),
            AspectKind::Opposition => Some(180.0),
            AspectKind::Trine => Some(120.0),
            AspectKind::Square => Some(90.0),
            AspectKind::Sextile => Some(60.0),
            AspectKind::Neutral => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::Opposition => "opposition",
            AspectKind::Trine => "trine",
            AspectKind::Square => "square",
            AspectKind::Sextile => "sextile",
            AspectKind::Neutral => "neutral",
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One transiting body in aspect to one natal body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitAspect {
    pub transiting: Body,
    pub natal: Body,
    pub kind: AspectKind,
    /// Shortest arc between the two longitudes, 0-180
    pub separation: f64,
    /// Deviation from the exact angle
    pub orb: f64,
    /// Within 0.1 degrees
    pub is_exact: bool,
    /// Moving toward exact
    pub is_applying: bool,
    /// A body conjunct its own natal position
    pub is_return: bool,
    /// Transiting body is retrograde
    pub is_retrograde: bool,
}
