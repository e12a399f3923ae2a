use thiserror::Error;

use crate::ephemeris::types::Body;

/// Errors raised while turning civil time into a Julian Day
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Unknown time zone identifier: {zone}")]
    UnknownZone { zone: String },
    #[error("Julian Day {jd} cannot be represented as a calendar date")]
    OutOfRange { jd: f64 },
}

/// Errors from the nutation/obliquity model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Non-finite Julian Day passed to {model}: {jd}")]
    NonFiniteInput { model: &'static str, jd: f64 },
    #[error("{model} produced a non-finite result at JD {jd}")]
    NonFiniteOutput { model: &'static str, jd: f64 },
}

/// Errors that can occur during ephemeris calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Primary ephemeris is not available")]
    PrimaryUnavailable,
    #[error("Failed to calculate position for {body} at JD {jd}: {message}")]
    CalculationFailed { body: Body, jd: f64, message: String },
    #[error("Rejected longitude {value} for {body} at JD {jd}")]
    RejectedValue { body: Body, jd: f64, value: f64 },
    #[error("{body} is derived from another body and has no ephemeris of its own")]
    DerivedBody { body: Body },
    #[error("Ayanamsa {value} outside the accepted range")]
    AyanamsaOutOfRange { value: f64 },
    #[error("House calculation failed: {message}")]
    HouseCalculationFailed { message: String },
}

/// Errors raised while opening the primary ephemeris at startup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    #[error("Primary ephemeris disabled by configuration")]
    Disabled,
    #[error("No ephemeris data directory found among {candidates:?}")]
    NoDataPath { candidates: Vec<String> },
    #[error("Ephemeris at {path} failed reference validation: {message}")]
    ValidationFailed { path: String, message: String },
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}

/// Reasons a house tier result was not accepted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HouseError {
    #[error("Tier skipped: {reason}")]
    Skipped { reason: String },
    #[error("Degenerate ascendant {ascendant}")]
    DegenerateAscendant { ascendant: f64 },
    #[error("Only {valid} of 12 cusps are valid")]
    TooFewValidCusps { valid: usize },
    #[error("Source failed: {0}")]
    Source(#[from] EphemerisError),
}

/// Fatal, user-facing chart errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Invalid birth input: {message}")]
    InvalidInput { message: String },
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error("Chart unusable, missing core quantities: {missing:?}")]
    Unusable { missing: Vec<String> },
}
