//! Civil time to Julian Day conversion.
//!
//! Birth times arrive as a local wall-clock reading plus a zone identifier.
//! The zone may be an IANA name (`Asia/Kolkata`) or a fixed offset
//! (`UTC+05:30`, `GMT-3`, `+0545`).

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, TimeError};

/// Julian Day of the J2000.0 epoch (2000-01-01T12:00:00 TT).
pub const J2000: f64 = 2_451_545.0;
/// Days per Julian century.
pub const DAYS_PER_CENTURY: f64 = 36_525.0;
/// 1800-01-01T00:00:00 UT.
pub const SUPPORTED_JD_START: f64 = 2_378_496.5;
/// 2200-01-01T00:00:00 UT.
pub const SUPPORTED_JD_END: f64 = 2_524_593.5;

lazy_static::lazy_static! {
    static ref FIXED_OFFSET: Regex =
        Regex::new(r"^(?:UTC|GMT)?\s*([+-])(\d{1,2})(?::?(\d{2}))?$").expect("valid offset pattern");
}

/// Julian centuries since J2000.0.
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000) / DAYS_PER_CENTURY
}

/// Birth data for one chart request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInput {
    /// Local civil date-time as read on the clock at the birth place
    pub datetime: NaiveDateTime,
    /// Geographic latitude in degrees, north positive
    pub latitude: f64,
    /// Geographic longitude in degrees, east positive
    pub longitude: f64,
    /// IANA zone name or fixed UTC offset
    pub timezone: String,
}

impl BirthInput {
    pub fn new(
        datetime: NaiveDateTime,
        latitude: f64,
        longitude: f64,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            datetime,
            latitude,
            longitude,
            timezone: timezone.into(),
        }
    }

    /// Reject input that cannot produce a chart at all.
    pub fn validate(&self) -> Result<(), ChartError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ChartError::InvalidInput {
                message: format!("latitude {} outside [-90, 90]", self.latitude),
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ChartError::InvalidInput {
                message: format!("longitude {} outside [-180, 180]", self.longitude),
            });
        }
        resolve_zone(&self.timezone)?;
        Ok(())
    }
}

/// A resolved zone identifier
#[derive(Debug, Clone, Copy)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Resolve an IANA name or fixed-offset string.
pub fn resolve_zone(zone: &str) -> Result<Zone, TimeError> {
    let trimmed = zone.trim();
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Ok(Zone::Named(tz));
    }
    let unknown = || TimeError::UnknownZone {
        zone: zone.to_string(),
    };
    let caps = FIXED_OFFSET.captures(trimmed).ok_or_else(unknown)?;
    let hours: i32 = caps[2].parse().map_err(|_| unknown())?;
    let minutes: i32 = caps
        .get(3)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| unknown())?
        .unwrap_or(0);
    if hours > 14 || minutes >= 60 {
        return Err(unknown());
    }
    let mut seconds = hours * 3600 + minutes * 60;
    if &caps[1] == "-" {
        seconds = -seconds;
    }
    FixedOffset::east_opt(seconds)
        .map(Zone::Fixed)
        .ok_or_else(unknown)
}

/// Stateless civil-time converter
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeConverter;

impl TimeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Local wall-clock time in `zone` to UTC.
    pub fn to_utc(&self, local: NaiveDateTime, zone: &str) -> Result<DateTime<Utc>, TimeError> {
        let utc = match resolve_zone(zone)? {
            Zone::Named(tz) => match tz.from_local_datetime(&local).earliest() {
                Some(dt) => dt.with_timezone(&Utc),
                None => {
                    // DST gap: use the offset in force at that instant.
                    let offset = tz.offset_from_utc_datetime(&local).fix();
                    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
                }
            },
            Zone::Fixed(offset) => {
                Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
            }
        };
        Ok(utc)
    }

    /// Local civil time plus zone to Julian Day (UT).
    pub fn to_julian_day(&self, local: NaiveDateTime, zone: &str) -> Result<f64, TimeError> {
        let utc = self.to_utc(local, zone)?;
        let jd = julian_day_from_utc(utc);
        if !is_within_supported_window(jd) {
            log::warn!(
                "Julian Day {jd:.5} ({}) is outside the 1800-2200 ephemeris window",
                utc.format("%Y-%m-%d")
            );
        }
        Ok(jd)
    }

    /// Julian Day back to a UTC instant.
    pub fn from_julian_day(&self, jd: f64) -> Result<DateTime<Utc>, TimeError> {
        julian_day_to_utc(jd)
    }
}

/// Whether `jd` lies in the window the ephemeris tiers are tuned for.
pub fn is_within_supported_window(jd: f64) -> bool {
    (SUPPORTED_JD_START..SUPPORTED_JD_END).contains(&jd)
}

/// Gregorian calendar UTC instant to Julian Day.
pub fn julian_day_from_utc(dt: DateTime<Utc>) -> f64 {
    let mut year = dt.year() as f64;
    let mut month = dt.month() as f64;
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }
    let seconds = dt.num_seconds_from_midnight() as f64 + dt.nanosecond() as f64 * 1e-9;
    let day = dt.day() as f64 + seconds / 86_400.0;

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b - 1524.5
}

/// Julian Day to Gregorian calendar UTC instant, millisecond resolution.
pub fn julian_day_to_utc(jd: f64) -> Result<DateTime<Utc>, TimeError> {
    if !jd.is_finite() {
        return Err(TimeError::OutOfRange { jd });
    }
    let shifted = jd + 0.5;
    let z = shifted.floor();
    let f = shifted - z;
    // Proleptic Gregorian throughout, matching `julian_day_from_utc`.
    let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
    let a = z + 1.0 + alpha - (alpha / 4.0).floor();
    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day = (b - d - (30.6001 * e).floor()) as u32;
    let month = (if e < 14.0 { e - 1.0 } else { e - 13.0 }) as u32;
    let year = (if month > 2 { c - 4716.0 } else { c - 4715.0 }) as i32;

    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or(TimeError::OutOfRange { jd })?;
    let millis = (f * 86_400_000.0).round() as i64;
    Ok(Utc.from_utc_datetime(&(midnight + Duration::milliseconds(millis))))
}
