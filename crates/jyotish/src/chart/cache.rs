//! Chart memoization.
//!
//! Natal charts depend only on immutable birth data and are cached without
//! expiry. Current-sky snapshots depend on the wall clock and are held for
//! a short time-to-live only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::chart::natal::{NatalChart, SkySnapshot};
use crate::error::ChartError;
use crate::time::BirthInput;

/// Hex SHA-256 of identity, birth instant, coordinates and zone.
pub fn chart_key(identity: &str, input: &BirthInput) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b"|");
    hasher.update(input.datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(input.latitude.to_bits().to_le_bytes());
    hasher.update(input.longitude.to_bits().to_le_bytes());
    hasher.update(b"|");
    hasher.update(input.timezone.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Natal charts keyed by [`chart_key`], at most one per key
#[derive(Debug, Default)]
pub struct ChartCache {
    charts: RwLock<HashMap<String, Arc<NatalChart>>>,
}

impl ChartCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<NatalChart>> {
        let charts = self.charts.read().unwrap_or_else(|p| p.into_inner());
        charts.get(key).cloned()
    }

    /// Cached chart for this key, or compute and store it. When two callers
    /// race on the same key the first stored chart wins and both get it.
    pub fn get_or_compute<F>(&self, identity: &str, input: &BirthInput, compute: F) -> Result<Arc<NatalChart>, ChartError>
    where
        F: FnOnce(&BirthInput) -> Result<NatalChart, ChartError>,
    {
        let key = chart_key(identity, input);
        if let Some(chart) = self.get(&key) {
            log::debug!("Chart cache hit {key}");
            return Ok(chart);
        }
        let chart = Arc::new(compute(input)?);
        let mut charts = self.charts.write().unwrap_or_else(|p| p.into_inner());
        Ok(charts.entry(key).or_insert(chart).clone())
    }

    pub fn len(&self) -> usize {
        self.charts.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Most recent current-sky snapshot, valid for a fixed TTL
#[derive(Debug)]
pub struct TransitCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, Arc<SkySnapshot>)>>,
}

impl TransitCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: Mutex::new(None) }
    }

    /// The cached snapshot if still fresh, otherwise a newly computed one.
    pub fn get_or_refresh<F>(&self, refresh: F) -> Arc<SkySnapshot>
    where
        F: FnOnce() -> SkySnapshot,
    {
        self.get_or_refresh_at(Instant::now(), refresh)
    }

    fn get_or_refresh_at<F>(&self, now: Instant, refresh: F) -> Arc<SkySnapshot>
    where
        F: FnOnce() -> SkySnapshot,
    {
        let mut entry = self.entry.lock().unwrap_or_else(|p| p.into_inner());
        if let Some((taken, snapshot)) = entry.as_ref() {
            if now.duration_since(*taken) < self.ttl {
                return snapshot.clone();
            }
        }
        let snapshot = Arc::new(refresh());
        *entry = Some((now, snapshot.clone()));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ayanamsa::Ayanamsa;
    use crate::ephemeris::EphemerisSource;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn input(tz: &str) -> BirthInput {
        let dt = NaiveDate::from_ymd_opt(1990, 5, 17)
            .unwrap()
            .and_hms_opt(4, 45, 0)
            .unwrap();
        BirthInput::new(dt, 19.076, 72.8777, tz)
    }

    fn snapshot(jd: f64) -> SkySnapshot {
        SkySnapshot {
            julian_day: jd,
            ayanamsa: Ayanamsa { degrees: 23.85, source: EphemerisSource::AnalyticalFallback },
            positions: BTreeMap::new(),
        }
    }

    #[test]
    fn key_is_stable_and_sensitive() {
        let a = chart_key("alice", &input("Asia/Kolkata"));
        assert_eq!(a, chart_key("alice", &input("Asia/Kolkata")));
        assert_eq!(a.len(), 64);
        assert_ne!(a, chart_key("bob", &input("Asia/Kolkata")));
        assert_ne!(a, chart_key("alice", &input("UTC+05:30")));
    }

    #[test]
    fn transit_snapshot_expires() {
        let cache = TransitCache::new(Duration::from_secs(60));
        let start = Instant::now();
        let first = cache.get_or_refresh_at(start, || snapshot(1.0));
        let again = cache.get_or_refresh_at(start + Duration::from_secs(30), || snapshot(2.0));
        assert_eq!(again.julian_day, first.julian_day);
        let later = cache.get_or_refresh_at(start + Duration::from_secs(61), || snapshot(3.0));
        assert_eq!(later.julian_day, 3.0);
    }
}
