//! Process-wide primary ephemeris handle.
//!
//! The primary source is opened once: candidate directories are probed in
//! order, the first that exists is opened and checked against a J2000.0
//! reference. The outcome, success or failure, is memoized for the life of
//! the process and injected into [`EphemerisProvider`](super::EphemerisProvider).

use std::env;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::angle::separation;
use crate::ephemeris::adapter::{PrimaryEphemeris, SwissEphemerisAdapter};
use crate::ephemeris::types::Body;
use crate::error::InitError;
use crate::time::J2000;

/// Apparent tropical Sun at J2000.0, degrees.
const REFERENCE_SUN_J2000: f64 = 280.37;
const REFERENCE_TOLERANCE: f64 = 1.0;

lazy_static::lazy_static! {
    /// Default data directories, after `SWISS_EPHEMERIS_PATH` when it is set.
    pub static ref DEFAULT_EPHEMERIS_PATHS: Vec<PathBuf> = {
        let mut paths = Vec::new();
        if let Ok(p) = env::var("SWISS_EPHEMERIS_PATH") {
            paths.push(PathBuf::from(p));
        }
        paths.extend(
            ["/usr/local/share/swisseph", "/usr/share/swisseph", "./ephe", "../../ephe"]
                .iter()
                .map(PathBuf::from),
        );
        paths
    };
}

static SHARED: OnceLock<Result<EphemerisHandle, InitError>> = OnceLock::new();

/// Shared, read-only primary ephemeris
#[derive(Clone)]
pub struct EphemerisHandle(Arc<dyn PrimaryEphemeris>);

impl EphemerisHandle {
    /// Wrap any primary implementation, skipping path probing.
    pub fn from_primary(primary: Arc<dyn PrimaryEphemeris>) -> Self {
        Self(primary)
    }

    /// Open the first existing candidate directory and validate it.
    pub fn probe(candidates: &[PathBuf]) -> Result<Self, InitError> {
        let path = candidates
            .iter()
            .find(|p| p.is_dir())
            .ok_or_else(|| InitError::NoDataPath {
                candidates: candidates.iter().map(|p| p.display().to_string()).collect(),
            })?;
        let adapter = SwissEphemerisAdapter::new(path)?;
        let handle = Self(Arc::new(adapter));
        handle.validate_reference().map_err(|message| InitError::ValidationFailed {
            path: path.display().to_string(),
            message,
        })?;
        log::info!("Primary ephemeris ready: {}", handle.describe());
        Ok(handle)
    }

    /// Probe once per process; later calls return the memoized outcome.
    pub fn shared(candidates: &[PathBuf]) -> Result<Self, InitError> {
        SHARED
            .get_or_init(|| {
                let outcome = Self::probe(candidates);
                if let Err(e) = &outcome {
                    log::warn!("Primary ephemeris unavailable, using analytical series: {e}");
                }
                outcome
            })
            .clone()
    }

    fn validate_reference(&self) -> Result<(), String> {
        let sun = self
            .tropical_longitude(J2000, Body::Sun)
            .map_err(|e| e.to_string())?;
        let off = separation(sun.longitude, REFERENCE_SUN_J2000);
        if !sun.longitude.is_finite() || off > REFERENCE_TOLERANCE {
            return Err(format!(
                "Sun at J2000.0 = {:.4}, expected {REFERENCE_SUN_J2000} +/- {REFERENCE_TOLERANCE}",
                sun.longitude
            ));
        }
        let ayanamsa = self.ayanamsa(J2000).map_err(|e| e.to_string())?;
        if !(15.0..=30.0).contains(&ayanamsa) {
            return Err(format!("ayanamsa at J2000.0 = {ayanamsa:.4}"));
        }
        Ok(())
    }
}

impl Deref for EphemerisHandle {
    type Target = dyn PrimaryEphemeris;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for EphemerisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EphemerisHandle").field(&self.0.describe()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_without_any_directory_fails() {
        let err = EphemerisHandle::probe(&[PathBuf::from("/no/such/ephe/dir")]).unwrap_err();
        assert!(matches!(err, InitError::NoDataPath { .. }));
    }

    #[test]
    fn default_paths_are_not_empty() {
        assert!(DEFAULT_EPHEMERIS_PATHS.len() >= 4);
    }
}
