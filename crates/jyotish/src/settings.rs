use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ephemeris::{EphemerisHandle, DEFAULT_EPHEMERIS_PATHS};
use crate::error::InitError;

/// Engine configuration. Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Candidate primary ephemeris directories, probed in order
    pub ephemeris_paths: Vec<PathBuf>,
    /// When false the engine never touches the primary ephemeris
    pub use_primary: bool,
    /// Julian Day nudge for the zero-cluster retry
    pub retry_epsilon_days: f64,
    /// Horizon refraction on the approximated ascendant
    pub apply_refraction: bool,
    /// How long a current-sky snapshot stays valid
    pub transit_cache_ttl_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ephemeris_paths: DEFAULT_EPHEMERIS_PATHS.clone(),
            use_primary: true,
            retry_epsilon_days: 1e-6,
            apply_refraction: true,
            transit_cache_ttl_secs: 300,
        }
    }
}

impl EngineSettings {
    /// Settings that skip the primary ephemeris entirely.
    pub fn analytical_only() -> Self {
        Self {
            use_primary: false,
            ..Self::default()
        }
    }

    /// The process-wide primary ephemeris, or why there is none.
    pub fn open_primary(&self) -> Result<EphemerisHandle, InitError> {
        if !self.use_primary {
            return Err(InitError::Disabled);
        }
        EphemerisHandle::shared(&self.candidate_paths())
    }

    /// `SWISS_EPHEMERIS_PATH` (when set) followed by the configured paths,
    /// without duplicates.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::with_capacity(self.ephemeris_paths.len() + 1);
        let from_env = env::var("SWISS_EPHEMERIS_PATH").ok().map(PathBuf::from);
        for path in from_env.into_iter().chain(self.ephemeris_paths.iter().cloned()) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }
}
