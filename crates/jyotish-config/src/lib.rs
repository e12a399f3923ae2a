use anyhow::Context;
use jyotish::EngineSettings;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Relative locations tried for `configs/jyotish.toml`, from the workspace
/// root and from a crate directory.
pub const CONFIG_PATHS: [&str; 2] = ["configs/jyotish.toml", "../../configs/jyotish.toml"];

const MAX_RETRY_EPSILON_DAYS: f64 = 1e-3;

#[derive(Debug, Clone, Default, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    engine: Option<EngineSettings>,
}

/// Settings from the first readable `configs/jyotish.toml`, or the
/// defaults when none exists.
pub fn load_engine_settings() -> anyhow::Result<EngineSettings> {
    for p in &CONFIG_PATHS {
        let path = Path::new(p);
        if path.exists() {
            return load_engine_settings_from(path);
        }
    }
    log::info!("No jyotish.toml found in {:?}; using default engine settings", CONFIG_PATHS);
    Ok(EngineSettings::default())
}

/// Settings from an explicit file. A missing `[engine]` table yields the
/// defaults; a present one is validated.
pub fn load_engine_settings_from(path: &Path) -> anyhow::Result<EngineSettings> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let settings = parse_engine_settings(&text).with_context(|| format!("Invalid config in {}", path.display()))?;
    log::debug!("Loaded engine settings from {}", path.display());
    Ok(settings)
}

pub fn parse_engine_settings(text: &str) -> anyhow::Result<EngineSettings> {
    let root: RootConfigToml = toml::from_str(text).context("Failed to parse TOML")?;
    let settings = root.engine.unwrap_or_default();
    validate_engine_settings(&settings)?;
    Ok(settings)
}

pub fn validate_engine_settings(settings: &EngineSettings) -> anyhow::Result<()> {
    let eps = settings.retry_epsilon_days;
    if !(eps.is_finite() && eps > 0.0 && eps <= MAX_RETRY_EPSILON_DAYS) {
        anyhow::bail!(
            "engine.retry_epsilon_days must be in (0, {MAX_RETRY_EPSILON_DAYS}], got {eps}"
        );
    }
    if settings.transit_cache_ttl_secs == 0 {
        anyhow::bail!("engine.transit_cache_ttl_secs must be positive");
    }
    if settings.use_primary && settings.ephemeris_paths.is_empty() {
        log::warn!("engine.use_primary is set but no ephemeris_paths are configured; only SWISS_EPHEMERIS_PATH will be probed");
    }
    Ok(())
}
