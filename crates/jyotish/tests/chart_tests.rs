use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use jyotish::angle::{normalize, separation};
use jyotish::chart::validator::FALLBACK_WARNING;
use jyotish::ephemeris::{
    AnalyticalEphemeris, Body, EphemerisHandle, EphemerisProvider, EphemerisSource, GeoLocation, PositionSource,
    PrimaryEphemeris, RawHouses, TropicalPosition,
};
use jyotish::sidereal::SiderealTimeCalculator;
use jyotish::time::J2000;
use jyotish::{
    AyanamsaCalculator, BirthInput, ChartCache, ChartEngine, ChartError, EngineSettings, EphemerisError,
    HouseCuspCalculator, TimeError,
};

fn noon_2000() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn delhi() -> BirthInput {
    BirthInput::new(noon_2000(), 28.6139, 77.2090, "UTC")
}

/// Primary that puts every body on the ayanamsa (sidereal 0) at J2000.0,
/// and spreads them out at any other instant.
struct ZeroClusterPrimary {
    everywhere: bool,
}

impl PrimaryEphemeris for ZeroClusterPrimary {
    fn describe(&self) -> String {
        "zero cluster".to_string()
    }

    fn tropical_longitude(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        let index = Body::ALL.iter().position(|b| *b == body).unwrap_or(0) as f64;
        let longitude = if self.everywhere || jd == J2000 { 24.0 } else { 24.0 + 25.0 * index + 1.0 };
        Ok(TropicalPosition { longitude, speed: 0.5, source: EphemerisSource::Primary })
    }

    fn ayanamsa(&self, _jd: f64) -> Result<f64, EphemerisError> {
        Ok(24.0)
    }

    fn houses(&self, _jd: f64, _location: GeoLocation) -> Result<RawHouses, EphemerisError> {
        Err(EphemerisError::HouseCalculationFailed { message: "not provided".to_string() })
    }
}

fn zero_cluster_engine(everywhere: bool) -> ChartEngine {
    let handle = EphemerisHandle::from_primary(Arc::new(ZeroClusterPrimary { everywhere }));
    ChartEngine::with_primary(EngineSettings::default(), Some(handle))
}

/// Analytical series that cannot produce the listed bodies.
struct GappySeries {
    missing: Vec<Body>,
}

impl PositionSource for GappySeries {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::AnalyticalFallback
    }

    fn tropical(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        if self.missing.contains(&body) {
            return Err(EphemerisError::CalculationFailed { body, jd, message: "series unavailable".to_string() });
        }
        AnalyticalEphemeris::new().tropical_longitude(jd, body)
    }
}

fn gappy_engine(missing: &[Body]) -> ChartEngine {
    let series: Arc<dyn PositionSource> = Arc::new(GappySeries { missing: missing.to_vec() });
    let provider = EphemerisProvider::with_strategies(vec![series]);
    ChartEngine::with_parts(
        EngineSettings::analytical_only(),
        provider,
        AyanamsaCalculator::new(None),
        HouseCuspCalculator::new(None, SiderealTimeCalculator::default(), true),
    )
}

#[test]
fn test_delhi_j2000_scenario_analytical() {
    let chart = ChartEngine::analytical_only().compute(&delhi()).unwrap();
    assert!((chart.julian_day - J2000).abs() < 1e-9);
    assert!((chart.ayanamsa.degrees - 23.85).abs() < 0.15);
    let sun = chart.position(Body::Sun).unwrap();
    assert!(separation(sun.longitude, 256.0) < 0.6, "sun {}", sun.longitude);
    assert!(!sun.retrograde);
}

#[test]
#[ignore] // Requires Swiss Ephemeris files
fn test_delhi_j2000_scenario_primary() {
    let engine = ChartEngine::new(EngineSettings::default());
    assert!(engine.has_primary());
    let chart = engine.compute(&delhi()).unwrap();
    let sun = chart.position(Body::Sun).unwrap();
    assert_eq!(sun.source, EphemerisSource::Primary);
    assert!((chart.ayanamsa.degrees - 23.85).abs() < 0.15);
    assert!(separation(sun.longitude, 256.0) < 0.6);
    let houses = chart.houses.as_ref().unwrap();
    assert_eq!(houses.source, EphemerisSource::Primary);
    assert_eq!(houses.cusp(1), houses.ascendant);
    assert_eq!(houses.cusp(10), houses.mc);
}

#[test]
fn test_primary_unavailable_still_usable() {
    let chart = ChartEngine::analytical_only().compute(&delhi()).unwrap();
    assert_eq!(chart.positions.len(), 12);
    for position in chart.positions.values() {
        assert_eq!(position.source, EphemerisSource::AnalyticalFallback, "{}", position.body);
    }
    assert!(chart.quality.score > 0);
    assert!(chart.quality.critical_failures.is_empty());
    assert!(chart.quality.warnings.iter().any(|w| w == FALLBACK_WARNING));
}

#[test]
fn test_rahu_ketu_opposition() {
    let engine = ChartEngine::analytical_only();
    for day in [0.0, 123.4, 4_567.8, -9_876.5] {
        let sky = engine.sky_at(J2000 + day);
        let rahu = sky.positions[&Body::Rahu];
        let ketu = sky.positions[&Body::Ketu];
        assert_eq!(ketu.longitude, normalize(rahu.longitude + 180.0));
        assert!(rahu.retrograde && ketu.retrograde);
    }
}

#[test]
fn test_zero_cluster_retries_exactly_once() {
    let chart = zero_cluster_engine(true).compute(&delhi()).unwrap();
    assert_eq!(chart.quality.retries, 1);
    assert!(chart.julian_day > J2000);
    assert!(chart
        .quality
        .warnings
        .iter()
        .any(|w| w.contains("remain at 0 degrees")));
}

#[test]
fn test_zero_cluster_cleared_by_nudge() {
    let chart = zero_cluster_engine(false).compute(&delhi()).unwrap();
    assert_eq!(chart.quality.retries, 1);
    assert!((chart.julian_day - (J2000 + 1e-6)).abs() < 1e-9);
    let zeros = chart
        .positions
        .values()
        .filter(|p| separation(p.longitude, 0.0) <= 1e-4)
        .count();
    assert!(zeros <= 2);
}

#[test]
fn test_no_retry_for_ordinary_chart() {
    let chart = ChartEngine::analytical_only().compute(&delhi()).unwrap();
    assert_eq!(chart.quality.retries, 0);
}

#[test]
fn test_single_body_failure_is_omitted_not_fatal() {
    let chart = gappy_engine(&[Body::Mars]).compute(&delhi()).unwrap();
    assert!(chart.position(Body::Mars).is_none());
    assert_eq!(chart.positions.len(), 11);
    assert!(chart.quality.missing.iter().any(|m| m == "mars"));
    let failure = chart
        .quality
        .critical_failures
        .iter()
        .find(|f| f.quantity == "mars")
        .unwrap();
    assert!(failure.reason.contains("series unavailable"));
    assert!(chart.houses.is_some());
    assert!(chart.quality.score > 0);
}

#[test]
fn test_missing_sun_and_moon_is_fatal() {
    match gappy_engine(&[Body::Sun, Body::Moon]).compute(&delhi()) {
        Err(ChartError::Unusable { missing }) => {
            assert_eq!(missing, vec!["sun".to_string(), "moon".to_string()]);
        }
        other => panic!("expected an unusable chart, got {other:?}"),
    }
}

#[test]
fn test_missing_rahu_also_drops_ketu() {
    let chart = gappy_engine(&[Body::Rahu]).compute(&delhi()).unwrap();
    assert!(chart.position(Body::Rahu).is_none());
    assert!(chart.position(Body::Ketu).is_none());
    assert!(chart.quality.missing.iter().any(|m| m == "ketu"));
}

#[test]
fn test_invalid_inputs_are_fatal() {
    let engine = ChartEngine::analytical_only();
    let mut bad_zone = delhi();
    bad_zone.timezone = "Nowhere/Special".to_string();
    assert!(matches!(
        engine.compute(&bad_zone),
        Err(ChartError::Time(TimeError::UnknownZone { .. }))
    ));
    let mut bad_lon = delhi();
    bad_lon.longitude = 200.0;
    assert!(matches!(engine.compute(&bad_lon), Err(ChartError::InvalidInput { .. })));
}

#[test]
fn test_polar_birth_uses_equal_or_emergency_houses() {
    let mut input = delhi();
    input.latitude = 85.0;
    let chart = ChartEngine::analytical_only().compute(&input).unwrap();
    let houses = chart.houses.as_ref().unwrap();
    assert_eq!(houses.method, jyotish::HouseMethod::Equal);

    input.latitude = 90.0;
    let chart = ChartEngine::analytical_only().compute(&input).unwrap();
    assert_eq!(chart.houses.as_ref().unwrap().source, EphemerisSource::Emergency);
    assert!(chart.quality.score > 0);
}

#[test]
fn test_chart_serializes_to_json() {
    let chart = ChartEngine::analytical_only().compute(&delhi()).unwrap();
    let json = serde_json::to_value(&chart).unwrap();
    assert!(json["quality"]["score"].is_number());
    assert_eq!(json["positions"]["sun"]["source"], "analytical_fallback");
}

#[tokio::test]
async fn test_concurrent_cache_keeps_one_chart_per_key() {
    let cache = Arc::new(ChartCache::new());
    let engine = Arc::new(ChartEngine::analytical_only());
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let engine = engine.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            cache.get_or_compute("same-person", &delhi(), |input| engine.compute(input))
        }));
    }
    let mut charts = Vec::new();
    for task in tasks {
        charts.push(task.await.unwrap().unwrap());
    }
    assert_eq!(cache.len(), 1);
    for chart in &charts {
        assert!(Arc::ptr_eq(chart, &charts[0]) || **chart == *charts[0]);
    }
    let stored = cache.get(&jyotish::chart::chart_key("same-person", &delhi())).unwrap();
    assert!(Arc::ptr_eq(&stored, &cache.get_or_compute("same-person", &delhi(), |_| unreachable!()).unwrap()));
}

#[tokio::test]
async fn test_independent_charts_in_parallel() {
    let engine = Arc::new(ChartEngine::analytical_only());
    let inputs: Vec<BirthInput> = (0..6)
        .map(|i| BirthInput::new(noon_2000(), -30.0 + 10.0 * i as f64, 15.0 * i as f64, "UTC"))
        .collect();
    let mut handles = Vec::new();
    for input in inputs.clone() {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || engine.compute(&input)));
    }
    for (handle, input) in handles.into_iter().zip(inputs) {
        let parallel = handle.await.unwrap().unwrap();
        let serial = engine.compute(&input).unwrap();
        assert_eq!(parallel, serial);
    }
}
