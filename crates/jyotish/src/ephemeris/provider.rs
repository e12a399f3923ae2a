//! Ordered position strategies.
//!
//! The provider walks its strategy list and keeps the first accepted
//! longitude. Rejections are returned as data so callers can record which
//! tiers failed and why.

use std::sync::Arc;

use crate::angle::normalize;
use crate::ephemeris::analytical::AnalyticalEphemeris;
use crate::ephemeris::handle::EphemerisHandle;
use crate::ephemeris::types::{Body, EphemerisSource, TropicalPosition};
use crate::error::EphemerisError;

/// One tier able to produce tropical longitudes
pub trait PositionSource: Send + Sync {
    fn tier(&self) -> EphemerisSource;

    fn tropical(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError>;
}

impl PositionSource for EphemerisHandle {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::Primary
    }

    fn tropical(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        // Nodes always come from the mean-node series.
        if body.is_node() {
            return Err(EphemerisError::PrimaryUnavailable);
        }
        self.tropical_longitude(jd, body)
    }
}

impl PositionSource for AnalyticalEphemeris {
    fn tier(&self) -> EphemerisSource {
        EphemerisSource::AnalyticalFallback
    }

    fn tropical(&self, jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
        self.tropical_longitude(jd, body)
    }
}

/// Reject non-finite and negative longitudes; wrap the rest into [0, 360).
pub fn accept(jd: f64, body: Body, position: TropicalPosition) -> Result<TropicalPosition, EphemerisError> {
    let value = position.longitude;
    if !value.is_finite() || value < 0.0 {
        return Err(EphemerisError::RejectedValue { body, jd, value });
    }
    Ok(TropicalPosition {
        longitude: normalize(value),
        speed: if position.speed.is_finite() { position.speed } else { 0.0 },
        source: position.source,
    })
}

/// Tiered ephemeris lookup
#[derive(Clone)]
pub struct EphemerisProvider {
    primary: Option<EphemerisHandle>,
    strategies: Vec<Arc<dyn PositionSource>>,
}

impl EphemerisProvider {
    /// Primary first when present, then the analytical series.
    pub fn new(primary: Option<EphemerisHandle>) -> Self {
        let mut strategies: Vec<Arc<dyn PositionSource>> = Vec::with_capacity(2);
        if let Some(handle) = &primary {
            strategies.push(Arc::new(handle.clone()));
        }
        strategies.push(Arc::new(AnalyticalEphemeris::new()));
        Self { primary, strategies }
    }

    pub fn analytical_only() -> Self {
        Self::new(None)
    }

    /// Use an explicit strategy list, tried in order.
    pub fn with_strategies(strategies: Vec<Arc<dyn PositionSource>>) -> Self {
        Self { primary: None, strategies }
    }

    pub fn primary(&self) -> Option<&EphemerisHandle> {
        self.primary.as_ref()
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// First accepted tropical position, or every tier's rejection.
    pub fn position(&self, jd: f64, body: Body) -> Result<TropicalPosition, Vec<EphemerisError>> {
        if body == Body::Ketu {
            return Err(vec![EphemerisError::DerivedBody { body }]);
        }
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.tropical(jd, body).and_then(|p| accept(jd, body, p)) {
                Ok(position) => {
                    if !failures.is_empty() {
                        log::debug!("{body} resolved by {:?} after {} rejection(s)", strategy.tier(), failures.len());
                    }
                    return Ok(position);
                }
                Err(EphemerisError::PrimaryUnavailable) if body.is_node() => {}
                Err(e) => {
                    log::debug!("{:?} rejected {body} at JD {jd}: {e}", strategy.tier());
                    failures.push(e);
                }
            }
        }
        Err(failures)
    }
}

impl std::fmt::Debug for EphemerisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemerisProvider")
            .field("primary", &self.primary)
            .field("tiers", &self.strategies.iter().map(|s| s.tier()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::adapter::PrimaryEphemeris;
    use crate::ephemeris::types::{GeoLocation, RawHouses};
    use crate::time::J2000;

    struct BrokenPrimary;

    impl PrimaryEphemeris for BrokenPrimary {
        fn describe(&self) -> String {
            "broken".into()
        }
        fn tropical_longitude(&self, _jd: f64, body: Body) -> Result<TropicalPosition, EphemerisError> {
            let longitude = if body == Body::Mars { -12.0 } else { f64::NAN };
            Ok(TropicalPosition { longitude, speed: 0.0, source: EphemerisSource::Primary })
        }
        fn ayanamsa(&self, _jd: f64) -> Result<f64, EphemerisError> {
            Ok(23.85)
        }
        fn houses(&self, _jd: f64, _loc: GeoLocation) -> Result<RawHouses, EphemerisError> {
            Err(EphemerisError::PrimaryUnavailable)
        }
    }

    #[test]
    fn rejected_primary_falls_through_to_analytical() {
        let handle = EphemerisHandle::from_primary(Arc::new(BrokenPrimary));
        let provider = EphemerisProvider::new(Some(handle));
        for body in [Body::Sun, Body::Mars] {
            let pos = provider.position(J2000, body).unwrap();
            assert_eq!(pos.source, EphemerisSource::AnalyticalFallback);
        }
    }

    #[test]
    fn rahu_never_uses_primary() {
        let handle = EphemerisHandle::from_primary(Arc::new(BrokenPrimary));
        let rahu = EphemerisProvider::new(Some(handle)).position(J2000, Body::Rahu).unwrap();
        assert_eq!(rahu.source, EphemerisSource::AnalyticalFallback);
    }

    #[test]
    fn ketu_is_not_looked_up() {
        let err = EphemerisProvider::analytical_only().position(J2000, Body::Ketu).unwrap_err();
        assert_eq!(err, vec![EphemerisError::DerivedBody { body: Body::Ketu }]);
    }

    #[test]
    fn empty_strategy_list_reports_no_position() {
        let provider = EphemerisProvider::with_strategies(Vec::new());
        assert_eq!(provider.position(J2000, Body::Sun).unwrap_err(), Vec::new());
    }

    #[test]
    fn accept_wraps_large_values() {
        let pos = TropicalPosition { longitude: 365.0, speed: 1.0, source: EphemerisSource::Primary };
        assert!((accept(J2000, Body::Sun, pos).unwrap().longitude - 5.0).abs() < 1e-12);
    }
}
