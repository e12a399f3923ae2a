use std::collections::BTreeMap;

use crate::angle::{separation, signed_difference};
use crate::aspects::types::{AspectKind, TransitAspect};
use crate::chart::{NatalChart, SiderealPosition, SkySnapshot};
use crate::ephemeris::Body;

/// Aspect angles and orbs in order of frequency (most common first)
const ASPECT_ORBS: &[(AspectKind, f64, f64)] = &[
    (AspectKind::Conjunction, 0.0, 8.0),
    (AspectKind::Opposition, 180.0, 8.0),
    (AspectKind::Trine, 120.0, 6.0),
    (AspectKind::Square, 90.0, 6.0),
    (AspectKind::Sextile, 60.0, 4.0),
];

/// Within this orb an aspect is "exact".
pub const EXACT_ORB: f64 = 0.1;

/// Stateless transit classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitAnalyzer;

impl TransitAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify the shortest arc between two longitudes.
    pub fn classify(&self, current: f64, natal: f64) -> AspectKind {
        self.match_aspect(separation(current, natal))
            .map(|(kind, _)| kind)
            .unwrap_or(AspectKind::Neutral)
    }

    fn match_aspect(&self, angle: f64) -> Option<(AspectKind, f64)> {
        if !angle.is_finite() {
            return None;
        }
        ASPECT_ORBS.iter().find_map(|(kind, exact, orb)| {
            let deviation = (angle - exact).abs();
            (deviation <= *orb).then_some((*kind, deviation))
        })
    }

    /// Every non-neutral (transiting, natal) pair between a chart and a sky snapshot.
    pub fn analyze(&self, natal: &NatalChart, current: &SkySnapshot) -> Vec<TransitAspect> {
        self.analyze_positions(&natal.positions, &current.positions)
    }

    pub fn analyze_positions(
        &self,
        natal: &BTreeMap<Body, SiderealPosition>,
        current: &BTreeMap<Body, SiderealPosition>,
    ) -> Vec<TransitAspect> {
        let mut aspects = Vec::new();
        for transit in current.values() {
            for radix in natal.values() {
                let angle = separation(transit.longitude, radix.longitude);
                let Some((kind, orb)) = self.match_aspect(angle) else {
                    continue;
                };
                let exact = kind.exact_angle().unwrap_or(0.0);
                aspects.push(TransitAspect {
                    transiting: transit.body,
                    natal: radix.body,
                    kind,
                    separation: angle,
                    orb,
                    is_exact: orb < EXACT_ORB,
                    // The natal chart is frozen, so only the transit moves.
                    is_applying: self.is_aspect_applying(transit.longitude, radix.longitude, transit.speed, 0.0, exact, angle),
                    is_return: kind == AspectKind::Conjunction && transit.body == radix.body,
                    is_retrograde: transit.retrograde,
                });
            }
        }
        aspects
    }

    /// Whether the separation is moving toward the exact angle.
    fn is_aspect_applying(
        &self,
        lon1: f64,
        lon2: f64,
        speed1: f64,
        speed2: f64,
        aspect_angle: f64,
        current_angle: f64,
    ) -> bool {
        let relative_speed = speed1 - speed2;

        // Stationary: call it applying only when effectively exact
        if relative_speed.abs() < 0.01 {
            return (current_angle - aspect_angle).abs() < EXACT_ORB;
        }

        // Project a small step forward and compare distances from exact
        let time_step = 0.1;
        let future_angle = signed_difference(lon1 + relative_speed * time_step, lon2).abs();
        let current_distance = (current_angle - aspect_angle).abs();
        let future_distance = (future_angle - aspect_angle).abs();
        future_distance < current_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_boundaries() {
        let t = TransitAnalyzer::new();
        assert_eq!(t.classify(10.0, 18.0), AspectKind::Conjunction);
        assert_eq!(t.classify(10.0, 18.01), AspectKind::Neutral);
        assert_eq!(t.classify(355.0, 3.0), AspectKind::Conjunction);
        assert_eq!(t.classify(0.0, 172.0), AspectKind::Opposition);
        assert_eq!(t.classify(0.0, 126.0), AspectKind::Trine);
        assert_eq!(t.classify(0.0, 84.0), AspectKind::Square);
        assert_eq!(t.classify(0.0, 64.0), AspectKind::Sextile);
        assert_eq!(t.classify(0.0, 45.0), AspectKind::Neutral);
        assert_eq!(t.classify(f64::NAN, 45.0), AspectKind::Neutral);
    }

    #[test]
    fn applying_when_fast_body_closes_in() {
        let t = TransitAnalyzer::new();
        // Square to natal 0: moving forward from 95 separates, from 85 applies.
        assert!(!t.is_aspect_applying(95.0, 0.0, 1.0, 0.0, 90.0, 95.0));
        assert!(t.is_aspect_applying(85.0, 0.0, 1.0, 0.0, 90.0, 85.0));
        assert!(t.is_aspect_applying(95.0, 0.0, -0.5, 0.0, 90.0, 95.0));
    }
}
