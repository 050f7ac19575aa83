//! Difficulty curve
//!
//! Pure functions mapping the run score (elapsed survival seconds) to spawn
//! probabilities and the vertical gap range between rows. Nothing here is
//! cached; every query recomputes from the profile.

use serde::{Deserialize, Serialize};

use crate::consts::RAMP_EPSILON;
use crate::{clamp01, lerp};

/// Spawn probabilities the curve can answer for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChanceKind {
    /// Platform becomes a falling platform
    Falling,
    /// Spike run on top of the platform
    Spikes,
    /// Laser beam above the platform
    Laser,
    /// Jetpack pickup above the platform
    Jetpack,
}

/// Balance profile for the difficulty curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyProfile {
    // === Falling platforms (ramped) ===
    pub falling_start_score: f32,
    pub falling_ramp_duration: f32,
    pub falling_max_chance: f32,

    // === Spikes (ramped) ===
    pub spikes_start_score: f32,
    pub spikes_ramp_duration: f32,
    pub spikes_max_chance: f32,

    // === Lasers (ramped) ===
    pub laser_start_score: f32,
    pub laser_ramp_duration: f32,
    pub laser_max_chance: f32,

    // === Jetpack pickups (decaying) ===
    pub jetpack_chance_start: f32,
    pub jetpack_chance_min: f32,
    pub jetpack_chance_decay_score: f32,

    // === Row gaps (world units, widening) ===
    pub gap_min_start: f32,
    pub gap_max_start: f32,
    pub gap_min_end: f32,
    pub gap_max_end: f32,
    pub gap_ramp_score: f32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            falling_start_score: 15.0,
            falling_ramp_duration: 45.0,
            falling_max_chance: 0.35,

            spikes_start_score: 80.0,
            spikes_ramp_duration: 60.0,
            spikes_max_chance: 0.35,

            laser_start_score: 100.0,
            laser_ramp_duration: 60.0,
            laser_max_chance: 0.25,

            jetpack_chance_start: 0.70,
            jetpack_chance_min: 0.20,
            jetpack_chance_decay_score: 50.0,

            gap_min_start: 3.0,
            gap_max_start: 5.5,
            gap_min_end: 4.0,
            gap_max_end: 7.0,
            gap_ramp_score: 120.0,
        }
    }
}

/// Ramped quantity: 0 below `start`, then rises linearly to `max` over `duration`
#[inline]
pub fn ramp(score: f32, start: f32, duration: f32, max: f32) -> f32 {
    if score < start {
        return 0.0;
    }
    max * clamp01((score - start) / duration.max(RAMP_EPSILON))
}

/// Decaying quantity: `from` at score 0, reaches `to` at `decay_score`
#[inline]
pub fn decay(score: f32, from: f32, to: f32, decay_score: f32) -> f32 {
    lerp(from, to, clamp01(score / decay_score.max(RAMP_EPSILON)))
}

/// Every curve output for one score, taken once per spawned row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySnapshot {
    pub score: f32,
    pub falling: f32,
    pub spikes: f32,
    pub laser: f32,
    pub jetpack: f32,
    pub gap_min: f32,
    pub gap_max: f32,
}

impl DifficultySnapshot {
    /// Snapshot with every hazard disabled (used for the safety platform)
    pub fn calm() -> Self {
        Self {
            score: 0.0,
            falling: 0.0,
            spikes: 0.0,
            laser: 0.0,
            jetpack: 0.0,
            gap_min: 0.0,
            gap_max: 0.0,
        }
    }
}

/// Score → probability/gap mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    pub profile: DifficultyProfile,
}

impl DifficultyCurve {
    pub fn new(profile: DifficultyProfile) -> Self {
        Self { profile }
    }

    /// Probability in [0, 1] for the given spawn kind
    pub fn chance(&self, kind: ChanceKind, score: f32) -> f32 {
        let p = &self.profile;
        let raw = match kind {
            ChanceKind::Falling => ramp(
                score,
                p.falling_start_score,
                p.falling_ramp_duration,
                p.falling_max_chance,
            ),
            ChanceKind::Spikes => ramp(
                score,
                p.spikes_start_score,
                p.spikes_ramp_duration,
                p.spikes_max_chance,
            ),
            ChanceKind::Laser => ramp(
                score,
                p.laser_start_score,
                p.laser_ramp_duration,
                p.laser_max_chance,
            ),
            ChanceKind::Jetpack => decay(
                score,
                p.jetpack_chance_start,
                p.jetpack_chance_min,
                p.jetpack_chance_decay_score,
            ),
        };
        clamp01(raw)
    }

    pub fn falling_chance(&self, score: f32) -> f32 {
        self.chance(ChanceKind::Falling, score)
    }

    pub fn spikes_chance(&self, score: f32) -> f32 {
        self.chance(ChanceKind::Spikes, score)
    }

    pub fn laser_chance(&self, score: f32) -> f32 {
        self.chance(ChanceKind::Laser, score)
    }

    pub fn jetpack_chance(&self, score: f32) -> f32 {
        self.chance(ChanceKind::Jetpack, score)
    }

    /// (min, max) vertical gap between rows, in world units
    pub fn gap_range(&self, score: f32) -> (f32, f32) {
        let p = &self.profile;
        let t = clamp01(score / p.gap_ramp_score.max(RAMP_EPSILON));
        (
            lerp(p.gap_min_start, p.gap_min_end, t),
            lerp(p.gap_max_start, p.gap_max_end, t),
        )
    }

    pub fn spikes_enabled(&self, score: f32) -> bool {
        score >= self.profile.spikes_start_score
    }

    pub fn laser_enabled(&self, score: f32) -> bool {
        score >= self.profile.laser_start_score
    }

    pub fn snapshot(&self, score: f32) -> DifficultySnapshot {
        let (gap_min, gap_max) = self.gap_range(score);
        DifficultySnapshot {
            score,
            falling: self.falling_chance(score),
            spikes: self.spikes_chance(score),
            laser: self.laser_chance(score),
            jetpack: self.jetpack_chance(score),
            gap_min,
            gap_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_zero_baseline() {
        let curve = DifficultyCurve::default();
        let p = &curve.profile;
        assert_eq!(curve.falling_chance(0.0), 0.0);
        assert_eq!(curve.jetpack_chance(0.0), p.jetpack_chance_start);
        assert_eq!(curve.gap_range(0.0), (p.gap_min_start, p.gap_max_start));
    }

    #[test]
    fn test_spikes_reach_max_at_end_of_ramp() {
        let curve = DifficultyCurve::default();
        let p = &curve.profile;
        let score = p.spikes_start_score + p.spikes_ramp_duration;
        assert_eq!(curve.spikes_chance(score), p.spikes_max_chance);
        // Past the ramp stays saturated
        assert_eq!(curve.spikes_chance(score + 500.0), p.spikes_max_chance);
    }

    #[test]
    fn test_ramp_is_zero_before_start() {
        let curve = DifficultyCurve::default();
        let p = &curve.profile;
        assert_eq!(curve.laser_chance(p.laser_start_score - 0.01), 0.0);
        assert!(!curve.laser_enabled(p.laser_start_score - 0.01));
        assert!(curve.laser_enabled(p.laser_start_score));
    }

    #[test]
    fn test_jetpack_decays_to_floor() {
        let curve = DifficultyCurve::default();
        let p = &curve.profile;
        let half = curve.jetpack_chance(p.jetpack_chance_decay_score * 0.5);
        assert!((half - 0.45).abs() < 1e-5);
        assert_eq!(curve.jetpack_chance(10_000.0), p.jetpack_chance_min);
    }

    #[test]
    fn test_zero_ramp_degrades_to_step() {
        let profile = DifficultyProfile {
            falling_ramp_duration: 0.0,
            gap_ramp_score: 0.0,
            jetpack_chance_decay_score: 0.0,
            ..Default::default()
        };
        let curve = DifficultyCurve::new(profile.clone());

        assert_eq!(curve.falling_chance(profile.falling_start_score - 1.0), 0.0);
        assert_eq!(
            curve.falling_chance(profile.falling_start_score + 0.01),
            profile.falling_max_chance
        );
        let (min, max) = curve.gap_range(1.0);
        assert!(min.is_finite() && max.is_finite());
        assert_eq!((min, max), (profile.gap_min_end, profile.gap_max_end));
        assert!(curve.jetpack_chance(0.0).is_finite());
    }

    #[test]
    fn test_snapshot_matches_queries() {
        let curve = DifficultyCurve::default();
        let snap = curve.snapshot(90.0);
        assert_eq!(snap.falling, curve.falling_chance(90.0));
        assert_eq!(snap.spikes, curve.spikes_chance(90.0));
        assert_eq!((snap.gap_min, snap.gap_max), curve.gap_range(90.0));
    }
}
