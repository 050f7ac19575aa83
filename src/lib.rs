//! Sky Climber - runtime core of a vertical endless platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level streaming, death wall, player controller, session)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Top-5 leaderboard with name sanitizing

pub mod highscores;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for responsive jumps)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Floor used for ramp/decay denominators configured as zero
    pub const RAMP_EPSILON: f32 = 0.0001;

    /// Downward acceleration before per-body scaling (world units/s²)
    pub const BASE_GRAVITY: f32 = -9.81;
}

/// Clamp a value to [0, 1]
#[inline]
pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Linear interpolation; `t >= 1` yields exactly `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t >= 1.0 {
        return b;
    }
    a + (b - a) * t
}

/// Uniform draw in [min, max], tolerant of a collapsed or inverted range
#[inline]
pub fn random_between<R: rand::Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}
