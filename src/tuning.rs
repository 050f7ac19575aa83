//! Game balance
//!
//! Every tunable number of the simulation, grouped per component. Loaded from
//! JSON; missing fields fall back to their defaults so partial files work.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::camera::CameraConfig;
use crate::sim::death_wall::DeathWallConfig;
use crate::sim::difficulty::DifficultyProfile;
use crate::sim::generator::GeneratorConfig;
use crate::sim::health::HealthConfig;
use crate::sim::jetpack::JetpackConfig;
use crate::sim::movement::MovementConfig;
use crate::sim::session::SessionConfig;

/// Error type for tuning files.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed tuning file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid range {field}: min {min} > max {max}")]
    InvertedRange { field: &'static str, min: f32, max: f32 },

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be within [0, 1] (got {value})")]
    NotAProbability { field: &'static str, value: f32 },
}

/// All component configs for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: DifficultyProfile,
    pub generator: GeneratorConfig,
    pub death_wall: DeathWallConfig,
    pub movement: MovementConfig,
    pub jetpack: JetpackConfig,
    pub camera: CameraConfig,
    pub health: HealthConfig,
    pub session: SessionConfig,
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
    if min > max {
        return Err(TuningError::InvertedRange { field, min, max });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !(value > 0.0) {
        return Err(TuningError::NotPositive { field, value });
    }
    Ok(())
}

fn check_probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TuningError::NotAProbability { field, value });
    }
    Ok(())
}

impl Tuning {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load, falling back to defaults when the file is unusable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    ///
    /// Zero ramp durations are allowed; the curve treats them as a step.
    pub fn validate(&self) -> Result<(), TuningError> {
        let d = &self.difficulty;
        check_range("difficulty.gap_start", d.gap_min_start, d.gap_max_start)?;
        check_range("difficulty.gap_end", d.gap_min_end, d.gap_max_end)?;
        check_range("difficulty.jetpack_chance", d.jetpack_chance_min, d.jetpack_chance_start)?;
        check_probability("difficulty.falling_max_chance", d.falling_max_chance)?;
        check_probability("difficulty.spikes_max_chance", d.spikes_max_chance)?;
        check_probability("difficulty.laser_max_chance", d.laser_max_chance)?;
        check_probability("difficulty.jetpack_chance_start", d.jetpack_chance_start)?;
        check_probability("difficulty.jetpack_chance_min", d.jetpack_chance_min)?;

        let g = &self.generator;
        check_positive("generator.cell_size", g.cell_size)?;
        check_positive("generator.min_width", g.min_width)?;
        check_range("generator.width", g.min_width, g.max_width)?;
        check_range("generator.step_x", g.min_step_x, g.max_step_x)?;
        check_range("generator.laser_length", g.laser_min_length, g.laser_max_length)?;
        check_probability("generator.direction_flip_chance", g.direction_flip_chance)?;
        check_probability("generator.spike_max_coverage", g.spike_max_coverage)?;
        check_positive("generator.pickup_size", g.pickup_size)?;

        let w = &self.death_wall;
        check_range("death_wall.speed", w.min_speed, w.max_speed)?;

        let m = &self.movement;
        check_positive("movement.max_speed", m.max_speed)?;
        check_positive("movement.mass", m.mass)?;
        check_positive("movement.max_fall_speed", m.max_fall_speed)?;
        check_positive("movement.size.x", m.size.x)?;
        check_positive("movement.size.y", m.size.y)?;

        let c = &self.camera;
        check_positive("camera.half_height", c.half_height)?;
        check_positive("camera.aspect", c.aspect)?;

        Ok(())
    }
}
