//! Generator-owned world objects
//!
//! Falling platforms, laser beams and jetpack pickups. Their timed behaviour
//! uses countdown timers polled once per fixed step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;

/// Stable handle for a spawned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Tuning for falling platforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallingConfig {
    /// Delay between first player contact and release (s)
    pub fall_delay: f32,
    /// Window after release where the player passes through (s)
    pub ignore_player_seconds: f32,
    /// Gravity applied once released (world units/s², negative is down)
    pub gravity: f32,
    pub max_fall_speed: f32,
}

impl Default for FallingConfig {
    fn default() -> Self {
        Self {
            fall_delay: 0.35,
            ignore_player_seconds: 0.05,
            gravity: -29.43,
            max_fall_speed: 30.0,
        }
    }
}

/// Tuning for laser beams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserConfig {
    /// Minimum time between two hits on the player (s)
    pub damage_interval: f32,
    /// Beam height in world units
    pub thickness: f32,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            damage_interval: 0.15,
            thickness: 0.3,
        }
    }
}

/// Falling platform phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FallPhase {
    /// Static until touched
    Armed,
    /// Touched; counting down to release
    Triggered { timer: f32 },
    /// Dynamic body
    Falling { ignore_player: f32 },
}

/// A platform that drops after the player stands on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingPlatform {
    pub aabb: Aabb,
    pub vel_y: f32,
    pub phase: FallPhase,
}

impl FallingPlatform {
    pub fn new(aabb: Aabb) -> Self {
        Self {
            aabb,
            vel_y: 0.0,
            phase: FallPhase::Armed,
        }
    }

    /// Register player contact. Returns true on the first contact only.
    pub fn on_player_contact(&mut self, config: &FallingConfig) -> bool {
        if self.phase != FallPhase::Armed {
            return false;
        }
        self.phase = FallPhase::Triggered {
            timer: config.fall_delay,
        };
        true
    }

    /// Advance timers and motion. Returns true on the step it is released.
    pub fn step(&mut self, config: &FallingConfig, dt: f32) -> bool {
        match self.phase {
            FallPhase::Armed => false,
            FallPhase::Triggered { timer } => {
                let timer = timer - dt;
                if timer <= 0.0 {
                    self.phase = FallPhase::Falling {
                        ignore_player: config.ignore_player_seconds,
                    };
                    true
                } else {
                    self.phase = FallPhase::Triggered { timer };
                    false
                }
            }
            FallPhase::Falling { ignore_player } => {
                self.phase = FallPhase::Falling {
                    ignore_player: (ignore_player - dt).max(0.0),
                };
                self.vel_y = (self.vel_y + config.gravity * dt).max(-config.max_fall_speed);
                self.aabb = self.aabb.translated(Vec2::new(0.0, self.vel_y * dt));
                false
            }
        }
    }

    /// Whether the player currently collides with this platform
    pub fn collides_with_player(&self) -> bool {
        !matches!(self.phase, FallPhase::Falling { ignore_player } if ignore_player > 0.0)
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.phase, FallPhase::Falling { .. })
    }
}

/// Horizontal beam hazard hovering one row above a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserBeam {
    pub aabb: Aabb,
    pub damage_cooldown: f32,
}

impl LaserBeam {
    pub fn new(center: Vec2, length: f32, thickness: f32) -> Self {
        Self {
            aabb: Aabb::from_center_size(center, Vec2::new(length, thickness)),
            damage_cooldown: 0.0,
        }
    }

    pub fn length(&self) -> f32 {
        self.aabb.size().x
    }

    pub fn step(&mut self, dt: f32) {
        if self.damage_cooldown > 0.0 {
            self.damage_cooldown = (self.damage_cooldown - dt).max(0.0);
        }
    }

    /// True if the beam may hit now; restarts the interval when it does
    pub fn try_hit(&mut self, config: &LaserConfig) -> bool {
        if self.damage_cooldown > 0.0 {
            return false;
        }
        self.damage_cooldown = config.damage_interval;
        true
    }
}

/// Jetpack fuel pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetpackPickup {
    pub pos: Vec2,
    pub aabb: Aabb,
    pub charges: u32,
}

impl JetpackPickup {
    pub fn new(pos: Vec2, size: f32, charges: u32) -> Self {
        Self {
            pos,
            aabb: Aabb::from_center_size(pos, Vec2::splat(size)),
            charges,
        }
    }
}

/// Anything a span owns besides its tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnedObject {
    Falling(FallingPlatform),
    Laser(LaserBeam),
    Pickup(JetpackPickup),
}
