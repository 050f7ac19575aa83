//! Death wall
//!
//! A rising boundary that chases the player from below. Everything under
//! `y` is lethal once the grace period is over.

use serde::{Deserialize, Serialize};

use super::physics::Aabb;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathWallConfig {
    /// Wall stays still this long after a reset (s)
    pub start_delay: f32,
    /// Contact is harmless this long after a reset (s)
    pub kill_grace_period: f32,
    /// Distance the wall tries to keep below the player
    pub desired_gap: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Extra speed per unit of distance behind the target
    pub catch_up_strength: f32,
    /// During grace, never advance past the target
    pub clamp_during_grace: bool,
    /// Initial distance below the player at reset
    pub start_offset: f32,
}

impl Default for DeathWallConfig {
    fn default() -> Self {
        Self {
            start_delay: 1.0,
            kill_grace_period: 2.0,
            desired_gap: 6.0,
            min_speed: 0.6,
            max_speed: 4.0,
            catch_up_strength: 0.6,
            clamp_during_grace: true,
            start_offset: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathWall {
    pub config: DeathWallConfig,
    /// Top edge of the wall
    pub y: f32,
    /// Time since the last reset (s)
    pub elapsed: f32,
}

impl DeathWall {
    pub fn new(config: DeathWallConfig) -> Self {
        Self {
            config,
            y: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn reset(&mut self, player_y: f32) {
        self.y = player_y - self.config.start_offset;
        self.elapsed = 0.0;
    }

    pub fn in_grace(&self) -> bool {
        self.elapsed < self.config.kill_grace_period
    }

    /// Chase speed for the current distance to the target
    pub fn chase_speed(&self, target_y: f32) -> f32 {
        let cfg = &self.config;
        let max = cfg.max_speed.max(cfg.min_speed);
        (cfg.min_speed + (target_y - self.y) * cfg.catch_up_strength).clamp(cfg.min_speed, max)
    }

    /// Advance toward `player_y - desired_gap`
    pub fn step(&mut self, player_y: f32, dt: f32) {
        self.elapsed += dt;
        if self.elapsed < self.config.start_delay {
            return;
        }

        let target_y = player_y - self.config.desired_gap;
        let mut next = self.y + self.chase_speed(target_y) * dt;

        // Don't sit on a freshly spawned player; never move back down either
        if self.config.clamp_during_grace && self.in_grace() {
            next = next.min(target_y.max(self.y));
        }

        self.y = next.max(self.y);
    }

    pub fn touches(&self, player: &Aabb) -> bool {
        player.min.y <= self.y
    }

    /// Contact that ends the run
    pub fn is_lethal_contact(&self, player: &Aabb) -> bool {
        !self.in_grace() && self.touches(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn player_box(feet_y: f32) -> Aabb {
        Aabb::new(Vec2::new(-0.4, feet_y), Vec2::new(0.4, feet_y + 1.0))
    }

    #[test]
    fn test_waits_for_start_delay() {
        let mut wall = DeathWall::new(DeathWallConfig::default());
        wall.reset(0.0);
        let start = wall.y;
        for _ in 0..50 {
            wall.step(0.0, 0.01);
        }
        assert_eq!(wall.y, start);
    }

    #[test]
    fn test_speed_clamped() {
        let mut wall = DeathWall::new(DeathWallConfig::default());
        wall.y = 0.0;
        // Far behind: max speed
        assert_eq!(wall.chase_speed(100.0), 4.0);
        // Ahead of target: min speed
        assert_eq!(wall.chase_speed(-100.0), 0.6);
        // In between: proportional
        assert!((wall.chase_speed(2.0) - (0.6 + 1.2)).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_and_grace_clamp() {
        let mut wall = DeathWall::new(DeathWallConfig {
            start_delay: 0.0,
            ..Default::default()
        });
        wall.reset(0.0);
        wall.y = -6.0; // Already at target

        let mut last = wall.y;
        for _ in 0..100 {
            // Player falling during grace must not drag the wall down
            wall.step(-3.0, 0.01);
            assert!(wall.y >= last);
            assert!(wall.y <= -6.0 + 1e-6);
            last = wall.y;
        }
    }

    #[test]
    fn test_lethal_only_after_grace() {
        let mut wall = DeathWall::new(DeathWallConfig::default());
        wall.reset(0.0);
        wall.y = 5.0;
        let player = player_box(0.0);
        assert!(wall.touches(&player));
        assert!(!wall.is_lethal_contact(&player));

        wall.elapsed = 2.5;
        assert!(wall.is_lethal_contact(&player));
        assert!(!wall.is_lethal_contact(&player_box(6.0)));
    }
}
