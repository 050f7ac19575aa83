//! Jetpack ability
//!
//! A single gated action: `try_boost` either sets a minimum upward velocity
//! and spends a charge, or rejects with the first failing guard. It shares
//! the jump button with the movement controller, so it refuses to fire on a
//! step where the controller already jumped.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::input::StepInput;
use super::movement::MovementStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JetpackConfig {
    // === Charges ===
    pub max_charges: u32,
    pub starting_charges: u32,
    /// Minimum time between boosts (s)
    pub cooldown: f32,

    // === Boost ===
    /// Vertical speed the boost sets (not adds)
    pub boost_up_speed: f32,
    pub only_in_air: bool,
    pub block_while_on_wall: bool,
    pub zero_out_down_velocity: bool,

    // === Gating ===
    /// Button must go up between two boosts
    pub require_release_before_boost: bool,
}

impl Default for JetpackConfig {
    fn default() -> Self {
        Self {
            max_charges: 1,
            starting_charges: 1,
            cooldown: 0.10,
            boost_up_speed: 16.0,
            only_in_air: true,
            block_while_on_wall: true,
            zero_out_down_velocity: true,
            require_release_before_boost: true,
        }
    }
}

/// Why a boost was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostRejection {
    NoCharges,
    Cooldown,
    NeedsRelease,
    Grounded,
    OnWall,
    /// The movement controller jumped on this step
    SameStepAsJump,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetpackAbility {
    pub config: JetpackConfig,
    charges: u32,
    cooldown_timer: f32,
    release_armed: bool,
}

impl JetpackAbility {
    pub fn new(config: JetpackConfig) -> Self {
        Self {
            charges: config.starting_charges.min(config.max_charges),
            cooldown_timer: 0.0,
            release_armed: true,
            config,
        }
    }

    pub fn reset(&mut self) {
        self.charges = self.config.starting_charges.min(self.config.max_charges);
        self.cooldown_timer = 0.0;
        self.release_armed = true;
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn is_release_armed(&self) -> bool {
        self.release_armed
    }

    /// Tick the cooldown and re-arm on button release
    pub fn update(&mut self, input: &StepInput, dt: f32) {
        if self.cooldown_timer > 0.0 {
            self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
        }
        if self.config.require_release_before_boost && input.jump_released {
            self.release_armed = true;
        }
    }

    /// Check every guard without touching state
    pub fn can_boost(&self, movement: MovementStatus, step_index: u64) -> Result<(), BoostRejection> {
        let cfg = &self.config;
        if self.charges == 0 {
            return Err(BoostRejection::NoCharges);
        }
        if self.cooldown_timer > 0.0 {
            return Err(BoostRejection::Cooldown);
        }
        if cfg.require_release_before_boost && !self.release_armed {
            return Err(BoostRejection::NeedsRelease);
        }
        if cfg.only_in_air && movement.grounded {
            return Err(BoostRejection::Grounded);
        }
        if cfg.block_while_on_wall && movement.on_wall {
            return Err(BoostRejection::OnWall);
        }
        if movement.last_jump_step == Some(step_index) {
            return Err(BoostRejection::SameStepAsJump);
        }
        Ok(())
    }

    /// Attempt a boost on `vel`
    pub fn try_boost(
        &mut self,
        vel: &mut Vec2,
        pos: Vec2,
        movement: MovementStatus,
        step_index: u64,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), BoostRejection> {
        if let Err(rejection) = self.can_boost(movement, step_index) {
            log::debug!("Jetpack blocked: {:?}", rejection);
            return Err(rejection);
        }

        if self.config.zero_out_down_velocity && vel.y < 0.0 {
            vel.y = 0.0;
        }
        vel.y = vel.y.max(self.config.boost_up_speed);

        self.charges -= 1;
        self.cooldown_timer = self.config.cooldown;
        if self.config.require_release_before_boost {
            self.release_armed = false;
        }

        events.push(GameEvent::JetpackBoost { pos });
        self.notify_fuel(events);
        Ok(())
    }

    /// Add (or remove) charges, clamped to `[0, max_charges]`
    ///
    /// Notifies only when the count actually changes.
    pub fn add_charges(&mut self, amount: i32, events: &mut Vec<GameEvent>) {
        let next = (self.charges as i64 + amount as i64).clamp(0, self.config.max_charges as i64) as u32;
        if next != self.charges {
            self.charges = next;
            self.notify_fuel(events);
        }
    }

    fn notify_fuel(&self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::FuelChanged {
            charges: self.charges,
            max_charges: self.config.max_charges,
        });
    }
}
