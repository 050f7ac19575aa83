//! Player hit points with a post-hit invulnerability window

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_hp: u32,
    /// Invulnerability after taking a hit (s)
    pub invuln_seconds: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_hp: 3,
            invuln_seconds: 0.6,
        }
    }
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Dead, invulnerable, or zero damage
    Ignored,
    Hurt { hp: u32 },
    Killed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub config: HealthConfig,
    hp: u32,
    invuln_timer: f32,
}

impl Health {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            hp: config.max_hp,
            invuln_timer: 0.0,
            config,
        }
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invuln_timer > 0.0
    }

    pub fn reset(&mut self) {
        self.hp = self.config.max_hp;
        self.invuln_timer = 0.0;
    }

    pub fn step(&mut self, dt: f32) {
        if self.invuln_timer > 0.0 {
            self.invuln_timer = (self.invuln_timer - dt).max(0.0);
        }
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.is_dead() || amount == 0 || self.is_invulnerable() {
            return DamageOutcome::Ignored;
        }

        self.hp = self.hp.saturating_sub(amount);
        self.invuln_timer = self.config.invuln_seconds;
        log::debug!("Player took {} damage ({}/{})", amount, self.hp, self.config.max_hp);

        if self.hp == 0 {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt { hp: self.hp }
        }
    }
}
