//! Notifications for presentation-side collaborators
//!
//! The core never calls UI, audio or VFX code. It queues events on the game
//! state and the embedder drains them once per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazards::EntityId;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    DeathWall,
    Offscreen,
    Hazard,
}

impl DeathReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DeathReason::DeathWall => "DeathWall",
            DeathReason::Offscreen => "Offscreen",
            DeathReason::Hazard => "Hazard",
        }
    }
}

impl std::fmt::Display for DeathReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped { pos: Vec2 },
    WallJumped { pos: Vec2, wall_direction: i8 },
    JetpackBoost { pos: Vec2 },
    /// Jetpack charges changed
    FuelChanged { charges: u32, max_charges: u32 },
    PickupCollected { id: EntityId, charges: u32 },
    /// A falling platform was touched and started its countdown
    PlatformTriggered { id: EntityId },
    PlayerDamaged { hp: u32 },
    PlayerDied { reason: DeathReason, score: u32 },
    RunReset { seed: u64 },
}
