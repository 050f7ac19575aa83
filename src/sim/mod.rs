//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spans by row, objects by entity ID)
//! - No rendering, audio or platform dependencies

pub mod camera;
pub mod death_wall;
pub mod difficulty;
pub mod events;
pub mod generator;
pub mod grid;
pub mod hazards;
pub mod health;
pub mod input;
pub mod jetpack;
pub mod movement;
pub mod physics;
pub mod placer;
pub mod session;
pub mod state;
pub mod tick;

pub use camera::{Camera, CameraConfig};
pub use death_wall::{DeathWall, DeathWallConfig};
pub use difficulty::{ChanceKind, DifficultyCurve, DifficultyProfile, DifficultySnapshot};
pub use events::{DeathReason, GameEvent};
pub use generator::{GeneratorConfig, GeneratorPhase, GeneratorView, StreamingGenerator};
pub use grid::{CellRange, Grid};
pub use hazards::{EntityId, SpawnedObject};
pub use health::{Health, HealthConfig};
pub use input::{Autopilot, FrameInput, InputLatch, StepInput};
pub use jetpack::{BoostRejection, JetpackAbility, JetpackConfig};
pub use movement::{JumpKind, MovementConfig, MovementStatus, PlayerMovement};
pub use physics::{Aabb, Body, CollisionQuery, LayerMask};
pub use placer::{HazardKind, RowPlacer, Span};
pub use session::{Session, SessionConfig, SessionPhase};
pub use state::GameState;
pub use tick::{frame, tick};
