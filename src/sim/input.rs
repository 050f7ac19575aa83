//! Player input
//!
//! Input is sampled once per frame but consumed by the fixed step. Button
//! edges are latched until a fixed step has seen them, so a tap shorter than
//! one frame (or a frame with zero fixed steps) is never lost.

use serde::{Deserialize, Serialize};

use super::state::GameState;

/// Raw input for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Horizontal axis in [-1, 1]
    pub axis: f32,
    /// Jump went down this frame
    pub jump_pressed: bool,
    /// Jump went up this frame
    pub jump_released: bool,
    /// Jump is currently down
    pub jump_held: bool,
    /// Confirm / restart (second logical button)
    pub confirm: bool,
}

/// Input seen by one fixed step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInput {
    pub axis: f32,
    pub jump_pressed: bool,
    pub jump_released: bool,
    pub jump_held: bool,
}

/// Holds frame edges until a fixed step consumes them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputLatch {
    axis: f32,
    jump_held: bool,
    jump_pressed: bool,
    jump_released: bool,
    confirm: bool,
}

impl InputLatch {
    /// Merge a frame's input; levels overwrite, edges accumulate
    pub fn sample(&mut self, frame: &FrameInput) {
        self.axis = if frame.axis.is_finite() {
            frame.axis.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.jump_held = frame.jump_held;
        self.jump_pressed |= frame.jump_pressed;
        self.jump_released |= frame.jump_released;
        self.confirm |= frame.confirm;
    }

    pub fn step_input(&self) -> StepInput {
        StepInput {
            axis: self.axis,
            jump_pressed: self.jump_pressed,
            jump_released: self.jump_released,
            jump_held: self.jump_held,
        }
    }

    /// Clear the jump edges after a fixed step used them
    pub fn consume_edges(&mut self) {
        self.jump_pressed = false;
        self.jump_released = false;
    }

    pub fn take_confirm(&mut self) -> bool {
        std::mem::take(&mut self.confirm)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Simple bot used by the headless runner and demos
///
/// Steers toward the nearest platform above the player and jumps whenever
/// it stands on something.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Frames left holding the jump button
    hold_frames: u32,
}

impl Autopilot {
    const HOLD_FRAMES: u32 = 12;
    /// Look this far above the feet for a landing target
    const LOOK_AHEAD: f32 = 7.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn drive(&mut self, state: &GameState) -> FrameInput {
        let mut input = FrameInput::default();

        if state.session.is_game_over() {
            input.confirm = true;
            return input;
        }

        let feet = state.body.feet();
        if let Some(target_x) = Self::target_x(state, feet.y) {
            let dx = target_x - feet.x;
            input.axis = (dx / 1.5).clamp(-1.0, 1.0);
        }

        if self.hold_frames > 0 {
            self.hold_frames -= 1;
            input.jump_held = self.hold_frames > 0;
            input.jump_released = self.hold_frames == 0;
        } else if state.movement.is_grounded() || state.movement.is_on_wall() {
            self.hold_frames = Self::HOLD_FRAMES;
            input.jump_pressed = true;
            input.jump_held = true;
        }

        input
    }

    fn target_x(state: &GameState, feet_y: f32) -> Option<f32> {
        let grid = state.generator.grid()?;
        state
            .generator
            .spans()
            .filter(|span| span.world_y > feet_y + 0.5 && span.world_y < feet_y + Self::LOOK_AHEAD)
            .map(|span| (span.world_y, grid.range_center_x(span.cells)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, x)| x)
    }
}
