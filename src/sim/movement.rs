//! Player movement state machine
//!
//! Fixed-step platformer controller: grounded/airborne acceleration, jump
//! buffering, coyote time, variable jump height, wall slide and wall jump.
//!
//! Step order matters and is fixed:
//! 1. input, 2. jump buffer, 3. contact probes, 4. coyote timer,
//! 5. jump intent, 6. horizontal motion, 7. jump execution, 8. jump cut,
//! 9. wall-slide clamp, 10. gravity shaping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::input::StepInput;
use super::physics::{Body, CollisionQuery, LayerMask};
use crate::consts::BASE_GRAVITY;

/// Controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // === Body ===
    pub size: Vec2,
    pub mass: f32,
    pub gravity_scale: f32,

    // === Horizontal ===
    pub max_speed: f32,
    pub ground_acceleration: f32,
    pub ground_deceleration: f32,
    pub air_acceleration: f32,
    pub air_deceleration: f32,

    // === Jump ===
    pub jump_velocity: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
    /// Vertical speed multiplier when the button is released while rising
    pub jump_cut_multiplier: f32,

    // === Gravity feel ===
    pub fall_gravity_multiplier: f32,
    pub max_fall_speed: f32,

    // === Wall jump ===
    pub enable_wall_jump: bool,
    pub wall_slide_max_fall_speed: f32,
    pub wall_jump_x_velocity: f32,
    pub wall_jump_y_velocity: f32,
    /// Horizontal input ignored this long after a wall jump (s)
    pub wall_jump_lock_time: f32,

    // === Variable jump ===
    pub hold_jump_gravity_multiplier: f32,
    pub max_hold_jump_time: f32,

    // === Probes ===
    pub ground_mask: LayerMask,
    pub ground_check_size: Vec2,
    pub wall_check_size: Vec2,
    pub check_distance: f32,

    // === Anti double-jump ===
    pub ignore_grounded_after_jump: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(0.8, 1.0),
            mass: 1.0,
            gravity_scale: 3.0,

            max_speed: 8.0,
            ground_acceleration: 70.0,
            ground_deceleration: 90.0,
            air_acceleration: 45.0,
            air_deceleration: 35.0,

            jump_velocity: 14.0,
            coyote_time: 0.10,
            jump_buffer_time: 0.10,
            jump_cut_multiplier: 0.55,

            fall_gravity_multiplier: 2.0,
            max_fall_speed: 22.0,

            enable_wall_jump: true,
            wall_slide_max_fall_speed: 4.5,
            wall_jump_x_velocity: 9.0,
            wall_jump_y_velocity: 14.0,
            wall_jump_lock_time: 0.12,

            hold_jump_gravity_multiplier: 0.55,
            max_hold_jump_time: 0.18,

            ground_mask: LayerMask::GROUND,
            ground_check_size: Vec2::new(0.65, 0.10),
            wall_check_size: Vec2::new(0.10, 0.9),
            check_distance: 0.05,

            ignore_grounded_after_jump: 0.08,
        }
    }
}

impl MovementConfig {
    /// Scaled gravity acceleration (negative)
    #[inline]
    pub fn gravity(&self) -> f32 {
        BASE_GRAVITY * self.gravity_scale
    }
}

/// Which jump fired on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    Ground,
    /// Pushed away from a wall on the given side (-1 left, +1 right)
    Wall { wall_direction: i8 },
}

/// What the ability system may know about the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementStatus {
    pub grounded: bool,
    pub on_wall: bool,
    pub last_jump_step: Option<u64>,
}

/// Controller state; velocity lives on the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMovement {
    pub config: MovementConfig,

    grounded: bool,
    raw_grounded: bool,
    on_wall_left: bool,
    on_wall_right: bool,
    /// -1 left, +1 right, 0 none (only while airborne)
    wall_direction: i8,

    coyote_timer: f32,
    jump_buffer_timer: f32,
    hold_jump_timer: f32,
    wall_jump_lock_timer: f32,
    ignore_grounded_timer: f32,
    is_jumping: bool,

    last_jump_step: Option<u64>,
}

impl PlayerMovement {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            grounded: false,
            raw_grounded: false,
            on_wall_left: false,
            on_wall_right: false,
            wall_direction: 0,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            hold_jump_timer: 0.0,
            wall_jump_lock_timer: 0.0,
            ignore_grounded_timer: 0.0,
            is_jumping: false,
            last_jump_step: None,
        }
    }

    /// Forget all timers and contacts (run restart)
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_on_wall(&self) -> bool {
        !self.grounded && self.wall_direction != 0
    }

    pub fn on_wall_left(&self) -> bool {
        self.on_wall_left
    }

    pub fn on_wall_right(&self) -> bool {
        self.on_wall_right
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn last_jump_step(&self) -> Option<u64> {
        self.last_jump_step
    }

    pub fn jump_buffer_timer(&self) -> f32 {
        self.jump_buffer_timer
    }

    pub fn coyote_timer(&self) -> f32 {
        self.coyote_timer
    }

    pub fn status(&self) -> MovementStatus {
        MovementStatus {
            grounded: self.is_grounded(),
            on_wall: self.is_on_wall(),
            last_jump_step: self.last_jump_step,
        }
    }

    /// Drop any pending buffered press (another system consumed it)
    pub fn consume_jump_buffer(&mut self) {
        self.jump_buffer_timer = 0.0;
    }

    /// Run one fixed step. Returns the jump that fired, if any.
    pub fn step<Q: CollisionQuery + ?Sized>(
        &mut self,
        body: &mut Body,
        input: &StepInput,
        world: &Q,
        step_index: u64,
        dt: f32,
    ) -> Option<JumpKind> {
        // 2. Jump buffer and anti double-jump window
        if input.jump_pressed {
            self.jump_buffer_timer = self.config.jump_buffer_time;
        } else {
            self.jump_buffer_timer = (self.jump_buffer_timer - dt).max(0.0);
        }
        if self.ignore_grounded_timer > 0.0 {
            self.ignore_grounded_timer = (self.ignore_grounded_timer - dt).max(0.0);
        }

        // 3. Contacts
        self.update_contacts(body, world);

        // 4. Coyote
        if self.grounded {
            self.coyote_timer = self.config.coyote_time;
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }

        // 5. Intent
        let want_jump = self.jump_buffer_timer > 0.0 && self.coyote_timer > 0.0;
        let want_wall_jump = self.jump_buffer_timer > 0.0
            && self.config.enable_wall_jump
            && !self.grounded
            && self.wall_direction != 0;

        // 6. Horizontal
        self.move_horizontally(body, input.axis, dt);

        // 7. Jump execution, ground first
        let jumped = if want_jump {
            body.vel.y = self.config.jump_velocity;
            self.coyote_timer = 0.0;
            self.start_jump(step_index);
            Some(JumpKind::Ground)
        } else if want_wall_jump {
            let wall_direction = self.wall_direction;
            body.vel = Vec2::new(
                -(wall_direction as f32) * self.config.wall_jump_x_velocity,
                self.config.wall_jump_y_velocity,
            );
            self.wall_jump_lock_timer = self.config.wall_jump_lock_time;
            self.start_jump(step_index);
            Some(JumpKind::Wall { wall_direction })
        } else {
            None
        };

        // 8. Jump cut
        self.apply_jump_cut(body, input.jump_released);

        // 9. Wall slide
        if self.config.enable_wall_jump
            && !self.grounded
            && self.wall_direction != 0
            && body.vel.y < 0.0
        {
            body.vel.y = body.vel.y.max(-self.config.wall_slide_max_fall_speed);
        }

        // 10. Gravity
        self.apply_gravity(body, input.jump_held, dt);

        if self.wall_jump_lock_timer > 0.0 {
            self.wall_jump_lock_timer = (self.wall_jump_lock_timer - dt).max(0.0);
        }
        if self.hold_jump_timer > 0.0 {
            self.hold_jump_timer = (self.hold_jump_timer - dt).max(0.0);
        }

        jumped
    }

    fn start_jump(&mut self, step_index: u64) {
        self.is_jumping = true;
        self.hold_jump_timer = self.config.max_hold_jump_time;
        self.jump_buffer_timer = 0.0;
        self.ignore_grounded_timer = self.config.ignore_grounded_after_jump;
        self.last_jump_step = Some(step_index);
        self.grounded = false;
    }

    /// Probe ground and walls around the body's box
    pub fn update_contacts<Q: CollisionQuery + ?Sized>(&mut self, body: &Body, world: &Q) {
        let cfg = &self.config;
        let bounds = body.aabb();
        let center = bounds.center();

        let ground_center = Vec2::new(center.x, bounds.min.y - cfg.check_distance);
        self.raw_grounded = world.overlap_box(ground_center, cfg.ground_check_size, cfg.ground_mask);

        // Touching ground while not rising ends the lockout early
        if self.raw_grounded && body.vel.y <= 0.01 {
            self.ignore_grounded_timer = 0.0;
        }
        self.grounded = self.raw_grounded && self.ignore_grounded_timer <= 0.0;

        let left_center = Vec2::new(bounds.min.x - cfg.check_distance, center.y);
        let right_center = Vec2::new(bounds.max.x + cfg.check_distance, center.y);
        self.on_wall_left = world.overlap_box(left_center, cfg.wall_check_size, cfg.ground_mask);
        self.on_wall_right = world.overlap_box(right_center, cfg.wall_check_size, cfg.ground_mask);

        self.wall_direction = 0;
        if !self.grounded {
            if self.on_wall_left {
                self.wall_direction = -1;
            } else if self.on_wall_right {
                self.wall_direction = 1;
            }
        }

        if self.grounded && body.vel.y <= 0.0 {
            self.is_jumping = false;
        }
    }

    /// Proportional force toward `axis * max_speed`, then clamp
    pub fn move_horizontally(&self, body: &mut Body, axis: f32, dt: f32) {
        let cfg = &self.config;
        let axis = if self.wall_jump_lock_timer > 0.0 {
            0.0
        } else {
            axis.clamp(-1.0, 1.0)
        };

        let target = axis * cfg.max_speed;
        let speed_diff = target - body.vel.x;

        // Accelerating only when input agrees with (or starts) the motion
        let accelerating = target.abs() > 0.01 && target * body.vel.x >= 0.0;
        let rate = match (self.grounded, accelerating) {
            (true, true) => cfg.ground_acceleration,
            (true, false) => cfg.ground_deceleration,
            (false, true) => cfg.air_acceleration,
            (false, false) => cfg.air_deceleration,
        };

        body.add_force(Vec2::new(rate * speed_diff * body.mass, 0.0), dt);
        body.vel.x = body.vel.x.clamp(-cfg.max_speed, cfg.max_speed);
    }

    /// Shorten the arc when the button is released while rising
    pub fn apply_jump_cut(&self, body: &mut Body, released: bool) {
        if released && body.vel.y > 0.0 {
            body.vel.y *= self.config.jump_cut_multiplier;
        }
    }

    /// Reduced gravity while holding a rising jump, heavier gravity when falling
    pub fn apply_gravity(&self, body: &mut Body, holding: bool, dt: f32) {
        let cfg = &self.config;
        let g = cfg.gravity();

        if self.is_jumping && holding && body.vel.y > 0.0 && self.hold_jump_timer > 0.0 {
            body.vel.y += g * cfg.hold_jump_gravity_multiplier * dt;
            return;
        }

        let multiplier = if body.vel.y < 0.0 {
            cfg.fall_gravity_multiplier
        } else {
            1.0
        };
        body.vel.y += g * multiplier * dt;
        body.vel.y = body.vel.y.max(-cfg.max_fall_speed);
    }
}
