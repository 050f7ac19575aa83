//! Vertical follow camera
//!
//! Follows the player upward only and never scrolls back down. The view is
//! orthographic: `half_height` world units above and below the center,
//! `half_height * aspect` to each side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::placer::HorizontalWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Orthographic half height (world units)
    pub half_height: f32,
    /// Width / height
    pub aspect: f32,
    /// Camera center sits this far above the player
    pub y_offset: f32,
    /// Locked horizontal center
    pub fixed_x: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            half_height: 9.0,
            aspect: 0.75,
            y_offset: 1.5,
            fixed_x: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub config: CameraConfig,
    pub pos: Vec2,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let pos = Vec2::new(config.fixed_x, 0.0);
        Self { config, pos }
    }

    /// Snap to the player (run start)
    pub fn reset(&mut self, player: Vec2) {
        self.pos = Vec2::new(self.config.fixed_x, player.y + self.config.y_offset);
    }

    /// Move up toward the player, never down
    pub fn follow(&mut self, player: Vec2) {
        let desired = player.y + self.config.y_offset;
        if desired > self.pos.y {
            self.pos.y = desired;
        }
        self.pos.x = self.config.fixed_x;
    }

    pub fn top(&self) -> f32 {
        self.pos.y + self.config.half_height
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y - self.config.half_height
    }

    pub fn half_width(&self) -> f32 {
        self.config.half_height * self.config.aspect
    }

    /// Placement window with `edge_padding` trimmed from both sides
    pub fn window(&self, edge_padding: f32) -> HorizontalWindow {
        HorizontalWindow::from_camera(
            self.pos.x,
            self.config.half_height,
            self.config.aspect,
            edge_padding,
        )
    }
}
