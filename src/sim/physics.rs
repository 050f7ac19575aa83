//! Minimal 2D body and box-query layer
//!
//! Stands in for the engine collaborator: axis-aligned box overlap queries
//! against a layer mask, and a single velocity write + position integration
//! per fixed step. Bodies are resolved against solids one axis at a time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazards::EntityId;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Strict overlap: boxes that only touch along an edge do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// Collision layer bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const GROUND: LayerMask = LayerMask(1);
    pub const HAZARD: LayerMask = LayerMask(1 << 1);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// Synchronous, side-effect-free geometric queries
pub trait CollisionQuery {
    /// True if any collider on `mask` overlaps the box at `center` with `size`
    fn overlap_box(&self, center: Vec2, size: Vec2, mask: LayerMask) -> bool;
}

/// What a solid belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidOwner {
    /// Static tile run of a span
    Tiles,
    /// A falling platform object
    Falling(EntityId),
}

/// A collider the player can stand on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solid {
    pub aabb: Aabb,
    pub owner: SolidOwner,
    pub layer: LayerMask,
}

/// Flat list of colliders rebuilt each fixed step
#[derive(Debug, Clone, Default)]
pub struct SolidSet {
    pub solids: Vec<Solid>,
}

impl SolidSet {
    pub fn new() -> Self {
        Self { solids: Vec::new() }
    }

    pub fn push(&mut self, aabb: Aabb, owner: SolidOwner) {
        self.solids.push(Solid {
            aabb,
            owner,
            layer: LayerMask::GROUND,
        });
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }
}

impl CollisionQuery for SolidSet {
    fn overlap_box(&self, center: Vec2, size: Vec2, mask: LayerMask) -> bool {
        let probe = Aabb::from_center_size(center, size);
        self.solids
            .iter()
            .any(|s| s.layer.intersects(mask) && s.aabb.overlaps(&probe))
    }
}

/// Dynamic box body (the player)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub half_extents: Vec2,
    pub mass: f32,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2, mass: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            half_extents: size * 0.5,
            mass: mass.max(0.0001),
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos - self.half_extents, self.pos + self.half_extents)
    }

    /// Bottom-center point
    #[inline]
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - self.half_extents.y)
    }

    /// Apply a continuous force for one step (F = m·a)
    #[inline]
    pub fn add_force(&mut self, force: Vec2, dt: f32) {
        self.vel += force / self.mass * dt;
    }
}

/// Which side of a solid the body was pushed out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSide {
    /// Body landed on top
    Top,
    Bottom,
    Left,
    Right,
}

/// A resolved contact between the body and a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub owner: SolidOwner,
    pub side: ContactSide,
}

/// Penetration below this depth on the cross axis is rounding, not a hit
const CONTACT_SKIN: f32 = 1e-4;

/// Overlap depth of two boxes along one axis
fn overlap_depth(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> f32 {
    a_max.min(b_max) - a_min.max(b_min)
}

/// Integrate the body's velocity and resolve penetration, x axis first
///
/// Returns the contacts resolved this step so callers can react to them
/// (e.g. trigger falling platforms).
pub fn move_and_collide(body: &mut Body, solids: &SolidSet, dt: f32) -> Vec<Contact> {
    let mut contacts = Vec::new();

    // Horizontal pass
    body.pos.x += body.vel.x * dt;
    for solid in &solids.solids {
        let aabb = body.aabb();
        if !aabb.overlaps(&solid.aabb)
            || overlap_depth(aabb.min.y, aabb.max.y, solid.aabb.min.y, solid.aabb.max.y) < CONTACT_SKIN
        {
            continue;
        }
        if body.vel.x > 0.0 || (body.vel.x == 0.0 && aabb.center().x < solid.aabb.center().x) {
            body.pos.x = solid.aabb.min.x - body.half_extents.x;
            contacts.push(Contact {
                owner: solid.owner,
                side: ContactSide::Left,
            });
        } else {
            body.pos.x = solid.aabb.max.x + body.half_extents.x;
            contacts.push(Contact {
                owner: solid.owner,
                side: ContactSide::Right,
            });
        }
        body.vel.x = 0.0;
    }

    // Vertical pass
    body.pos.y += body.vel.y * dt;
    for solid in &solids.solids {
        let aabb = body.aabb();
        if !aabb.overlaps(&solid.aabb)
            || overlap_depth(aabb.min.x, aabb.max.x, solid.aabb.min.x, solid.aabb.max.x) < CONTACT_SKIN
        {
            continue;
        }
        if body.vel.y <= 0.0 {
            body.pos.y = solid.aabb.max.y + body.half_extents.y;
            contacts.push(Contact {
                owner: solid.owner,
                side: ContactSide::Top,
            });
        } else {
            body.pos.y = solid.aabb.min.y - body.half_extents.y;
            contacts.push(Contact {
                owner: solid.owner,
                side: ContactSide::Bottom,
            });
        }
        body.vel.y = 0.0;
    }

    contacts
}
