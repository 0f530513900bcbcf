//! Physical bodies and their shapes
//!
//! A body is position + velocity + shape plus the game-level kind tag the
//! collision handler dispatches on. Bodies are owned exclusively by the
//! [`World`](super::world::World); everything else refers to them through
//! generational [`BodyHandle`]s.

use glam::Vec2;

/// Game-level body classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Character,
    Floor,
    Coin,
    GoldenCoin,
}

impl BodyKind {
    /// True for kinds the character can collect
    pub fn is_collectible(self) -> bool {
        matches!(self, BodyKind::Coin | BodyKind::GoldenCoin)
    }
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl Shape {
    /// Axis-aligned half extents of the shape's bounding box
    #[inline]
    pub fn half_extents(self) -> Vec2 {
        match self {
            Shape::Rect { width, height } => Vec2::new(width / 2.0, height / 2.0),
            Shape::Circle { radius } => Vec2::splat(radius),
        }
    }
}

/// Handle into the world's body arena.
///
/// Handles carry the slot generation, so a handle to a removed body (or to a
/// slot that has since been reused) never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A simulated body
#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub kind: BodyKind,
    /// Static bodies ignore gravity and never move on their own
    pub is_static: bool,
    /// Sensors detect overlap without physical collision response
    pub is_sensor: bool,
}

impl Body {
    pub fn new(kind: BodyKind, shape: Shape, pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            shape,
            kind,
            is_static: false,
            is_sensor: false,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    /// Bounding box as (min, max) corners
    pub fn aabb(&self) -> (Vec2, Vec2) {
        let half = self.shape.half_extents();
        (self.pos - half, self.pos + half)
    }

    /// Overlap test between two bodies
    pub fn overlaps(&self, other: &Body) -> bool {
        match (self.shape, other.shape) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                self.pos.distance_squared(other.pos) < (ra + rb) * (ra + rb)
            }
            (Shape::Rect { .. }, Shape::Circle { radius }) => {
                circle_rect_overlap(other.pos, radius, self)
            }
            (Shape::Circle { radius }, Shape::Rect { .. }) => {
                circle_rect_overlap(self.pos, radius, other)
            }
            (Shape::Rect { .. }, Shape::Rect { .. }) => {
                let (amin, amax) = self.aabb();
                let (bmin, bmax) = other.aabb();
                amin.x < bmax.x && amax.x > bmin.x && amin.y < bmax.y && amax.y > bmin.y
            }
        }
    }
}

/// Circle vs axis-aligned rect: clamp the center to the rect, compare the
/// clamped distance against the radius.
fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Body) -> bool {
    let (min, max) = rect.aabb();
    let closest = center.clamp(min, max);
    center.distance_squared(closest) < radius * radius
}
