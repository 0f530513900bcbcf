//! Gravity-driven body simulation
//!
//! The world owns every body, advances them in fixed timesteps, resolves the
//! one solid interaction the game has (dynamic bodies landing on static
//! slabs), and reports sensor overlaps edge-triggered: a pair is reported on
//! the step it starts touching and never again while contact persists.
//!
//! Input-driven motion (jump, fly, coin drift) goes through the kinematic
//! overrides [`World::set_velocity`] / [`World::set_position`] instead of
//! force integration. Arcade control, not realistic dynamics.

use std::collections::HashSet;

use glam::Vec2;

use super::body::{Body, BodyHandle};
use crate::consts::TICK_MS;

/// A sensor overlap that started this step. `a` is the dynamic body,
/// `b` the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The physics world (one per game session)
pub struct World {
    gravity: Vec2,
    terminal_fall_speed: f32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Sensor pairs overlapping as of the previous step
    touching: HashSet<(BodyHandle, BodyHandle)>,
}

impl World {
    pub fn new(gravity: Vec2, terminal_fall_speed: f32) -> Self {
        Self {
            gravity,
            terminal_fall_speed,
            slots: Vec::new(),
            free: Vec::new(),
            touching: HashSet::new(),
        }
    }

    /// Insert a body into the simulated set
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle {
                index: self.slots.len() as u32 - 1,
                generation: 0,
            }
        }
    }

    /// Remove a body. Stale handles are ignored, so removing twice is a no-op.
    pub fn remove_body(&mut self, handle: BodyHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation || slot.body.is_none() {
            return;
        }
        slot.body = None;
        slot.generation += 1;
        self.free.push(handle.index);
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Kinematic velocity override (jump/fly input)
    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.vel = vel;
        }
    }

    /// Kinematic position override (coin drift/recycle)
    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.pos = pos;
        }
    }

    /// Live bodies with their handles
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// Advance the simulation by `dt_ms` and return the sensor contacts that
    /// started this step.
    ///
    /// Order: gravity integration with the terminal-fall clamp, position
    /// update, solid contact resolution, then edge-triggered sensor overlap
    /// detection.
    pub fn step(&mut self, dt_ms: f32) -> Vec<Contact> {
        let k = dt_ms / TICK_MS;

        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            if body.is_static {
                continue;
            }
            body.vel += self.gravity * k;
            if body.vel.y > self.terminal_fall_speed {
                body.vel.y = self.terminal_fall_speed;
            }
            body.pos += body.vel * k;
        }

        self.resolve_solid_contacts();
        self.detect_sensor_contacts()
    }

    /// Land dynamic bodies on static solid slabs: snap to the slab top and
    /// zero any downward velocity.
    fn resolve_solid_contacts(&mut self) {
        let slabs: Vec<(Vec2, Vec2)> = self
            .bodies()
            .filter(|(_, b)| b.is_static && !b.is_sensor)
            .map(|(_, b)| b.aabb())
            .collect();

        for slot in &mut self.slots {
            let Some(body) = slot.body.as_mut() else {
                continue;
            };
            if body.is_static || body.is_sensor {
                continue;
            }
            let half = body.shape.half_extents();
            for &(slab_min, slab_max) in &slabs {
                let (bmin, bmax) = body.aabb();
                let overlapping = bmin.x < slab_max.x
                    && bmax.x > slab_min.x
                    && bmin.y < slab_max.y
                    && bmax.y > slab_min.y;
                if overlapping && body.vel.y >= 0.0 {
                    body.pos.y = slab_min.y - half.y;
                    body.vel.y = 0.0;
                }
            }
        }
    }

    /// Report sensor overlaps that were not present on the previous step.
    fn detect_sensor_contacts(&mut self) -> Vec<Contact> {
        let dynamics: Vec<BodyHandle> = self
            .bodies()
            .filter(|(_, b)| !b.is_static && !b.is_sensor)
            .map(|(h, _)| h)
            .collect();
        let sensors: Vec<BodyHandle> = self
            .bodies()
            .filter(|(_, b)| b.is_sensor)
            .map(|(h, _)| h)
            .collect();

        let mut contacts = Vec::new();
        let mut touching = HashSet::new();
        for &a in &dynamics {
            for &b in &sensors {
                let (Some(body_a), Some(body_b)) = (self.body(a), self.body(b)) else {
                    continue;
                };
                if !body_a.overlaps(body_b) {
                    continue;
                }
                if !self.touching.contains(&(a, b)) {
                    contacts.push(Contact { a, b });
                }
                touching.insert((a, b));
            }
        }
        // Pairs involving removed bodies drop out here, so a reused slot
        // starts with a clean edge.
        self.touching = touching;
        contacts
    }
}
