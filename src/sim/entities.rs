//! Entity arena and spawn/recycle policy
//!
//! Maps game-level semantics (character, floor, coin, golden coin) onto
//! world bodies. Entities live in a generational slot arena with a free
//! list, so removing a collected coin and inserting its replacement is O(1)
//! slot reuse and stale references never resolve.
//!
//! Spawn policy, in the order it runs each tick:
//! - every coin drifts left by the scroll speed; one that crosses the left
//!   threshold is recycled in place (repositioned to the right edge, handle
//!   identity preserved)
//! - on the golden interval, one Bernoulli trial may spawn a golden coin at
//!   the right edge
//! - a collected regular coin frees its slot and a replacement is inserted
//!   at the right edge, keeping the population constant; golden coins are
//!   not replaced

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyHandle, BodyKind, Shape};
use super::world::World;
use crate::config::WorldConfig;
use crate::consts::*;

/// Stable handle into the entity arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

/// Pairs a world body with the kind the renderer maps to a sprite
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    pub body: BodyHandle,
    pub kind: BodyKind,
}

struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Entity lifecycle manager for one session
pub struct Entities {
    slots: Vec<Slot>,
    free: Vec<u32>,
    character: BodyHandle,
}

impl Entities {
    /// Populate a fresh world: full-width static floor, one dynamic
    /// character, and the initial coins staggered into the jumpable band.
    pub fn setup(world: &mut World, config: &WorldConfig, rng: &mut Pcg32) -> Self {
        let floor = world.add_body(
            Body::new(
                BodyKind::Floor,
                Shape::Rect {
                    width: config.width,
                    height: FLOOR_HEIGHT,
                },
                Vec2::new(config.width / 2.0, config.height - FLOOR_HEIGHT / 2.0),
            )
            .fixed(),
        );
        let character = world.add_body(Body::new(
            BodyKind::Character,
            Shape::Rect {
                width: CHARACTER_SIZE,
                height: CHARACTER_SIZE,
            },
            Vec2::new(
                config.width * CHARACTER_X_FRACTION,
                config.height - COIN_BAND_OFFSET,
            ),
        ));

        let mut entities = Self {
            slots: Vec::new(),
            free: Vec::new(),
            character,
        };
        entities.insert(Entity {
            body: floor,
            kind: BodyKind::Floor,
        });
        entities.insert(Entity {
            body: character,
            kind: BodyKind::Character,
        });

        for i in 0..config.coin_count {
            let pos = Vec2::new(
                config.width / 2.0 + i as f32 * COIN_SPACING,
                coin_band_y(config, rng),
            );
            let body = spawn_coin_body(world, pos, false);
            entities.insert(Entity {
                body,
                kind: BodyKind::Coin,
            });
        }
        entities
    }

    pub fn character_body(&self) -> BodyHandle {
        self.character
    }

    /// Leftward drift and off-screen recycling for every collectible.
    ///
    /// Recycling repositions the existing body at the right edge with a new
    /// random height; the body handle and entity slot are untouched.
    pub fn scroll_pass(&mut self, world: &mut World, config: &WorldConfig, rng: &mut Pcg32) {
        for slot in &self.slots {
            let Some(entity) = &slot.entity else {
                continue;
            };
            if !entity.kind.is_collectible() {
                continue;
            }
            let Some(body) = world.body(entity.body) else {
                continue;
            };
            let mut pos = body.pos;
            if pos.x < config.recycle_threshold {
                pos.x = config.width + RESPAWN_MARGIN_X;
                pos.y = config.height / 4.0 + rng.random_range(0.0..config.height / 2.0);
            } else {
                pos.x -= config.scroll_speed;
            }
            world.set_position(entity.body, pos);
        }
    }

    /// One Bernoulli spawn trial for a golden coin. The driver calls this on
    /// the golden interval; most trials spawn nothing.
    pub fn golden_spawn_trial(
        &mut self,
        world: &mut World,
        config: &WorldConfig,
        rng: &mut Pcg32,
    ) -> bool {
        if rng.random::<f64>() >= config.golden_spawn_probability {
            return false;
        }
        let band = (config.height - GOLDEN_BAND_MARGIN).max(1.0);
        let pos = Vec2::new(
            config.width + GOLDEN_SPAWN_MARGIN_X,
            GOLDEN_MIN_Y + rng.random_range(0.0..band),
        );
        let body = spawn_coin_body(world, pos, true);
        self.insert(Entity {
            body,
            kind: BodyKind::GoldenCoin,
        });
        log::debug!("golden coin spawned at y={:.0}", pos.y);
        true
    }

    /// Resolve a sensor contact against the arena.
    ///
    /// Removes the coin's body from the world, frees its slot, and for a
    /// regular coin inserts a replacement at the right edge. Returns the
    /// collected kind. A handle that no longer maps to a live collectible
    /// (already collected, slot reused) resolves to `None`, which is what
    /// makes duplicate contact events inert.
    pub fn collect(
        &mut self,
        world: &mut World,
        body: BodyHandle,
        config: &WorldConfig,
        rng: &mut Pcg32,
    ) -> Option<BodyKind> {
        let (id, kind) = self.slots.iter().enumerate().find_map(|(i, slot)| {
            let entity = slot.entity.as_ref()?;
            (entity.body == body && entity.kind.is_collectible()).then_some((
                EntityId {
                    index: i as u32,
                    generation: slot.generation,
                },
                entity.kind,
            ))
        })?;

        world.remove_body(body);
        self.remove(id);

        if kind == BodyKind::Coin {
            let pos = Vec2::new(
                config.width + rng.random_range(0.0..RESPAWN_JITTER_X),
                coin_band_y(config, rng),
            );
            let replacement = spawn_coin_body(world, pos, false);
            self.insert(Entity {
                body: replacement,
                kind: BodyKind::Coin,
            });
        }
        Some(kind)
    }

    /// Live entities with their ids
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entity.as_ref().map(|entity| {
                (
                    EntityId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    entity,
                )
            })
        })
    }

    pub fn count_of(&self, kind: BodyKind) -> usize {
        self.iter().filter(|(_, e)| e.kind == kind).count()
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            EntityId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                entity: Some(entity),
            });
            EntityId {
                index: self.slots.len() as u32 - 1,
                generation: 0,
            }
        }
    }

    fn remove(&mut self, id: EntityId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.entity.is_none() {
            return;
        }
        slot.entity = None;
        slot.generation += 1;
        self.free.push(id.index);
    }
}

/// Random height inside the band the character can reach with a jump
fn coin_band_y(config: &WorldConfig, rng: &mut Pcg32) -> f32 {
    config.height - COIN_BAND_OFFSET + rng.random_range(0.0..COIN_BAND_JITTER)
}

fn spawn_coin_body(world: &mut World, pos: Vec2, golden: bool) -> BodyHandle {
    let kind = if golden {
        BodyKind::GoldenCoin
    } else {
        BodyKind::Coin
    };
    world.add_body(
        Body::new(kind, Shape::Circle { radius: COIN_RADIUS }, pos)
            .fixed()
            .sensor(),
    )
}
