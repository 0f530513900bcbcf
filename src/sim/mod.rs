//! Deterministic simulation module
//!
//! All gameplay physics lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod body;
pub mod entities;
pub mod world;

pub use body::{Body, BodyHandle, BodyKind, Shape};
pub use entities::{Entities, Entity, EntityId};
pub use world::{Contact, World};
