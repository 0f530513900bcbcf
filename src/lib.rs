//! Coin Runner - a side-scrolling collection game core with a mining mini-game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics world, bodies, entity lifecycle)
//! - `mining`: Proof-of-work reward gate (combo tracker, hash search, orchestrator)
//! - `session`: Game loop driver and session lifecycle
//! - `storage` / `ledger`: Boundary contracts for persistence and reward accounting
//! - `config`: Data-driven game balance

pub mod config;
pub mod ledger;
pub mod mining;
pub mod session;
pub mod sim;
pub mod storage;

pub use config::{MiningConfig, WorldConfig};
pub use session::{GameSession, HudSnapshot, SessionEvent, TickInput};

/// Game geometry and timing constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const TICK_MS: f32 = 16.666;
    /// Nominal ticks per second
    pub const TICKS_PER_SECOND: u64 = 60;

    /// Character body is a square of this size (px)
    pub const CHARACTER_SIZE: f32 = 72.0;
    /// Character starts at this fraction of the viewport width
    pub const CHARACTER_X_FRACTION: f32 = 0.25;
    /// Coin sensor radius (px)
    pub const COIN_RADIUS: f32 = 15.0;
    /// Floor slab height (px)
    pub const FLOOR_HEIGHT: f32 = 60.0;

    /// Horizontal gap between the initial coins (px)
    pub const COIN_SPACING: f32 = 200.0;
    /// Top of the jumpable coin band, measured up from the viewport bottom (px)
    pub const COIN_BAND_OFFSET: f32 = 250.0;
    /// Random vertical jitter within the jumpable band (px)
    pub const COIN_BAND_JITTER: f32 = 50.0;

    /// Golden coins spawn at least this far below the viewport top (px)
    pub const GOLDEN_MIN_Y: f32 = 100.0;
    /// Vertical clearance the golden band keeps above the floor (px)
    pub const GOLDEN_BAND_MARGIN: f32 = 400.0;
    /// Margin past the right edge where golden coins enter (px)
    pub const GOLDEN_SPAWN_MARGIN_X: f32 = 50.0;

    /// Margin past the right edge where recycled coins re-enter (px)
    pub const RESPAWN_MARGIN_X: f32 = 30.0;
    /// Horizontal jitter for coins respawned after collection (px)
    pub const RESPAWN_JITTER_X: f32 = 100.0;
}
