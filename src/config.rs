//! Data-driven game balance
//!
//! Every tunable the game and mining layers consume lives here with its
//! documented default. Defaults are the canonical values; embedders override
//! fields before constructing a session.

use serde::{Deserialize, Serialize};

/// Physics world and entity lifecycle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Viewport width (px)
    pub width: f32,
    /// Viewport height (px)
    pub height: f32,
    /// Downward acceleration applied to dynamic bodies (px/tick²)
    pub gravity: f32,
    /// Maximum descent speed (px/tick)
    pub terminal_fall_speed: f32,
    /// One-shot vertical velocity applied on jump (px/tick, negative is up)
    pub jump_impulse: f32,
    /// Sustained vertical velocity while the fly input is held (px/tick)
    pub fly_ascent: f32,
    /// abs(vy) below this counts as standing on the floor
    pub grounded_epsilon: f32,
    /// Leftward coin drift per tick (px)
    pub scroll_speed: f32,
    /// Coins whose x falls below this are recycled to the right edge
    pub recycle_threshold: f32,
    /// Number of regular coins kept in play
    pub coin_count: usize,
    /// Ticks between golden-coin spawn trials
    pub golden_spawn_interval_ticks: u64,
    /// Per-trial golden spawn probability
    pub golden_spawn_probability: f64,
    /// Score for collecting a regular coin
    pub coin_score: u32,
    /// Score for collecting a golden coin
    pub golden_coin_score: u32,
    /// Grace period after backgrounding before forced logout (ms)
    pub background_grace_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            gravity: 0.2,
            terminal_fall_speed: 5.0,
            jump_impulse: -20.0,
            fly_ascent: -5.0,
            grounded_epsilon: 0.1,
            scroll_speed: 2.0,
            recycle_threshold: -30.0,
            coin_count: 5,
            golden_spawn_interval_ticks: 60,
            golden_spawn_probability: 0.01,
            coin_score: 1,
            golden_coin_score: 5,
            background_grace_ms: 30_000,
        }
    }
}

/// Mining reward and difficulty tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Base difficulty (leading zero hex digits) for regular coins
    pub difficulty_regular: u32,
    /// Base difficulty for golden coins
    pub difficulty_golden: u32,
    /// Base reward for regular coins
    pub reward_regular: f64,
    /// Base reward for golden coins
    pub reward_golden: f64,
    /// Attempts closer together than this extend the combo streak (ms)
    pub combo_window_ms: u64,
    /// Reward multiplier gained per combo step above 1
    pub combo_multiplier_step: f64,
    /// Difficulty rises by one per this many combo steps
    pub difficulty_combo_divisor: u32,
    /// Effective difficulty never exceeds this, bounding search cost
    pub max_difficulty: u32,
    /// Nonce bound for a single search
    pub max_nonce: u64,
    /// Wall-clock bound for a single search (ms)
    pub search_timeout_ms: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty_regular: 1,
            difficulty_golden: 2,
            reward_regular: 0.0001,
            reward_golden: 0.001,
            combo_window_ms: 10_000,
            combo_multiplier_step: 0.1,
            difficulty_combo_divisor: 10,
            max_difficulty: 4,
            max_nonce: 1_000_000,
            search_timeout_ms: 5_000,
        }
    }
}
