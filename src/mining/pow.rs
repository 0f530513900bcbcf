//! Hash-based reward gate
//!
//! Simulated proof-of-work: search for a nonce whose SHA-256 digest starts
//! with `difficulty` zero hex digits. The search is the synchronous gate on
//! reward issuance, so it is bounded both by a nonce limit and a wall-clock
//! timeout; hitting either bound reports failure.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::MiningConfig;

/// Timeout is checked once per this many nonces
const TIMEOUT_CHECK_BATCH: u64 = 1024;

/// Inputs captured at attempt time
#[derive(Debug, Clone)]
pub struct SearchParams<'a> {
    pub address: &'a str,
    pub is_golden: bool,
    pub combo: u32,
    pub timestamp_ms: u64,
}

/// Outcome of one bounded search. On failure, `hash`/`nonce` carry the last
/// tried values.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningResult {
    pub success: bool,
    pub hash: Option<String>,
    pub nonce: Option<u64>,
    pub reward: Option<f64>,
}

impl MiningResult {
    fn failure(hash: Option<String>, nonce: Option<u64>) -> Self {
        Self {
            success: false,
            hash,
            nonce,
            reward: None,
        }
    }
}

/// Difficulty rises with the streak and is capped to bound search cost
pub fn effective_difficulty(config: &MiningConfig, is_golden: bool, combo: u32) -> u32 {
    let base = if is_golden {
        config.difficulty_golden
    } else {
        config.difficulty_regular
    };
    (base + combo / config.difficulty_combo_divisor).min(config.max_difficulty)
}

/// Linear combo scaling over the base reward
pub fn reward_for_combo(config: &MiningConfig, is_golden: bool, combo: u32) -> f64 {
    let base = if is_golden {
        config.reward_golden
    } else {
        config.reward_regular
    };
    base * (1.0 + combo.saturating_sub(1) as f64 * config.combo_multiplier_step)
}

/// Domain separation between the two attempt kinds
fn domain(is_golden: bool) -> &'static str {
    if is_golden { "golden-coin" } else { "coin" }
}

fn attempt_message(params: &SearchParams, nonce: u64) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        params.address,
        nonce,
        params.timestamp_ms,
        domain(params.is_golden),
        params.combo
    )
}

/// Run one bounded nonce search.
pub fn search(params: &SearchParams, config: &MiningConfig) -> MiningResult {
    let difficulty = effective_difficulty(config, params.is_golden, params.combo) as usize;
    let target = "0".repeat(difficulty);
    let deadline = Instant::now() + Duration::from_millis(config.search_timeout_ms);

    let mut last_hash = None;
    let mut nonce = 0u64;
    while nonce < config.max_nonce {
        let digest = Sha256::digest(attempt_message(params, nonce).as_bytes());
        let hash = hex::encode(digest);
        if hash.starts_with(&target) {
            return MiningResult {
                success: true,
                hash: Some(hash),
                nonce: Some(nonce),
                reward: Some(reward_for_combo(config, params.is_golden, params.combo)),
            };
        }
        last_hash = Some(hash);
        nonce += 1;
        if nonce % TIMEOUT_CHECK_BATCH == 0 && Instant::now() >= deadline {
            log::debug!("hash search timed out after {nonce} nonces");
            break;
        }
    }
    MiningResult::failure(last_hash, nonce.checked_sub(1))
}
