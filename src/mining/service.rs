//! Mining orchestration and stats persistence
//!
//! One service per session coordinates the combo tracker and the hash
//! search, keeps the cumulative stats, snapshots them to storage after
//! every successful mine, and forwards confirmed rewards best-effort to the
//! ledger. Storage and ledger failures are logged and swallowed; the
//! in-memory stats stay authoritative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::combo::ComboTracker;
use super::pow::{self, MiningResult, SearchParams};
use crate::config::MiningConfig;
use crate::ledger::{LedgerError, RewardLedger};
use crate::storage::{KeyValueStore, MINING_STATS_KEY};

/// Cumulative mining statistics, persisted after every successful mine.
/// `total_mined` never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningStats {
    pub total_mined: f64,
    pub combo: u32,
    pub difficulty: u32,
    pub last_mining_time: u64,
}

impl Default for MiningStats {
    fn default() -> Self {
        Self {
            total_mined: 0.0,
            combo: 0,
            difficulty: 1,
            last_mining_time: 0,
        }
    }
}

/// Per-session mining orchestrator
pub struct MiningService {
    address: String,
    total_mined: f64,
    combo: ComboTracker,
    store: Arc<dyn KeyValueStore>,
    ledger: Option<Box<dyn RewardLedger>>,
    config: MiningConfig,
}

impl MiningService {
    /// Loads persisted stats once; a missing key is a first run.
    ///
    /// A `ledger` of `None` runs local-only mode: rewards still accrue in
    /// stats, nothing is forwarded. Construction never fails for a missing
    /// ledger.
    pub fn new(
        address: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        ledger: Option<Box<dyn RewardLedger>>,
        config: MiningConfig,
    ) -> Self {
        let stats = load_stats(store.as_ref());
        if ledger.is_none() {
            log::info!("no reward ledger configured, mining in local-only mode");
        }
        Self {
            address: address.into(),
            total_mined: stats.total_mined,
            combo: ComboTracker::resume(config.combo_window_ms, stats.combo, stats.last_mining_time),
            store,
            ledger,
            config,
        }
    }

    /// Run one mining attempt for a collection event.
    ///
    /// The combo advances whatever the outcome. On success the reward is
    /// added to `total_mined`, the stats snapshot is persisted, and the
    /// reward is forwarded to the ledger.
    pub fn mine_coin(&mut self, is_golden: bool, now_ms: u64) -> MiningResult {
        let combo = self.combo.record_attempt(now_ms);
        let params = SearchParams {
            address: &self.address,
            is_golden,
            combo,
            timestamp_ms: now_ms,
        };
        let result = pow::search(&params, &self.config);

        if let Some(reward) = result.reward {
            self.total_mined += reward;
            log::info!(
                "mined {:.6} at combo {}x (nonce {:?})",
                reward,
                combo,
                result.nonce
            );
            self.persist();
            self.forward_reward(reward);
        }
        result
    }

    /// Snapshot copy of the current stats
    pub fn stats(&self) -> MiningStats {
        MiningStats {
            total_mined: self.total_mined,
            combo: self.combo.combo(),
            difficulty: pow::effective_difficulty(&self.config, false, self.combo.combo()),
            last_mining_time: self.combo.last_mining_time_ms(),
        }
    }

    /// Write the stats snapshot to the store. Failures are logged and
    /// swallowed.
    pub fn persist(&self) {
        let stats = self.stats();
        let json = match serde_json::to_string(&stats) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to encode mining stats: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(MINING_STATS_KEY, &json) {
            log::warn!("failed to save mining stats: {err}");
        }
    }

    /// Pending ledger balance, zero when no ledger is configured or the
    /// query fails.
    pub fn pending_rewards(&self) -> f64 {
        let Some(ledger) = &self.ledger else {
            return 0.0;
        };
        match ledger.pending_rewards(&self.address) {
            Ok(amount) => amount,
            Err(err) => {
                log::warn!("failed to query pending rewards: {err}");
                0.0
            }
        }
    }

    /// User-initiated withdrawal. Unlike the game-path calls, errors
    /// propagate so the UI can show them.
    pub fn withdraw_rewards(&self) -> Result<bool, LedgerError> {
        let ledger = self.ledger.as_deref().ok_or(LedgerError::NotConfigured)?;
        ledger.withdraw_rewards(&self.address)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn forward_reward(&self, reward: f64) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        match ledger.add_reward(&self.address, reward) {
            Ok(true) => {}
            Ok(false) => log::warn!("ledger rejected reward of {reward:.6}"),
            Err(err) => log::warn!("reward forwarding failed: {err}"),
        }
    }
}

fn load_stats(store: &dyn KeyValueStore) -> MiningStats {
    match store.get(MINING_STATS_KEY) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(stats) => stats,
            Err(err) => {
                log::warn!("corrupt mining stats, starting fresh: {err}");
                MiningStats::default()
            }
        },
        Ok(None) => MiningStats::default(),
        Err(err) => {
            log::warn!("failed to load mining stats: {err}");
            MiningStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LocalLedger;
    use crate::ledger::test_support::FailingLedger;
    use crate::storage::MemoryStore;
    use crate::storage::test_support::FailingStore;

    /// Zero base difficulty makes every attempt succeed on nonce 0
    fn forced_success() -> MiningConfig {
        MiningConfig {
            difficulty_regular: 0,
            difficulty_golden: 0,
            ..MiningConfig::default()
        }
    }

    fn service_with(
        store: Arc<dyn KeyValueStore>,
        ledger: Option<Box<dyn RewardLedger>>,
    ) -> MiningService {
        MiningService::new("0xf00d", store, ledger, forced_success())
    }

    #[test]
    fn test_first_run_starts_from_zeroed_stats() {
        let service = service_with(Arc::new(MemoryStore::new()), None);
        let stats = service.stats();
        assert_eq!(stats.total_mined, 0.0);
        assert_eq!(stats.combo, 0);
        assert_eq!(stats.last_mining_time, 0);
    }

    #[test]
    fn test_successful_mine_updates_and_persists_stats() {
        let store = Arc::new(MemoryStore::new());
        let mut service = service_with(store.clone(), None);

        let result = service.mine_coin(false, 1_000);
        assert!(result.success);
        assert!((service.stats().total_mined - 0.0001).abs() < 1e-12);

        let saved: MiningStats =
            serde_json::from_str(&store.get(MINING_STATS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved, service.stats());
    }

    #[test]
    fn test_stats_survive_a_restart() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut service = service_with(store.clone(), None);
            service.mine_coin(false, 1_000);
            service.mine_coin(false, 2_000);
        }
        let resumed = service_with(store, None);
        let stats = resumed.stats();
        assert_eq!(stats.combo, 2);
        assert_eq!(stats.last_mining_time, 2_000);
        assert!(stats.total_mined > 0.0);
    }

    #[test]
    fn test_combo_scales_reward_within_window() {
        let mut service = service_with(Arc::new(MemoryStore::new()), None);
        let first = service.mine_coin(false, 1_000).reward.unwrap();
        let second = service.mine_coin(false, 2_000).reward.unwrap();
        let third = service.mine_coin(false, 3_000).reward.unwrap();
        assert!((first - 0.0001).abs() < 1e-12);
        assert!(second > first);
        assert!((third - 0.00012).abs() < 1e-12);
    }

    #[test]
    fn test_failed_search_only_advances_combo() {
        // Impossible bounds: difficulty 4 with a two-nonce budget
        let config = MiningConfig {
            difficulty_regular: 4,
            max_nonce: 2,
            ..MiningConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let mut service = MiningService::new("0xf00d", store.clone(), None, config);

        let result = service.mine_coin(false, 1_000);
        assert!(!result.success);
        let stats = service.stats();
        assert_eq!(stats.total_mined, 0.0);
        assert_eq!(stats.combo, 1);
        assert_eq!(stats.last_mining_time, 1_000);
        // Nothing persisted without a reward
        assert!(store.get(MINING_STATS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_total_mined_is_monotone() {
        let mut service = service_with(Arc::new(MemoryStore::new()), None);
        let mut prev = 0.0;
        for i in 0..20u64 {
            service.mine_coin(i % 3 == 0, i * 500);
            let total = service.stats().total_mined;
            assert!(total >= prev);
            prev = total;
        }
    }

    #[test]
    fn test_store_failure_keeps_memory_authoritative() {
        let mut service = service_with(Arc::new(FailingStore), None);
        let result = service.mine_coin(false, 1_000);
        assert!(result.success);
        assert!((service.stats().total_mined - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_ledger_failure_does_not_roll_back_stats() {
        let mut service = service_with(
            Arc::new(MemoryStore::new()),
            Some(Box::new(FailingLedger)),
        );
        let result = service.mine_coin(false, 1_000);
        assert!(result.success);
        assert!((service.stats().total_mined - 0.0001).abs() < 1e-12);
        assert_eq!(service.pending_rewards(), 0.0);
    }

    #[test]
    fn test_rewards_forward_to_ledger() {
        let mut service = service_with(
            Arc::new(MemoryStore::new()),
            Some(Box::new(LocalLedger::default())),
        );
        service.mine_coin(false, 1_000);
        assert!((service.pending_rewards() - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_withdraw_without_ledger_reports_not_configured() {
        let service = service_with(Arc::new(MemoryStore::new()), None);
        assert!(matches!(
            service.withdraw_rewards(),
            Err(LedgerError::NotConfigured)
        ));
    }

    #[test]
    fn test_golden_reward_uses_golden_base() {
        let store = Arc::new(MemoryStore::new());
        let mut service = MiningService::new(
            "0xf00d",
            store,
            None,
            MiningConfig {
                difficulty_golden: 0,
                ..MiningConfig::default()
            },
        );
        let result = service.mine_coin(true, 1_000);
        assert_eq!(result.reward, Some(0.001));
    }
}
