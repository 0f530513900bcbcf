//! External reward ledger boundary
//!
//! Reward accounting lives in an external contract; the core only sees this
//! trait. Calls on the game path are best-effort: implementations must
//! return promptly (slow transports queue internally) and their failures
//! never roll back local stats. Only user-initiated withdrawal surfaces
//! errors to the player.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("reward ledger not configured")]
    NotConfigured,
    #[error("ledger transaction failed: {0}")]
    Transaction(String),
}

/// Reward accounting contract
pub trait RewardLedger: Send + Sync {
    /// Credit a mined reward to the player. `Ok(false)` means the ledger
    /// rejected the credit without a transport error.
    fn add_reward(&self, address: &str, amount: f64) -> Result<bool, LedgerError>;
    fn pending_rewards(&self, address: &str) -> Result<f64, LedgerError>;
    fn min_withdraw_amount(&self) -> Result<f64, LedgerError>;
    /// `Ok(false)` when the pending balance is below the minimum.
    fn withdraw_rewards(&self, address: &str) -> Result<bool, LedgerError>;
}

/// In-process accumulator standing in for the contract client, used by the
/// demo binary and tests.
#[derive(Debug)]
pub struct LocalLedger {
    pending: Mutex<HashMap<String, f64>>,
    min_withdraw: f64,
}

impl LocalLedger {
    pub fn new(min_withdraw: f64) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            min_withdraw,
        }
    }
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl RewardLedger for LocalLedger {
    fn add_reward(&self, address: &str, amount: f64) -> Result<bool, LedgerError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        *pending.entry(address.to_string()).or_insert(0.0) += amount;
        Ok(true)
    }

    fn pending_rewards(&self, address: &str) -> Result<f64, LedgerError> {
        let pending = self
            .pending
            .lock()
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        Ok(pending.get(address).copied().unwrap_or(0.0))
    }

    fn min_withdraw_amount(&self) -> Result<f64, LedgerError> {
        Ok(self.min_withdraw)
    }

    fn withdraw_rewards(&self, address: &str) -> Result<bool, LedgerError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        let balance = pending.get(address).copied().unwrap_or(0.0);
        if balance < self.min_withdraw {
            return Ok(false);
        }
        pending.insert(address.to_string(), 0.0);
        Ok(true)
    }
}
