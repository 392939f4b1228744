//! Per-(user, ticker) balance and the transfer-info record materialized by
//! an inscribe-transfer (spec §3 "User/ticker balance", "Transfer info").

use crate::decimal::Decimal;
use crate::script::ScriptKey;
use std::collections::HashMap;

/// Materialized when an inscribe-transfer is validated; consumed when the
/// corresponding inscription is spent.
#[derive(Debug, Clone)]
pub struct TransferInfo {
  pub owner: ScriptKey,
  pub ticker: String,
  pub amount: Decimal,
  pub create_idx_key: u64,
}

#[derive(Debug, Clone)]
pub struct UserTickerBalance {
  pub owner: ScriptKey,
  pub ticker: String,
  pub available: Decimal,
  pub available_safe: Decimal,
  pub transferable: Decimal,
  /// `create_idx_key -> TransferInfo`, the live (unspent) transfer
  /// inscriptions this user currently holds for this ticker.
  pub valid_transfers: HashMap<u64, TransferInfo>,

  pub history: Vec<u32>,
  pub history_mint: Vec<u32>,
  pub history_inscribe_transfer: Vec<u32>,
  pub history_send: Vec<u32>,
  pub history_receive: Vec<u32>,
}

impl UserTickerBalance {
  pub fn new(owner: ScriptKey, ticker: String, decimal: u8) -> Self {
    Self {
      owner,
      ticker,
      available: Decimal::zero(decimal),
      available_safe: Decimal::zero(decimal),
      transferable: Decimal::zero(decimal),
      valid_transfers: HashMap::new(),
      history: Vec::new(),
      history_mint: Vec::new(),
      history_inscribe_transfer: Vec::new(),
      history_send: Vec::new(),
      history_receive: Vec::new(),
    }
  }

  pub fn is_empty_balance(&self) -> bool {
    self.available.sign() == 0 && self.transferable.sign() == 0
  }

  /// spec §3 invariant: `available >= 0`, `transferable >= 0`,
  /// `available_safe <= available`, `transferable == sum(valid_transfers)`.
  #[cfg(test)]
  pub(crate) fn check_invariants(&self) -> bool {
    if self.available.sign() < 0 || self.transferable.sign() < 0 {
      return false;
    }
    if self.available_safe.cmp(&self.available) == std::cmp::Ordering::Greater {
      return false;
    }
    let mut sum = Decimal::zero(self.available.precision());
    for t in self.valid_transfers.values() {
      sum = sum.checked_add(&t.amount).unwrap();
    }
    sum == self.transferable
  }
}
