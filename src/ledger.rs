//! The base-protocol ledger: every user's balance in every ticker, kept
//! two-way indexed (user->ticker and ticker->user) the same way
//! `ModuleInfo` indexes its sub-ledger (spec Design Notes: model
//! bidirectional lookups as keyed maps, never shared pointers, since
//! nothing here needs to mutate through both directions at once).

use crate::ticker::balance::{TransferInfo, UserTickerBalance};
use crate::script::ScriptKey;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
  balances: HashMap<(ScriptKey, String), UserTickerBalance>,
  users_by_ticker: HashMap<String, HashSet<ScriptKey>>,
  tickers_by_user: HashMap<ScriptKey, HashSet<String>>,

  /// Inscribe-transfers rejected for insufficient `available` at
  /// validation time, kept indexed by `create_idx_key` purely for
  /// explainability (spec §4.6, §7) — never consulted to mutate a
  /// balance. Omitted from `snapshot::cherry_pick` (spec §4.10).
  invalid_transfers: HashMap<u64, TransferInfo>,
}

impl Ledger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Gets (initializing at `decimal` precision if absent) `user`'s
  /// balance in `ticker`, keeping both index directions consistent.
  pub fn balance_mut(&mut self, ticker: &str, user: &ScriptKey, decimal: u8) -> &mut UserTickerBalance {
    let key = (user.clone(), ticker.to_string());
    self
      .balances
      .entry(key.clone())
      .or_insert_with(|| UserTickerBalance::new(user.clone(), ticker.to_string(), decimal));
    self.users_by_ticker.entry(ticker.to_string()).or_default().insert(user.clone());
    self.tickers_by_user.entry(user.clone()).or_default().insert(ticker.to_string());
    self.balances.get_mut(&key).expect("just inserted")
  }

  pub fn balance(&self, ticker: &str, user: &ScriptKey) -> Option<&UserTickerBalance> {
    self.balances.get(&(user.clone(), ticker.to_string()))
  }

  pub fn holders(&self, ticker: &str) -> impl Iterator<Item = &ScriptKey> {
    self
      .users_by_ticker
      .get(ticker)
      .into_iter()
      .flat_map(|set| set.iter())
  }

  pub fn tickers_held_by(&self, user: &ScriptKey) -> impl Iterator<Item = &String> {
    self.tickers_by_user.get(user).into_iter().flat_map(|set| set.iter())
  }

  pub fn len(&self) -> usize {
    self.balances.len()
  }

  pub fn is_empty(&self) -> bool {
    self.balances.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&(ScriptKey, String), &UserTickerBalance)> {
    self.balances.iter()
  }

  pub fn record_invalid_transfer(&mut self, info: TransferInfo) {
    self.invalid_transfers.insert(info.create_idx_key, info);
  }

  pub fn invalid_transfer(&self, create_idx_key: u64) -> Option<&TransferInfo> {
    self.invalid_transfers.get(&create_idx_key)
  }

  /// Drops every balance record that holds nothing (zero available,
  /// zero transferable) from the ticker->users side only, matching the
  /// reference's presentation-layer GC exactly (spec supplement: the Go
  /// `ProcessUpdateLatestBRC20Loop` trailing pass prunes holder listings,
  /// not the user->ticker side, so a user's own balance lookup still
  /// finds the zeroed record). Not part of the base protocol's consensus
  /// rules — purely a memory-hygiene pass over holder listings, safe to
  /// run at any point between events.
  pub fn gc_empty_holders(&mut self) -> usize {
    let empty: Vec<(ScriptKey, String)> = self
      .balances
      .iter()
      .filter(|(_, balance)| balance.is_empty_balance() && balance.valid_transfers.is_empty())
      .map(|(key, _)| key.clone())
      .collect();

    for key in &empty {
      if let Some(set) = self.users_by_ticker.get_mut(&key.1) {
        set.remove(&key.0);
        if set.is_empty() {
          self.users_by_ticker.remove(&key.1);
        }
      }
    }
    empty.len()
  }

  /// Checks two-way index consistency. A balance that `gc_empty_holders`
  /// has swept is deliberately absent from the ticker->users side while
  /// still present in `balances` and the user->ticker side, so such
  /// entries are exempt from the ticker->users half of the check.
  #[cfg(test)]
  pub(crate) fn check_index_consistency(&self) -> bool {
    for ((user, ticker), balance) in &self.balances {
      let gc_eligible = balance.is_empty_balance() && balance.valid_transfers.is_empty();
      if !gc_eligible && !self.users_by_ticker.get(ticker).map(|s| s.contains(user)).unwrap_or(false) {
        return false;
      }
      if !self.tickers_by_user.get(user).map(|s| s.contains(ticker)).unwrap_or(false) {
        return false;
      }
    }
    true
  }
}
