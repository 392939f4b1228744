//! Module registry and sub-ledger (spec §3 "Module info", §4.8).

pub mod approve;
pub mod balance;
pub mod commit;
pub mod create;
pub mod sign;
pub mod withdraw;

use crate::decimal::Decimal;
use crate::script::ScriptKey;
use balance::{ModuleTokenBalance, PoolTotalBalance};
use std::collections::{HashMap, HashSet};

/// Canonical, order-independent pool key for a pair of tickers, so
/// `(a, b)` and `(b, a)` commits address the same pool (spec §4 supplement,
/// grounded on `GetLowerInnerPairNameByToken`).
pub fn pool_key(tick_a: &str, tick_b: &str) -> (String, String) {
  let a = tick_a.to_lowercase();
  let b = tick_b.to_lowercase();
  if a <= b {
    (a, b)
  } else {
    (b, a)
  }
}

#[derive(Debug, Clone)]
pub struct ModuleInfo {
  pub id: String,
  pub name: String,
  pub deployer: ScriptKey,
  pub sequencer: ScriptKey,
  pub gas_to: ScriptKey,
  pub lp_fee_pk_script: ScriptKey,
  pub fee_rate_swap: String,
  pub gas_tick: String,

  pub history: Vec<u32>,

  /// All commits ever accepted as valid.
  pub commit_ids: HashSet<String>,
  /// All commits rejected as invalid (kept for explainability, spec §7).
  pub commit_invalid: HashSet<String>,
  /// Commit ids that have been consumed as a `parent` and can no longer
  /// be reused as a parent by a later commit (spec §4.8 step 4; kept
  /// byte-exact with the reference's replay discipline — see spec Open
  /// Questions).
  pub commit_id_chain: HashSet<String>,

  /// `(user, ticker) -> balance`, indexed both ways as the base ledger is.
  pub(crate) user_tick_balances: HashMap<(ScriptKey, String), ModuleTokenBalance>,
  pub(crate) users_by_tick: HashMap<String, HashSet<ScriptKey>>,
  pub(crate) ticks_by_user: HashMap<ScriptKey, HashSet<String>>,

  pub pools: HashMap<(String, String), PoolTotalBalance>,
  /// `(pool, user) -> lp balance`.
  pub lp_balances: HashMap<((String, String), ScriptKey), Decimal>,
}

impl ModuleInfo {
  pub fn new(
    id: String,
    name: String,
    deployer: ScriptKey,
    sequencer: ScriptKey,
    gas_to: ScriptKey,
    lp_fee_pk_script: ScriptKey,
    fee_rate_swap: String,
    gas_tick: String,
  ) -> Self {
    Self {
      id,
      name,
      deployer,
      sequencer,
      gas_to,
      lp_fee_pk_script,
      fee_rate_swap,
      gas_tick,
      history: Vec::new(),
      commit_ids: HashSet::new(),
      commit_invalid: HashSet::new(),
      commit_id_chain: HashSet::new(),
      user_tick_balances: HashMap::new(),
      users_by_tick: HashMap::new(),
      ticks_by_user: HashMap::new(),
      pools: HashMap::new(),
      lp_balances: HashMap::new(),
    }
  }

  /// Gets (initializing if absent) the user's balance for `tick`, keeping
  /// the two-way user<->tick index consistent.
  pub fn balance_mut(&mut self, tick: &str, user: &ScriptKey) -> &mut ModuleTokenBalance {
    let lower = tick.to_lowercase();
    let key = (user.clone(), lower.clone());
    self
      .user_tick_balances
      .entry(key)
      .or_insert_with(|| ModuleTokenBalance::new(lower.clone(), user.clone()));
    self
      .users_by_tick
      .entry(lower.clone())
      .or_default()
      .insert(user.clone());
    self.ticks_by_user.entry(user.clone()).or_default().insert(lower.clone());
    self
      .user_tick_balances
      .get_mut(&(user.clone(), lower))
      .expect("just inserted")
  }

  pub fn balance(&self, tick: &str, user: &ScriptKey) -> Option<&ModuleTokenBalance> {
    self.user_tick_balances.get(&(user.clone(), tick.to_lowercase()))
  }

  pub fn pool_mut(&mut self, tick_a: &str, tick_b: &str) -> &mut PoolTotalBalance {
    let key = pool_key(tick_a, tick_b);
    self
      .pools
      .entry(key.clone())
      .or_insert_with(|| PoolTotalBalance::new(key.0.clone(), key.1.clone()))
  }

  pub fn lp_balance(&self, tick_a: &str, tick_b: &str, user: &ScriptKey) -> Decimal {
    let key = pool_key(tick_a, tick_b);
    self
      .lp_balances
      .get(&(key, user.clone()))
      .cloned()
      .unwrap_or(Decimal::zero(18))
  }

  pub fn users_count(&self) -> usize {
    self.ticks_by_user.len()
  }
}

/// All deployed modules, keyed by module id (the parent inscription id of
/// the module-deploy event).
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
  pub(crate) modules: HashMap<String, ModuleInfo>,
}

impl ModuleRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
    self.modules.get(id)
  }

  pub fn get_mut(&mut self, id: &str) -> Option<&mut ModuleInfo> {
    self.modules.get_mut(id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.modules.contains_key(id)
  }

  pub fn insert(&mut self, info: ModuleInfo) {
    self.modules.insert(info.id.clone(), info);
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &ModuleInfo)> {
    self.modules.iter()
  }
}
