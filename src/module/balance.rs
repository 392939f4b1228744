//! Per-(module, user, ticker) balance and per-pool totals (spec §3
//! "Module info", grounded on `model/swap.go`'s `BRC20ModuleTokenBalance`
//! / `BRC20ModulePoolTotalBalance`).

use crate::decimal::Decimal;
use crate::script::ScriptKey;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ModuleTokenBalance {
  pub ticker: String,
  pub owner: ScriptKey,

  /// Deposited-into-module balance usable for swap/commit operations.
  pub swap_account: Decimal,
  pub swap_account_safe: Decimal,

  /// On-module "available" balance mirroring the base ledger's shape,
  /// used while an approve/withdraw is pending.
  pub module_account: Decimal,
  pub module_account_safe: Decimal,

  pub approveable: Decimal,
  pub ready_to_withdraw_amount: Decimal,

  /// Pending approvals, keyed by the approve inscription's `create_idx_key`.
  pub valid_approve: HashMap<u64, Decimal>,
  /// Pending withdrawals, keyed by the withdraw inscription's
  /// `create_idx_key`, to `(requested_at_height, amount)`. Stays pending
  /// until the module's safe-confirmation threshold has passed.
  pub ready_to_withdraw: HashMap<u64, (u32, Decimal)>,

  pub history: Vec<u32>,
}

/// Every module sub-ledger balance is kept at a fixed 18 fractional
/// digits, independent of the base ledger's per-ticker `decimal` (spec
/// §3) — callers crossing the base-ledger/module boundary rescale with
/// `Decimal::rescale` rather than threading the ticker's own precision
/// through.
pub const MODULE_DECIMAL: u8 = 18;

impl ModuleTokenBalance {
  pub fn new(ticker: String, owner: ScriptKey) -> Self {
    Self {
      ticker,
      owner,
      swap_account: Decimal::zero(MODULE_DECIMAL),
      swap_account_safe: Decimal::zero(MODULE_DECIMAL),
      module_account: Decimal::zero(MODULE_DECIMAL),
      module_account_safe: Decimal::zero(MODULE_DECIMAL),
      approveable: Decimal::zero(MODULE_DECIMAL),
      ready_to_withdraw_amount: Decimal::zero(MODULE_DECIMAL),
      valid_approve: HashMap::new(),
      ready_to_withdraw: HashMap::new(),
      history: Vec::new(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PoolTotalBalance {
  pub tick: [String; 2],
  pub tick_balance: [Decimal; 2],
  pub lp_balance: Decimal,
  pub last_root_k: Decimal,
  pub history: Vec<u32>,
}

impl PoolTotalBalance {
  pub fn new(tick_a: String, tick_b: String) -> Self {
    Self {
      tick: [tick_a, tick_b],
      tick_balance: [Decimal::zero(18), Decimal::zero(18)],
      lp_balance: Decimal::zero(18),
      last_root_k: Decimal::zero(18),
      history: Vec::new(),
    }
  }
}
