//! Module approve handler (spec §4.8 step 2), grounded on the same
//! inscribe/confirm split `inscribe_transfer`/`spend` use for base-ledger
//! transfers: approving is a two-phase operation, not an immediate
//! balance move.
//!
//! Inscribing an approve moves `amt` out of the user's base-ledger
//! `available` into the module's `approveable` (pending) bucket. The
//! approve inscription's own first move (a "spend") then either settles
//! it into `swap_account` (receiver resolves back to the module itself)
//! or refunds it to base-ledger `available` (any other receiver).

use crate::amount::validate_amount;
use crate::decimal::Decimal;
use crate::error::RejectReason;
use crate::ledger::Ledger;
use crate::module::balance::MODULE_DECIMAL;
use crate::module::ModuleInfo;
use crate::script::ScriptKey;

/// Validates `amt` at the base ledger's `decimal` precision, debits it
/// from `user`'s base `available`, and parks it (rescaled to
/// [`MODULE_DECIMAL`]) in the module's `approveable` bucket keyed by
/// `create_idx_key`, awaiting the approve inscription's own spend.
pub fn handle_module_approve_inscribe(
  ledger: &mut Ledger,
  module: &mut ModuleInfo,
  user: &ScriptKey,
  tick: &str,
  amt: &str,
  decimal: u8,
  create_idx_key: u64,
) -> Result<Decimal, RejectReason> {
  let amount = validate_amount(amt, decimal)?;

  let base_balance = ledger.balance_mut(tick, user, decimal);
  if base_balance.available.cmp(&amount) == std::cmp::Ordering::Less {
    return Err(RejectReason::InsufficientAvailable {
      have: base_balance.available,
      need: amount,
    });
  }
  base_balance.available = base_balance.available.checked_sub(&amount).expect("checked above");

  let mut pending = amount;
  pending.rescale(MODULE_DECIMAL);
  let balance = module.balance_mut(tick, user);
  balance.approveable = balance.approveable.checked_add(&pending).map_err(|_| RejectReason::OutOfRange)?;
  balance.valid_approve.insert(create_idx_key, pending);
  Ok(amount)
}

/// Consumes the pending approval recorded under `create_idx_key`. When
/// `settle` is true (the approve inscription's move landed back on the
/// module's own script) the amount leaves `approveable` and enters
/// `swap_account`; otherwise it's refunded to base-ledger `available`.
pub fn handle_module_approve_spend(
  ledger: &mut Ledger,
  module: &mut ModuleInfo,
  user: &ScriptKey,
  tick: &str,
  decimal: u8,
  create_idx_key: u64,
  settle: bool,
) -> Result<Decimal, RejectReason> {
  let balance = module.balance_mut(tick, user);
  let pending = balance.valid_approve.remove(&create_idx_key).ok_or(RejectReason::NothingPending)?;
  balance.approveable = balance.approveable.checked_sub(&pending).expect("tracked in approveable");

  if settle {
    balance.swap_account = balance.swap_account.checked_add(&pending).map_err(|_| RejectReason::OutOfRange)?;
  } else {
    let mut refund = pending;
    refund.rescale(decimal);
    let base_balance = ledger.balance_mut(tick, user, decimal);
    base_balance.available = base_balance.available.checked_add(&refund).map_err(|_| RejectReason::OutOfRange)?;
  }
  Ok(pending)
}
