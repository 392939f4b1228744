//! Module withdraw handler (spec §4.8 step 3), grounded on
//! `original_source/model/swap.go`'s `ReadyToWithdrawAmount`/
//! `ReadyToWithdrawMap` field pair (the process-logic source itself isn't
//! among the kept original-source files; the two-phase request/settle
//! shape is reworked here into an inscribe/confirm-spend pair to match
//! how base-ledger transfers are modeled in this crate).
//!
//! Inscribing a withdraw moves `amt` out of the module's swap-usable
//! `swap_account` into `ready_to_withdraw`, pending its own first move.
//! That move either completes (credits the destination's base-ledger
//! `available`) or invalidates (refunds back into `swap_account`).

use crate::amount::validate_amount;
use crate::decimal::Decimal;
use crate::error::RejectReason;
use crate::ledger::Ledger;
use crate::module::balance::MODULE_DECIMAL;
use crate::module::ModuleInfo;
use crate::script::ScriptKey;

/// Registers a withdrawal request: `amt` leaves `swap_account`
/// immediately (so it can't be double-spent in a later commit) and sits
/// in `ready_to_withdraw`, keyed by `create_idx_key`, until the
/// withdraw inscription's own move resolves it.
pub fn handle_module_withdraw_inscribe(
  module: &mut ModuleInfo,
  user: &ScriptKey,
  tick: &str,
  amt: &str,
  create_idx_key: u64,
  height: u32,
) -> Result<Decimal, RejectReason> {
  let amount = validate_amount(amt, MODULE_DECIMAL)?;
  let balance = module.balance_mut(tick, user);
  if balance.swap_account.cmp(&amount) == std::cmp::Ordering::Less {
    return Err(RejectReason::InsufficientModuleBalance);
  }
  balance.swap_account = balance
    .swap_account
    .checked_sub(&amount)
    .map_err(|_| RejectReason::InsufficientModuleBalance)?;
  balance.ready_to_withdraw.insert(create_idx_key, (height, amount));
  balance.ready_to_withdraw_amount = balance
    .ready_to_withdraw_amount
    .checked_add(&amount)
    .map_err(|_| RejectReason::OutOfRange)?;
  Ok(amount)
}

/// Consumes the pending withdrawal recorded under `create_idx_key`. When
/// `complete` is true, `destination` (the withdraw inscription's
/// recipient, at `decimal` precision in the base ledger) is credited;
/// otherwise the amount is refunded back into `swap_account`.
pub fn handle_module_withdraw_spend(
  ledger: &mut Ledger,
  module: &mut ModuleInfo,
  user: &ScriptKey,
  tick: &str,
  decimal: u8,
  create_idx_key: u64,
  destination: &ScriptKey,
  confirmed: bool,
  complete: bool,
) -> Result<Decimal, RejectReason> {
  let balance = module.balance_mut(tick, user);
  let (_, amount) = balance.ready_to_withdraw.remove(&create_idx_key).ok_or(RejectReason::NothingPending)?;
  balance.ready_to_withdraw_amount = balance
    .ready_to_withdraw_amount
    .checked_sub(&amount)
    .expect("tracked in ready_to_withdraw_amount");

  if complete {
    let mut credited = amount;
    credited.rescale(decimal);
    let base_balance = ledger.balance_mut(tick, destination, decimal);
    base_balance.available = base_balance.available.checked_add(&credited).map_err(|_| RejectReason::OutOfRange)?;
    if confirmed {
      base_balance.available_safe = base_balance
        .available_safe
        .checked_add(&credited)
        .map_err(|_| RejectReason::OutOfRange)?;
    }
  } else {
    balance.swap_account = balance.swap_account.checked_add(&amount).map_err(|_| RejectReason::OutOfRange)?;
  }
  Ok(amount)
}
