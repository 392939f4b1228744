//! Handles the first move of an already-validated transfer inscription
//! (spec §4.7), grounded on `original_source/indexer/brc20_transfer.go`'s
//! `ProcessTransfer` step, including its own trailing module-deposit
//! branch (same file, `GetModuleFromScript`/`SwapAccountBalance` update)
//! for the deposit-via-transfer special case (spec §4.8 step 1b): a
//! transfer whose recipient script resolves to a module account deposits
//! into that module's sub-ledger instead of crediting a plain user
//! balance.

use crate::decimal::Decimal;
use crate::error::RejectReason;
use crate::ledger::Ledger;
use crate::module::ModuleRegistry;
use crate::script::ScriptKey;
use crate::ticker::TickerRegistry;

pub enum SpendOutcome {
  /// The originating inscribe-transfer was invalid (insufficient
  /// `available` at the time): nothing moves, this move is a no-op.
  Invalid,
  /// Credited a plain user balance.
  Transferred,
  /// Credited a module's deposited balance.
  Deposited { module_id: String },
  /// Sent to the burn script: removed from supply, credited to no one.
  Burned,
}

/// Consumes the pending transfer keyed by `create_idx_key` under
/// `ticker`/`sender`, crediting `recipient`. A transfer inscription can
/// only ever be spent once: if no matching pending transfer exists
/// (already spent, or never validated), this is a silent no-op rather
/// than an error, since the event stream may replay the same
/// inscription's later moves.
///
/// `was_valid` distinguishes a covered inscribe-transfer from one parked
/// in the invalid-transfer map (spec §4.6/§4.7): an invalid one is
/// consumed without moving any balance. `confirmed` gates `available_safe`
/// crediting and the module-deposit safe-balance companion; `latest_height`
/// and `safe_confirmation` implement that gate's `(latest_height -
/// event.height + 1) >= BRC20_MODULE_SAFE_CONFIRMATION` threshold.
#[allow(clippy::too_many_arguments)]
pub fn handle_spend(
  tickers: &mut TickerRegistry,
  ledger: &mut Ledger,
  modules: &mut ModuleRegistry,
  sender: &ScriptKey,
  ticker: &str,
  create_idx_key: u64,
  recipient: &ScriptKey,
  module_id_for_recipient: Option<String>,
  was_valid: bool,
  confirmed: bool,
  event_height: u32,
  latest_height: u32,
  safe_confirmation: u32,
) -> Result<SpendOutcome, RejectReason> {
  let lower = ticker.to_lowercase();
  let decimal = tickers
    .get(&lower)
    .ok_or_else(|| RejectReason::UnknownTicker(lower.clone()))?
    .decimal;

  if !was_valid {
    return Ok(SpendOutcome::Invalid);
  }

  let transfer = {
    let balance = ledger.balance_mut(&lower, sender, decimal);
    balance
      .valid_transfers
      .remove(&create_idx_key)
      .ok_or(RejectReason::NothingPending)?
  };

  {
    let sender_balance = ledger.balance_mut(&lower, sender, decimal);
    sender_balance.transferable = sender_balance
      .transferable
      .checked_sub(&transfer.amount)
      .expect("transferable tracks the sum of valid_transfers");
  }

  if recipient.is_burn() {
    if let Some(info) = tickers.get_mut(&lower) {
      info.burned = info.burned.checked_add(&transfer.amount).map_err(|_| RejectReason::OutOfRange)?;
    }
    return Ok(SpendOutcome::Burned);
  }

  if let Some(module_id) = module_id_for_recipient {
    let module = modules.get_mut(&module_id).ok_or(RejectReason::UnknownModule(module_id.clone()))?;
    let mut deposited: Decimal = transfer.amount;
    deposited.rescale(crate::module::balance::MODULE_DECIMAL);
    let balance = module.balance_mut(&lower, sender);
    balance.swap_account = balance.swap_account.checked_add(&deposited).map_err(|_| RejectReason::OutOfRange)?;
    if latest_height.saturating_sub(event_height) + 1 >= safe_confirmation {
      balance.swap_account_safe = balance
        .swap_account_safe
        .checked_add(&deposited)
        .map_err(|_| RejectReason::OutOfRange)?;
    }
    return Ok(SpendOutcome::Deposited { module_id });
  }

  let recipient_balance = ledger.balance_mut(&lower, recipient, decimal);
  recipient_balance.available = recipient_balance
    .available
    .checked_add(&transfer.amount)
    .map_err(|_| RejectReason::OutOfRange)?;
  if confirmed {
    recipient_balance.available_safe = recipient_balance
      .available_safe
      .checked_add(&transfer.amount)
      .map_err(|_| RejectReason::OutOfRange)?;
  }

  Ok(SpendOutcome::Transferred)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decimal::Decimal;
  use crate::ticker::balance::TransferInfo;
  use crate::ticker::TickerInfo;

  fn setup() -> (TickerRegistry, Ledger, ModuleRegistry, ScriptKey, ScriptKey) {
    let mut tickers = TickerRegistry::new();
    tickers.insert(
      "aaaa".to_string(),
      TickerInfo::new(
        "aaaa".to_string(),
        false,
        ScriptKey::from_bytes(vec![9]),
        "insc1".to_string(),
        8,
        Decimal::parse("1000", 8).unwrap(),
        Decimal::parse("1000", 8).unwrap(),
      ),
    );
    let mut ledger = Ledger::new();
    let alice = ScriptKey::from_bytes(vec![1]);
    let bob = ScriptKey::from_bytes(vec![2]);
    let balance = ledger.balance_mut("aaaa", &alice, 8);
    balance.transferable = Decimal::parse("40", 8).unwrap();
    balance.valid_transfers.insert(
      1,
      TransferInfo {
        owner: alice.clone(),
        ticker: "aaaa".to_string(),
        amount: Decimal::parse("40", 8).unwrap(),
        create_idx_key: 1,
      },
    );
    (tickers, ledger, ModuleRegistry::new(), alice, bob)
  }

  #[test]
  fn spend_credits_recipient() {
    let (mut tickers, mut ledger, mut modules, alice, bob) = setup();
    let outcome =
      handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &bob, None, true, true, 100, 100, 60).unwrap();
    assert!(matches!(outcome, SpendOutcome::Transferred));
    assert_eq!(ledger.balance("aaaa", &bob).unwrap().available.to_string(), "40.00000000");
    assert_eq!(ledger.balance("aaaa", &bob).unwrap().available_safe.to_string(), "40.00000000");
    assert_eq!(ledger.balance("aaaa", &alice).unwrap().transferable.to_string(), "0.00000000");
  }

  #[test]
  fn unconfirmed_spend_does_not_credit_safe_balance() {
    let (mut tickers, mut ledger, mut modules, alice, bob) = setup();
    handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &bob, None, true, false, 100, 100, 60).unwrap();
    assert_eq!(ledger.balance("aaaa", &bob).unwrap().available.to_string(), "40.00000000");
    assert_eq!(ledger.balance("aaaa", &bob).unwrap().available_safe.to_string(), "0.00000000");
  }

  #[test]
  fn duplicate_spend_is_noop_rejection() {
    let (mut tickers, mut ledger, mut modules, alice, bob) = setup();
    handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &bob, None, true, true, 100, 100, 60).unwrap();
    let result = handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &bob, None, true, true, 100, 100, 60);
    assert!(matches!(result, Err(RejectReason::NothingPending)));
  }

  #[test]
  fn invalid_transfer_spend_is_noop() {
    let (mut tickers, mut ledger, mut modules, alice, bob) = setup();
    let outcome =
      handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &bob, None, false, true, 100, 100, 60).unwrap();
    assert!(matches!(outcome, SpendOutcome::Invalid));
    // the pending transfer is still sitting there untouched
    assert!(ledger.balance("aaaa", &alice).unwrap().valid_transfers.contains_key(&1));
  }

  #[test]
  fn burn_drops_amount_without_crediting_and_bumps_burned() {
    let (mut tickers, mut ledger, mut modules, alice, _bob) = setup();
    let burn = ScriptKey::from_bytes(vec![0x6a]);
    let outcome =
      handle_spend(&mut tickers, &mut ledger, &mut modules, &alice, "aaaa", 1, &burn, None, true, true, 100, 100, 60).unwrap();
    assert!(matches!(outcome, SpendOutcome::Burned));
    assert_eq!(tickers.get("aaaa").unwrap().burned.to_string(), "40.00000000");
  }

  #[test]
  fn module_deposit_credits_swap_account_when_confirmed_enough() {
    let (mut tickers, mut ledger, mut modules, alice, _bob) = setup();
    modules.insert(crate::module::ModuleInfo::new(
      "mod1".to_string(),
      "test".to_string(),
      ScriptKey::from_bytes(vec![9]),
      ScriptKey::from_bytes(vec![9]),
      ScriptKey::from_bytes(vec![8]),
      ScriptKey::from_bytes(vec![7]),
      "0".to_string(),
      "gas".to_string(),
    ));
    let module_script = ScriptKey::from_bytes(vec![42]);
    let outcome = handle_spend(
      &mut tickers,
      &mut ledger,
      &mut modules,
      &alice,
      "aaaa",
      1,
      &module_script,
      Some("mod1".to_string()),
      true,
      true,
      100,
      160,
      60,
    )
    .unwrap();
    assert!(matches!(outcome, SpendOutcome::Deposited { .. }));
    let balance = modules.get("mod1").unwrap().balance("aaaa", &alice).unwrap();
    assert_eq!(balance.swap_account.to_string(), "40.000000000000000000");
    assert_eq!(balance.swap_account_safe.to_string(), "40.000000000000000000");
  }
}
