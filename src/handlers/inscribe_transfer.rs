//! Inscribe-transfer handler (spec §4.6), grounded on
//! `original_source/indexer/brc20_transfer.go`'s `InscribeTransfer`.

use crate::amount::validate_amount;
use crate::error::RejectReason;
use crate::ledger::Ledger;
use crate::script::ScriptKey;
use crate::ticker::balance::TransferInfo;
use crate::ticker::TickerRegistry;

/// Materializes a transfer inscription (spec §4.6). `amt` must parse at
/// the ticker's precision and not exceed its `max` supply (matching
/// `original_source/indexer/brc20_transfer.go`'s bound against
/// `tinfo.Max`, not the per-mint `limit`).
///
/// When `available` can't cover it, this does **not** reject: it records
/// the transfer into the ledger's invalid-transfer map (still keyed by
/// `create_idx_key`, for explainability) and returns `Ok(false)` so the
/// eventual spend can still recognize and no-op on it (spec §4.7). A
/// covered transfer returns `Ok(true)`.
///
/// `available_safe` is decremented unconditionally alongside
/// `available`, even though it tracks confirmed (not mempool-optimistic)
/// balance — kept byte-exact with the reference rather than clamped at
/// zero, since a later reorg-free confirmation reconciles it (spec Open
/// Questions).
pub fn handle_inscribe_transfer(
  tickers: &TickerRegistry,
  ledger: &mut Ledger,
  owner: ScriptKey,
  tick: &str,
  amt: &str,
  create_idx_key: u64,
) -> Result<bool, RejectReason> {
  let lower = tick.to_lowercase();
  let info = tickers.get(&lower).ok_or_else(|| RejectReason::UnknownTicker(lower.clone()))?;
  let decimal = info.decimal;

  let amount = validate_amount(amt, decimal)?;
  if amount.cmp(&info.max) == std::cmp::Ordering::Greater {
    return Err(RejectReason::OutOfRange);
  }

  let balance = ledger.balance_mut(&lower, &owner, decimal);
  if balance.available.cmp(&amount) == std::cmp::Ordering::Less {
    ledger.record_invalid_transfer(TransferInfo {
      owner,
      ticker: lower,
      amount,
      create_idx_key,
    });
    return Ok(false);
  }

  let balance = ledger.balance_mut(&lower, &owner, decimal);
  balance.available = balance.available.checked_sub(&amount).expect("checked above");
  // Not clamped at zero: subtracting unconditionally lets available_safe
  // go negative when a transfer outruns confirmed balance, matching the
  // reference rather than silently floor-ing it.
  balance.available_safe = balance
    .available_safe
    .checked_sub(&amount)
    .expect("i128 has ample headroom below realistic balances");
  balance.transferable = balance.transferable.checked_add(&amount).expect("bounded by prior available");
  balance.valid_transfers.insert(
    create_idx_key,
    TransferInfo {
      owner,
      ticker: lower,
      amount,
      create_idx_key,
    },
  );
  Ok(true)
}
