//! Mint handler (spec §4.5), grounded on the teacher's own
//! `brc20/updater.rs::process_mint`'s clamp-to-remaining behavior
//! (`amt` capped at `supply - minted`) and `original_source/model/model.go`'s
//! `BRC20TokenInfo.TotalMinted`/`MaxMintTimes` running-total fields —
//! `original_source` has no standalone mint-processing file in the kept
//! set, so the clamp's exact arithmetic is cross-checked against the
//! teacher rather than an absent Go source file.

use crate::amount::validate_amount;
use crate::error::RejectReason;
use crate::ledger::Ledger;
use crate::script::ScriptKey;
use crate::ticker::TickerRegistry;

/// Mints `amt` of `tick` to `minter`. The amount actually credited is
/// clamped to the ticker's remaining supply (spec §4.5 edge case: a
/// mint that requests more than what's left still succeeds for
/// whatever remains, rather than being rejected outright), and
/// `mint_times` increments exactly once regardless of clamping.
///
/// `parent_inscription_id` is the mint inscription's own parent, checked
/// against the ticker's deploy inscription when `self_mint` is set
/// (spec §4.5); `self_mint_enabled` is the height gate already resolved
/// by the caller (`height >= Config::enable_self_mint_height`).
///
/// Returns the amount actually minted.
#[allow(clippy::too_many_arguments)]
pub fn handle_mint(
  tickers: &mut TickerRegistry,
  ledger: &mut Ledger,
  minter: ScriptKey,
  tick: &str,
  amt: &str,
  parent_inscription_id: Option<&str>,
  self_mint_enabled: bool,
  confirmed: bool,
  height: u32,
  block_time: u32,
) -> Result<crate::decimal::Decimal, RejectReason> {
  let lower = tick.to_lowercase();
  let info = tickers.get_mut(&lower).ok_or_else(|| RejectReason::UnknownTicker(lower.clone()))?;

  if info.self_mint {
    if !self_mint_enabled {
      return Err(RejectReason::SelfMintNotEnabled);
    }
    if parent_inscription_id != Some(info.deploy_inscription_id.as_str()) {
      return Err(RejectReason::SelfMintParentMismatch);
    }
  }

  let requested = validate_amount(amt, info.decimal)?;
  if requested.cmp(&info.limit) == std::cmp::Ordering::Greater {
    return Err(RejectReason::MintExceedsLimit);
  }

  let remaining = info.remaining();
  if remaining.sign() <= 0 {
    return Err(RejectReason::MintExhausted);
  }

  let credited = if requested.cmp(&remaining) == std::cmp::Ordering::Greater {
    remaining
  } else {
    requested
  };

  info.minted = info.minted.checked_add(&credited).expect("bounded by max");
  if confirmed {
    info.confirmed_minted = info.confirmed_minted.checked_add(&credited).expect("bounded by max");
  }
  info.mint_times += 1;
  if info.minted.cmp(&info.max) != std::cmp::Ordering::Less && info.complete_height.is_none() {
    info.complete_height = Some(height);
    info.complete_block_time = Some(block_time);
  }

  let balance = ledger.balance_mut(&lower, &minter, info.decimal);
  balance.available = balance.available.checked_add(&credited).expect("bounded by max");
  if confirmed {
    balance.available_safe = balance.available_safe.checked_add(&credited).expect("bounded by max");
  }

  Ok(credited)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ticker::TickerInfo;

  fn setup() -> (TickerRegistry, Ledger) {
    let mut tickers = TickerRegistry::new();
    let info = TickerInfo::new(
      "aaaa".to_string(),
      false,
      ScriptKey::from_bytes(vec![9]),
      "insc1".to_string(),
      8,
      crate::decimal::Decimal::parse("1000", 8).unwrap(),
      crate::decimal::Decimal::parse("600", 8).unwrap(),
    );
    tickers.insert("aaaa".to_string(), info);
    (tickers, Ledger::new())
  }

  #[test]
  fn mints_within_limit() {
    let (mut tickers, mut ledger) = setup();
    let alice = ScriptKey::from_bytes(vec![1]);
    let credited = handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "400", None, true, true, 1, 100).unwrap();
    assert_eq!(credited.to_string(), "400.00000000");
    let balance = ledger.balance("aaaa", &alice).unwrap();
    assert_eq!(balance.available.to_string(), "400.00000000");
    assert_eq!(balance.available_safe.to_string(), "400.00000000");
  }

  #[test]
  fn unconfirmed_mint_does_not_credit_safe_balance() {
    let (mut tickers, mut ledger) = setup();
    let alice = ScriptKey::from_bytes(vec![1]);
    handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "400", None, true, false, 1, 0).unwrap();
    let balance = ledger.balance("aaaa", &alice).unwrap();
    assert_eq!(balance.available.to_string(), "400.00000000");
    assert_eq!(balance.available_safe.to_string(), "0.00000000");
  }

  #[test]
  fn clamps_to_remaining_supply() {
    let (mut tickers, mut ledger) = setup();
    let alice = ScriptKey::from_bytes(vec![1]);
    handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "600", None, true, true, 1, 100).unwrap();
    let bob = ScriptKey::from_bytes(vec![2]);
    let credited = handle_mint(&mut tickers, &mut ledger, bob.clone(), "aaaa", "600", None, true, true, 2, 200).unwrap();
    assert_eq!(credited.to_string(), "400.00000000");
    let info = tickers.get("aaaa").unwrap();
    assert_eq!(info.minted.to_string(), "1000.00000000");
    assert_eq!(info.complete_height, Some(2));
    assert_eq!(info.mint_times, 2);
  }

  #[test]
  fn rejects_mint_over_limit() {
    let (mut tickers, mut ledger) = setup();
    let alice = ScriptKey::from_bytes(vec![1]);
    let result = handle_mint(&mut tickers, &mut ledger, alice, "aaaa", "601", None, true, true, 1, 100);
    assert!(matches!(result, Err(RejectReason::MintExceedsLimit)));
  }

  #[test]
  fn rejects_mint_once_exhausted() {
    let (mut tickers, mut ledger) = setup();
    let alice = ScriptKey::from_bytes(vec![1]);
    handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "600", None, true, true, 1, 100).unwrap();
    handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "400", None, true, true, 2, 200).unwrap();
    let result = handle_mint(&mut tickers, &mut ledger, alice, "aaaa", "1", None, true, true, 3, 300);
    assert!(matches!(result, Err(RejectReason::MintExhausted)));
  }

  #[test]
  fn self_mint_requires_matching_parent() {
    let mut tickers = TickerRegistry::new();
    tickers.insert(
      "aaaa".to_string(),
      TickerInfo::new(
        "aaaa".to_string(),
        true,
        ScriptKey::from_bytes(vec![9]),
        "deploy-insc".to_string(),
        8,
        crate::decimal::Decimal::parse("1000", 8).unwrap(),
        crate::decimal::Decimal::parse("600", 8).unwrap(),
      ),
    );
    let mut ledger = Ledger::new();
    let alice = ScriptKey::from_bytes(vec![1]);

    let wrong_parent = handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "1", Some("other-insc"), true, true, 1, 100);
    assert!(matches!(wrong_parent, Err(RejectReason::SelfMintParentMismatch)));

    let not_enabled = handle_mint(&mut tickers, &mut ledger, alice.clone(), "aaaa", "1", Some("deploy-insc"), false, true, 1, 100);
    assert!(matches!(not_enabled, Err(RejectReason::SelfMintNotEnabled)));

    let ok = handle_mint(&mut tickers, &mut ledger, alice, "aaaa", "1", Some("deploy-insc"), true, true, 1, 100);
    assert!(ok.is_ok());
  }
}
