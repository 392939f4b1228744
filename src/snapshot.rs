//! Snapshot helpers (spec §5): a full, independent copy of the engine's
//! state, and a narrower "cherry pick" extract limited to the entities a
//! caller actually cares about. Grounded on `original_source/model`'s
//! snapshot helpers and the teacher's use of `rayon` for independent,
//! CPU-bound fan-out work.

use crate::history::HistoryLog;
use crate::indexer::BRC20ModuleIndexer;
use crate::module::balance::PoolTotalBalance;
use crate::module::{pool_key, ModuleInfo};
use crate::script::ScriptKey;
use crate::ticker::balance::UserTickerBalance;
use crate::ticker::TickerInfo;
use rayon::prelude::*;

/// A deep, independent copy of the indexer's state. `with_data` controls
/// whether the (potentially large) history log is copied along with the
/// ticker/module/ledger state, or left empty for callers that only need
/// the current balances (spec §5 edge case: history is the single
/// biggest piece of state and isn't always needed).
///
/// Starts from the indexer's own `Clone` impl — which already carries
/// every map (pending transfer/approve/withdraw indices, per-user
/// history, `latest_height`) a faithful snapshot needs (spec §4.10: "all
/// maps copied") — and only re-does the two priciest pieces (ticker and
/// module registries) across a `rayon::join` fan-out, matching the
/// teacher's use of `rayon` for independent, CPU-bound clone work.
pub fn deep_copy(indexer: &BRC20ModuleIndexer, with_data: bool) -> BRC20ModuleIndexer {
  let (tickers, modules) = rayon::join(|| indexer.tickers.clone(), || indexer.modules.clone());

  let mut copy = indexer.clone();
  copy.tickers = tickers;
  copy.modules = modules;

  if !with_data {
    copy.history = HistoryLog::new();
  }

  copy
}

/// A narrow extract of a single module plus the balances of the given
/// users in the given tickers, and the given pools — enough state to
/// answer a query about one module's corner of the ledger without
/// copying the whole engine.
pub struct CherryPick {
  pub module: Option<ModuleInfo>,
  pub tickers: Vec<TickerInfo>,
  pub user_balances: Vec<UserTickerBalance>,
  pub pools: Vec<PoolTotalBalance>,
}

/// Restricts a snapshot to `users` x `ticker_names`, the named `pools`,
/// and the module `module_id` (if any) — the module's own `gas_tick` is
/// always pulled in alongside whatever the caller asked for, since every
/// module operation needs its gas ticker's balance to be meaningful.
pub fn cherry_pick(
  indexer: &BRC20ModuleIndexer,
  module_id: Option<&str>,
  users: &[ScriptKey],
  ticker_names: &[String],
  pools: &[(String, String)],
) -> CherryPick {
  let module = module_id.and_then(|id| indexer.modules.get(id)).cloned();

  let mut wanted_tickers = ticker_names.to_vec();
  if let Some(m) = &module {
    if !wanted_tickers.iter().any(|t| t == &m.gas_tick) {
      wanted_tickers.push(m.gas_tick.clone());
    }
  }

  let tickers: Vec<TickerInfo> = wanted_tickers
    .par_iter()
    .filter_map(|tick| indexer.tickers.get(tick).cloned())
    .collect();

  let user_balances: Vec<UserTickerBalance> = users
    .par_iter()
    .flat_map(|user| {
      wanted_tickers
        .par_iter()
        .filter_map(move |tick| indexer.ledger.balance(tick, user).cloned())
    })
    .collect();

  let pool_balances: Vec<PoolTotalBalance> = module
    .as_ref()
    .map(|m| {
      pools
        .par_iter()
        .filter_map(|(a, b)| m.pools.get(&pool_key(a, b)).cloned())
        .collect()
    })
    .unwrap_or_default();

  CherryPick {
    module,
    tickers,
    user_balances,
    pools: pool_balances,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::decimal::Decimal;

  #[test]
  fn deep_copy_is_independent() {
    let mut indexer = BRC20ModuleIndexer::new(Config::default());
    indexer.tickers.insert(
      "aaaa".to_string(),
      TickerInfo::new(
        "aaaa".to_string(),
        false,
        ScriptKey::from_bytes(vec![1]),
        "insc1".to_string(),
        8,
        Decimal::parse("100", 8).unwrap(),
        Decimal::parse("100", 8).unwrap(),
      ),
    );

    let copy = deep_copy(&indexer, false);
    assert!(copy.tickers.contains("aaaa"));
    assert!(copy.history.is_empty());

    indexer.tickers.get_mut("aaaa").unwrap().minted = Decimal::parse("50", 8).unwrap();
    assert_eq!(copy.tickers.get("aaaa").unwrap().minted.to_string(), "0.00000000");
  }

  #[test]
  fn cherry_pick_filters_to_requested_entities() {
    let mut indexer = BRC20ModuleIndexer::new(Config::default());
    let alice = ScriptKey::from_bytes(vec![1]);
    indexer.ledger.balance_mut("aaaa", &alice, 8).available = Decimal::parse("5", 8).unwrap();
    indexer.ledger.balance_mut("bbbb", &alice, 8).available = Decimal::parse("6", 8).unwrap();

    let picked = cherry_pick(&indexer, None, &[alice], &["aaaa".to_string()], &[]);
    assert_eq!(picked.user_balances.len(), 1);
    assert_eq!(picked.user_balances[0].available.to_string(), "5.00000000");
  }
}
