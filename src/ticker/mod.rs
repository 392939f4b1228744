//! Ticker registry: per-ticker deploy parameters and running totals (spec
//! §3 "Ticker info", §4.4).

pub mod balance;

use crate::decimal::Decimal;
use crate::script::ScriptKey;
use std::collections::HashMap;

/// Immutable deploy parameters plus the mutable running totals tracked as
/// the ticker is minted, transferred, and burned.
#[derive(Debug, Clone)]
pub struct TickerInfo {
  /// Canonical-case ticker string as it was first deployed.
  pub ticker: String,
  pub self_mint: bool,
  pub deployer: ScriptKey,
  /// Inscription id of the deploy inscription itself, used to gate
  /// self-mint mints to the ticker they were deployed by (spec §4.5).
  pub deploy_inscription_id: String,
  pub decimal: u8,

  pub max: Decimal,
  pub max_999: Decimal,
  pub limit: Decimal,
  pub max_mint_times: u64,

  pub minted: Decimal,
  pub confirmed_minted: Decimal,
  pub burned: Decimal,
  pub mint_times: u64,

  pub complete_height: Option<u32>,
  pub complete_block_time: Option<u32>,

  pub history: Vec<u32>,
  pub history_mint: Vec<u32>,
  pub history_inscribe_transfer: Vec<u32>,
  pub history_transfer: Vec<u32>,
}

impl TickerInfo {
  pub fn new(
    ticker: String,
    self_mint: bool,
    deployer: ScriptKey,
    deploy_inscription_id: String,
    decimal: u8,
    max: Decimal,
    limit: Decimal,
  ) -> Self {
    let max_999 = max
      .checked_mul(&Decimal::parse("999", 3).unwrap())
      .and_then(|v| v.checked_div(&Decimal::parse("1000", 3).unwrap()))
      .unwrap_or(max);

    // spec §3: `ceil(max/limit)` clamped to at least 1.
    let max_mint_times = max.ceil_div_u64(&limit).unwrap_or(1).max(1);

    Self {
      ticker,
      self_mint,
      deployer,
      deploy_inscription_id,
      decimal,
      max,
      max_999,
      limit,
      max_mint_times,
      minted: Decimal::zero(decimal),
      confirmed_minted: Decimal::zero(decimal),
      burned: Decimal::zero(decimal),
      mint_times: 0,
      complete_height: None,
      complete_block_time: None,
      history: Vec::new(),
      history_mint: Vec::new(),
      history_inscribe_transfer: Vec::new(),
      history_transfer: Vec::new(),
    }
  }

  pub fn remaining(&self) -> Decimal {
    self.max.checked_sub(&self.minted).unwrap_or(Decimal::zero(self.decimal))
  }
}

/// The engine's full ticker registry, keyed by lowercase identity.
#[derive(Debug, Clone, Default)]
pub struct TickerRegistry {
  pub(crate) tickers: HashMap<String, TickerInfo>,
}

impl TickerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, lower_ticker: &str) -> Option<&TickerInfo> {
    self.tickers.get(lower_ticker)
  }

  pub fn get_mut(&mut self, lower_ticker: &str) -> Option<&mut TickerInfo> {
    self.tickers.get_mut(lower_ticker)
  }

  pub fn contains(&self, lower_ticker: &str) -> bool {
    self.tickers.contains_key(lower_ticker)
  }

  pub fn insert(&mut self, lower_ticker: String, info: TickerInfo) {
    self.tickers.insert(lower_ticker, info);
  }

  pub fn len(&self) -> usize {
    self.tickers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tickers.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &TickerInfo)> {
    self.tickers.iter()
  }
}
