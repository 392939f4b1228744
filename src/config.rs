//! Process-wide configuration, built once and threaded explicitly into the
//! indexer rather than read from environment globals, so tests can run with
//! differing settings in parallel (see spec Design Notes).

use bitcoin::Network;
use std::collections::HashSet;

pub const DEFAULT_MODULE_SAFE_CONFIRMATION: u32 = 60;
pub const DEFAULT_TICK_MIN_LEN: usize = 4;
pub const DEFAULT_TICK_MAX_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct Config {
  pub debug: bool,
  /// When `Some`, only tickers in this allow-list (lowercase) may be
  /// deployed; tickers containing a space are rejected while the allow-list
  /// is active.
  pub ticks_enabled: Option<HashSet<String>>,
  pub tick_min_len: usize,
  pub tick_max_len: usize,
  pub module_safe_confirmation: u32,
  pub enable_self_mint_height: u32,
  pub module_swap_source_inscription_id: String,
  pub network: Network,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      debug: false,
      ticks_enabled: None,
      tick_min_len: DEFAULT_TICK_MIN_LEN,
      tick_max_len: DEFAULT_TICK_MAX_LEN,
      module_safe_confirmation: DEFAULT_MODULE_SAFE_CONFIRMATION,
      enable_self_mint_height: 0,
      module_swap_source_inscription_id: String::new(),
      network: Network::Bitcoin,
    }
  }
}

impl Config {
  pub fn testnet() -> Self {
    Self {
      network: Network::Testnet,
      ..Self::default()
    }
  }
}
