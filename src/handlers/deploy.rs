//! Deploy handler (spec §4.4), grounded on
//! `original_source/indexer/brc20_deploy.go` and the teacher's
//! `okx/protocol/brc20/msg_executor.rs` dispatch shape.

use crate::config::Config;
use crate::content;
use crate::decimal::{Decimal, MAX_PRECISION};
use crate::error::RejectReason;
use crate::script::ScriptKey;
use crate::ticker::{TickerInfo, TickerRegistry};

fn parse_decimal_digits(dec: Option<&str>) -> Result<u8, RejectReason> {
  match dec {
    None => Ok(MAX_PRECISION),
    Some(s) => {
      let value: u8 = s.parse().map_err(|_| RejectReason::InvalidNumber(s.to_string()))?;
      if value > MAX_PRECISION {
        return Err(RejectReason::OutOfRange);
      }
      Ok(value)
    }
  }
}

fn parse_self_mint_flag(self_mint: Option<&str>) -> Result<bool, RejectReason> {
  match self_mint {
    None => Ok(false),
    Some("true") => Ok(true),
    Some("false") => Ok(false),
    Some(_) => Err(RejectReason::InvalidSelfMintFlag),
  }
}

/// Runs a deploy inscription against the ticker registry. On success
/// returns the canonical (lowercase) ticker it was registered under.
#[allow(clippy::too_many_arguments)]
pub fn handle_deploy(
  tickers: &mut TickerRegistry,
  config: &Config,
  deployer: ScriptKey,
  deploy_inscription_id: String,
  height: u32,
  tick: &str,
  max: &str,
  lim: Option<&str>,
  dec: Option<&str>,
  self_mint: Option<&str>,
) -> Result<String, RejectReason> {
  let lower = content::validate_ticker(
    tick,
    config.tick_min_len,
    config.tick_max_len,
    config.ticks_enabled.as_ref(),
  )
  .ok_or_else(|| RejectReason::InvalidTicker(tick.to_string()))?;

  if tickers.contains(&lower) {
    return Err(RejectReason::DuplicateTicker(lower));
  }

  let decimal = parse_decimal_digits(dec)?;
  let self_mint_flag = parse_self_mint_flag(self_mint)?;

  if self_mint_flag && height < config.enable_self_mint_height {
    return Err(RejectReason::SelfMintNotEnabled);
  }

  let max_parsed = Decimal::parse(max, decimal).map_err(|_| RejectReason::InvalidNumber(max.to_string()))?;
  if max_parsed.sign() < 0 {
    return Err(RejectReason::InvalidNumber(max.to_string()));
  }
  // A zero max is only meaningful for a self-mint deploy, where it marks
  // an open-ended supply rather than a fixed one (spec §4.4 edge case).
  if max_parsed.sign() == 0 && !self_mint_flag {
    return Err(RejectReason::InvalidNumber(max.to_string()));
  }
  if max_parsed.is_overflow_u64() {
    return Err(RejectReason::OutOfRange);
  }

  // `lim == 0` falls back to the unbounded per-mint limit the same way
  // `max == 0` does, but only under self-mint (spec §4.4).
  let limit_parsed = match lim {
    Some(raw) => {
      let parsed = Decimal::parse(raw, decimal).map_err(|_| RejectReason::InvalidNumber(raw.to_string()))?;
      if parsed.sign() < 0 || parsed.is_overflow_u64() {
        return Err(RejectReason::OutOfRange);
      }
      if parsed.sign() == 0 {
        if !self_mint_flag {
          return Err(RejectReason::OutOfRange);
        }
        Decimal::max_u64(decimal)
      } else {
        parsed
      }
    }
    None if max_parsed.sign() == 0 => Decimal::max_u64(decimal),
    None => max_parsed,
  };

  let info = TickerInfo::new(
    lower.clone(),
    self_mint_flag,
    deployer,
    deploy_inscription_id,
    decimal,
    max_parsed,
    limit_parsed,
  );
  tickers.insert(lower.clone(), info);
  Ok(lower)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn deployer() -> ScriptKey {
    ScriptKey::from_bytes(vec![1])
  }

  #[test]
  fn deploys_standard_ticker() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    let lower = handle_deploy(
      &mut tickers, &config, deployer(), "insc1".to_string(), 0, "AAAAAA", "21000000", Some("1000"), Some("8"), None,
    )
    .unwrap();
    assert_eq!(lower, "aaaaaa");
    let info = tickers.get("aaaaaa").unwrap();
    assert_eq!(info.max_mint_times, 21000);
  }

  #[test]
  fn rejects_duplicate_deploy() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    handle_deploy(&mut tickers, &config, deployer(), "insc1".to_string(), 0, "aaaa", "1000", None, None, None).unwrap();
    let result = handle_deploy(&mut tickers, &config, deployer(), "insc2".to_string(), 0, "aaaa", "1000", None, None, None);
    assert!(matches!(result, Err(RejectReason::DuplicateTicker(_))));
  }

  #[test]
  fn rejects_zero_max_for_regular_deploy() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    let result = handle_deploy(&mut tickers, &config, deployer(), "insc1".to_string(), 0, "aaaa", "0", None, None, None);
    assert!(result.is_err());
  }

  #[test]
  fn accepts_zero_max_for_self_mint() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    let result = handle_deploy(
      &mut tickers, &config, deployer(), "insc1".to_string(), 0, "aaaa", "0", None, None, Some("true"),
    );
    assert!(result.is_ok());
  }

  #[test]
  fn rejects_zero_lim_for_regular_deploy() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    let result = handle_deploy(
      &mut tickers, &config, deployer(), "insc1".to_string(), 0, "aaaa", "1000", Some("0"), None, None,
    );
    assert!(result.is_err());
  }

  #[test]
  fn zero_lim_falls_back_to_max_u64_for_self_mint() {
    let mut tickers = TickerRegistry::new();
    let config = Config::default();
    let result = handle_deploy(
      &mut tickers, &config, deployer(), "insc1".to_string(), 0, "aaaa", "1000", Some("0"), None, Some("true"),
    );
    assert!(result.is_ok());
    let info = tickers.get("aaaa").unwrap();
    assert_eq!(info.limit, crate::decimal::Decimal::max_u64(MAX_PRECISION));
  }

  #[test]
  fn self_mint_gated_by_height() {
    let mut tickers = TickerRegistry::new();
    let mut config = Config::default();
    config.enable_self_mint_height = 1000;
    let result = handle_deploy(
      &mut tickers, &config, deployer(), "insc1".to_string(), 500, "aaaa", "0", None, None, Some("true"),
    );
    assert!(matches!(result, Err(RejectReason::SelfMintNotEnabled)));
  }
}
