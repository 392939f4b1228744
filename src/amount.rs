//! Shared amount parsing/validation used by both the inscribe-transfer
//! handler and module commit `send` functions (spec §4.6, §4.8): both
//! need "parse at this ticker's decimal precision, reject zero/negative,
//! reject values that would not fit in a `u64` integer part" applied
//! identically, so it lives in one place instead of being re-derived at
//! each call site.

use crate::decimal::Decimal;
use crate::error::RejectReason;

/// Parses `raw` at `precision`, rejecting anything that isn't strictly
/// positive or that overflows the `u64` range a balance is allowed to
/// reach.
pub fn validate_amount(raw: &str, precision: u8) -> Result<Decimal, RejectReason> {
  let amount = Decimal::parse(raw, precision).map_err(|_| RejectReason::InvalidNumber(raw.to_string()))?;
  if amount.sign() <= 0 {
    return Err(RejectReason::InvalidNumber(raw.to_string()));
  }
  if amount.is_overflow_u64() {
    return Err(RejectReason::OutOfRange);
  }
  Ok(amount)
}
