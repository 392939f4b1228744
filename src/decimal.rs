//! Fixed-point decimal: a signed `i128` magnitude paired with a per-value
//! `precision` (number of fractional digits, `0..=18`). Arithmetic is exact
//! in the value domain; overflow against the `u64` range is a validation
//! concern at the call site, never a silent wrap.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

pub const MAX_PRECISION: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
  #[error("invalid decimal string")]
  Malformed,
  #[error("precision {0} exceeds maximum of {MAX_PRECISION}")]
  PrecisionTooLarge(u8),
  #[error("more fractional digits than the target precision allows")]
  TooManyFractionalDigits,
  #[error("arithmetic overflow")]
  Overflow,
}

/// A signed decimal value: `raw / 10^precision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
  raw: i128,
  precision: u8,
}

impl Decimal {
  pub fn zero(precision: u8) -> Self {
    Self { raw: 0, precision }
  }

  pub fn precision(&self) -> u8 {
    self.precision
  }

  /// Parses a base-10 string (optional leading `-`, optional single `.`)
  /// at the given target precision. Rejects malformed digits and any
  /// string with more fractional digits than `precision` allows.
  pub fn parse(s: &str, precision: u8) -> Result<Self, DecimalError> {
    if precision > MAX_PRECISION {
      return Err(DecimalError::PrecisionTooLarge(precision));
    }
    let s = s.trim();
    if s.is_empty() {
      return Err(DecimalError::Malformed);
    }

    let (neg, body) = match s.strip_prefix('-') {
      Some(rest) => (true, rest),
      None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match body.split_once('.') {
      Some((i, f)) => (i, f),
      None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
      return Err(DecimalError::Malformed);
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
      || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
      return Err(DecimalError::Malformed);
    }
    if frac_part.len() > precision as usize {
      return Err(DecimalError::TooManyFractionalDigits);
    }

    let mut digits = String::with_capacity(int_part.len() + precision as usize);
    digits.push_str(if int_part.is_empty() { "0" } else { int_part });
    digits.push_str(frac_part);
    for _ in 0..(precision as usize - frac_part.len()) {
      digits.push('0');
    }

    let raw: i128 = digits.parse().map_err(|_| DecimalError::Malformed)?;
    let raw = if neg { -raw } else { raw };

    Ok(Self { raw, precision })
  }

  pub fn sign(&self) -> i8 {
    match self.raw.cmp(&0) {
      Ordering::Less => -1,
      Ordering::Equal => 0,
      Ordering::Greater => 1,
    }
  }

  fn same_precision(&self, other: &Self) -> bool {
    self.precision == other.precision
  }

  pub fn checked_add(&self, other: &Self) -> Result<Self, DecimalError> {
    debug_assert!(self.same_precision(other), "mismatched decimal precision");
    Ok(Self {
      raw: self.raw.checked_add(other.raw).ok_or(DecimalError::Overflow)?,
      precision: self.precision,
    })
  }

  pub fn checked_sub(&self, other: &Self) -> Result<Self, DecimalError> {
    debug_assert!(self.same_precision(other), "mismatched decimal precision");
    Ok(Self {
      raw: self.raw.checked_sub(other.raw).ok_or(DecimalError::Overflow)?,
      precision: self.precision,
    })
  }

  pub fn checked_mul(&self, other: &Self) -> Result<Self, DecimalError> {
    let scale = 10i128.pow(other.precision as u32);
    let raw = self.raw.checked_mul(other.raw).ok_or(DecimalError::Overflow)?;
    Ok(Self {
      raw: raw.checked_div(scale).ok_or(DecimalError::Overflow)?,
      precision: self.precision,
    })
  }

  /// Truncating division toward zero.
  pub fn checked_div(&self, other: &Self) -> Result<Self, DecimalError> {
    if other.raw == 0 {
      return Err(DecimalError::Overflow);
    }
    let scale = 10i128.pow(other.precision as u32);
    let numerator = self.raw.checked_mul(scale).ok_or(DecimalError::Overflow)?;
    Ok(Self {
      raw: numerator / other.raw,
      precision: self.precision,
    })
  }

  pub fn cmp(&self, other: &Self) -> Ordering {
    debug_assert!(self.same_precision(other), "mismatched decimal precision");
    self.raw.cmp(&other.raw)
  }

  /// `true` when the integer part would exceed `u64::MAX`.
  pub fn is_overflow_u64(&self) -> bool {
    if self.raw < 0 {
      return false;
    }
    let scale = 10i128.pow(self.precision as u32);
    let int_part = self.raw / scale;
    int_part > u64::MAX as i128
  }

  /// The representation of `u64::MAX` at this value's precision.
  pub fn max_u64(precision: u8) -> Self {
    let scale = 10i128.pow(precision as u32);
    Self {
      raw: (u64::MAX as i128) * scale,
      precision,
    }
  }

  pub fn rescale(&mut self, precision: u8) {
    if precision == self.precision {
      return;
    }
    if precision > self.precision {
      self.raw *= 10i128.pow((precision - self.precision) as u32);
    } else {
      self.raw /= 10i128.pow((self.precision - precision) as u32);
    }
    self.precision = precision;
  }

  /// `ceil(self / other)` as a `u64`, for callers that need a mint-times
  /// style count rather than a decimal quotient. `None` if `other` is
  /// zero or the result doesn't fit in a `u64`.
  pub fn ceil_div_u64(&self, other: &Self) -> Option<u64> {
    if other.raw <= 0 || self.raw < 0 {
      return None;
    }
    let (q, r) = (self.raw / other.raw, self.raw % other.raw);
    let q = if r != 0 { q + 1 } else { q };
    u64::try_from(q).ok()
  }

  pub fn to_u64(&self) -> Option<u64> {
    if self.raw < 0 || self.is_overflow_u64() {
      return None;
    }
    let scale = 10i128.pow(self.precision as u32);
    u64::try_from(self.raw / scale).ok()
  }
}

impl Display for Decimal {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let scale = 10i128.pow(self.precision as u32);
    let neg = self.raw < 0;
    let raw = self.raw.unsigned_abs();
    let int_part = raw / scale as u128;
    let frac_part = raw % scale as u128;
    if neg && (int_part != 0 || frac_part != 0) {
      write!(f, "-")?;
    }
    if self.precision == 0 {
      write!(f, "{int_part}")
    } else {
      write!(f, "{int_part}.{frac_part:0width$}", width = self.precision as usize)
    }
  }
}

impl PartialOrd for Decimal {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    if self.precision != other.precision {
      return None;
    }
    Some(self.raw.cmp(&other.raw))
  }
}

impl Serialize for Decimal {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Decimal {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    struct Raw {
      raw: i128,
      precision: u8,
    }
    let raw = Raw::deserialize(deserializer)?;
    Ok(Decimal {
      raw: raw.raw,
      precision: raw.precision,
    })
  }
}
