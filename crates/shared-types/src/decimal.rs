//! # Fixed-Point Decimal
//!
//! Non-negative decimal with 18 fractional digits, used for commission rates
//! and delegator shares. Always rendered with all 18 digits so the textual
//! form of a value is unique.

use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Number of fractional digits.
pub const DECIMAL_PRECISION: u32 = 18;

const SCALE: u128 = 1_000_000_000_000_000_000;

/// Fixed-point decimal, `value / 10^18`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Dec(u128);

impl Dec {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn one() -> Self {
        Self(SCALE)
    }

    /// `p / 100`.
    pub const fn percent(p: u64) -> Self {
        Self(p as u128 * (SCALE / 100))
    }

    /// Whole number as a decimal.
    pub fn from_int(value: u128) -> Result<Self, TypeError> {
        value
            .checked_mul(SCALE)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidDecimal {
                input: value.to_string(),
                reason: "integer too large",
            })
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:018}", self.0 / SCALE, self.0 % SCALE)
    }
}

impl FromStr for Dec {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| TypeError::InvalidDecimal {
            input: s.to_string(),
            reason,
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("integer part must be digits"));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("fractional part must be digits"));
        }
        if frac_part.len() > DECIMAL_PRECISION as usize {
            return Err(invalid("more than 18 fractional digits"));
        }

        let whole: u128 = int_part.parse().map_err(|_| invalid("integer part too large"))?;
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let digits: u128 = frac_part.parse().map_err(|_| invalid("bad fraction"))?;
            digits * 10u128.pow(DECIMAL_PRECISION - frac_part.len() as u32)
        };

        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .map(Dec)
            .ok_or_else(|| invalid("value too large"))
    }
}
