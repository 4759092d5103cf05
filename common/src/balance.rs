use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits in one whole token.
pub const NEAR_NOMINATION: usize = 24;

/// One whole token in base units (10^24 yocto).
pub const ONE_NEAR: u128 = 10u128.pow(NEAR_NOMINATION as u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is not a decimal number: {0:?}")]
    NotANumber(String),
    #[error("amount has more than {NEAR_NOMINATION} fractional digits: {0:?}")]
    TooPrecise(String),
    #[error("amount does not fit in 128 bits: {0:?}")]
    Overflow(String),
}

/// An amount of the native value token, in base units.
///
/// Serialized as a decimal string because JSON numbers cannot carry 128 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(pub u128);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub fn as_yocto(self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Balance) -> Option<Balance> {
        self.0.checked_add(other.0).map(Balance)
    }

    pub fn checked_sub(self, other: Balance) -> Option<Balance> {
        self.0.checked_sub(other.0).map(Balance)
    }
}

impl From<u128> for Balance {
    fn from(v: u128) -> Self {
        Balance(v)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a raw base-unit amount such as `"10000000000000000000000"`.
impl FromStr for Balance {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::NotANumber(s.to_string()));
        }
        s.parse::<u128>()
            .map(Balance)
            .map_err(|_| AmountError::Overflow(s.to_string()))
    }
}

impl Serialize for Balance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Convert a whole-token decimal string (`"1.5"`) into base units.
///
/// An empty or whitespace-only input is treated as zero, matching what a blank
/// donation field means to a user.
pub fn parse_near_amount(amount: &str) -> Result<Balance, AmountError> {
    let trimmed = amount.trim().replace(',', "");
    if trimmed.is_empty() {
        return Ok(Balance::ZERO);
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed.as_str(), ""),
    };
    let valid_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !valid_digits(whole) || !valid_digits(frac) {
        return Err(AmountError::NotANumber(amount.to_string()));
    }
    if frac.len() > NEAR_NOMINATION {
        return Err(AmountError::TooPrecise(amount.to_string()));
    }

    let overflow = || AmountError::Overflow(amount.to_string());
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let padded = format!("{frac:0<width$}", width = NEAR_NOMINATION);
    let frac: u128 = padded.parse().map_err(|_| overflow())?;

    whole
        .checked_mul(ONE_NEAR)
        .and_then(|w| w.checked_add(frac))
        .map(Balance)
        .ok_or_else(overflow)
}

/// Render base units as a whole-token decimal string with trailing zeros trimmed.
pub fn format_near_amount(balance: Balance) -> String {
    let whole = balance.0 / ONE_NEAR;
    let frac = balance.0 % ONE_NEAR;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = NEAR_NOMINATION);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
