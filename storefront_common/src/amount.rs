use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The currency used for orders and charges when none is configured.
pub const DEFAULT_CURRENCY: &str = "TZS";

//--------------------------------------       Amount        ---------------------------------------------------------
/// A monetary value in the unit the payment provider charges in (whole shillings for TZS).
///
/// Cart prices, order totals, ledger amounts and profit all share this unit, so no conversion ever happens between
/// them. Amounts deserialize from JSON integers, from floats with no fractional part, and from numeric strings, since
/// provider callbacks are not consistent about how they encode numbers.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);

impl Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(AmountConversionError(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as i64))
    }
}

impl TryFrom<&str> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(Self(v));
        }
        let v = trimmed.parse::<f64>().map_err(|_| AmountConversionError(value.to_string()))?;
        Self::try_from(v)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_mul(&self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(&self, rhs: Amount) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(&self, rhs: Amount) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Int(i64),
            Float(f64),
            Text(String),
        }
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(v) => Ok(Self(v)),
            RawAmount::Float(v) => Self::try_from(v).map_err(de::Error::custom),
            RawAmount::Text(s) => Self::try_from(s.as_str()).map_err(de::Error::custom),
        }
    }
}
