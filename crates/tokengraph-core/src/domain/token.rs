use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::validate_non_negative;
use crate::ValidationError;

/// Stable token identifier (policy id + asset name upstream).
///
/// Units are case-sensitive and compared verbatim; only surrounding
/// whitespace is stripped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit(String);

impl Unit {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUnit);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for Unit {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Unit {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Unit {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        value.0
    }
}

/// Liquidity-ranked token snapshot. Tickers are display names and may collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub unit: Unit,
    pub ticker: String,
    pub price: f64,
    pub liquidity: f64,
}

impl Token {
    pub fn new(
        unit: Unit,
        ticker: impl Into<String>,
        price: f64,
        liquidity: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_non_negative("liquidity", liquidity)?;

        let ticker = ticker.into();
        let ticker = match ticker.trim() {
            "" => unit.as_str().to_owned(),
            trimmed => trimmed.to_owned(),
        };

        Ok(Self {
            unit,
            ticker,
            price,
            liquidity,
        })
    }
}
