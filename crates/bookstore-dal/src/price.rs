//! Monetary amounts kept in minor units (cents) so that equality filters and
//! two-decimal presentation stay exact.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParsePriceError {
    #[error("not a decimal number: {0}")]
    NotANumber(String),
    #[error("more than two fraction digits: {0}")]
    TooManyFractionDigits(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Price(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl FromStr for Price {
    type Err = ParsePriceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (units_part, fraction_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if units_part.is_empty() && fraction_part.is_empty() {
            return Err(ParsePriceError::NotANumber(input.to_string()));
        }
        if fraction_part.len() > 2 {
            return Err(ParsePriceError::TooManyFractionDigits(input.to_string()));
        }
        let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !digits(units_part) || !digits(fraction_part) {
            return Err(ParsePriceError::NotANumber(input.to_string()));
        }
        let units: i64 = if units_part.is_empty() {
            0
        } else {
            units_part
                .parse()
                .map_err(|_| ParsePriceError::OutOfRange(input.to_string()))?
        };
        let fraction: i64 = match fraction_part.len() {
            0 => 0,
            1 => fraction_part.parse::<i64>().unwrap() * 10,
            _ => fraction_part.parse().unwrap(),
        };
        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(|| ParsePriceError::OutOfRange(input.to_string()))?;
        Ok(Price(if negative { -cents } else { cents }))
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PriceVisitor;

        impl Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal amount with at most two fraction digits")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Price, E> {
                value
                    .checked_mul(100)
                    .map(Price)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Price, E> {
                i64::try_from(value)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Price)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Price, E> {
                if !value.is_finite() {
                    return Err(E::custom("amount out of range"));
                }
                // shortest round-trip representation, so excess fraction
                // digits are rejected rather than rounded away
                value.to_string().parse().map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Price, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

impl sqlx::Type<crate::ChosenDB> for Price {
    fn type_info() -> <crate::ChosenDB as sqlx::Database>::TypeInfo {
        <i64 as sqlx::Type<crate::ChosenDB>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, crate::ChosenDB> for Price {
    fn decode(
        value: <crate::ChosenDB as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Price(<i64 as sqlx::Decode<crate::ChosenDB>>::decode(
            value,
        )?))
    }
}

impl<'q> sqlx::Encode<'q, crate::ChosenDB> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut <crate::ChosenDB as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<'q, crate::ChosenDB>>::encode_by_ref(&self.0, buf)
    }
}
