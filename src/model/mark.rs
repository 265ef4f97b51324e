//! Decimal grade with one digit after the point

use crate::{Error, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Maximum number of digits in a mark, both sides of the point
pub const MAX_DIGITS: usize = 3;
/// Digits allowed after the decimal point
pub const DECIMAL_PLACES: usize = 1;

const MAX_TENTHS: i64 = 999;

/// A solution mark such as `9.5` or `10.0`.
///
/// Stored as an integer number of tenths so no floating point rounding
/// ever reaches the database. Always within `-99.9..=99.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(i64);

impl Mark {
    /// Build a mark from tenths (`95` is `9.5`)
    pub fn from_tenths(tenths: i64) -> Result<Self> {
        if tenths.abs() > MAX_TENTHS {
            return Err(Error::field(
                "mark",
                format!("Ensure that there are no more than {} digits in total.", MAX_DIGITS),
            ));
        }
        Ok(Mark(tenths))
    }

    pub fn tenths(self) -> i64 {
        self.0
    }
}

impl FromStr for Mark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::field("mark", format!("Enter a number. Got '{}'.", s));

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > DECIMAL_PLACES {
            return Err(Error::field(
                "mark",
                format!("Ensure that there are no more than {} decimal place.", DECIMAL_PLACES),
            ));
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_DIGITS - DECIMAL_PLACES {
            return Err(Error::field(
                "mark",
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    MAX_DIGITS - DECIMAL_PLACES
                ),
            ));
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
        let tenth: i64 = if fraction.is_empty() { 0 } else { fraction.parse().map_err(|_| invalid())? };
        let tenths = whole * 10 + tenth;

        Mark::from_tenths(if negative { -tenths } else { tenths })
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

impl Serialize for Mark {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Mark {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Mark {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tenths = i64::column_result(value)?;
        Mark::from_tenths(tenths).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
