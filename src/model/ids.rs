//! Typed row identifiers
//!
//! Each table gets its own id type so a `TeacherId` can never be passed
//! where an `AcademicId` is expected.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| crate::Error::InvalidValue(format!("invalid {} id: {}", $label, s)))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                $name(id)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

define_id!(
    /// Identifier of an externally managed person record
    HumanId, "human"
);
define_id!(
    /// Identifier of an externally managed student record
    AcademicId, "academic"
);
define_id!(
    /// Identifier of an externally managed payment period
    SessionId, "session"
);
define_id!(TeacherId, "teacher");
define_id!(TeachingId, "teaching");
define_id!(TaskId, "task");
define_id!(SolutionId, "solution");
define_id!(TagId, "tag");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: TeacherId = " 42 ".parse().unwrap();
        assert_eq!(id, TeacherId(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "abc".parse::<TaskId>().unwrap_err();
        assert!(err.to_string().contains("invalid task id"));
    }
}
