//! Mirrors of the externally owned registries
//!
//! People, academics and sessions are managed by other modules. The store
//! keeps just enough of each row to enforce foreign keys, search by name and
//! print a readable label.

use super::ids::{AcademicId, HumanId, SessionId};
use super::validation::{normalize_text, ValidationErrors, REQUIRED};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A person from the contact registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Human {
    pub id: HumanId,
    pub first_name: String,
    pub last_name: String,
    /// Surname before a change of name, kept searchable
    pub old_last_name: Option<String>,
}

impl Human {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: HumanId(0), // Set by DB
            first_name: first_name.into(),
            last_name: last_name.into(),
            old_last_name: None,
        }
    }

    pub fn with_old_last_name(mut self, old_last_name: impl Into<String>) -> Self {
        self.old_last_name = Some(old_last_name.into());
        self
    }

    pub(crate) fn normalized(&self) -> crate::Result<Self> {
        let mut errors = ValidationErrors::new();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        if first_name.is_empty() {
            errors.add("first_name", REQUIRED);
        }
        if last_name.is_empty() {
            errors.add("last_name", REQUIRED);
        }
        errors.into_result()?;

        Ok(Self {
            id: self.id,
            first_name,
            last_name,
            old_last_name: normalize_text(self.old_last_name.clone()),
        })
    }
}

impl fmt::Display for Human {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// A student from the academic registry; every academic is a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Academic {
    pub id: AcademicId,
    pub human: HumanId,
}

/// A payment period used to attribute graded solutions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SessionId(0), // Set by DB
            title: title.into(),
            begin_date: None,
            end_date: None,
        }
    }

    pub fn between(mut self, begin: NaiveDate, end: NaiveDate) -> Self {
        self.begin_date = Some(begin);
        self.end_date = Some(end);
        self
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
