//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - teachers(human_id, comment), teachings(teacher_id, academic_id, join_date, leave_date)
//! - tasks(title UNIQUE, creation_date, comment) with task_authors and task_tags links
//! - solutions(task_id, academic_id UNIQUE together, number, mark_tenths, ...) with solution_sessions
//! - humans, academics, sessions, tags: mirrors of externally owned registries

pub mod schema;
pub mod sqlite;
pub mod solutions;
pub mod tasks;
pub mod teachers;

pub use sqlite::{DbStats, DeletePolicy, RecordStore, StoreOptions};
pub use solutions::BatchConflict;

use crate::{Error, Result};
use std::fmt;

/// Rows still pointing at a record that is about to be deleted
pub(crate) struct Dependents {
    entity: &'static str,
    id: i64,
    counts: Vec<(&'static str, usize)>,
}

impl Dependents {
    pub(crate) fn new(entity: &'static str, id: i64) -> Self {
        Self { entity, id, counts: Vec::new() }
    }

    pub(crate) fn add(&mut self, relation: &'static str, count: usize) {
        if count > 0 {
            self.counts.push((relation, count));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Integrity error listing every referencing relation, if there are any
    pub(crate) fn ensure_none(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::Integrity(format!(
            "Cannot delete {} #{}: referenced by {}",
            self.entity, self.id, self
        )))
    }
}

impl fmt::Display for Dependents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (relation, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}(s)", count, relation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependents_message() {
        let mut deps = Dependents::new("Teacher", 4);
        deps.add("teaching", 2);
        deps.add("task author link", 0);
        deps.add("assessed solution", 1);

        let err = deps.ensure_none().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Integrity error: Cannot delete Teacher #4: referenced by 2 teaching(s), 1 assessed solution(s)"
        );
        assert!(Dependents::new("Task", 1).ensure_none().is_ok());
    }
}
