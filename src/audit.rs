//! Consistency audit
//!
//! Reports record states the schema permits but the grading workflow does
//! not expect. Nothing is modified.

use serde::Serialize;
use std::fmt;
use crate::model::{SessionId, SolutionId, TaskId, TeachingId};
use crate::storage::RecordStore;
use crate::Result;

/// One suspicious record (or record group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    MarkWithoutAssessor { solution: SolutionId },
    MarkWithoutReceiveDate { solution: SolutionId },
    LeaveBeforeJoin { teaching: TeachingId },
    BatchConflict { session: SessionId, number: i64, tasks: Vec<TaskId> },
}

impl Finding {
    pub fn kind(&self) -> &'static str {
        match self {
            Finding::MarkWithoutAssessor { .. } => "mark_without_assessor",
            Finding::MarkWithoutReceiveDate { .. } => "mark_without_receive_date",
            Finding::LeaveBeforeJoin { .. } => "leave_before_join",
            Finding::BatchConflict { .. } => "batch_conflict",
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MarkWithoutAssessor { solution } => {
                write!(f, "Solution #{} has a mark but no assessor", solution)
            }
            Finding::MarkWithoutReceiveDate { solution } => {
                write!(f, "Solution #{} has a mark but no receive date", solution)
            }
            Finding::LeaveBeforeJoin { teaching } => {
                write!(f, "Teaching #{} ends before it starts", teaching)
            }
            Finding::BatchConflict { session, number, tasks } => {
                let tasks: Vec<String> = tasks.iter().map(|t| format!("#{}", t)).collect();
                write!(
                    f,
                    "Session #{} uses number {} for tasks {}",
                    session,
                    number,
                    tasks.join(", ")
                )
            }
        }
    }
}

fn ids_where<T: rusqlite::types::FromSql>(store: &RecordStore, sql: &str) -> Result<Vec<T>> {
    let mut stmt = store.conn().prepare(sql)?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(ids)
}

/// Inspect the whole store and collect every finding
pub fn audit(store: &RecordStore) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for solution in ids_where(
        store,
        "SELECT id FROM solutions WHERE mark_tenths IS NOT NULL AND assessor_id IS NULL ORDER BY id",
    )? {
        findings.push(Finding::MarkWithoutAssessor { solution });
    }

    for solution in ids_where(
        store,
        "SELECT id FROM solutions WHERE mark_tenths IS NOT NULL AND receive_date IS NULL ORDER BY id",
    )? {
        findings.push(Finding::MarkWithoutReceiveDate { solution });
    }

    for teaching in ids_where(
        store,
        "SELECT id FROM teachings WHERE leave_date IS NOT NULL AND leave_date < join_date ORDER BY id",
    )? {
        findings.push(Finding::LeaveBeforeJoin { teaching });
    }

    for conflict in store.batch_conflicts()? {
        findings.push(Finding::BatchConflict {
            session: conflict.session,
            number: conflict.number,
            tasks: conflict.tasks,
        });
    }

    for finding in &findings {
        tracing::warn!("Audit: {}", finding);
    }
    tracing::debug!("Audit finished with {} finding(s)", findings.len());
    Ok(findings)
}
