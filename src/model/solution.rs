//! Solutions: one academic's attempt at one task

use super::ids::{AcademicId, SolutionId, TaskId, TeacherId};
use super::mark::Mark;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One academic's attempt at one task, given out in a numbered batch.
///
/// `give_date`, `number` and the attached sessions record when the task was
/// handed out. A missing `mark` means the task was given but no graded
/// solution exists yet. `(task, academic)` is unique across all solutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    /// Date the task was given to the academic
    pub give_date: NaiveDate,
    /// Date the solution came back
    pub receive_date: Option<NaiveDate>,
    /// Batch number; within one session it always names the same task
    pub number: i64,
    pub academic: AcademicId,
    pub task: TaskId,
    pub mark: Option<Mark>,
    /// Teacher who evaluated the solution
    pub assessor: Option<TeacherId>,
}

impl Solution {
    pub fn new(task: TaskId, academic: AcademicId, number: i64, give_date: NaiveDate) -> Self {
        Self {
            id: SolutionId(0), // Set by DB
            give_date,
            receive_date: None,
            number,
            academic,
            task,
            mark: None,
            assessor: None,
        }
    }

    pub fn received_on(mut self, date: NaiveDate) -> Self {
        self.receive_date = Some(date);
        self
    }

    pub fn graded(mut self, mark: Mark, assessor: TeacherId) -> Self {
        self.mark = Some(mark);
        self.assessor = Some(assessor);
        self
    }

    pub fn state(&self) -> SolutionState {
        match (self.mark, self.receive_date) {
            (Some(_), _) => SolutionState::Graded,
            (None, Some(_)) => SolutionState::Received,
            (None, None) => SolutionState::Given,
        }
    }
}

/// Mark or `-` while ungraded
impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mark {
            Some(mark) => write!(f, "{}", mark),
            None => write!(f, "-"),
        }
    }
}

/// Where a solution stands, derived from its nullable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionState {
    /// Task handed out, nothing received
    Given,
    /// Solution received, not graded yet
    Received,
    /// Mark recorded
    Graded,
}

impl SolutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionState::Given => "given",
            SolutionState::Received => "received",
            SolutionState::Graded => "graded",
        }
    }
}

impl fmt::Display for SolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Solution {
        Solution::new(TaskId(1), AcademicId(2), 1, NaiveDate::from_ymd_opt(2021, 9, 1).unwrap())
    }

    #[test]
    fn test_state_transitions() {
        let given = sample();
        assert_eq!(given.state(), SolutionState::Given);

        let received = given.clone().received_on(NaiveDate::from_ymd_opt(2021, 9, 20).unwrap());
        assert_eq!(received.state(), SolutionState::Received);

        let graded = received.graded(Mark::from_tenths(85).unwrap(), TeacherId(3));
        assert_eq!(graded.state(), SolutionState::Graded);
    }

    #[test]
    fn test_display_mark_or_dash() {
        let solution = sample();
        assert_eq!(solution.to_string(), "-");
        let graded = solution.graded(Mark::from_tenths(100).unwrap(), TeacherId(1));
        assert_eq!(graded.to_string(), "10.0");
    }
}
