//! Teachers and the groups of academics they teach

use super::ids::{AcademicId, HumanId, TeacherId, TeachingId};
use super::registry::Human;
use super::validation::normalize_text;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A distance-learning teacher.
///
/// Identity and contact data live on the referenced `Human`; the teacher
/// row only adds a free-text comment. Students are linked through `Teaching`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub human: HumanId,
    pub comment: Option<String>,
}

impl Teacher {
    pub fn new(human: HumanId) -> Self {
        Self {
            id: TeacherId(0), // Set by DB
            human,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Label shown wherever a teacher is referenced, e.g. `Ada Lovelace (teacher)`
    pub fn label(human: &Human) -> String {
        format!("{} (teacher)", human)
    }

    pub(crate) fn normalized(&self) -> Self {
        Self {
            id: self.id,
            human: self.human,
            comment: normalize_text(self.comment.clone()),
        }
    }
}

/// Membership of an academic in a teacher's group over a time interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teaching {
    pub id: TeachingId,
    pub teacher: TeacherId,
    pub academic: AcademicId,
    /// When the academic joined the group
    pub join_date: NaiveDate,
    /// When the academic left the group; `None` while still a member
    pub leave_date: Option<NaiveDate>,
}

impl Teaching {
    pub fn new(teacher: TeacherId, academic: AcademicId, join_date: NaiveDate) -> Self {
        Self {
            id: TeachingId(0), // Set by DB
            teacher,
            academic,
            join_date,
            leave_date: None,
        }
    }

    pub fn left_on(mut self, leave_date: NaiveDate) -> Self {
        self.leave_date = Some(leave_date);
        self
    }

    /// Active iff there is no leave date or it is still in the future on `on`
    pub fn is_active(&self, on: NaiveDate) -> bool {
        match self.leave_date {
            None => true,
            Some(leave) => leave > on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_activity_window() {
        let teaching = Teaching::new(TeacherId(1), AcademicId(1), date(2020, 1, 1));
        assert!(teaching.is_active(date(2030, 1, 1)));

        let left = teaching.left_on(date(2020, 6, 1));
        assert!(left.is_active(date(2020, 5, 31)));
        assert!(!left.is_active(date(2020, 6, 1)));
        assert!(!left.is_active(date(2021, 1, 1)));
    }

    #[test]
    fn test_label() {
        let human = Human::new("Ada", "Lovelace");
        assert_eq!(Teacher::label(&human), "Ada Lovelace (teacher)");
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let teacher = Teacher::new(HumanId(1)).with_comment("   ").normalized();
        assert_eq!(teacher.comment, None);
    }
}
