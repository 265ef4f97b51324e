//! Record types
//!
//! Four entities make up the learning records:
//! - `Teacher`: a distance-learning instructor, backed by a `Human`
//! - `Teaching`: an academic's membership in a teacher's group
//! - `Task`: an assignment with unique title, authors and tags
//! - `Solution`: one academic's graded (or pending) attempt at a task
//!
//! `Human`, `Academic` and `Session` belong to external registries and
//! are only mirrored here.

pub mod ids;
pub mod mark;
pub mod registry;
pub mod solution;
pub mod task;
pub mod teacher;
pub mod validation;

pub use ids::{AcademicId, HumanId, SessionId, SolutionId, TagId, TaskId, TeacherId, TeachingId};
pub use mark::Mark;
pub use registry::{Academic, Human, Session};
pub use solution::{Solution, SolutionState};
pub use task::{slugify, Tag, Task};
pub use teacher::{Teacher, Teaching};
pub use validation::{FieldError, ValidationErrors};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The administrable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Teacher,
    Teaching,
    Task,
    Solution,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Teacher => "teacher",
            EntityKind::Teaching => "teaching",
            EntityKind::Task => "task",
            EntityKind::Solution => "solution",
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Teacher,
            EntityKind::Teaching,
            EntityKind::Task,
            EntityKind::Solution,
        ]
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "teacher" | "teachers" => Ok(EntityKind::Teacher),
            "teaching" | "teachings" | "group" => Ok(EntityKind::Teaching),
            "task" | "tasks" => Ok(EntityKind::Task),
            "solution" | "solutions" => Ok(EntityKind::Solution),
            _ => Err(Error::InvalidValue(format!("Unknown entity: {}", s))),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_roundtrip_names() {
        for kind in EntityKind::all() {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), *kind);
        }
        assert_eq!("Solutions".parse::<EntityKind>().unwrap(), EntityKind::Solution);
        assert!("homework".parse::<EntityKind>().is_err());
    }
}
