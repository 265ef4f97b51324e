//! Tasks handed out to academics, and the free-form tags attached to them

use super::ids::{TagId, TaskId};
use super::validation::{normalize_text, ValidationErrors, REQUIRED};
use chrono::NaiveDate;
use deunicode::deunicode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Longest allowed task title, in characters
pub const TITLE_MAX_LENGTH: usize = 200;

/// A distance-learning task.
///
/// Titles are unique across all tasks. Authors and tags are link sets
/// kept by the store next to the task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub creation_date: Option<NaiveDate>,
    pub comment: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TaskId(0), // Set by DB
            title: title.into(),
            creation_date: None,
            comment: None,
        }
    }

    pub fn created_on(mut self, date: NaiveDate) -> Self {
        self.creation_date = Some(date);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Trimmed copy with field-level checks applied; uniqueness is checked by the store
    pub(crate) fn normalized(&self) -> crate::Result<Self> {
        let mut errors = ValidationErrors::new();
        let title = self.title.trim().to_string();
        let length = title.chars().count();

        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if length > TITLE_MAX_LENGTH {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    TITLE_MAX_LENGTH, length
                ),
            );
        }
        errors.into_result()?;

        Ok(Self {
            id: self.id,
            title,
            creation_date: self.creation_date,
            comment: normalize_text(self.comment.clone()),
        })
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A free-form label; names and slugs are both unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn non_slug_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// Transliterate to ASCII, lowercase, and collapse every run of other
/// characters into `-` (`Grafų teorija` becomes `grafu-teorija`)
pub fn slugify(name: &str) -> String {
    let lowered = deunicode(name.trim()).to_lowercase();
    non_slug_chars()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Validate a tag name and derive its slug
pub(crate) fn tag_parts(name: &str) -> crate::Result<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::Error::field("tags", REQUIRED));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(crate::Error::field(
            "tags",
            format!("Tag '{}' must contain at least one letter or digit.", name),
        ));
    }
    Ok((name.to_string(), slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_required() {
        let err = Task::new("   ").normalized().unwrap_err();
        match err {
            crate::Error::Validation(errors) => assert_eq!(errors.fields(), vec!["title"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_title_max_length_counts_characters() {
        let exact = "ž".repeat(TITLE_MAX_LENGTH);
        assert!(Task::new(exact).normalized().is_ok());

        let too_long = "a".repeat(TITLE_MAX_LENGTH + 1);
        let err = Task::new(too_long).normalized().unwrap_err();
        assert!(err.to_string().contains("at most 200 characters (it has 201)"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Dynamic Programming"), "dynamic-programming");
        assert_eq!(slugify("  Graphs & Trees!! "), "graphs-trees");
        assert_eq!(slugify("C++"), "c");
    }

    #[test]
    fn test_slugify_transliterates_lithuanian() {
        assert_eq!(slugify("Šachmatai"), "sachmatai");
        assert_eq!(slugify("Grafų teorija"), "grafu-teorija");
        assert_eq!(slugify("Žaidimų teorija"), "zaidimu-teorija");
        assert_eq!(tag_parts("ąčę").unwrap(), ("ąčę".to_string(), "ace".to_string()));
    }

    #[test]
    fn test_tag_parts_rejects_punctuation_only() {
        assert!(tag_parts("!!!").is_err());
        assert!(tag_parts("").is_err());
        assert_eq!(tag_parts(" Greedy ").unwrap(), ("Greedy".to_string(), "greedy".to_string()));
    }
}
