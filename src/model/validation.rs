//! Field-attributed validation errors

use serde::Serialize;
use std::fmt;

/// A single constraint violation attributed to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found while validating one record.
///
/// Validation collects all failures before reporting, so a caller can show
/// them next to each offending field at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Names of the offending fields, in the order they were reported
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors
    pub fn into_result(self) -> crate::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

pub(crate) const REQUIRED: &str = "This field is required.";

/// Trim free text and treat blank input as absent
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_and_formats() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("title", REQUIRED);
        errors.add("mark", "out of range");

        assert_eq!(errors.fields(), vec!["title", "mark"]);
        assert!(errors.has_field("mark"));
        assert_eq!(errors.to_string(), "title: This field is required.; mark: out of range");
        assert!(errors.into_result().unwrap_err().is_validation());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  ".into())), None);
        assert_eq!(normalize_text(Some(" note ".into())), Some("note".to_string()));
        assert_eq!(normalize_text(None), None);
    }
}
