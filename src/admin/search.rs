//! Free-text search over configured fields
//!
//! A search term is split on whitespace. Every word has to match at least
//! one search field, so words are AND-ed and fields are OR-ed. A prefix on
//! the field name picks the lookup:
//! - none or `@`: case-insensitive substring
//! - `^`: case-insensitive prefix
//! - `=`: case-insensitive exact match

use rusqlite::types::Value;
use serde::{Serialize, Serializer};
use std::fmt;
use crate::model::EntityKind;
use crate::{Error, Result};
use super::fields::column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Contains,
    StartsWith,
    Exact,
}

/// A field path plus the lookup used to match it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
    pub path: String,
    pub lookup: Lookup,
}

impl SearchField {
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        let (lookup, path) = match field.chars().next() {
            Some('^') => (Lookup::StartsWith, &field[1..]),
            Some('=') => (Lookup::Exact, &field[1..]),
            Some('@') => (Lookup::Contains, &field[1..]),
            _ => (Lookup::Contains, field),
        };
        Self {
            path: path.to_string(),
            lookup,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.lookup {
            Lookup::Contains => "",
            Lookup::StartsWith => "^",
            Lookup::Exact => "=",
        };
        write!(f, "{}{}", prefix, self.path)
    }
}

impl Serialize for SearchField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `WHERE` fragment and parameters for a search term, `None` for a blank term
pub(crate) fn search_clause(
    kind: EntityKind,
    fields: &[SearchField],
    term: &str,
) -> Result<Option<(String, Vec<Value>)>> {
    let words: Vec<&str> = term.split_whitespace().collect();
    if words.is_empty() || fields.is_empty() {
        return Ok(None);
    }

    let mut resolved = Vec::with_capacity(fields.len());
    for field in fields {
        let expr = column(kind, &field.path).ok_or_else(|| {
            Error::Catalog(format!("{} has no search field '{}'", kind, field.path))
        })?;
        resolved.push((expr, field.lookup));
    }

    let mut clauses = Vec::with_capacity(words.len());
    let mut params = Vec::new();
    for word in words {
        let escaped = escape_like(word);
        let alternatives: Vec<String> = resolved
            .iter()
            .map(|(expr, lookup)| match lookup {
                Lookup::Contains => {
                    params.push(Value::Text(format!("%{}%", escaped)));
                    format!("CAST({} AS TEXT) LIKE ? ESCAPE '\\'", expr)
                }
                Lookup::StartsWith => {
                    params.push(Value::Text(format!("{}%", escaped)));
                    format!("CAST({} AS TEXT) LIKE ? ESCAPE '\\'", expr)
                }
                Lookup::Exact => {
                    params.push(Value::Text(word.to_string()));
                    format!("CAST({} AS TEXT) = ? COLLATE NOCASE", expr)
                }
            })
            .collect();
        clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    Ok(Some((clauses.join(" AND "), params)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(SearchField::parse("title").lookup, Lookup::Contains);
        assert_eq!(SearchField::parse("^title").lookup, Lookup::StartsWith);
        let exact = SearchField::parse("=id");
        assert_eq!(exact.lookup, Lookup::Exact);
        assert_eq!(exact.path, "id");
        assert_eq!(exact.to_string(), "=id");
        assert_eq!(SearchField::parse("@title").to_string(), "title");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }

    #[test]
    fn test_clause_ands_words_and_ors_fields() {
        let fields = vec![SearchField::parse("=id"), SearchField::parse("title")];
        let (sql, params) = search_clause(EntityKind::Task, &fields, " algo  graphs ")
            .unwrap()
            .unwrap();
        assert_eq!(
            sql,
            "(CAST(tk.id AS TEXT) = ? COLLATE NOCASE OR CAST(tk.title AS TEXT) LIKE ? ESCAPE '\\') AND \
             (CAST(tk.id AS TEXT) = ? COLLATE NOCASE OR CAST(tk.title AS TEXT) LIKE ? ESCAPE '\\')"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[1], Value::Text("%algo%".to_string()));
    }

    #[test]
    fn test_blank_term_has_no_clause() {
        let fields = vec![SearchField::parse("title")];
        assert!(search_clause(EntityKind::Task, &fields, "   ").unwrap().is_none());
    }

    #[test]
    fn test_unknown_field_is_catalog_error() {
        let fields = vec![SearchField::parse("nope")];
        assert!(matches!(
            search_clause(EntityKind::Task, &fields, "x"),
            Err(Error::Catalog(_))
        ));
    }
}
