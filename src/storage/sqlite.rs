//! SQLite record store: connection, schema, registry mirrors and statistics

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::{Deserialize, Serialize};
use crate::{Error, Result};
use crate::model::{Academic, AcademicId, Human, HumanId, Session, SessionId};
use super::schema;

/// What happens to rows that reference a record being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse the delete while anything still references the record
    #[default]
    Restrict,
    /// Delete dependents holding required references, null out optional ones
    Cascade,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::Restrict => "restrict",
            DeletePolicy::Cascade => "cascade",
        }
    }
}

impl std::str::FromStr for DeletePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "restrict" | "protect" => Ok(DeletePolicy::Restrict),
            "cascade" => Ok(DeletePolicy::Cascade),
            _ => Err(Error::InvalidValue(format!("Unknown delete policy: {}", s))),
        }
    }
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Behaviour switches for a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub delete_policy: DeletePolicy,
    /// Reject solutions whose (session, number) pair already names another task
    pub enforce_batch_dependency: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Restrict,
            enforce_batch_dependency: true,
        }
    }
}

/// SQLite-backed storage for the learning records
pub struct RecordStore {
    conn: Connection,
    options: StoreOptions,
}

impl RecordStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn, options };
        store.initialize_schema()?;
        tracing::debug!("Opened record store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(StoreOptions::default())
    }

    pub fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, options };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", true)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction; any error rolls everything back
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Registry Operations ==========

    /// Insert a person into the contact registry mirror
    pub fn insert_human(&self, human: &Human) -> Result<Human> {
        let human = human.normalized()?;
        self.conn.execute(
            "INSERT INTO humans (first_name, last_name, old_last_name) VALUES (?1, ?2, ?3)",
            params![human.first_name, human.last_name, human.old_last_name],
        )?;
        Ok(Human {
            id: HumanId(self.conn.last_insert_rowid()),
            ..human
        })
    }

    pub fn get_human(&self, id: HumanId) -> Result<Option<Human>> {
        self.conn
            .query_row(
                "SELECT id, first_name, last_name, old_last_name FROM humans WHERE id = ?1",
                [id],
                |row| {
                    Ok(Human {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        old_last_name: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Register an existing person as an academic
    pub fn insert_academic(&self, human: HumanId) -> Result<Academic> {
        if !exists(&self.conn, "humans", human.get())? {
            return Err(invalid_choice("human", "Human", human.get()));
        }
        self.conn.execute("INSERT INTO academics (human_id) VALUES (?1)", [human])?;
        Ok(Academic {
            id: AcademicId(self.conn.last_insert_rowid()),
            human,
        })
    }

    pub fn get_academic(&self, id: AcademicId) -> Result<Option<Academic>> {
        self.conn
            .query_row(
                "SELECT id, human_id FROM academics WHERE id = ?1",
                [id],
                |row| Ok(Academic { id: row.get(0)?, human: row.get(1)? }),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Person behind an academic, for labels
    pub fn academic_human(&self, id: AcademicId) -> Result<Option<Human>> {
        match self.get_academic(id)? {
            Some(academic) => self.get_human(academic.human),
            None => Ok(None),
        }
    }

    pub fn insert_session(&self, session: &Session) -> Result<Session> {
        let title = session.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::field("title", crate::model::validation::REQUIRED));
        }
        self.conn.execute(
            "INSERT INTO sessions (title, begin_date, end_date) VALUES (?1, ?2, ?3)",
            params![title, session.begin_date, session.end_date],
        )?;
        Ok(Session {
            id: SessionId(self.conn.last_insert_rowid()),
            title,
            begin_date: session.begin_date,
            end_date: session.end_date,
        })
    }

    pub fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
        self.conn
            .query_row(
                "SELECT id, title, begin_date, end_date FROM sessions WHERE id = ?1",
                [id],
                |row| {
                    Ok(Session {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        begin_date: row.get(2)?,
                        end_date: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Statistics ==========

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            teachers: self.count("SELECT COUNT(*) FROM teachers")?,
            teachings: self.count("SELECT COUNT(*) FROM teachings")?,
            open_teachings: self.count("SELECT COUNT(*) FROM teachings WHERE leave_date IS NULL")?,
            tasks: self.count("SELECT COUNT(*) FROM tasks")?,
            tags: self.count("SELECT COUNT(*) FROM tags")?,
            solutions: self.count("SELECT COUNT(*) FROM solutions")?,
            graded_solutions: self.count("SELECT COUNT(*) FROM solutions WHERE mark_tenths IS NOT NULL")?,
        })
    }
}

/// Whether `table` has a row with primary key `id`
pub(crate) fn exists(conn: &Connection, table: &'static str, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(&format!("SELECT 1 FROM {} WHERE id = ?1", table), [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Number of rows matching a single-parameter count query
pub(crate) fn count_refs(conn: &Connection, sql: &str, id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(count as usize)
}

/// Validation error for a reference to a row that does not exist
pub(crate) fn invalid_choice(field: &'static str, entity: &str, id: i64) -> Error {
    Error::field(
        field,
        format!("Select a valid choice. {} #{} does not exist.", entity, id),
    )
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub teachers: usize,
    pub teachings: usize,
    /// Teachings without a leave date
    pub open_teachings: usize,
    pub tasks: usize,
    pub tags: usize,
    pub solutions: usize,
    pub graded_solutions: usize,
}

impl DbStats {
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Teachers", self.teachers.to_string()),
            ("Teachings", self.teachings.to_string()),
            ("Open teachings", self.open_teachings.to_string()),
            ("Tasks", self.tasks.to_string()),
            ("Tags", self.tags.to_string()),
            ("Solutions", self.solutions.to_string()),
            ("Graded solutions", self.graded_solutions.to_string()),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (label, value) in self.rows() {
            writeln!(f, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_registry_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();

        let human = store
            .insert_human(&Human::new(" Ada ", "Lovelace").with_old_last_name("Byron"))
            .unwrap();
        assert_eq!(human.first_name, "Ada");

        let academic = store.insert_academic(human.id).unwrap();
        assert_eq!(store.get_academic(academic.id).unwrap().unwrap().human, human.id);
        assert_eq!(store.academic_human(academic.id).unwrap().unwrap().to_string(), "Ada Lovelace");

        let begin = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
        let session = store.insert_session(&Session::new("Autumn 2021").between(begin, end)).unwrap();
        let loaded = store.get_session(session.id).unwrap().unwrap();
        assert_eq!(loaded.begin_date, Some(begin));
    }

    #[test]
    fn test_academic_requires_existing_human() {
        let store = RecordStore::open_in_memory().unwrap();
        let err = store.insert_academic(HumanId(99)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_human_requires_names() {
        let store = RecordStore::open_in_memory().unwrap();
        match store.insert_human(&Human::new("", " ")).unwrap_err() {
            Error::Validation(errors) => assert_eq!(errors.fields(), vec!["first_name", "last_name"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        {
            let store = RecordStore::open(&path).unwrap();
            store.insert_human(&Human::new("Alan", "Turing")).unwrap();
        }
        let store = RecordStore::open(&path).unwrap();
        assert!(store.get_human(HumanId(1)).unwrap().is_some());
    }

    #[test]
    fn test_delete_policy_parse() {
        assert_eq!("cascade".parse::<DeletePolicy>().unwrap(), DeletePolicy::Cascade);
        assert_eq!("RESTRICT".parse::<DeletePolicy>().unwrap(), DeletePolicy::Restrict);
        assert!("ignore".parse::<DeletePolicy>().is_err());
    }
}
