//! # Learning Records
//!
//! Records for distance-learning teachers, the academics they teach,
//! the tasks they author and the graded solutions academics hand in.
//!
//! The crate provides:
//! - Plain record types for `Teacher`, `Teaching`, `Task` and `Solution`
//! - A SQLite-backed `RecordStore` that owns the schema and its constraints
//! - An explicit `AdminCatalog` describing list columns, search fields and filters
//! - A change-list engine that answers search/filter queries against the catalog
//! - An audit pass over states the schema allows but the workflow does not expect

pub mod model;
pub mod storage;
pub mod admin;
pub mod audit;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use model::{
    EntityKind, FieldError, Mark, Solution, SolutionState, Task, Teacher, Teaching,
    ValidationErrors,
};
pub use storage::{DeletePolicy, RecordStore, StoreOptions};
pub use admin::{AdminCatalog, ChangeListEngine, ChangeListQuery, ModelAdmin};

/// Result type alias for learning-records operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for learning-records operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more fields failed their constraints before anything was written
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// The store rejected a write: foreign key, uniqueness or a restricted delete
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl Error {
    /// Shorthand for a validation failure on a single field
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation(ValidationErrors::single(field, message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Integrity(message.unwrap_or_else(|| code.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
