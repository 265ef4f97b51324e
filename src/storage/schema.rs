//! Database schema definitions

/// Mirror of the contact registry
pub const CREATE_HUMANS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS humans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    old_last_name TEXT
)
"#;

/// Mirror of the academic registry
pub const CREATE_ACADEMICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS academics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    human_id INTEGER NOT NULL REFERENCES humans(id)
)
"#;

/// Mirror of the session (payment period) registry
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    begin_date TEXT,
    end_date TEXT
)
"#;

pub const CREATE_TEACHERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS teachers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    human_id INTEGER NOT NULL REFERENCES humans(id),
    comment TEXT
)
"#;

/// Teacher <-> academic membership, kept as its own entity
pub const CREATE_TEACHINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS teachings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    teacher_id INTEGER NOT NULL REFERENCES teachers(id),
    academic_id INTEGER NOT NULL REFERENCES academics(id),
    join_date TEXT NOT NULL,
    leave_date TEXT
)
"#;

pub const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE CHECK (length(title) > 0 AND length(title) <= 200),
    creation_date TEXT,
    comment TEXT
)
"#;

pub const CREATE_TASK_AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task_authors (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    teacher_id INTEGER NOT NULL REFERENCES teachers(id),
    PRIMARY KEY (task_id, teacher_id)
)
"#;

pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_TASK_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task_tags (
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, tag_id)
)
"#;

/// Marks are stored as tenths: 9.5 is 95
pub const CREATE_SOLUTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS solutions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    give_date TEXT NOT NULL,
    receive_date TEXT,
    number INTEGER NOT NULL,
    academic_id INTEGER NOT NULL REFERENCES academics(id),
    task_id INTEGER NOT NULL REFERENCES tasks(id),
    mark_tenths INTEGER CHECK (mark_tenths BETWEEN -999 AND 999),
    assessor_id INTEGER REFERENCES teachers(id),
    UNIQUE(task_id, academic_id)
)
"#;

/// Sessions a solution is paid under
pub const CREATE_SOLUTION_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS solution_sessions (
    solution_id INTEGER NOT NULL REFERENCES solutions(id) ON DELETE CASCADE,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    PRIMARY KEY (solution_id, session_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_academics_human ON academics(human_id)",
    "CREATE INDEX IF NOT EXISTS idx_teachers_human ON teachers(human_id)",
    "CREATE INDEX IF NOT EXISTS idx_teachings_teacher ON teachings(teacher_id)",
    "CREATE INDEX IF NOT EXISTS idx_teachings_academic ON teachings(academic_id)",
    "CREATE INDEX IF NOT EXISTS idx_task_authors_teacher ON task_authors(teacher_id)",
    "CREATE INDEX IF NOT EXISTS idx_task_tags_tag ON task_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_solutions_academic ON solutions(academic_id)",
    "CREATE INDEX IF NOT EXISTS idx_solutions_assessor ON solutions(assessor_id)",
    "CREATE INDEX IF NOT EXISTS idx_solutions_number ON solutions(number)",
    "CREATE INDEX IF NOT EXISTS idx_solution_sessions_session ON solution_sessions(session_id)",
];

/// All schema creation statements, referenced tables first
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_HUMANS_TABLE,
        CREATE_ACADEMICS_TABLE,
        CREATE_SESSIONS_TABLE,
        CREATE_TEACHERS_TABLE,
        CREATE_TEACHINGS_TABLE,
        CREATE_TASKS_TABLE,
        CREATE_TASK_AUTHORS_TABLE,
        CREATE_TAGS_TABLE,
        CREATE_TASK_TAGS_TABLE,
        CREATE_SOLUTIONS_TABLE,
        CREATE_SOLUTION_SESSIONS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
