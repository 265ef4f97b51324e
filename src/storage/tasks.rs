//! Task operations: titles, authors and tags

use rusqlite::{params, Connection, OptionalExtension};
use crate::{Error, Result};
use crate::model::task::tag_parts;
use crate::model::{Tag, TagId, Task, TaskId, TeacherId};
use super::sqlite::{count_refs, exists, invalid_choice, DeletePolicy, RecordStore};
use super::Dependents;

const TASK_COLUMNS: &str = "id, title, creation_date, comment";

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        creation_date: row.get(2)?,
        comment: row.get(3)?,
    })
}

fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

/// Reject a title already used by a different task
fn ensure_unique_title(conn: &Connection, title: &str, own_id: TaskId) -> Result<()> {
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM tasks WHERE title = ?1 AND id != ?2",
            params![title, own_id],
            |row| row.get(0),
        )
        .optional()?;
    match clash {
        Some(_) => Err(Error::field("title", "Task with this Title already exists.")),
        None => Ok(()),
    }
}

const TAG_BY_NAME_OR_SLUG: &str = r#"
    SELECT id, name, slug FROM tags
    WHERE id = COALESCE(
        (SELECT id FROM tags WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1),
        (SELECT id FROM tags WHERE slug = ?2)
    )
"#;

/// Resolve a tag given by name (any ASCII case) or by its exact slug
fn find_tag(conn: &Connection, name: &str) -> Result<Option<Tag>> {
    let name = name.trim();
    conn.query_row(TAG_BY_NAME_OR_SLUG, params![name, name.to_lowercase()], row_to_tag)
        .optional()
        .map_err(Into::into)
}

/// First free slug among `base`, `base-1`, `base-2`, ...
fn unique_slug(conn: &Connection, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut counter = 0;
    while exists_slug(conn, &candidate)? {
        counter += 1;
        candidate = format!("{}-{}", base, counter);
    }
    Ok(candidate)
}

fn exists_slug(conn: &Connection, slug: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE slug = ?1", [slug], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Find a tag by name, creating it when missing.
///
/// Different names never share a tag: when the new name's slug is already
/// taken it gets a numeric suffix (`C#` after `C++` is stored as `c-1`).
fn ensure_tag(conn: &Connection, name: &str) -> Result<Tag> {
    let (name, slug) = tag_parts(name)?;
    let existing = conn
        .query_row(
            "SELECT id, name, slug FROM tags WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
            [&name],
            row_to_tag,
        )
        .optional()?;
    if let Some(tag) = existing {
        return Ok(tag);
    }

    let slug = unique_slug(conn, &slug)?;
    conn.execute("INSERT INTO tags (name, slug) VALUES (?1, ?2)", params![name, slug])?;
    Ok(Tag {
        id: TagId(conn.last_insert_rowid()),
        name,
        slug,
    })
}

fn link_author(conn: &Connection, task: TaskId, teacher: TeacherId) -> Result<()> {
    if !exists(conn, "teachers", teacher.get())? {
        return Err(invalid_choice("authors", "Teacher", teacher.get()));
    }
    conn.execute(
        "INSERT OR IGNORE INTO task_authors (task_id, teacher_id) VALUES (?1, ?2)",
        params![task, teacher],
    )?;
    Ok(())
}

fn link_tag(conn: &Connection, task: TaskId, name: &str) -> Result<Tag> {
    let tag = ensure_tag(conn, name)?;
    conn.execute(
        "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
        params![task, tag.id],
    )?;
    Ok(tag)
}

fn require_task(conn: &Connection, task: TaskId) -> Result<()> {
    if exists(conn, "tasks", task.get())? {
        Ok(())
    } else {
        Err(Error::NotFound { entity: "Task", id: task.get() })
    }
}

impl RecordStore {
    // ========== Task Operations ==========

    /// Insert a task; the title must be present, at most 200 characters and unused
    pub fn create_task(&self, task: &Task) -> Result<Task> {
        self.create_task_with(task, &[], &[]).map(|(task, _)| task)
    }

    /// Insert a task together with its authors and tags in one transaction.
    ///
    /// Any bad author or tag rolls the whole task back.
    pub fn create_task_with(
        &self,
        task: &Task,
        authors: &[TeacherId],
        tags: &[String],
    ) -> Result<(Task, Vec<Tag>)> {
        let task = task.normalized()?;
        self.write(|tx| {
            ensure_unique_title(tx, &task.title, TaskId(0))?;
            tx.execute(
                "INSERT INTO tasks (title, creation_date, comment) VALUES (?1, ?2, ?3)",
                params![task.title, task.creation_date, task.comment],
            )?;
            let id = TaskId(tx.last_insert_rowid());
            for author in authors {
                link_author(tx, id, *author)?;
            }
            let mut linked: Vec<Tag> = Vec::with_capacity(tags.len());
            for name in tags {
                let tag = link_tag(tx, id, name)?;
                if !linked.iter().any(|t| t.id == tag.id) {
                    linked.push(tag);
                }
            }
            tracing::debug!(
                "Created task #{} '{}' with {} author(s), {} tag(s)",
                id, task.title, authors.len(), linked.len()
            );
            Ok((Task { id, ..task }, linked))
        })
    }

    pub fn update_task(&self, task: &Task) -> Result<Task> {
        let task = task.normalized()?;
        self.write(|tx| {
            require_task(tx, task.id)?;
            ensure_unique_title(tx, &task.title, task.id)?;
            tx.execute(
                "UPDATE tasks SET title = ?1, creation_date = ?2, comment = ?3 WHERE id = ?4",
                params![task.title, task.creation_date, task.comment, task.id],
            )?;
            tracing::debug!("Updated task #{}", task.id);
            Ok(task)
        })
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                [id],
                row_to_task,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_task_by_title(&self, title: &str) -> Result<Option<Task>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM tasks WHERE title = ?1", TASK_COLUMNS),
                [title.trim()],
                row_to_task,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Delete a task with its author and tag links.
    ///
    /// Solutions of the task block the delete under `Restrict` and are
    /// deleted with it under `Cascade`.
    pub fn delete_task(&self, id: TaskId) -> Result<()> {
        let policy = self.options().delete_policy;
        self.write(|tx| {
            require_task(tx, id)?;

            let mut dependents = Dependents::new("Task", id.get());
            dependents.add("solution", count_refs(tx, "SELECT COUNT(*) FROM solutions WHERE task_id = ?1", id.get())?);

            match policy {
                DeletePolicy::Restrict => dependents.ensure_none()?,
                DeletePolicy::Cascade => {
                    let removed = tx.execute("DELETE FROM solutions WHERE task_id = ?1", [id])?;
                    if removed > 0 {
                        tracing::info!("Cascading delete of task #{}: {} solution(s)", id, removed);
                    }
                }
            }

            tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            tracing::info!("Deleted task #{}", id);
            Ok(())
        })
    }

    // ========== Author Operations ==========

    /// Link a teacher as an author; linking twice is a no-op
    pub fn add_author(&self, task: TaskId, teacher: TeacherId) -> Result<()> {
        self.write(|tx| {
            require_task(tx, task)?;
            link_author(tx, task, teacher)?;
            tracing::debug!("Teacher #{} authors task #{}", teacher, task);
            Ok(())
        })
    }

    pub fn remove_author(&self, task: TaskId, teacher: TeacherId) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM task_authors WHERE task_id = ?1 AND teacher_id = ?2",
            params![task, teacher],
        )?;
        Ok(removed > 0)
    }

    pub fn authors_of(&self, task: TaskId) -> Result<Vec<TeacherId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT teacher_id FROM task_authors WHERE task_id = ?1 ORDER BY teacher_id")?;
        let ids = stmt
            .query_map([task], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    pub fn tasks_by_author(&self, teacher: TeacherId) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT t.id, t.title, t.creation_date, t.comment
            FROM tasks t JOIN task_authors a ON a.task_id = t.id
            WHERE a.teacher_id = ?1
            ORDER BY t.id
            "#,
        )?;
        let tasks = stmt
            .query_map([teacher], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    // ========== Tag Operations ==========

    /// Attach a tag by name, creating the tag on first use
    pub fn add_tag(&self, task: TaskId, name: &str) -> Result<Tag> {
        self.write(|tx| {
            require_task(tx, task)?;
            let tag = link_tag(tx, task, name)?;
            tracing::debug!("Tagged task #{} with '{}'", task, tag.name);
            Ok(tag)
        })
    }

    /// Detach a tag given by name or slug; the tag itself is kept
    pub fn remove_tag(&self, task: TaskId, name: &str) -> Result<bool> {
        let (name, _) = tag_parts(name)?;
        let Some(tag) = find_tag(self.conn(), &name)? else {
            return Ok(false);
        };
        let removed = self.conn().execute(
            "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
            params![task, tag.id],
        )?;
        Ok(removed > 0)
    }

    /// Replace the whole tag set of a task atomically
    pub fn set_tags(&self, task: TaskId, names: &[String]) -> Result<Vec<Tag>> {
        self.write(|tx| {
            require_task(tx, task)?;
            tx.execute("DELETE FROM task_tags WHERE task_id = ?1", [task])?;
            let mut tags = Vec::with_capacity(names.len());
            for name in names {
                let tag = link_tag(tx, task, name)?;
                if !tags.iter().any(|t: &Tag| t.id == tag.id) {
                    tags.push(tag);
                }
            }
            Ok(tags)
        })
    }

    pub fn tags_of(&self, task: TaskId) -> Result<Vec<Tag>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT g.id, g.name, g.slug
            FROM tags g JOIN task_tags tt ON tt.tag_id = g.id
            WHERE tt.task_id = ?1
            ORDER BY g.name
            "#,
        )?;
        let tags = stmt
            .query_map([task], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Tasks carrying the tag with this name or slug
    pub fn tasks_with_tag(&self, name: &str) -> Result<Vec<Task>> {
        let (name, _) = tag_parts(name)?;
        let Some(tag) = find_tag(self.conn(), &name)? else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn().prepare(
            r#"
            SELECT t.id, t.title, t.creation_date, t.comment
            FROM tasks t
            JOIN task_tags tt ON tt.task_id = t.id
            WHERE tt.tag_id = ?1
            ORDER BY t.id
            "#,
        )?;
        let tasks = stmt
            .query_map([tag.id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn().prepare("SELECT id, name, slug FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Human;

    fn store_with_teacher() -> (RecordStore, TeacherId) {
        let store = RecordStore::open_in_memory().unwrap();
        let human = store.insert_human(&Human::new("Donald", "Knuth")).unwrap();
        let teacher = store.create_teacher(&crate::model::Teacher::new(human.id)).unwrap();
        (store, teacher.id)
    }

    #[test]
    fn test_task_crud() {
        let store = RecordStore::open_in_memory().unwrap();
        let task = store.create_task(&Task::new("  Algorithms I ").with_comment("first batch")).unwrap();
        assert_eq!(task.title, "Algorithms I");

        let mut edited = task.clone();
        edited.title = "Algorithms 1".to_string();
        store.update_task(&edited).unwrap();

        assert!(store.get_task_by_title("Algorithms I").unwrap().is_none());
        assert_eq!(store.get_task(task.id).unwrap().unwrap().title, "Algorithms 1");
    }

    #[test]
    fn test_titles_are_unique() {
        let store = RecordStore::open_in_memory().unwrap();
        store.create_task(&Task::new("Graphs")).unwrap();

        match store.create_task(&Task::new("Graphs")).unwrap_err() {
            Error::Validation(errors) => assert_eq!(errors.fields(), vec!["title"]),
            other => panic!("unexpected error: {other}"),
        }

        let other = store.create_task(&Task::new("Trees")).unwrap();
        let mut renamed = other.clone();
        renamed.title = "Graphs".to_string();
        assert!(store.update_task(&renamed).unwrap_err().is_validation());

        // Saving a task under its own title is fine
        store.update_task(&other).unwrap();

        let titles: Vec<_> = store.list_tasks().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Graphs", "Trees"]);
    }

    #[test]
    fn test_storage_level_title_uniqueness() {
        let store = RecordStore::open_in_memory().unwrap();
        store.create_task(&Task::new("Graphs")).unwrap();
        let err: Error = store
            .conn()
            .execute("INSERT INTO tasks (title) VALUES ('Graphs')", [])
            .unwrap_err()
            .into();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_authors() {
        let (store, teacher) = store_with_teacher();
        let task = store.create_task(&Task::new("Recursion")).unwrap();

        store.add_author(task.id, teacher).unwrap();
        store.add_author(task.id, teacher).unwrap();
        assert_eq!(store.authors_of(task.id).unwrap(), vec![teacher]);
        assert_eq!(store.tasks_by_author(teacher).unwrap().len(), 1);

        assert!(store.add_author(task.id, TeacherId(99)).unwrap_err().is_validation());

        assert!(store.remove_author(task.id, teacher).unwrap());
        assert!(store.authors_of(task.id).unwrap().is_empty());
    }

    #[test]
    fn test_author_link_restricts_teacher_delete() {
        let (store, teacher) = store_with_teacher();
        let task = store.create_task(&Task::new("Recursion")).unwrap();
        store.add_author(task.id, teacher).unwrap();

        let err = store.delete_teacher(teacher).unwrap_err();
        assert!(err.to_string().contains("task author link"));
    }

    #[test]
    fn test_tags() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = store.create_task(&Task::new("Dijkstra")).unwrap();
        let b = store.create_task(&Task::new("Prim")).unwrap();

        let graphs = store.add_tag(a.id, "Graphs").unwrap();
        let again = store.add_tag(b.id, "graphs").unwrap();
        assert_eq!(graphs.id, again.id);
        store.add_tag(a.id, "Shortest Paths").unwrap();

        let names: Vec<_> = store.tags_of(a.id).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Graphs", "Shortest Paths"]);
        assert_eq!(store.tasks_with_tag("graphs").unwrap().len(), 2);
        assert_eq!(store.tasks_with_tag("shortest-paths").unwrap().len(), 1);

        assert!(store.remove_tag(a.id, "GRAPHS").unwrap());
        assert_eq!(store.tasks_with_tag("graphs").unwrap().len(), 1);
    }

    #[test]
    fn test_set_tags_replaces() {
        let store = RecordStore::open_in_memory().unwrap();
        let task = store.create_task(&Task::new("Heaps")).unwrap();
        store.add_tag(task.id, "old").unwrap();

        let tags = store
            .set_tags(task.id, &["Data Structures".to_string(), "data structures".to_string()])
            .unwrap();
        assert_eq!(tags.len(), 1);
        let names: Vec<_> = store.tags_of(task.id).unwrap().into_iter().map(|t| t.slug).collect();
        assert_eq!(names, vec!["data-structures"]);
        assert_eq!(store.list_tags().unwrap().len(), 2);
    }

    #[test]
    fn test_set_tags_is_atomic() {
        let store = RecordStore::open_in_memory().unwrap();
        let task = store.create_task(&Task::new("Heaps")).unwrap();
        store.add_tag(task.id, "keep").unwrap();

        assert!(store.set_tags(task.id, &["fine".to_string(), "!!!".to_string()]).is_err());
        let names: Vec<_> = store.tags_of(task.id).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["keep"]);
    }

    #[test]
    fn test_delete_task_removes_links() {
        let (store, teacher) = store_with_teacher();
        let task = store.create_task(&Task::new("Sorting")).unwrap();
        store.add_author(task.id, teacher).unwrap();
        store.add_tag(task.id, "basics").unwrap();

        store.delete_task(task.id).unwrap();
        assert!(store.get_task(task.id).unwrap().is_none());
        assert!(store.tasks_by_author(teacher).unwrap().is_empty());
        // The author link no longer blocks the teacher
        store.delete_teacher(teacher).unwrap();
    }

    #[test]
    fn test_colliding_slugs_stay_distinct_tags() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = store.create_task(&Task::new("Templates")).unwrap();
        let b = store.create_task(&Task::new("LINQ")).unwrap();

        let cpp = store.add_tag(a.id, "C++").unwrap();
        let csharp = store.add_tag(b.id, "C#").unwrap();
        assert_ne!(cpp.id, csharp.id);
        assert_eq!((cpp.name.as_str(), cpp.slug.as_str()), ("C++", "c"));
        assert_eq!((csharp.name.as_str(), csharp.slug.as_str()), ("C#", "c-1"));

        let names: Vec<_> = store.tags_of(b.id).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["C#"]);
        assert_eq!(store.tasks_with_tag("C#").unwrap()[0].id, b.id);
        assert_eq!(store.tasks_with_tag("c-1").unwrap()[0].id, b.id);

        // Removing one never detaches the other
        assert!(!store.remove_tag(a.id, "C#").unwrap());
        assert!(store.remove_tag(b.id, "C#").unwrap());
        assert_eq!(store.tags_of(a.id).unwrap().len(), 1);
    }

    #[test]
    fn test_lithuanian_tag_names() {
        let store = RecordStore::open_in_memory().unwrap();
        let task = store.create_task(&Task::new("Šachmatų uždaviniai")).unwrap();

        let tags = store
            .set_tags(task.id, &["Šachmatai".to_string(), "Grafų teorija".to_string()])
            .unwrap();
        let slugs: Vec<_> = tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["sachmatai", "grafu-teorija"]);
        assert_eq!(store.tasks_with_tag("grafu-teorija").unwrap().len(), 1);
    }

    #[test]
    fn test_create_task_with_links() {
        let (store, teacher) = store_with_teacher();
        let (task, tags) = store
            .create_task_with(
                &Task::new("Graphs"),
                &[teacher],
                &["ok".to_string(), "OK".to_string()],
            )
            .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(store.authors_of(task.id).unwrap(), vec![teacher]);
        assert_eq!(store.tags_of(task.id).unwrap().len(), 1);
    }

    #[test]
    fn test_create_task_with_rolls_back_on_bad_link() {
        let (store, teacher) = store_with_teacher();

        let err = store
            .create_task_with(&Task::new("Graphs"), &[teacher], &["ok".to_string(), "!!!".to_string()])
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.get_task_by_title("Graphs").unwrap().is_none());
        assert!(store.list_tags().unwrap().is_empty());
        assert!(store.tasks_by_author(teacher).unwrap().is_empty());

        let err = store
            .create_task_with(&Task::new("Graphs"), &[TeacherId(99)], &[])
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.list_tasks().unwrap().is_empty());

        // Nothing was left behind, so the same title is still free
        store
            .create_task_with(&Task::new("Graphs"), &[teacher], &["ok".to_string()])
            .unwrap();
    }
}
