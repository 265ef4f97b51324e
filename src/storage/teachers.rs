//! Teacher and Teaching operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use crate::{Error, Result};
use crate::model::{AcademicId, Teacher, TeacherId, Teaching, TeachingId, ValidationErrors};
use super::sqlite::{count_refs, exists, invalid_choice, DeletePolicy, RecordStore};
use super::Dependents;

const TEACHER_COLUMNS: &str = "id, human_id, comment";
const TEACHING_COLUMNS: &str = "id, teacher_id, academic_id, join_date, leave_date";

fn row_to_teacher(row: &rusqlite::Row) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        human: row.get(1)?,
        comment: row.get(2)?,
    })
}

fn row_to_teaching(row: &rusqlite::Row) -> rusqlite::Result<Teaching> {
    Ok(Teaching {
        id: row.get(0)?,
        teacher: row.get(1)?,
        academic: row.get(2)?,
        join_date: row.get(3)?,
        leave_date: row.get(4)?,
    })
}

impl RecordStore {
    // ========== Teacher Operations ==========

    /// Insert a teacher; the referenced human must exist
    pub fn create_teacher(&self, teacher: &Teacher) -> Result<Teacher> {
        let teacher = teacher.normalized();
        self.write(|tx| {
            if !exists(tx, "humans", teacher.human.get())? {
                return Err(invalid_choice("human", "Human", teacher.human.get()));
            }
            tx.execute(
                "INSERT INTO teachers (human_id, comment) VALUES (?1, ?2)",
                params![teacher.human, teacher.comment],
            )?;
            let id = TeacherId(tx.last_insert_rowid());
            tracing::debug!("Created teacher #{}", id);
            Ok(Teacher { id, ..teacher })
        })
    }

    /// Overwrite every field of an existing teacher
    pub fn update_teacher(&self, teacher: &Teacher) -> Result<Teacher> {
        let teacher = teacher.normalized();
        self.write(|tx| {
            if !exists(tx, "humans", teacher.human.get())? {
                return Err(invalid_choice("human", "Human", teacher.human.get()));
            }
            let changed = tx.execute(
                "UPDATE teachers SET human_id = ?1, comment = ?2 WHERE id = ?3",
                params![teacher.human, teacher.comment, teacher.id],
            )?;
            if changed == 0 {
                return Err(Error::NotFound { entity: "Teacher", id: teacher.id.get() });
            }
            tracing::debug!("Updated teacher #{}", teacher.id);
            Ok(teacher)
        })
    }

    pub fn get_teacher(&self, id: TeacherId) -> Result<Option<Teacher>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM teachers WHERE id = ?1", TEACHER_COLUMNS),
                [id],
                row_to_teacher,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_teachers(&self) -> Result<Vec<Teacher>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {} FROM teachers ORDER BY id", TEACHER_COLUMNS))?;
        let teachers = stmt
            .query_map([], row_to_teacher)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachers)
    }

    /// Delete a teacher according to the store's delete policy.
    ///
    /// Under `Restrict` any teaching, authored task or assessed solution
    /// blocks the delete. Under `Cascade` teachings and author links are
    /// removed and assessed solutions lose their assessor.
    pub fn delete_teacher(&self, id: TeacherId) -> Result<()> {
        let policy = self.options().delete_policy;
        self.write(|tx| {
            if !exists(tx, "teachers", id.get())? {
                return Err(Error::NotFound { entity: "Teacher", id: id.get() });
            }

            let mut dependents = Dependents::new("Teacher", id.get());
            dependents.add("teaching", count_refs(tx, "SELECT COUNT(*) FROM teachings WHERE teacher_id = ?1", id.get())?);
            dependents.add("task author link", count_refs(tx, "SELECT COUNT(*) FROM task_authors WHERE teacher_id = ?1", id.get())?);
            dependents.add("assessed solution", count_refs(tx, "SELECT COUNT(*) FROM solutions WHERE assessor_id = ?1", id.get())?);

            match policy {
                DeletePolicy::Restrict => dependents.ensure_none()?,
                DeletePolicy::Cascade => {
                    tx.execute("DELETE FROM teachings WHERE teacher_id = ?1", [id])?;
                    tx.execute("DELETE FROM task_authors WHERE teacher_id = ?1", [id])?;
                    tx.execute("UPDATE solutions SET assessor_id = NULL WHERE assessor_id = ?1", [id])?;
                    if !dependents.is_empty() {
                        tracing::info!("Cascading delete of teacher #{}: {}", id, dependents);
                    }
                }
            }

            tx.execute("DELETE FROM teachers WHERE id = ?1", [id])?;
            tracing::info!("Deleted teacher #{}", id);
            Ok(())
        })
    }

    /// Academics taught by a teacher; with `on`, only memberships active that day
    pub fn students_of(&self, teacher: TeacherId, on: Option<NaiveDate>) -> Result<Vec<AcademicId>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT DISTINCT academic_id FROM teachings
            WHERE teacher_id = ?1
              AND (?2 IS NULL OR leave_date IS NULL OR leave_date > ?2)
            ORDER BY academic_id
            "#,
        )?;
        let ids = stmt
            .query_map(params![teacher, on], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    // ========== Teaching Operations ==========

    fn check_teaching_refs(tx: &rusqlite::Connection, teaching: &Teaching) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if !exists(tx, "teachers", teaching.teacher.get())? {
            errors.add("teacher", format!("Select a valid choice. Teacher #{} does not exist.", teaching.teacher));
        }
        if !exists(tx, "academics", teaching.academic.get())? {
            errors.add("academic", format!("Select a valid choice. Academic #{} does not exist.", teaching.academic));
        }
        errors.into_result()
    }

    /// Add an academic to a teacher's group.
    ///
    /// Overlapping memberships are allowed, and a leave date before the
    /// join date is stored as given.
    pub fn create_teaching(&self, teaching: &Teaching) -> Result<Teaching> {
        self.write(|tx| {
            Self::check_teaching_refs(tx, teaching)?;
            tx.execute(
                "INSERT INTO teachings (teacher_id, academic_id, join_date, leave_date) VALUES (?1, ?2, ?3, ?4)",
                params![teaching.teacher, teaching.academic, teaching.join_date, teaching.leave_date],
            )?;
            let id = TeachingId(tx.last_insert_rowid());
            tracing::debug!("Created teaching #{} (teacher #{}, academic #{})", id, teaching.teacher, teaching.academic);
            Ok(Teaching { id, ..teaching.clone() })
        })
    }

    pub fn update_teaching(&self, teaching: &Teaching) -> Result<Teaching> {
        self.write(|tx| {
            Self::check_teaching_refs(tx, teaching)?;
            let changed = tx.execute(
                r#"
                UPDATE teachings
                SET teacher_id = ?1, academic_id = ?2, join_date = ?3, leave_date = ?4
                WHERE id = ?5
                "#,
                params![teaching.teacher, teaching.academic, teaching.join_date, teaching.leave_date, teaching.id],
            )?;
            if changed == 0 {
                return Err(Error::NotFound { entity: "Teaching", id: teaching.id.get() });
            }
            tracing::debug!("Updated teaching #{}", teaching.id);
            Ok(teaching.clone())
        })
    }

    /// Set or clear the leave date, leaving every other field untouched
    pub fn set_leave_date(&self, id: TeachingId, leave_date: Option<NaiveDate>) -> Result<Teaching> {
        let changed = self.conn().execute(
            "UPDATE teachings SET leave_date = ?1 WHERE id = ?2",
            params![leave_date, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound { entity: "Teaching", id: id.get() });
        }
        tracing::debug!("Teaching #{} leave date set to {:?}", id, leave_date);
        self.get_teaching(id)?
            .ok_or(Error::NotFound { entity: "Teaching", id: id.get() })
    }

    pub fn get_teaching(&self, id: TeachingId) -> Result<Option<Teaching>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM teachings WHERE id = ?1", TEACHING_COLUMNS),
                [id],
                row_to_teaching,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn teachings_of_teacher(&self, teacher: TeacherId) -> Result<Vec<Teaching>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM teachings WHERE teacher_id = ?1 ORDER BY join_date, id",
            TEACHING_COLUMNS
        ))?;
        let teachings = stmt
            .query_map([teacher], row_to_teaching)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachings)
    }

    pub fn teachings_of_academic(&self, academic: AcademicId) -> Result<Vec<Teaching>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM teachings WHERE academic_id = ?1 ORDER BY join_date, id",
            TEACHING_COLUMNS
        ))?;
        let teachings = stmt
            .query_map([academic], row_to_teaching)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachings)
    }

    /// Teachings whose leave date is unset or after `on`
    pub fn active_teachings(&self, on: NaiveDate) -> Result<Vec<Teaching>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM teachings WHERE leave_date IS NULL OR leave_date > ?1 ORDER BY id",
            TEACHING_COLUMNS
        ))?;
        let teachings = stmt
            .query_map([on], row_to_teaching)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachings)
    }

    /// Every teaching, for audits
    pub fn list_teachings(&self) -> Result<Vec<Teaching>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {} FROM teachings ORDER BY id", TEACHING_COLUMNS))?;
        let teachings = stmt
            .query_map([], row_to_teaching)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachings)
    }

    /// Nothing references a teaching, so this never depends on the delete policy
    pub fn delete_teaching(&self, id: TeachingId) -> Result<()> {
        let changed = self.conn().execute("DELETE FROM teachings WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound { entity: "Teaching", id: id.get() });
        }
        tracing::info!("Deleted teaching #{}", id);
        Ok(())
    }
}
