//! Solution operations, session attribution and the batch-number dependency

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use crate::{Error, Result};
use crate::model::{
    AcademicId, Mark, SessionId, Solution, SolutionId, TaskId, TeacherId, ValidationErrors,
};
use super::sqlite::{exists, invalid_choice, RecordStore};

const SOLUTION_COLUMNS: &str =
    "id, give_date, receive_date, number, academic_id, task_id, mark_tenths, assessor_id";

fn row_to_solution(row: &rusqlite::Row) -> rusqlite::Result<Solution> {
    Ok(Solution {
        id: row.get(0)?,
        give_date: row.get(1)?,
        receive_date: row.get(2)?,
        number: row.get(3)?,
        academic: row.get(4)?,
        task: row.get(5)?,
        mark: row.get(6)?,
        assessor: row.get(7)?,
    })
}

/// A (session, batch number) pair that names more than one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchConflict {
    pub session: SessionId,
    pub number: i64,
    pub tasks: Vec<TaskId>,
}

fn check_solution_refs(conn: &Connection, solution: &Solution, sessions: &[SessionId]) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if !exists(conn, "academics", solution.academic.get())? {
        errors.add("academic", format!("Select a valid choice. Academic #{} does not exist.", solution.academic));
    }
    if !exists(conn, "tasks", solution.task.get())? {
        errors.add("task", format!("Select a valid choice. Task #{} does not exist.", solution.task));
    }
    if let Some(assessor) = solution.assessor {
        if !exists(conn, "teachers", assessor.get())? {
            errors.add("assessor", format!("Select a valid choice. Teacher #{} does not exist.", assessor));
        }
    }
    for session in sessions {
        if !exists(conn, "sessions", session.get())? {
            errors.add("sessions", format!("Select a valid choice. Session #{} does not exist.", session));
        }
    }
    errors.into_result()
}

/// Within one session a batch number must keep naming the same task
fn check_batch_number(
    conn: &Connection,
    own_id: SolutionId,
    number: i64,
    task: TaskId,
    sessions: &[SessionId],
) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        SELECT s.task_id FROM solution_sessions ss
        JOIN solutions s ON s.id = ss.solution_id
        WHERE ss.session_id = ?1 AND s.number = ?2 AND s.task_id != ?3 AND s.id != ?4
        LIMIT 1
        "#,
    )?;
    for session in sessions {
        let other: Option<TaskId> = stmt
            .query_row(params![session, number, task, own_id], |row| row.get(0))
            .optional()?;
        if let Some(other) = other {
            return Err(Error::field(
                "number",
                format!(
                    "Batch number {} in session #{} already refers to task #{}.",
                    number, session, other
                ),
            ));
        }
    }
    Ok(())
}

fn session_ids(conn: &Connection, solution: SolutionId) -> Result<Vec<SessionId>> {
    let mut stmt = conn.prepare(
        "SELECT session_id FROM solution_sessions WHERE solution_id = ?1 ORDER BY session_id",
    )?;
    let ids = stmt
        .query_map([solution], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

impl RecordStore {
    // ========== Solution Operations ==========

    /// Record that a task was given to an academic, attributed to `sessions`.
    ///
    /// A second solution for the same (task, academic) pair is rejected by
    /// the store with an integrity error.
    pub fn create_solution(&self, solution: &Solution, sessions: &[SessionId]) -> Result<Solution> {
        let enforce = self.options().enforce_batch_dependency;
        self.write(|tx| {
            check_solution_refs(tx, solution, sessions)?;
            if enforce {
                check_batch_number(tx, SolutionId(0), solution.number, solution.task, sessions)?;
            }
            tx.execute(
                r#"
                INSERT INTO solutions (give_date, receive_date, number, academic_id, task_id, mark_tenths, assessor_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    solution.give_date,
                    solution.receive_date,
                    solution.number,
                    solution.academic,
                    solution.task,
                    solution.mark,
                    solution.assessor,
                ],
            )?;
            let id = SolutionId(tx.last_insert_rowid());
            for session in sessions {
                tx.execute(
                    "INSERT OR IGNORE INTO solution_sessions (solution_id, session_id) VALUES (?1, ?2)",
                    params![id, session],
                )?;
            }
            tracing::debug!(
                "Created solution #{} (task #{}, academic #{}, batch {})",
                id, solution.task, solution.academic, solution.number
            );
            Ok(Solution { id, ..solution.clone() })
        })
    }

    /// Overwrite every field of an existing solution; sessions are kept
    pub fn update_solution(&self, solution: &Solution) -> Result<Solution> {
        let enforce = self.options().enforce_batch_dependency;
        self.write(|tx| {
            if !exists(tx, "solutions", solution.id.get())? {
                return Err(Error::NotFound { entity: "Solution", id: solution.id.get() });
            }
            check_solution_refs(tx, solution, &[])?;
            if enforce {
                let sessions = session_ids(tx, solution.id)?;
                check_batch_number(tx, solution.id, solution.number, solution.task, &sessions)?;
            }
            tx.execute(
                r#"
                UPDATE solutions
                SET give_date = ?1, receive_date = ?2, number = ?3, academic_id = ?4,
                    task_id = ?5, mark_tenths = ?6, assessor_id = ?7
                WHERE id = ?8
                "#,
                params![
                    solution.give_date,
                    solution.receive_date,
                    solution.number,
                    solution.academic,
                    solution.task,
                    solution.mark,
                    solution.assessor,
                    solution.id,
                ],
            )?;
            tracing::debug!("Updated solution #{}", solution.id);
            Ok(solution.clone())
        })
    }

    /// Record a mark and its assessor; `received` also sets the receive date
    pub fn grade_solution(
        &self,
        id: SolutionId,
        mark: Mark,
        assessor: TeacherId,
        received: Option<NaiveDate>,
    ) -> Result<Solution> {
        self.write(|tx| {
            if !exists(tx, "teachers", assessor.get())? {
                return Err(invalid_choice("assessor", "Teacher", assessor.get()));
            }
            let changed = tx.execute(
                r#"
                UPDATE solutions
                SET mark_tenths = ?1, assessor_id = ?2, receive_date = COALESCE(?3, receive_date)
                WHERE id = ?4
                "#,
                params![mark, assessor, received, id],
            )?;
            if changed == 0 {
                return Err(Error::NotFound { entity: "Solution", id: id.get() });
            }
            tracing::debug!("Solution #{} graded {} by teacher #{}", id, mark, assessor);
            Ok(())
        })?;
        self.get_solution(id)?
            .ok_or(Error::NotFound { entity: "Solution", id: id.get() })
    }

    pub fn get_solution(&self, id: SolutionId) -> Result<Option<Solution>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM solutions WHERE id = ?1", SOLUTION_COLUMNS),
                [id],
                row_to_solution,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_solutions(&self) -> Result<Vec<Solution>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {} FROM solutions ORDER BY id", SOLUTION_COLUMNS))?;
        let solutions = stmt
            .query_map([], row_to_solution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(solutions)
    }

    pub fn solutions_for_task(&self, task: TaskId) -> Result<Vec<Solution>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM solutions WHERE task_id = ?1 ORDER BY number, id",
            SOLUTION_COLUMNS
        ))?;
        let solutions = stmt
            .query_map([task], row_to_solution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(solutions)
    }

    pub fn solutions_for_academic(&self, academic: AcademicId) -> Result<Vec<Solution>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM solutions WHERE academic_id = ?1 ORDER BY give_date, id",
            SOLUTION_COLUMNS
        ))?;
        let solutions = stmt
            .query_map([academic], row_to_solution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(solutions)
    }

    /// Session links go with the solution; nothing else references it
    pub fn delete_solution(&self, id: SolutionId) -> Result<()> {
        let changed = self.conn().execute("DELETE FROM solutions WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound { entity: "Solution", id: id.get() });
        }
        tracing::info!("Deleted solution #{}", id);
        Ok(())
    }

    // ========== Session Attribution ==========

    /// Attribute a solution to a session; attaching twice is a no-op
    pub fn add_session(&self, solution: SolutionId, session: SessionId) -> Result<()> {
        let enforce = self.options().enforce_batch_dependency;
        self.write(|tx| {
            let current = self
                .get_solution(solution)?
                .ok_or(Error::NotFound { entity: "Solution", id: solution.get() })?;
            if !exists(tx, "sessions", session.get())? {
                return Err(invalid_choice("sessions", "Session", session.get()));
            }
            if enforce {
                check_batch_number(tx, solution, current.number, current.task, &[session])?;
            }
            tx.execute(
                "INSERT OR IGNORE INTO solution_sessions (solution_id, session_id) VALUES (?1, ?2)",
                params![solution, session],
            )?;
            tracing::debug!("Solution #{} attributed to session #{}", solution, session);
            Ok(())
        })
    }

    pub fn remove_session(&self, solution: SolutionId, session: SessionId) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM solution_sessions WHERE solution_id = ?1 AND session_id = ?2",
            params![solution, session],
        )?;
        Ok(removed > 0)
    }

    pub fn sessions_of(&self, solution: SolutionId) -> Result<Vec<SessionId>> {
        session_ids(self.conn(), solution)
    }

    /// Every (session, number) pair that maps to more than one task
    pub fn batch_conflicts(&self) -> Result<Vec<BatchConflict>> {
        let mut stmt = self.conn().prepare(
            r#"
            SELECT ss.session_id, s.number, GROUP_CONCAT(DISTINCT s.task_id)
            FROM solution_sessions ss
            JOIN solutions s ON s.id = ss.solution_id
            GROUP BY ss.session_id, s.number
            HAVING COUNT(DISTINCT s.task_id) > 1
            ORDER BY ss.session_id, s.number
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, SessionId>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut conflicts = Vec::with_capacity(rows.len());
        for (session, number, task_list) in rows {
            let mut tasks = task_list
                .split(',')
                .map(|id| id.parse::<TaskId>())
                .collect::<Result<Vec<_>>>()?;
            tasks.sort();
            conflicts.push(BatchConflict { session, number, tasks });
        }
        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Human, Session, Task, Teacher};
    use crate::storage::{DeletePolicy, StoreOptions};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: RecordStore,
        teacher: TeacherId,
        academic: AcademicId,
        other_academic: AcademicId,
        task: TaskId,
        other_task: TaskId,
        session: SessionId,
    }

    fn fixture(options: StoreOptions) -> Fixture {
        let store = RecordStore::open_in_memory_with(options).unwrap();
        let h1 = store.insert_human(&Human::new("Barbara", "Liskov")).unwrap();
        let h2 = store.insert_human(&Human::new("Ken", "Thompson")).unwrap();
        let h3 = store.insert_human(&Human::new("Dennis", "Ritchie")).unwrap();
        let teacher = store.create_teacher(&Teacher::new(h1.id)).unwrap().id;
        let academic = store.insert_academic(h2.id).unwrap().id;
        let other_academic = store.insert_academic(h3.id).unwrap().id;
        let task = store.create_task(&Task::new("Task1")).unwrap().id;
        let other_task = store.create_task(&Task::new("Task2")).unwrap().id;
        let session = store.insert_session(&Session::new("Spring")).unwrap().id;
        Fixture { store, teacher, academic, other_academic, task, other_task, session }
    }

    #[test]
    fn test_duplicate_task_academic_is_integrity_error() {
        let f = fixture(StoreOptions::default());
        f.store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[])
            .unwrap();

        let err = f
            .store
            .create_solution(&Solution::new(f.task, f.academic, 2, date(2021, 4, 1)), &[])
            .unwrap_err();
        assert!(err.is_integrity(), "got {err}");
        assert_eq!(f.store.list_solutions().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_without_assessor_is_permitted() {
        let f = fixture(StoreOptions::default());
        let mut solution = Solution::new(f.task, f.academic, 1, date(2021, 3, 1));
        solution.mark = Some(Mark::from_tenths(70).unwrap());
        let stored = f.store.create_solution(&solution, &[]).unwrap();
        assert_eq!(stored.assessor, None);
        assert_eq!(f.store.get_solution(stored.id).unwrap().unwrap().mark, solution.mark);
    }

    #[test]
    fn test_grade_solution() {
        let f = fixture(StoreOptions::default());
        let solution = f
            .store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();

        let graded = f
            .store
            .grade_solution(solution.id, "9.5".parse().unwrap(), f.teacher, Some(date(2021, 3, 20)))
            .unwrap();
        assert_eq!(graded.mark.unwrap().to_string(), "9.5");
        assert_eq!(graded.assessor, Some(f.teacher));
        assert_eq!(graded.receive_date, Some(date(2021, 3, 20)));

        let regraded = f
            .store
            .grade_solution(solution.id, "8".parse().unwrap(), f.teacher, None)
            .unwrap();
        assert_eq!(regraded.receive_date, Some(date(2021, 3, 20)));

        assert!(f
            .store
            .grade_solution(solution.id, "8".parse().unwrap(), TeacherId(42), None)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_reference_validation() {
        let f = fixture(StoreOptions::default());
        let mut solution = Solution::new(TaskId(99), AcademicId(99), 1, date(2021, 3, 1));
        solution.assessor = Some(TeacherId(99));
        match f.store.create_solution(&solution, &[SessionId(99)]).unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(errors.fields(), vec!["academic", "task", "assessor", "sessions"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_batch_number_dependency_enforced() {
        let f = fixture(StoreOptions::default());
        f.store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();

        // Same batch, same task, different academic: fine
        f.store
            .create_solution(&Solution::new(f.task, f.other_academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();

        // Same batch, different task: rejected
        let err = f
            .store
            .create_solution(&Solution::new(f.other_task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap_err();
        match err {
            Error::Validation(errors) => assert_eq!(errors.fields(), vec!["number"]),
            other => panic!("unexpected error: {other}"),
        }

        // Created without the session, then attached: rejected too
        let detached = f
            .store
            .create_solution(&Solution::new(f.other_task, f.academic, 1, date(2021, 3, 1)), &[])
            .unwrap();
        assert!(f.store.add_session(detached.id, f.session).unwrap_err().is_validation());
        assert!(f.store.sessions_of(detached.id).unwrap().is_empty());
        assert!(f.store.batch_conflicts().unwrap().is_empty());
    }

    #[test]
    fn test_batch_number_dependency_on_update() {
        let f = fixture(StoreOptions::default());
        f.store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();
        let second = f
            .store
            .create_solution(&Solution::new(f.other_task, f.academic, 2, date(2021, 3, 8)), &[f.session])
            .unwrap();

        let mut renumbered = second.clone();
        renumbered.number = 1;
        assert!(f.store.update_solution(&renumbered).unwrap_err().is_validation());

        renumbered.number = 3;
        f.store.update_solution(&renumbered).unwrap();
        assert_eq!(f.store.get_solution(second.id).unwrap().unwrap().number, 3);
    }

    #[test]
    fn test_batch_conflicts_reported_when_not_enforced() {
        let options = StoreOptions { enforce_batch_dependency: false, ..StoreOptions::default() };
        let f = fixture(options);
        f.store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();
        f.store
            .create_solution(&Solution::new(f.other_task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();

        let conflicts = f.store.batch_conflicts().unwrap();
        assert_eq!(
            conflicts,
            vec![BatchConflict { session: f.session, number: 1, tasks: vec![f.task, f.other_task] }]
        );
    }

    #[test]
    fn test_sessions_attach_and_detach() {
        let f = fixture(StoreOptions::default());
        let solution = f
            .store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[])
            .unwrap();
        f.store.add_session(solution.id, f.session).unwrap();
        f.store.add_session(solution.id, f.session).unwrap();
        assert_eq!(f.store.sessions_of(solution.id).unwrap(), vec![f.session]);
        assert!(f.store.remove_session(solution.id, f.session).unwrap());
        assert!(!f.store.remove_session(solution.id, f.session).unwrap());
    }

    #[test]
    fn test_task_delete_policies() {
        let f = fixture(StoreOptions::default());
        f.store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();
        assert!(f.store.delete_task(f.task).unwrap_err().is_integrity());

        let f = fixture(StoreOptions { delete_policy: DeletePolicy::Cascade, ..StoreOptions::default() });
        let solution = f
            .store
            .create_solution(&Solution::new(f.task, f.academic, 1, date(2021, 3, 1)), &[f.session])
            .unwrap();
        f.store.delete_task(f.task).unwrap();
        assert!(f.store.get_solution(solution.id).unwrap().is_none());
        assert!(f.store.sessions_of(solution.id).unwrap().is_empty());
    }

    #[test]
    fn test_cascade_nulls_assessor() {
        let f = fixture(StoreOptions { delete_policy: DeletePolicy::Cascade, ..StoreOptions::default() });
        let solution = f
            .store
            .create_solution(
                &Solution::new(f.task, f.academic, 1, date(2021, 3, 1))
                    .graded(Mark::from_tenths(60).unwrap(), f.teacher),
                &[],
            )
            .unwrap();

        f.store.delete_teacher(f.teacher).unwrap();
        let reloaded = f.store.get_solution(solution.id).unwrap().unwrap();
        assert_eq!(reloaded.assessor, None);
        assert!(reloaded.mark.is_some());
    }

    #[test]
    fn test_solution_lookups_and_delete() {
        let f = fixture(StoreOptions::default());
        let a = f
            .store
            .create_solution(&Solution::new(f.task, f.academic, 2, date(2021, 3, 8)), &[])
            .unwrap();
        f.store
            .create_solution(&Solution::new(f.other_task, f.academic, 1, date(2021, 3, 1)), &[])
            .unwrap();

        assert_eq!(f.store.solutions_for_task(f.task).unwrap().len(), 1);
        let by_academic = f.store.solutions_for_academic(f.academic).unwrap();
        assert_eq!(by_academic[0].task, f.other_task);

        f.store.delete_solution(a.id).unwrap();
        assert!(matches!(f.store.delete_solution(a.id), Err(Error::NotFound { .. })));
    }
}
