//! Change lists: the searchable, filterable list view of one entity

use std::collections::HashMap;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Serialize;
use crate::model::{
    AcademicId, EntityKind, HumanId, SolutionId, TaskId, Teacher, TeacherId, TeachingId,
};
use crate::storage::RecordStore;
use crate::{Error, Result};
use super::fields::{entity_sql, filter_sql, order_column, FilterSql, RefTarget};
use super::search::search_clause;
use super::{AdminCatalog, ModelAdmin};

/// Shown for empty values
pub const EMPTY_VALUE: &str = "-";

/// Search, filters, ordering and paging for one change-list request
#[derive(Debug, Clone, Default)]
pub struct ChangeListQuery {
    pub search: Option<String>,
    /// `(field, value)` pairs; each field must be a configured list filter
    pub filters: Vec<(String, String)>,
    /// A `list_display` column, `-` prefixed for descending order
    pub ordering: Option<String>,
    /// Page size; the entity's `list_per_page` when unset
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ChangeListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.ordering = Some(column.into());
        self
    }

    /// Page size, at least one row
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeListRow {
    pub id: i64,
    pub cells: Vec<String>,
}

/// One rendered page of a change list
#[derive(Debug, Clone, Serialize)]
pub struct ChangeList {
    pub entity: EntityKind,
    pub columns: Vec<String>,
    pub rows: Vec<ChangeListRow>,
    /// Matching rows across all pages
    pub total: usize,
}

/// A selectable value of a list filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChoice {
    pub value: String,
    pub label: String,
}

/// Runs change-list queries described by an `AdminCatalog`
pub struct ChangeListEngine<'a> {
    store: &'a RecordStore,
    catalog: &'a AdminCatalog,
}

impl<'a> ChangeListEngine<'a> {
    pub fn new(store: &'a RecordStore, catalog: &'a AdminCatalog) -> Self {
        Self { store, catalog }
    }

    /// `WHERE` clause and parameters for search plus filters
    fn where_clause(&self, admin: &ModelAdmin, query: &ChangeListQuery) -> Result<(String, Vec<Value>)> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(term) = &query.search {
            if let Some((sql, values)) = search_clause(admin.entity, &admin.search_fields, term)? {
                clauses.push(sql);
                params.extend(values);
            }
        }

        for (field, value) in &query.filters {
            if !admin.list_filter.iter().any(|f| *f == field.as_str()) {
                return Err(Error::field(
                    "filter",
                    format!("{} cannot be filtered by '{}'", admin.entity, field),
                ));
            }
            let filter = filter_sql(admin.entity, field)
                .ok_or_else(|| Error::Catalog(format!("{} has no filter '{}'", admin.entity, field)))?;
            match filter {
                FilterSql::Foreign { column, .. } => {
                    let id: i64 = value.trim().parse().map_err(|_| {
                        Error::field("filter", format!("'{}' is not a valid id for {}", value, field))
                    })?;
                    clauses.push(format!("{} = ?", column));
                    params.push(Value::Integer(id));
                }
                FilterSql::Tag => {
                    // By name first, then by exact slug, so `C#` never picks up `c`
                    clauses.push(
                        "EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = tk.id AND tt.tag_id = COALESCE(\
                         (SELECT id FROM tags WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1), \
                         (SELECT id FROM tags WHERE slug = ?)))"
                            .to_string(),
                    );
                    let value = value.trim();
                    params.push(Value::Text(value.to_string()));
                    params.push(Value::Text(value.to_lowercase()));
                }
            }
        }

        if clauses.is_empty() {
            Ok(("1 = 1".to_string(), params))
        } else {
            Ok((clauses.join(" AND "), params))
        }
    }

    fn order_clause(&self, admin: &ModelAdmin, query: &ChangeListQuery) -> Result<String> {
        let id = entity_sql(admin.entity).id;
        let Some(ordering) = &query.ordering else {
            return Ok(format!("{} DESC", id));
        };

        let (name, direction) = match ordering.strip_prefix('-') {
            Some(name) => (name, "DESC"),
            None => (ordering.as_str(), "ASC"),
        };
        if !admin.list_display.iter().any(|c| *c == name) {
            return Err(Error::field(
                "ordering",
                format!("'{}' is not a list column of {}", name, admin.entity),
            ));
        }
        let expr = order_column(admin.entity, name).ok_or_else(|| {
            Error::field("ordering", format!("{} cannot be ordered by '{}'", admin.entity, name))
        })?;
        Ok(format!("{} {}, {} {}", expr, direction, id, direction))
    }

    /// Ids of every matching record, ignoring paging
    pub fn matching_ids(&self, entity: EntityKind, query: &ChangeListQuery) -> Result<Vec<i64>> {
        let admin = self.catalog.get(entity)?;
        let sql = entity_sql(entity);
        let (where_sql, params) = self.where_clause(admin, query)?;
        let order_sql = self.order_clause(admin, query)?;

        let statement = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            sql.id, sql.from, where_sql, order_sql
        );
        let mut stmt = self.store.conn().prepare(&statement)?;
        let ids = stmt
            .query_map(params_from_iter(params), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Run a query and render one page of rows
    pub fn run(&self, entity: EntityKind, query: &ChangeListQuery) -> Result<ChangeList> {
        let admin = self.catalog.get(entity)?;
        let sql = entity_sql(entity);
        let (where_sql, params) = self.where_clause(admin, query)?;
        let order_sql = self.order_clause(admin, query)?;
        let limit = query.limit.unwrap_or(admin.list_per_page).max(1);

        let total: i64 = self.store.conn().query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {}", sql.from, where_sql),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        let statement = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            sql.id, sql.from, where_sql, order_sql, limit, query.offset
        );
        let ids = {
            let mut stmt = self.store.conn().prepare(&statement)?;
            stmt.query_map(params_from_iter(params.iter()), |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?
        };

        let mut labels = Labels::new(self.store);
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let cells = labels.render_row(entity, id, &admin.list_display)?;
            rows.push(ChangeListRow { id, cells });
        }
        tracing::debug!("{} change list: {} of {} row(s)", entity, rows.len(), total);

        Ok(ChangeList {
            entity,
            columns: admin.list_display.iter().map(|c| c.to_string()).collect(),
            rows,
            total: total as usize,
        })
    }

    /// Values offered by a list filter, with labels
    pub fn filter_choices(&self, entity: EntityKind, field: &str) -> Result<Vec<FilterChoice>> {
        let admin = self.catalog.get(entity)?;
        if !admin.list_filter.iter().any(|f| *f == field) {
            return Err(Error::field(
                "filter",
                format!("{} cannot be filtered by '{}'", entity, field),
            ));
        }
        let filter = filter_sql(entity, field)
            .ok_or_else(|| Error::Catalog(format!("{} has no filter '{}'", entity, field)))?;

        match filter {
            FilterSql::Foreign { column, target } => {
                let sql = entity_sql(entity);
                let mut stmt = self.store.conn().prepare(&format!(
                    "SELECT DISTINCT {col} FROM {from} WHERE {col} IS NOT NULL ORDER BY {col}",
                    col = column,
                    from = sql.from
                ))?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<i64>>>()?;

                let mut labels = Labels::new(self.store);
                let mut choices = Vec::with_capacity(ids.len());
                for id in ids {
                    let label = match target {
                        RefTarget::Teacher => labels.teacher(TeacherId(id))?,
                        RefTarget::Academic => labels.academic(AcademicId(id))?,
                        RefTarget::Task => labels.task(TaskId(id))?,
                    };
                    choices.push(FilterChoice { value: id.to_string(), label });
                }
                Ok(choices)
            }
            FilterSql::Tag => Ok(self
                .store
                .list_tags()?
                .into_iter()
                .map(|tag| FilterChoice { value: tag.slug, label: tag.name })
                .collect()),
        }
    }
}

/// Cached labels for referenced records while rendering one page
struct Labels<'a> {
    store: &'a RecordStore,
    humans: HashMap<HumanId, String>,
    teachers: HashMap<TeacherId, String>,
    academics: HashMap<AcademicId, String>,
    tasks: HashMap<TaskId, String>,
}

impl<'a> Labels<'a> {
    fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            humans: HashMap::new(),
            teachers: HashMap::new(),
            academics: HashMap::new(),
            tasks: HashMap::new(),
        }
    }

    fn human(&mut self, id: HumanId) -> Result<String> {
        if let Some(label) = self.humans.get(&id) {
            return Ok(label.clone());
        }
        let label = match self.store.get_human(id)? {
            Some(human) => human.to_string(),
            None => format!("Human #{}", id),
        };
        self.humans.insert(id, label.clone());
        Ok(label)
    }

    fn teacher(&mut self, id: TeacherId) -> Result<String> {
        if let Some(label) = self.teachers.get(&id) {
            return Ok(label.clone());
        }
        let label = match self.store.get_teacher(id)? {
            Some(teacher) => match self.store.get_human(teacher.human)? {
                Some(human) => Teacher::label(&human),
                None => format!("Teacher #{}", id),
            },
            None => format!("Teacher #{}", id),
        };
        self.teachers.insert(id, label.clone());
        Ok(label)
    }

    fn academic(&mut self, id: AcademicId) -> Result<String> {
        if let Some(label) = self.academics.get(&id) {
            return Ok(label.clone());
        }
        let label = match self.store.get_academic(id)? {
            Some(academic) => self.human(academic.human)?,
            None => format!("Academic #{}", id),
        };
        self.academics.insert(id, label.clone());
        Ok(label)
    }

    fn task(&mut self, id: TaskId) -> Result<String> {
        if let Some(label) = self.tasks.get(&id) {
            return Ok(label.clone());
        }
        let label = match self.store.get_task(id)? {
            Some(task) => task.to_string(),
            None => format!("Task #{}", id),
        };
        self.tasks.insert(id, label.clone());
        Ok(label)
    }

    fn render_row(&mut self, entity: EntityKind, id: i64, columns: &[&str]) -> Result<Vec<String>> {
        let missing = || Error::NotFound { entity: entity_name(entity), id };
        let mut cells = Vec::with_capacity(columns.len());

        match entity {
            EntityKind::Teacher => {
                let teacher = self.store.get_teacher(TeacherId(id))?.ok_or_else(missing)?;
                for column in columns {
                    cells.push(match *column {
                        "id" => teacher.id.to_string(),
                        "human" => self.human(teacher.human)?,
                        "comment" => or_empty(teacher.comment.clone()),
                        other => return Err(unknown_column(entity, other)),
                    });
                }
            }
            EntityKind::Teaching => {
                let teaching = self.store.get_teaching(TeachingId(id))?.ok_or_else(missing)?;
                for column in columns {
                    cells.push(match *column {
                        "id" => teaching.id.to_string(),
                        "teacher" => self.teacher(teaching.teacher)?,
                        "academic" => self.academic(teaching.academic)?,
                        "join_date" => teaching.join_date.to_string(),
                        "leave_date" => or_empty(teaching.leave_date),
                        other => return Err(unknown_column(entity, other)),
                    });
                }
            }
            EntityKind::Task => {
                let task = self.store.get_task(TaskId(id))?.ok_or_else(missing)?;
                for column in columns {
                    cells.push(match *column {
                        "id" => task.id.to_string(),
                        "title" => task.title.clone(),
                        "creation_date" => or_empty(task.creation_date),
                        "comment" => or_empty(task.comment.clone()),
                        "authors" => {
                            let mut names = Vec::new();
                            for author in self.store.authors_of(task.id)? {
                                names.push(self.teacher(author)?);
                            }
                            join_or_empty(names)
                        }
                        "tags" => join_or_empty(
                            self.store.tags_of(task.id)?.into_iter().map(|t| t.name).collect(),
                        ),
                        other => return Err(unknown_column(entity, other)),
                    });
                }
            }
            EntityKind::Solution => {
                let solution = self.store.get_solution(SolutionId(id))?.ok_or_else(missing)?;
                for column in columns {
                    cells.push(match *column {
                        "id" => solution.id.to_string(),
                        "task" => self.task(solution.task)?,
                        "give_date" => solution.give_date.to_string(),
                        "receive_date" => or_empty(solution.receive_date),
                        "number" => solution.number.to_string(),
                        "academic" => self.academic(solution.academic)?,
                        "mark" => solution.to_string(),
                        "assessor" => match solution.assessor {
                            Some(assessor) => self.teacher(assessor)?,
                            None => EMPTY_VALUE.to_string(),
                        },
                        "state" => solution.state().to_string(),
                        "sessions" => {
                            let mut titles = Vec::new();
                            for session in self.store.sessions_of(solution.id)? {
                                titles.push(match self.store.get_session(session)? {
                                    Some(s) => s.title,
                                    None => format!("Session #{}", session),
                                });
                            }
                            join_or_empty(titles)
                        }
                        other => return Err(unknown_column(entity, other)),
                    });
                }
            }
        }
        Ok(cells)
    }
}

fn entity_name(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Teacher => "Teacher",
        EntityKind::Teaching => "Teaching",
        EntityKind::Task => "Task",
        EntityKind::Solution => "Solution",
    }
}

fn unknown_column(entity: EntityKind, column: &str) -> Error {
    Error::Catalog(format!("{} has no list column '{}'", entity, column))
}

fn or_empty<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| EMPTY_VALUE.to_string())
}

fn join_or_empty(values: Vec<String>) -> String {
    if values.is_empty() {
        EMPTY_VALUE.to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::admin::DEFAULT_LIST_PER_PAGE;
    use crate::model::{Human, Mark, Session, Solution, Task, Teaching};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Seed {
        store: RecordStore,
        catalog: AdminCatalog,
        hopper: TeacherId,
        knuth: TeacherId,
    }

    fn seed() -> Seed {
        let store = RecordStore::open_in_memory().unwrap();
        let catalog = AdminCatalog::standard(DEFAULT_LIST_PER_PAGE).unwrap();

        let grace = store.insert_human(&Human::new("Grace", "Hopper")).unwrap();
        let donald = store.insert_human(&Human::new("Donald", "Knuth")).unwrap();
        let ada = store
            .insert_human(&Human::new("Ada", "Lovelace").with_old_last_name("Byron"))
            .unwrap();
        let alan = store.insert_human(&Human::new("Alan", "Turing")).unwrap();

        let hopper = store.create_teacher(&Teacher::new(grace.id)).unwrap().id;
        let knuth = store.create_teacher(&Teacher::new(donald.id)).unwrap().id;
        let ada = store.insert_academic(ada.id).unwrap().id;
        let alan = store.insert_academic(alan.id).unwrap().id;

        store.create_teaching(&Teaching::new(hopper, ada, date(2020, 1, 1))).unwrap();
        store.create_teaching(&Teaching::new(knuth, alan, date(2020, 2, 1))).unwrap();
        store
            .create_teaching(&Teaching::new(hopper, alan, date(2020, 3, 1)).left_on(date(2020, 6, 1)))
            .unwrap();

        let algo = store.create_task(&Task::new("Algorithms 101").created_on(date(2020, 1, 5))).unwrap();
        let algebra = store.create_task(&Task::new("Linear algebra")).unwrap();
        store.create_task(&Task::new("Advanced ALGO tricks")).unwrap();
        store.create_task(&Task::new("100%_sure")).unwrap();
        store.add_tag(algo.id, "Graphs").unwrap();
        store.add_author(algo.id, knuth).unwrap();

        let session = store.insert_session(&Session::new("Spring 2020")).unwrap().id;
        store
            .create_solution(
                &Solution::new(algo.id, ada, 1, date(2020, 3, 1))
                    .received_on(date(2020, 3, 10))
                    .graded(Mark::from_tenths(95).unwrap(), hopper),
                &[session],
            )
            .unwrap();
        store
            .create_solution(&Solution::new(algebra.id, alan, 2, date(2020, 3, 8)), &[])
            .unwrap();

        Seed { store, catalog, hopper, knuth }
    }

    #[test]
    fn test_task_search_by_partial_title() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        let list = engine.run(EntityKind::Task, &ChangeListQuery::new().search("Algo")).unwrap();
        let titles: Vec<_> = list.rows.iter().map(|r| r.cells[1].clone()).collect();
        assert_eq!(list.total, 2);
        assert_eq!(titles, vec!["Advanced ALGO tricks", "Algorithms 101"]);
        assert_eq!(list.columns, vec!["id", "title", "creation_date"]);
    }

    #[test]
    fn test_search_words_are_anded() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let ids = engine
            .matching_ids(EntityKind::Task, &ChangeListQuery::new().search("algo tricks"))
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let ids = engine
            .matching_ids(EntityKind::Task, &ChangeListQuery::new().search("%_"))
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_teacher_search_by_name() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let list = engine.run(EntityKind::Teacher, &ChangeListQuery::new().search("hopper")).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.rows[0].cells, vec![s.hopper.to_string(), "Grace Hopper".to_string()]);
    }

    #[test]
    fn test_teaching_search_old_last_name_and_filter() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        let by_old_name = engine
            .run(EntityKind::Teaching, &ChangeListQuery::new().search("byron"))
            .unwrap();
        assert_eq!(by_old_name.total, 1);
        assert_eq!(by_old_name.rows[0].cells[1], "Grace Hopper (teacher)");
        assert_eq!(by_old_name.rows[0].cells[2], "Ada Lovelace");
        assert_eq!(by_old_name.rows[0].cells[4], EMPTY_VALUE);

        let by_teacher = engine
            .run(
                EntityKind::Teaching,
                &ChangeListQuery::new().filter("teacher", s.hopper.to_string()),
            )
            .unwrap();
        assert_eq!(by_teacher.total, 2);

        let by_date = engine
            .matching_ids(EntityKind::Teaching, &ChangeListQuery::new().search("2020-06"))
            .unwrap();
        assert_eq!(by_date.len(), 1);
    }

    #[test]
    fn test_filter_must_be_configured() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let err = engine
            .run(EntityKind::Teacher, &ChangeListQuery::new().filter("human", "1"))
            .unwrap_err();
        assert!(err.is_validation());

        let err = engine
            .run(EntityKind::Teaching, &ChangeListQuery::new().filter("teacher", "abc"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_tag_filter_and_choices() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let list = engine
            .run(EntityKind::Task, &ChangeListQuery::new().filter("tags", "graphs"))
            .unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.rows[0].cells[1], "Algorithms 101");

        let choices = engine.filter_choices(EntityKind::Task, "tags").unwrap();
        assert_eq!(choices, vec![FilterChoice { value: "graphs".into(), label: "Graphs".into() }]);
    }

    #[test]
    fn test_teacher_filter_choices() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let choices = engine.filter_choices(EntityKind::Teaching, "teacher").unwrap();
        let labels: Vec<_> = choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Grace Hopper (teacher)", "Donald Knuth (teacher)"]);
        assert_eq!(choices[1].value, s.knuth.to_string());
    }

    #[test]
    fn test_solution_rows_and_search() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        let all = engine.run(EntityKind::Solution, &ChangeListQuery::new().order_by("number")).unwrap();
        assert_eq!(all.total, 2);
        let graded = &all.rows[0].cells;
        assert_eq!(graded[1], "Algorithms 101");
        assert_eq!(graded[6], "9.5");
        assert_eq!(graded[7], "Grace Hopper (teacher)");
        let pending = &all.rows[1].cells;
        assert_eq!(pending[3], EMPTY_VALUE);
        assert_eq!(pending[6], "-");
        assert_eq!(pending[7], EMPTY_VALUE);

        // Search reaches the assessor through a LEFT JOIN
        let by_assessor = engine
            .matching_ids(EntityKind::Solution, &ChangeListQuery::new().search("hopper"))
            .unwrap();
        assert_eq!(by_assessor.len(), 1);
    }

    #[test]
    fn test_ordering_and_paging() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        let page = engine
            .run(EntityKind::Task, &ChangeListQuery::new().order_by("title").limit(2).offset(1))
            .unwrap();
        assert_eq!(page.total, 4);
        let titles: Vec<_> = page.rows.iter().map(|r| r.cells[1].as_str()).collect();
        assert_eq!(titles, vec!["Advanced ALGO tricks", "Algorithms 101"]);

        let err = engine
            .run(EntityKind::Task, &ChangeListQuery::new().order_by("comment"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_ordering_by_reference_uses_label() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        // Hopper has the lower id, Knuth sorts first by name
        let teachers: Vec<_> = engine
            .run(EntityKind::Teaching, &ChangeListQuery::new().order_by("teacher"))
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.cells[1].clone())
            .collect();
        assert_eq!(
            teachers,
            vec!["Donald Knuth (teacher)", "Grace Hopper (teacher)", "Grace Hopper (teacher)"]
        );

        let tasks: Vec<_> = engine
            .run(EntityKind::Solution, &ChangeListQuery::new().order_by("-task"))
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.cells[1].clone())
            .collect();
        assert_eq!(tasks, vec!["Linear algebra", "Algorithms 101"]);
    }

    #[test]
    fn test_zero_limit_still_returns_a_row() {
        let s = seed();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);
        let page = engine.run(EntityKind::Task, &ChangeListQuery::new().limit(0)).unwrap();
        assert_eq!(page.rows.len(), 1);

        let raw = ChangeListQuery { limit: Some(0), ..ChangeListQuery::default() };
        assert_eq!(engine.run(EntityKind::Task, &raw).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_tag_filter_keeps_colliding_slugs_apart() {
        let s = seed();
        let cpp = s.store.create_task(&Task::new("Templates")).unwrap();
        let csharp = s.store.create_task(&Task::new("LINQ")).unwrap();
        s.store.add_tag(cpp.id, "C++").unwrap();
        s.store.add_tag(csharp.id, "C#").unwrap();
        let engine = ChangeListEngine::new(&s.store, &s.catalog);

        let by_name = engine
            .matching_ids(EntityKind::Task, &ChangeListQuery::new().filter("tags", "C#"))
            .unwrap();
        assert_eq!(by_name, vec![csharp.id.get()]);

        let by_slug = engine
            .matching_ids(EntityKind::Task, &ChangeListQuery::new().filter("tags", "c"))
            .unwrap();
        assert_eq!(by_slug, vec![cpp.id.get()]);
    }
}
