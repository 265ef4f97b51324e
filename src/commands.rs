use chrono::NaiveDate;
use learning_records::admin::ChangeListQuery;
use learning_records::audit::audit;
use learning_records::config::{self, RecordsConfig};
use learning_records::model::{
    AcademicId, Human, HumanId, Mark, Session, SessionId, SolutionId, TaskId, TeacherId, TeachingId,
};
use learning_records::output::{emit_success, is_quiet, OutputMode};
use learning_records::ui::{
    self, header, info, muted, record_changed, record_created, record_deleted, section, stats_table,
    success, summary_row, Icons, TableBuilder,
};
use learning_records::{
    AdminCatalog, ChangeListEngine, EntityKind, Error, RecordStore, Solution, Task, Teacher, Teaching,
};
use std::path::Path;

/// Everything a command needs once the store is open
pub struct Context<'a> {
    pub store: &'a RecordStore,
    pub catalog: &'a AdminCatalog,
    pub mode: OutputMode,
}

impl Context<'_> {
    fn teacher_label(&self, id: TeacherId) -> anyhow::Result<String> {
        let teacher = self
            .store
            .get_teacher(id)?
            .ok_or(Error::NotFound { entity: "Teacher", id: id.get() })?;
        Ok(match self.store.get_human(teacher.human)? {
            Some(human) => Teacher::label(&human),
            None => format!("Teacher #{}", id),
        })
    }

    fn academic_label(&self, id: AcademicId) -> anyhow::Result<String> {
        Ok(match self.store.academic_human(id)? {
            Some(human) => human.to_string(),
            None => format!("Academic #{}", id),
        })
    }
}

// ========== Setup ==========

pub fn run_init(
    mode: OutputMode,
    config_path: &Path,
    database: Option<&Path>,
    base: &Path,
    force: bool,
) -> anyhow::Result<()> {
    let database = database
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config::default_database_path_in(base));
    let settings = RecordsConfig::with_defaults(&database);

    config::write_config(config_path, &settings, force)?;
    config::ensure_db_dir(&database)?;
    let store = RecordStore::open_with(&database, settings.store_options())?;
    let stats = store.stats()?;
    tracing::info!("Initialized record store at {}", database.display());

    if mode.is_json() {
        let data = serde_json::json!({
            "config": config_path.display().to_string(),
            "database": database.display().to_string(),
            "stats": stats,
        });
        return emit_success("init", &data);
    }

    header("Learning records initialized");
    info("Config", &config_path.display().to_string());
    ui::status(Icons::DATABASE, "Database", &database.display().to_string());
    success("Ready");
    Ok(())
}

// ========== Registry Mirrors ==========

pub fn run_registry_human(
    ctx: &Context,
    first_name: &str,
    last_name: &str,
    old_last_name: Option<String>,
) -> anyhow::Result<()> {
    let mut human = Human::new(first_name, last_name);
    human.old_last_name = old_last_name;
    let human = ctx.store.insert_human(&human)?;

    if ctx.mode.is_json() {
        return emit_success("registry", &human);
    }
    record_created("Human", human.id.get(), &human.to_string());
    Ok(())
}

pub fn run_registry_academic(ctx: &Context, human: i64) -> anyhow::Result<()> {
    let academic = ctx.store.insert_academic(HumanId(human))?;

    if ctx.mode.is_json() {
        return emit_success("registry", &academic);
    }
    let label = ctx.academic_label(academic.id)?;
    record_created("Academic", academic.id.get(), &label);
    Ok(())
}

pub fn run_registry_session(
    ctx: &Context,
    title: &str,
    period: Option<(NaiveDate, NaiveDate)>,
) -> anyhow::Result<()> {
    let mut session = Session::new(title);
    if let Some((begin, end)) = period {
        session = session.between(begin, end);
    }
    let session = ctx.store.insert_session(&session)?;

    if ctx.mode.is_json() {
        return emit_success("registry", &session);
    }
    record_created("Session", session.id.get(), &session.title);
    Ok(())
}

// ========== Create ==========

pub fn run_add_teacher(ctx: &Context, human: i64, comment: Option<String>) -> anyhow::Result<()> {
    let mut teacher = Teacher::new(HumanId(human));
    teacher.comment = comment;
    let teacher = ctx.store.create_teacher(&teacher)?;

    if ctx.mode.is_json() {
        return emit_success("add", &teacher);
    }
    let label = ctx.teacher_label(teacher.id)?;
    record_created("Teacher", teacher.id.get(), &label);
    Ok(())
}

pub fn run_add_teaching(
    ctx: &Context,
    teacher: i64,
    academic: i64,
    join: NaiveDate,
    leave: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let mut teaching = Teaching::new(TeacherId(teacher), AcademicId(academic), join);
    teaching.leave_date = leave;
    let teaching = ctx.store.create_teaching(&teaching)?;

    if ctx.mode.is_json() {
        return emit_success("add", &teaching);
    }
    let label = format!(
        "{} in the group of {}",
        ctx.academic_label(teaching.academic)?,
        ctx.teacher_label(teaching.teacher)?
    );
    record_created("Teaching", teaching.id.get(), &label);
    Ok(())
}

pub fn run_add_task(
    ctx: &Context,
    title: &str,
    created: Option<NaiveDate>,
    comment: Option<String>,
    authors: &[i64],
    tags: &[String],
) -> anyhow::Result<()> {
    let mut task = Task::new(title);
    task.creation_date = created;
    task.comment = comment;
    let authors: Vec<TeacherId> = authors.iter().copied().map(TeacherId).collect();
    let (task, tags) = ctx.store.create_task_with(&task, &authors, tags)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "task": task, "authors": authors, "tags": tags });
        return emit_success("add", &data);
    }
    record_created("Task", task.id.get(), &task.title);
    if !tags.is_empty() {
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        summary_row("tags", &names.join(", "));
    }
    Ok(())
}

pub fn run_add_solution(
    ctx: &Context,
    task: i64,
    academic: i64,
    number: i64,
    given: NaiveDate,
    received: Option<NaiveDate>,
    sessions: &[i64],
) -> anyhow::Result<()> {
    let mut solution = Solution::new(TaskId(task), AcademicId(academic), number, given);
    solution.receive_date = received;
    let sessions: Vec<SessionId> = sessions.iter().copied().map(SessionId).collect();
    let solution = ctx.store.create_solution(&solution, &sessions)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "solution": solution, "sessions": sessions });
        return emit_success("add", &data);
    }
    let label = format!("batch {} for {}", solution.number, ctx.academic_label(solution.academic)?);
    record_created("Solution", solution.id.get(), &label);
    Ok(())
}

// ========== Update ==========

pub fn run_leave(ctx: &Context, teaching: i64, date: NaiveDate) -> anyhow::Result<()> {
    let teaching = ctx.store.set_leave_date(TeachingId(teaching), Some(date))?;

    if ctx.mode.is_json() {
        return emit_success("leave", &teaching);
    }
    record_changed("Teaching", teaching.id.get(), &format!("left on {}", date));
    Ok(())
}

pub fn run_grade(
    ctx: &Context,
    solution: i64,
    mark: &str,
    assessor: i64,
    received: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let mark: Mark = mark.parse()?;
    let solution = ctx
        .store
        .grade_solution(SolutionId(solution), mark, TeacherId(assessor), received)?;

    if ctx.mode.is_json() {
        return emit_success("grade", &solution);
    }
    let label = format!("marked {} by {}", mark, ctx.teacher_label(TeacherId(assessor))?);
    record_changed("Solution", solution.id.get(), &label);
    Ok(())
}

pub fn run_author(ctx: &Context, task: i64, teacher: i64, remove: bool) -> anyhow::Result<()> {
    let (task, teacher) = (TaskId(task), TeacherId(teacher));
    let changed = if remove {
        ctx.store.remove_author(task, teacher)?
    } else {
        ctx.store.add_author(task, teacher)?;
        true
    };
    let authors = ctx.store.authors_of(task)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "task": task, "changed": changed, "authors": authors });
        return emit_success("author", &data);
    }
    let mut names = Vec::with_capacity(authors.len());
    for author in &authors {
        names.push(ctx.teacher_label(*author)?);
    }
    record_changed("Task", task.get(), &format!("authors: {}", display_list(&names)));
    Ok(())
}

pub fn run_tag(ctx: &Context, task: i64, names: &[String], remove: bool, set: bool) -> anyhow::Result<()> {
    let task = TaskId(task);
    if set {
        ctx.store.set_tags(task, names)?;
    } else if remove {
        for name in names {
            if !ctx.store.remove_tag(task, name)? {
                tracing::debug!("Task #{} was not tagged '{}'", task, name);
            }
        }
    } else {
        for name in names {
            ctx.store.add_tag(task, name)?;
        }
    }
    let tags = ctx.store.tags_of(task)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "task": task, "tags": tags });
        return emit_success("tag", &data);
    }
    let names: Vec<String> = tags.into_iter().map(|t| t.name).collect();
    ui::status(Icons::TAG, &format!("Task #{}", task), &display_list(&names));
    Ok(())
}

pub fn run_session(ctx: &Context, solution: i64, session: i64, remove: bool) -> anyhow::Result<()> {
    let (solution, session) = (SolutionId(solution), SessionId(session));
    if remove {
        ctx.store.remove_session(solution, session)?;
    } else {
        ctx.store.add_session(solution, session)?;
    }
    let sessions = ctx.store.sessions_of(solution)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "solution": solution, "sessions": sessions });
        return emit_success("session", &data);
    }
    let mut titles = Vec::with_capacity(sessions.len());
    for id in &sessions {
        titles.push(match ctx.store.get_session(*id)? {
            Some(s) => s.title,
            None => format!("Session #{}", id),
        });
    }
    record_changed("Solution", solution.get(), &format!("sessions: {}", display_list(&titles)));
    Ok(())
}

// ========== Change Lists ==========

pub fn run_list(
    ctx: &Context,
    entity: EntityKind,
    search: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
    offset: usize,
) -> anyhow::Result<()> {
    let query = ChangeListQuery {
        search,
        filters,
        ordering: order,
        limit,
        offset,
    };
    let list = ChangeListEngine::new(ctx.store, ctx.catalog).run(entity, &query)?;

    if ctx.mode.is_json() {
        return emit_success("list", &list);
    }

    let mut table = TableBuilder::new(list.columns.iter().cloned());
    for row in &list.rows {
        table.add_row(row.cells.iter().cloned());
    }
    if table.is_empty() {
        info(&format!("0 {}s", entity), "nothing matches");
        return Ok(());
    }
    println!("{}", table.build());
    if !is_quiet() {
        println!(
            "{}",
            muted(&format!(
                "{} of {} {}(s), starting at {}",
                list.rows.len(),
                list.total,
                entity,
                query.offset
            ))
        );
    }
    Ok(())
}

pub fn run_filters(ctx: &Context, entity: EntityKind, field: &str) -> anyhow::Result<()> {
    let choices = ChangeListEngine::new(ctx.store, ctx.catalog).filter_choices(entity, field)?;

    if ctx.mode.is_json() {
        return emit_success("filters", &choices);
    }
    section(&format!(" {} by {} ", entity, field));
    let mut table = TableBuilder::new(["Value", "Label"]);
    for choice in &choices {
        table.add_row([choice.value.clone(), choice.label.clone()]);
    }
    if table.is_empty() {
        info(field, "no values yet");
    } else {
        println!("{}", table.build());
    }
    Ok(())
}

// ========== Show / Delete ==========

pub fn run_show(ctx: &Context, entity: EntityKind, id: i64) -> anyhow::Result<()> {
    let mut rows: Vec<(&str, String)> = Vec::new();

    let data = match entity {
        EntityKind::Teacher => {
            let teacher = ctx
                .store
                .get_teacher(TeacherId(id))?
                .ok_or(Error::NotFound { entity: "Teacher", id })?;
            let teachings = ctx.store.teachings_of_teacher(teacher.id)?;
            let authored = ctx.store.tasks_by_author(teacher.id)?;
            rows.push(("Teacher", ctx.teacher_label(teacher.id)?));
            rows.push(("Comment", display_opt(&teacher.comment)));
            rows.push(("Teachings", teachings.len().to_string()));
            rows.push(("Authored tasks", display_list(&authored.iter().map(|t| t.title.clone()).collect::<Vec<_>>())));
            serde_json::json!({ "teacher": teacher, "teachings": teachings, "tasks": authored })
        }
        EntityKind::Teaching => {
            let teaching = ctx
                .store
                .get_teaching(TeachingId(id))?
                .ok_or(Error::NotFound { entity: "Teaching", id })?;
            let active = teaching.is_active(chrono::Local::now().date_naive());
            rows.push(("Teacher", ctx.teacher_label(teaching.teacher)?));
            rows.push(("Academic", ctx.academic_label(teaching.academic)?));
            rows.push(("Joined", teaching.join_date.to_string()));
            rows.push(("Left", display_opt(&teaching.leave_date)));
            rows.push(("Active", if active { "yes" } else { "no" }.to_string()));
            serde_json::json!({ "teaching": teaching, "active": active })
        }
        EntityKind::Task => {
            let task = ctx
                .store
                .get_task(TaskId(id))?
                .ok_or(Error::NotFound { entity: "Task", id })?;
            let authors = ctx.store.authors_of(task.id)?;
            let tags = ctx.store.tags_of(task.id)?;
            let solutions = ctx.store.solutions_for_task(task.id)?;
            let mut names = Vec::with_capacity(authors.len());
            for author in &authors {
                names.push(ctx.teacher_label(*author)?);
            }
            rows.push(("Title", task.title.clone()));
            rows.push(("Created", display_opt(&task.creation_date)));
            rows.push(("Comment", display_opt(&task.comment)));
            rows.push(("Authors", display_list(&names)));
            rows.push(("Tags", display_list(&tags.iter().map(|t| t.name.clone()).collect::<Vec<_>>())));
            rows.push(("Solutions", solutions.len().to_string()));
            serde_json::json!({ "task": task, "authors": authors, "tags": tags, "solutions": solutions.len() })
        }
        EntityKind::Solution => {
            let solution = ctx
                .store
                .get_solution(SolutionId(id))?
                .ok_or(Error::NotFound { entity: "Solution", id })?;
            let sessions = ctx.store.sessions_of(solution.id)?;
            let task = ctx.store.get_task(solution.task)?;
            rows.push(("Task", task.map(|t| t.title).unwrap_or_else(|| format!("Task #{}", solution.task))));
            rows.push(("Academic", ctx.academic_label(solution.academic)?));
            rows.push(("Number", solution.number.to_string()));
            rows.push(("Given", solution.give_date.to_string()));
            rows.push(("Received", display_opt(&solution.receive_date)));
            rows.push(("Mark", solution.to_string()));
            rows.push((
                "Assessor",
                match solution.assessor {
                    Some(assessor) => ctx.teacher_label(assessor)?,
                    None => "-".to_string(),
                },
            ));
            rows.push(("State", solution.state().to_string()));
            rows.push(("Sessions", display_list(&sessions.iter().map(|s| format!("#{}", s)).collect::<Vec<_>>())));
            serde_json::json!({ "solution": solution, "state": solution.state(), "sessions": sessions })
        }
    };

    if ctx.mode.is_json() {
        return emit_success("show", &data);
    }
    section(&format!(" {} #{} ", entity, id));
    let mut table = TableBuilder::new(["Field", "Value"]);
    for (label, value) in rows {
        table.add_row([label.to_string(), value]);
    }
    println!("{}", table.build());
    Ok(())
}

pub fn run_delete(ctx: &Context, entity: EntityKind, id: i64) -> anyhow::Result<()> {
    match entity {
        EntityKind::Teacher => ctx.store.delete_teacher(TeacherId(id))?,
        EntityKind::Teaching => ctx.store.delete_teaching(TeachingId(id))?,
        EntityKind::Task => ctx.store.delete_task(TaskId(id))?,
        EntityKind::Solution => ctx.store.delete_solution(SolutionId(id))?,
    }

    if ctx.mode.is_json() {
        let data = serde_json::json!({
            "entity": entity,
            "id": id,
            "policy": ctx.store.options().delete_policy,
        });
        return emit_success("delete", &data);
    }
    record_deleted(&entity.to_string(), id);
    Ok(())
}

// ========== Reports ==========

pub fn run_students(ctx: &Context, teacher: i64, on: Option<NaiveDate>) -> anyhow::Result<()> {
    let teacher = TeacherId(teacher);
    let label = ctx.teacher_label(teacher)?;
    let students = ctx.store.students_of(teacher, on)?;

    if ctx.mode.is_json() {
        let data = serde_json::json!({ "teacher": teacher, "on": on, "students": students });
        return emit_success("students", &data);
    }
    let title = match on {
        Some(date) => format!(" Students of {} on {} ", label, date),
        None => format!(" Students of {} ", label),
    };
    section(&title);
    let mut table = TableBuilder::new(["Academic", "Name"]);
    for academic in &students {
        table.add_row([academic.to_string(), ctx.academic_label(*academic)?]);
    }
    if table.is_empty() {
        info("Students", "none");
    } else {
        println!("{}", table.build());
    }
    Ok(())
}

pub fn run_audit(ctx: &Context) -> anyhow::Result<()> {
    let findings = audit(ctx.store)?;

    if ctx.mode.is_json() {
        return emit_success("audit", &findings);
    }
    header("Audit");
    if findings.is_empty() {
        success("No findings");
        return Ok(());
    }
    let mut table = TableBuilder::new(["Kind", "Finding"]);
    for finding in &findings {
        table.add_row([finding.kind().to_string(), finding.to_string()]);
    }
    println!("{}", table.build());
    ui::warn(&format!("{} finding(s)", findings.len()));
    Ok(())
}

pub fn run_stats(ctx: &Context, database: &Path) -> anyhow::Result<()> {
    let stats = ctx.store.stats()?;

    if ctx.mode.is_json() {
        return emit_success("stats", &stats);
    }
    header("Learning records");
    ui::status(Icons::DATABASE, "Database", &database.display().to_string());
    ui::status(
        Icons::STATS,
        "Delete policy",
        ctx.store.options().delete_policy.as_str(),
    );
    println!("{}", stats_table(&stats.rows()));
    Ok(())
}

pub fn run_catalog(ctx: &Context) -> anyhow::Result<()> {
    let entries: Vec<_> = ctx.catalog.entries().collect();

    if ctx.mode.is_json() {
        return emit_success("catalog", &entries);
    }
    for admin in entries {
        section(&format!(" {} ", admin.entity));
        summary_row("about", admin.description);
        summary_row("columns", &admin.list_display.join(", "));
        let search: Vec<String> = admin.search_fields.iter().map(|f| f.to_string()).collect();
        summary_row("search", &display_list(&search));
        summary_row("filters", &display_list(&admin.list_filter.iter().map(|f| f.to_string()).collect::<Vec<_>>()));
        summary_row("wide pickers", &display_list(&admin.filter_horizontal.iter().map(|f| f.to_string()).collect::<Vec<_>>()));
        summary_row("raw id", &display_list(&admin.raw_id_fields.iter().map(|f| f.to_string()).collect::<Vec<_>>()));
        summary_row("per page", &admin.list_per_page.to_string());
    }
    Ok(())
}

fn display_opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_list(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}
