//! SQL shape of each administrable entity
//!
//! Field paths use `__` to walk relations (`teacher__human__last_name`).
//! Every path resolves to one SQL expression over the entity's joined
//! `FROM` clause. All joins are to-one, so a row per record comes back.

use crate::model::EntityKind;

pub(crate) struct EntitySql {
    pub from: &'static str,
    pub id: &'static str,
    /// Searchable and orderable field paths
    pub fields: &'static [(&'static str, &'static str)],
    /// Columns the change list can render
    pub display: &'static [&'static str],
    /// Sort keys for display columns whose label is not the raw value
    pub order_by: &'static [(&'static str, &'static str)],
    /// Many-to-many fields, eligible for wide pickers
    pub many_to_many: &'static [&'static str],
    /// Foreign keys, eligible for raw-id entry
    pub foreign_keys: &'static [&'static str],
}

/// How a list filter narrows the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterSql {
    /// Equality on a foreign key column; choices are labelled by `target`
    Foreign { column: &'static str, target: RefTarget },
    /// Tasks carrying a tag, matched by slug or name
    Tag,
}

/// Referenced record kinds that get a label in filter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefTarget {
    Teacher,
    Academic,
    Task,
}

const TEACHER: EntitySql = EntitySql {
    from: "teachers t JOIN humans h ON h.id = t.human_id",
    id: "t.id",
    fields: &[
        ("id", "t.id"),
        ("human", "h.last_name || ' ' || h.first_name"),
        ("human__first_name", "h.first_name"),
        ("human__last_name", "h.last_name"),
        ("human__old_last_name", "h.old_last_name"),
        ("comment", "t.comment"),
    ],
    display: &["id", "human", "comment"],
    order_by: &[("human", "h.first_name || ' ' || h.last_name")],
    many_to_many: &["students"],
    foreign_keys: &["human"],
};

const TEACHING: EntitySql = EntitySql {
    from: "teachings tg \
           JOIN teachers t ON t.id = tg.teacher_id \
           JOIN humans th ON th.id = t.human_id \
           JOIN academics a ON a.id = tg.academic_id \
           JOIN humans ah ON ah.id = a.human_id",
    id: "tg.id",
    fields: &[
        ("id", "tg.id"),
        ("teacher", "tg.teacher_id"),
        ("academic", "tg.academic_id"),
        ("join_date", "tg.join_date"),
        ("leave_date", "tg.leave_date"),
        ("teacher__human__first_name", "th.first_name"),
        ("teacher__human__last_name", "th.last_name"),
        ("teacher__human__old_last_name", "th.old_last_name"),
        ("academic__human__first_name", "ah.first_name"),
        ("academic__human__last_name", "ah.last_name"),
        ("academic__human__old_last_name", "ah.old_last_name"),
    ],
    display: &["id", "teacher", "academic", "join_date", "leave_date"],
    order_by: &[
        ("teacher", "th.first_name || ' ' || th.last_name"),
        ("academic", "ah.first_name || ' ' || ah.last_name"),
    ],
    many_to_many: &[],
    foreign_keys: &["teacher", "academic"],
};

const TASK: EntitySql = EntitySql {
    from: "tasks tk",
    id: "tk.id",
    fields: &[
        ("id", "tk.id"),
        ("title", "tk.title"),
        ("creation_date", "tk.creation_date"),
        ("comment", "tk.comment"),
    ],
    display: &["id", "title", "creation_date", "comment", "authors", "tags"],
    order_by: &[],
    many_to_many: &["authors", "tags"],
    foreign_keys: &[],
};

const SOLUTION: EntitySql = EntitySql {
    from: "solutions s \
           JOIN tasks tk ON tk.id = s.task_id \
           JOIN academics a ON a.id = s.academic_id \
           JOIN humans ah ON ah.id = a.human_id \
           LEFT JOIN teachers t ON t.id = s.assessor_id \
           LEFT JOIN humans th ON th.id = t.human_id",
    id: "s.id",
    fields: &[
        ("id", "s.id"),
        ("task", "s.task_id"),
        ("task__title", "tk.title"),
        ("give_date", "s.give_date"),
        ("receive_date", "s.receive_date"),
        ("number", "s.number"),
        ("academic", "s.academic_id"),
        ("mark", "s.mark_tenths"),
        ("assessor", "s.assessor_id"),
        ("assessor__human__first_name", "th.first_name"),
        ("assessor__human__last_name", "th.last_name"),
        ("assessor__human__old_last_name", "th.old_last_name"),
        ("academic__human__first_name", "ah.first_name"),
        ("academic__human__last_name", "ah.last_name"),
        ("academic__human__old_last_name", "ah.old_last_name"),
    ],
    display: &[
        "id", "task", "give_date", "receive_date", "number", "academic", "mark", "assessor",
        "state", "sessions",
    ],
    order_by: &[
        ("task", "tk.title"),
        ("academic", "ah.first_name || ' ' || ah.last_name"),
        ("assessor", "th.first_name || ' ' || th.last_name"),
        (
            "state",
            "CASE WHEN s.mark_tenths IS NOT NULL THEN 2 WHEN s.receive_date IS NOT NULL THEN 1 ELSE 0 END",
        ),
    ],
    many_to_many: &["sessions"],
    foreign_keys: &["academic", "task", "assessor"],
};

pub(crate) fn entity_sql(kind: EntityKind) -> &'static EntitySql {
    match kind {
        EntityKind::Teacher => &TEACHER,
        EntityKind::Teaching => &TEACHING,
        EntityKind::Task => &TASK,
        EntityKind::Solution => &SOLUTION,
    }
}

/// SQL expression for a field path, if the entity has it
pub(crate) fn column(kind: EntityKind, path: &str) -> Option<&'static str> {
    entity_sql(kind)
        .fields
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, expr)| *expr)
}

/// Sort expression for a display column: its label when that differs from
/// the stored value, otherwise the field itself
pub(crate) fn order_column(kind: EntityKind, name: &str) -> Option<&'static str> {
    entity_sql(kind)
        .order_by
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, expr)| *expr)
        .or_else(|| column(kind, name))
}

/// Filter definition for a field, if the entity supports filtering on it
pub(crate) fn filter_sql(kind: EntityKind, field: &str) -> Option<FilterSql> {
    match (kind, field) {
        (EntityKind::Teaching, "teacher") => Some(FilterSql::Foreign {
            column: "tg.teacher_id",
            target: RefTarget::Teacher,
        }),
        (EntityKind::Teaching, "academic") => Some(FilterSql::Foreign {
            column: "tg.academic_id",
            target: RefTarget::Academic,
        }),
        (EntityKind::Task, "tags") => Some(FilterSql::Tag),
        (EntityKind::Solution, "task") => Some(FilterSql::Foreign {
            column: "s.task_id",
            target: RefTarget::Task,
        }),
        (EntityKind::Solution, "assessor") => Some(FilterSql::Foreign {
            column: "s.assessor_id",
            target: RefTarget::Teacher,
        }),
        _ => None,
    }
}
