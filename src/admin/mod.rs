//! Administrative catalog
//!
//! Describes, per entity, how list views are generated: which columns are
//! shown, which fields the free-text search covers, which discrete filters
//! exist, and which relations get a wide picker or raw-id entry. The catalog
//! is an ordinary value built at startup and handed to the change-list engine.

mod fields;
pub mod changelist;
pub mod search;

pub use changelist::{ChangeList, ChangeListEngine, ChangeListQuery, ChangeListRow, FilterChoice};
pub use search::{Lookup, SearchField};

use std::collections::BTreeMap;
use serde::Serialize;
use crate::model::EntityKind;
use crate::{Error, Result};

/// Rows per page when nothing else is configured
pub const DEFAULT_LIST_PER_PAGE: usize = 100;

/// List/search/filter configuration for one entity
#[derive(Debug, Clone, Serialize)]
pub struct ModelAdmin {
    pub entity: EntityKind,
    pub description: &'static str,
    pub list_display: Vec<&'static str>,
    pub search_fields: Vec<SearchField>,
    pub list_filter: Vec<&'static str>,
    /// Many-to-many fields edited with a two-pane picker
    pub filter_horizontal: Vec<&'static str>,
    /// Foreign keys entered by id instead of a drop-down
    pub raw_id_fields: Vec<&'static str>,
    pub list_per_page: usize,
}

impl ModelAdmin {
    pub fn new(entity: EntityKind, description: &'static str) -> Self {
        Self {
            entity,
            description,
            list_display: vec!["id"],
            search_fields: Vec::new(),
            list_filter: Vec::new(),
            filter_horizontal: Vec::new(),
            raw_id_fields: Vec::new(),
            list_per_page: DEFAULT_LIST_PER_PAGE,
        }
    }

    pub fn display(mut self, columns: &[&'static str]) -> Self {
        self.list_display = columns.to_vec();
        self
    }

    pub fn search(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| SearchField::parse(f)).collect();
        self
    }

    pub fn filter(mut self, fields: &[&'static str]) -> Self {
        self.list_filter = fields.to_vec();
        self
    }

    pub fn wide_pickers(mut self, fields: &[&'static str]) -> Self {
        self.filter_horizontal = fields.to_vec();
        self
    }

    pub fn raw_id(mut self, fields: &[&'static str]) -> Self {
        self.raw_id_fields = fields.to_vec();
        self
    }

    pub fn per_page(mut self, rows: usize) -> Self {
        self.list_per_page = rows.max(1);
        self
    }

    /// Every configured name must exist on the entity
    pub fn check(&self) -> Result<()> {
        let sql = fields::entity_sql(self.entity);
        let fail = |what: &str, name: &str| {
            Err(Error::Catalog(format!("{}: unknown {} '{}'", self.entity, what, name)))
        };

        if self.list_display.is_empty() {
            return Err(Error::Catalog(format!("{}: list_display is empty", self.entity)));
        }
        for column in &self.list_display {
            if !sql.display.contains(column) {
                return fail("list_display column", column);
            }
        }
        for field in &self.search_fields {
            if fields::column(self.entity, &field.path).is_none() {
                return fail("search field", &field.path);
            }
        }
        for field in &self.list_filter {
            if fields::filter_sql(self.entity, field).is_none() {
                return fail("list_filter field", field);
            }
        }
        for field in &self.filter_horizontal {
            if !sql.many_to_many.contains(field) {
                return fail("many-to-many field", field);
            }
        }
        for field in &self.raw_id_fields {
            if !sql.foreign_keys.contains(field) {
                return fail("foreign key", field);
            }
        }
        Ok(())
    }
}

/// The set of administrable entities and their list configuration
#[derive(Debug, Clone, Default)]
pub struct AdminCatalog {
    entries: BTreeMap<EntityKind, ModelAdmin>,
}

impl AdminCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; each entity can be registered once
    pub fn register(&mut self, admin: ModelAdmin) -> Result<()> {
        admin.check()?;
        if self.entries.contains_key(&admin.entity) {
            return Err(Error::Catalog(format!("{} is already registered", admin.entity)));
        }
        tracing::debug!("Registered {} in admin catalog", admin.entity);
        self.entries.insert(admin.entity, admin);
        Ok(())
    }

    pub fn get(&self, entity: EntityKind) -> Result<&ModelAdmin> {
        self.entries
            .get(&entity)
            .ok_or_else(|| Error::Catalog(format!("{} is not registered", entity)))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ModelAdmin> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The standard catalog for all four entities
    pub fn standard(list_per_page: usize) -> Result<Self> {
        let mut catalog = Self::new();

        catalog.register(
            ModelAdmin::new(EntityKind::Teacher, "Distance-learning teachers")
                .display(&["id", "human"])
                .search(&["id", "human__first_name", "human__last_name", "human__old_last_name"])
                .per_page(list_per_page),
        )?;

        catalog.register(
            ModelAdmin::new(EntityKind::Teaching, "Academics belonging to a teacher's group")
                .display(&["id", "teacher", "academic", "join_date", "leave_date"])
                .search(&[
                    "id",
                    "teacher__human__first_name",
                    "teacher__human__last_name",
                    "teacher__human__old_last_name",
                    "academic__human__first_name",
                    "academic__human__last_name",
                    "academic__human__old_last_name",
                    "join_date",
                    "leave_date",
                ])
                .filter(&["teacher"])
                .raw_id(&["teacher", "academic"])
                .per_page(list_per_page),
        )?;

        catalog.register(
            ModelAdmin::new(EntityKind::Task, "Distance-learning tasks")
                .display(&["id", "title", "creation_date"])
                .search(&["id", "title"])
                .filter(&["tags"])
                .wide_pickers(&["authors"])
                .per_page(list_per_page),
        )?;

        catalog.register(
            ModelAdmin::new(EntityKind::Solution, "Solutions given to and received from academics")
                .display(&[
                    "id", "task", "give_date", "receive_date", "number", "academic", "mark", "assessor",
                ])
                .search(&[
                    "id",
                    "task__title",
                    "assessor__human__first_name",
                    "assessor__human__last_name",
                    "assessor__human__old_last_name",
                    "academic__human__first_name",
                    "academic__human__last_name",
                    "academic__human__old_last_name",
                ])
                .wide_pickers(&["sessions"])
                .raw_id(&["academic"])
                .per_page(list_per_page),
        )?;

        Ok(catalog)
    }
}
