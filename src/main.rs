//! learning-records CLI - distance-learning teachers, tasks and graded solutions

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use learning_records::config;
use learning_records::output::{error_json, OutputMode};
use learning_records::{AdminCatalog, EntityKind, RecordStore};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "learning-records")]
#[command(version)]
#[command(about = "Records for distance-learning teachers, tasks and graded solutions")]
#[command(long_about = r#"
Keeps the teacher/academic groups, the task catalogue and the solutions
academics hand in, with an admin-style list view for each of them.

Example usage:
  learning-records init
  learning-records add task "Algorithms 101" --tag graphs
  learning-records list task -s algo
  learning-records grade 12 --mark 9.5 --assessor 3
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print a JSON envelope instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Mirror rows from the external person, academic and session registries
    Registry {
        #[command(subcommand)]
        entry: RegistryEntry,
    },

    /// Create a record
    Add {
        #[command(subcommand)]
        record: AddRecord,
    },

    /// Set the date an academic left a teacher's group
    Leave {
        teaching: i64,

        #[arg(long)]
        date: NaiveDate,
    },

    /// Record a solution's mark and assessor
    Grade {
        solution: i64,

        #[arg(short, long, allow_hyphen_values = true)]
        mark: String,

        #[arg(short, long)]
        assessor: i64,

        /// Also set the receive date
        #[arg(long)]
        received: Option<NaiveDate>,
    },

    /// Add or remove a task author
    Author {
        task: i64,
        teacher: i64,

        #[arg(long)]
        remove: bool,
    },

    /// Add, remove or replace task tags
    Tag {
        task: i64,

        #[arg(required_unless_present = "set")]
        names: Vec<String>,

        #[arg(long, conflicts_with = "set")]
        remove: bool,

        /// Replace all tags with the given names (none clears them)
        #[arg(long)]
        set: bool,
    },

    /// Attribute a solution to a session, or detach it
    Session {
        solution: i64,
        session: i64,

        #[arg(long)]
        remove: bool,
    },

    /// Search and filter the change list of an entity
    List {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,

        /// Free-text search over the entity's search fields
        #[arg(short, long)]
        search: Option<String>,

        /// Filter as field=value (repeatable)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Order by a list column, prefix with - for descending
        #[arg(short, long, allow_hyphen_values = true)]
        order: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show the values a list filter offers
    Filters {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        field: String,
    },

    /// Show one record with its relations
    Show {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        id: i64,
    },

    /// Delete a record, honouring the configured delete policy
    Delete {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
        id: i64,
    },

    /// Academics in a teacher's group
    Students {
        teacher: i64,

        /// Only memberships still active on this date
        #[arg(long)]
        on: Option<NaiveDate>,
    },

    /// Report suspicious but permitted record states
    Audit,

    /// Show record counts
    Stats,

    /// Show the admin catalog
    Catalog,
}

#[derive(Subcommand)]
enum RegistryEntry {
    /// Mirror a person
    Human {
        first_name: String,
        last_name: String,

        #[arg(long)]
        old_last_name: Option<String>,
    },

    /// Mirror an academic for an existing person
    Academic { human: i64 },

    /// Mirror a payment session
    Session {
        title: String,

        #[arg(long, requires = "end")]
        begin: Option<NaiveDate>,

        #[arg(long, requires = "begin")]
        end: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum AddRecord {
    /// Make a person a teacher
    Teacher {
        human: i64,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Put an academic into a teacher's group
    Teaching {
        teacher: i64,
        academic: i64,

        #[arg(long)]
        join: NaiveDate,

        #[arg(long)]
        leave: Option<NaiveDate>,
    },

    /// Create a task
    Task {
        title: String,

        #[arg(long)]
        created: Option<NaiveDate>,

        #[arg(long)]
        comment: Option<String>,

        /// Author teacher id (repeatable)
        #[arg(long = "author")]
        authors: Vec<i64>,

        /// Tag name (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Record a task given to an academic
    Solution {
        task: i64,
        academic: i64,

        /// Batch number of the hand-out
        #[arg(short, long)]
        number: i64,

        #[arg(long)]
        given: NaiveDate,

        #[arg(long)]
        received: Option<NaiveDate>,

        /// Session id (repeatable)
        #[arg(long = "session")]
        sessions: Vec<i64>,
    },
}

fn parse_entity(s: &str) -> Result<EntityKind, String> {
    s.parse().map_err(|e: learning_records::Error| e.to_string())
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", s)),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Registry { .. } => "registry",
        Commands::Add { .. } => "add",
        Commands::Leave { .. } => "leave",
        Commands::Grade { .. } => "grade",
        Commands::Author { .. } => "author",
        Commands::Tag { .. } => "tag",
        Commands::Session { .. } => "session",
        Commands::List { .. } => "list",
        Commands::Filters { .. } => "filters",
        Commands::Show { .. } => "show",
        Commands::Delete { .. } => "delete",
        Commands::Students { .. } => "students",
        Commands::Audit => "audit",
        Commands::Stats => "stats",
        Commands::Catalog => "catalog",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = OutputMode::from_flag(cli.json);
    let name = command_name(&cli.command);
    match run(cli, mode) {
        Ok(()) => Ok(()),
        Err(err) if mode.is_json() => {
            println!("{}", error_json(name, &format!("{:#}", err)));
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

fn run(cli: Cli, mode: OutputMode) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let base = std::env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        return commands::run_init(mode, &config_path, cli.database.as_deref(), &base, force);
    }

    let settings = config::load_config(Some(&config_path))?.unwrap_or_default();
    let database = cli.database.unwrap_or_else(|| settings.database_path(&base));
    if !database.exists() {
        anyhow::bail!(
            "no database at {} (run `learning-records init` first)",
            database.display()
        );
    }

    let store = RecordStore::open_with(&database, settings.store_options())?;
    let catalog = AdminCatalog::standard(settings.list_per_page())?;
    let ctx = commands::Context { store: &store, catalog: &catalog, mode };

    match cli.command {
        // Handled before the store is opened
        Commands::Init { .. } => Ok(()),
        Commands::Registry { entry } => match entry {
            RegistryEntry::Human { first_name, last_name, old_last_name } => {
                commands::run_registry_human(&ctx, &first_name, &last_name, old_last_name)
            }
            RegistryEntry::Academic { human } => commands::run_registry_academic(&ctx, human),
            RegistryEntry::Session { title, begin, end } => {
                commands::run_registry_session(&ctx, &title, begin.zip(end))
            }
        },
        Commands::Add { record } => match record {
            AddRecord::Teacher { human, comment } => commands::run_add_teacher(&ctx, human, comment),
            AddRecord::Teaching { teacher, academic, join, leave } => {
                commands::run_add_teaching(&ctx, teacher, academic, join, leave)
            }
            AddRecord::Task { title, created, comment, authors, tags } => {
                commands::run_add_task(&ctx, &title, created, comment, &authors, &tags)
            }
            AddRecord::Solution { task, academic, number, given, received, sessions } => {
                commands::run_add_solution(&ctx, task, academic, number, given, received, &sessions)
            }
        },
        Commands::Leave { teaching, date } => commands::run_leave(&ctx, teaching, date),
        Commands::Grade { solution, mark, assessor, received } => {
            commands::run_grade(&ctx, solution, &mark, assessor, received)
        }
        Commands::Author { task, teacher, remove } => commands::run_author(&ctx, task, teacher, remove),
        Commands::Tag { task, names, remove, set } => commands::run_tag(&ctx, task, &names, remove, set),
        Commands::Session { solution, session, remove } => {
            commands::run_session(&ctx, solution, session, remove)
        }
        Commands::List { entity, search, filters, order, limit, offset } => {
            commands::run_list(&ctx, entity, search, filters, order, limit, offset)
        }
        Commands::Filters { entity, field } => commands::run_filters(&ctx, entity, &field),
        Commands::Show { entity, id } => commands::run_show(&ctx, entity, id),
        Commands::Delete { entity, id } => commands::run_delete(&ctx, entity, id),
        Commands::Students { teacher, on } => commands::run_students(&ctx, teacher, on),
        Commands::Audit => commands::run_audit(&ctx),
        Commands::Stats => commands::run_stats(&ctx, &database),
        Commands::Catalog => commands::run_catalog(&ctx),
    }
}
