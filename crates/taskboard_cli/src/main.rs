//! Command-line front end for the task board.
//!
//! # Responsibility
//! - Build one `TaskService` per invocation and route commands to it.
//! - Keep output line-oriented for quick inspection and scripting.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_core::db::open_db;
use taskboard_core::{
    core_version, format_duration, init_logging, CoreConfig, LocalTaskRepository, NewTask,
    SqliteStorage, Task, TaskError, TaskErrorCause, TaskId, TaskOperation, TaskService,
    TaskStorage,
};

const DEFAULT_DB_FILE_NAME: &str = "taskboard.sqlite3";

type Service = TaskService<LocalTaskRepository<SqliteStorage>>;

#[derive(Debug, Parser)]
#[command(name = "taskboard", about = "Track tasks in a local task board")]
struct Cli {
    /// SQLite database holding the task collection. Without it (or
    /// `db_path` in the config) tasks go to `taskboard.sqlite3` in the system
    /// temp directory, which the OS may clear.
    #[arg(long, env = "TASKBOARD_DB", global = true)]
    db: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reload and print every task.
    List,
    /// Create a task.
    Add(TaskFields),
    /// Change fields of an existing task.
    Edit {
        id: TaskId,
        #[command(flatten)]
        fields: EditFields,
    },
    /// Flip completion of a task.
    Toggle { id: TaskId },
    /// Delete a task.
    Rm { id: TaskId },
    /// Delete every task.
    Clear,
    /// Print completion statistics.
    Stats,
    /// Print the core version.
    Version,
}

#[derive(Debug, Args)]
struct TaskFields {
    #[arg(long)]
    source: String,
    #[arg(long)]
    description: String,
    /// Minutes.
    #[arg(long, default_value_t = 0.0)]
    duration: f64,
    #[arg(long)]
    completed: bool,
}

#[derive(Debug, Args)]
struct EditFields {
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    duration: Option<f64>,
    #[arg(long)]
    completed: Option<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Command::Version) {
        print_version();
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let service = build_service(&config)?;
    service.initialize()?;
    info!("event=cli_start module=cli status=ok");
    execute(&service, cli.command)
}

fn execute(service: &Service, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let tasks = service.get_all()?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                print_task(task);
            }
        }
        Command::Add(fields) => {
            let task = service.create(NewTask {
                source: fields.source,
                description: fields.description,
                duration: fields.duration,
                completed: fields.completed,
            })?;
            println!("Created task {}.", task.id);
        }
        Command::Edit { id, fields } => {
            let mut task = find_task(service, id)?;
            if let Some(source) = fields.source {
                task.source = source;
            }
            if let Some(description) = fields.description {
                task.description = description;
            }
            if let Some(duration) = fields.duration {
                task.duration = duration;
            }
            if let Some(completed) = fields.completed {
                task.completed = completed;
            }
            service.update(&task)?;
            println!("Updated task {id}.");
        }
        Command::Toggle { id } => {
            let task = service.toggle_status(id)?;
            let state = if task.completed { "done" } else { "open" };
            println!("Task {id} is now {state}.");
        }
        Command::Rm { id } => {
            service.delete(id)?;
            println!("Deleted task {id}.");
        }
        Command::Clear => {
            service.delete_all()?;
            println!("Deleted all tasks.");
        }
        Command::Stats => {
            let stats = service.statistics();
            println!("tasks={} completed={}", stats.total_tasks, stats.completed_tasks);
            println!(
                "hours={} completed_hours={}",
                stats.total_duration_label(),
                stats.completed_duration_label()
            );
            println!("completion={}", stats.completion_label());
        }
        Command::Version => print_version(),
    }

    Ok(())
}

fn print_version() {
    println!("taskboard_core version={}", core_version());
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn build_service(config: &CoreConfig) -> Result<Service> {
    let db_path = config
        .db_path
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let medium = SqliteStorage::try_new(conn)?.with_quota(config.quota());
    let storage = TaskStorage::with_key(medium, config.storage_key.clone());
    Ok(TaskService::new(LocalTaskRepository::new(storage)))
}

/// Current snapshot of `id`, failing the way `TaskService::update` would.
fn find_task(service: &Service, id: TaskId) -> Result<Task, TaskError> {
    service
        .store()
        .get_all()
        .iter()
        .find(|task| task.id == id)
        .cloned()
        .ok_or_else(|| TaskError::new(TaskOperation::Update, TaskErrorCause::NotFound(id)))
}

fn print_task(task: &Task) {
    let mark = if task.completed { 'x' } else { ' ' };
    println!(
        "[{mark}] {}  {}  {}  ({})",
        task.id,
        task.source,
        task.description,
        format_duration(task.duration)
    );
}
