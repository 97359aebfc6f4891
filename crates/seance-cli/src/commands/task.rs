//! Task management commands for CLI.

use clap::Subcommand;
use seance_core::remote::{NewTask, TaskUpdate};
use seance_core::storage::Database;
use seance_core::{Config, SnapshotStore};

use super::{print_json, services, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Only tasks of this séance
        #[arg(long, conflicts_with = "current")]
        seance: Option<String>,
        /// Only tasks of the active séance
        #[arg(long)]
        current: bool,
    },
    /// Show one task
    Get { id: String },
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// haute, moyenne or basse
        #[arg(long)]
        priority: Option<String>,
        /// ISO 8601 date
        #[arg(long)]
        deadline: Option<String>,
        /// Attach to the active séance
        #[arg(long)]
        current: bool,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Change a task's status, e.g. "en cours" or "terminé"
    Status { id: String, status: String },
    /// Delete a task
    Delete { id: String },
}

/// Id of the session stored in the local snapshot, if one is active.
fn active_seance_id() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let store = SnapshotStore::new(Database::open()?);
    Ok(store.load().and_then(|s| s.active_session_id))
}

fn require_active() -> Result<String, Box<dyn std::error::Error>> {
    Ok(active_seance_id()?.ok_or("no active session")?)
}

pub async fn run(action: TaskAction) -> CliResult {
    let config = Config::load()?;
    let tasks = services(&config)?.tasks;

    match action {
        TaskAction::List { seance, current } => {
            let seance = if current { Some(require_active()?) } else { seance };
            let list = match seance {
                Some(id) => tasks.list_for_seance(&id).await?,
                None => tasks.list().await?,
            };
            print_json(&list)?;
        }
        TaskAction::Get { id } => print_json(&tasks.get(&id).await?)?,
        TaskAction::Add {
            title,
            description,
            priority,
            deadline,
            current,
        } => {
            let seance_id = if current { Some(require_active()?) } else { None };
            let task = NewTask {
                title,
                description,
                status: None,
                priority,
                deadline,
                seance_id,
            };
            print_json(&tasks.create(&task).await?)?;
        }
        TaskAction::Edit {
            id,
            title,
            description,
            priority,
            deadline,
        } => {
            let update = TaskUpdate {
                title,
                description,
                status: None,
                priority,
                deadline,
            };
            print_json(&tasks.update(&id, &update).await?)?;
        }
        TaskAction::Status { id, status } => {
            print_json(&tasks.update_status(&id, &status).await?)?;
        }
        TaskAction::Delete { id } => {
            tasks.delete(&id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}
