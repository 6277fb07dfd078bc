use crate::model::{Category, Direction, ListId, TaskId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daylist", version, about = "Daily task groups in the terminal")]
pub struct Cli {
    /// Store directory (overrides config and project discovery)
    #[arg(long, global = true, env = "DAYLIST_STORE")]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project store in the current directory
    Init,
    /// Print task groups, lists and tasks
    Show {
        /// Only days strictly after this D/M/YYYY date
        #[arg(long)]
        after: Option<String>,
    },
    /// Print the raw persisted value of every key
    Dump,
    /// Remove all persisted task data
    Clear,
    /// Task group commands
    #[command(subcommand)]
    Group(GroupCommand),
    /// List commands
    #[command(subcommand)]
    List(ListCommand),
    /// Task commands
    #[command(subcommand)]
    Task(TaskCommand),
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a task group (defaults to today)
    Add {
        /// Date as D/M/YYYY
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete every group for a date, with all of its lists and tasks
    Delete { date: String },
    /// Set or clear (empty text) the group caption
    Caption { date: String, text: String },
    /// Expand all lists of the day, or collapse them if all are expanded
    Toggle { date: String },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// Add a list under a date
    Add { date: String },
    /// Set the list category
    Category { list_id: ListId, category: Category },
    /// Set or clear (empty text) the list caption
    Caption { list_id: ListId, text: String },
    /// Show or hide the list's tasks
    Toggle { list_id: ListId },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to a list
    Add {
        list_id: ListId,
        /// Initial content
        #[arg(long)]
        content: Option<String>,
    },
    /// Replace the task content
    Edit {
        list_id: ListId,
        task_id: TaskId,
        text: String,
    },
    /// Mark the task done
    Check { list_id: ListId, task_id: TaskId },
    /// Mark the task not done
    Uncheck { list_id: ListId, task_id: TaskId },
    /// Set the due date (YYYY-MM-DD)
    Due {
        list_id: ListId,
        task_id: TaskId,
        date: Option<String>,
        /// Clear the due date
        #[arg(long)]
        clear: bool,
    },
    /// Move the task up or down within its list
    Move {
        list_id: ListId,
        task_id: TaskId,
        direction: Direction,
    },
    /// Delete the task
    Delete { list_id: ListId, task_id: TaskId },
}
