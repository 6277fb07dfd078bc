use crate::cli::{GroupCommand, ListCommand, TaskCommand};
use crate::dates;
use crate::model::{Task, TaskList, TaskStore};
use crate::session::Session;
use crate::snapshot::KNOWN_KEYS;
use crate::storage::{init_project_store, locate_store, KvStore, StoreLocation};
use crate::ui::{self, THEME_KEY};
use crate::view::{self, DayStatus, DayView, ListStatus};
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

pub fn init() -> Result<()> {
    let location = init_project_store()?;
    println!("Initialized store at {}", location.path.display());
    Ok(())
}

pub fn show(store: Option<PathBuf>, after: Option<String>) -> Result<()> {
    let (session, location) = open_session(store)?;
    println!(
        "Store: {} ({})",
        location.path.display(),
        location.scope.label()
    );
    let days = match after.as_deref() {
        Some(date) => {
            parse_group_date(date)?;
            view::days_after(session.store(), date)
        }
        None => view::days(session.store()),
    };
    if days.is_empty() {
        println!("  (no task groups)");
    }
    for day in &days {
        print_day(session.store(), day);
    }
    Ok(())
}

pub fn dump(store: Option<PathBuf>) -> Result<()> {
    let kv = KvStore::open(&locate(store)?);
    for key in KNOWN_KEYS.iter().chain(std::iter::once(&THEME_KEY)) {
        match kv.raw(key) {
            Some(raw) => println!("{}: {}", key, raw),
            None => println!("{}: (absent)", key),
        }
    }
    Ok(())
}

pub fn clear(store: Option<PathBuf>) -> Result<()> {
    let (mut session, location) = open_session(store)?;
    session.clear();
    println!("Cleared task data in {}", location.path.display());
    Ok(())
}

pub fn group(store: Option<PathBuf>, command: GroupCommand) -> Result<()> {
    let (mut session, _) = open_session(store)?;
    match command {
        GroupCommand::Add { date } => {
            let date = match date {
                Some(raw) => canonical_date(&raw)?,
                None => dates::current_date_string(),
            };
            let id = session.apply(|s| s.create_task_group_on(&date));
            println!("Created task group {} for {}", id, date);
        }
        GroupCommand::Delete { date } => {
            let date = canonical_date(&date)?;
            if session.apply(|s| s.delete_task_group(&date)) {
                println!("Deleted task group {}", date);
            } else {
                println!("No task group for {}", date);
            }
        }
        GroupCommand::Caption { date, text } => {
            let date = canonical_date(&date)?;
            if session.apply(|s| s.set_task_group_caption(&date, &text)) {
                println!("Updated caption for {}", date);
            } else {
                println!("No task group for {}", date);
            }
        }
        GroupCommand::Toggle { date } => {
            let date = canonical_date(&date)?;
            if session.apply(|s| s.toggle_group_expansion(&date)) {
                let expanded = session.store().lists(&date).iter().all(|l| l.expanded);
                println!(
                    "{} lists under {}",
                    if expanded { "Expanded" } else { "Collapsed" },
                    date
                );
            } else {
                println!("No lists under {}", date);
            }
        }
    }
    Ok(())
}

pub fn list(store: Option<PathBuf>, command: ListCommand) -> Result<()> {
    let (mut session, _) = open_session(store)?;
    match command {
        ListCommand::Add { date } => {
            let date = canonical_date(&date)?;
            if !session.store().groups().iter().any(|g| g.date == date) {
                println!("No task group for {}", date);
                return Ok(());
            }
            let id = session.apply(|s| s.create_list(&date));
            println!("Created list {} under {}", id, date);
        }
        ListCommand::Category { list_id, category } => {
            report(
                session.apply(|s| s.set_category(list_id, category)),
                format!("Set category of list {} to {}", list_id, category),
                format!("No list {}", list_id),
            );
        }
        ListCommand::Caption { list_id, text } => {
            report(
                session.apply(|s| s.set_list_caption(list_id, &text)),
                format!("Updated caption for list {}", list_id),
                format!("No list {}", list_id),
            );
        }
        ListCommand::Toggle { list_id } => {
            report(
                session.apply(|s| s.toggle_list_tasks_expansion(list_id)),
                format!("Toggled tasks of list {}", list_id),
                format!("No list {}", list_id),
            );
        }
    }
    Ok(())
}

pub fn task(store: Option<PathBuf>, command: TaskCommand) -> Result<()> {
    let (mut session, _) = open_session(store)?;
    match command {
        TaskCommand::Add { list_id, content } => {
            let created = session.apply(|s| {
                let id = s.create_task(list_id)?;
                if let Some(text) = content.as_deref() {
                    s.update_task_content(list_id, id, text);
                }
                Some(id)
            });
            match created {
                Some(id) => println!("Created task {} in list {}", id, list_id),
                None => println!("No list {}", list_id),
            }
        }
        TaskCommand::Edit {
            list_id,
            task_id,
            text,
        } => report(
            session.apply(|s| s.update_task_content(list_id, task_id, &text)),
            format!("Updated task {}", task_id),
            missing_task(list_id, task_id),
        ),
        TaskCommand::Check { list_id, task_id } => report(
            session.apply(|s| s.update_task_checked(list_id, task_id, true)),
            format!("Checked task {}", task_id),
            missing_task(list_id, task_id),
        ),
        TaskCommand::Uncheck { list_id, task_id } => report(
            session.apply(|s| s.update_task_checked(list_id, task_id, false)),
            format!("Unchecked task {}", task_id),
            missing_task(list_id, task_id),
        ),
        TaskCommand::Due {
            list_id,
            task_id,
            date,
            clear,
        } => {
            let due = if clear {
                String::new()
            } else {
                let raw = date.ok_or_else(|| anyhow!("provide a due date or --clear"))?;
                parse_due(&raw)?
            };
            report(
                session.apply(|s| s.update_task_due_date(list_id, task_id, &due)),
                format!("Updated due date of task {}", task_id),
                missing_task(list_id, task_id),
            );
        }
        TaskCommand::Move {
            list_id,
            task_id,
            direction,
        } => {
            let known = session.store().task(list_id, task_id).is_some();
            let moved = session.apply(|s| s.move_task(list_id, task_id, direction));
            if moved {
                println!("Moved task {}", task_id);
            } else if known {
                println!("Task {} is already at the edge", task_id);
            } else {
                println!("{}", missing_task(list_id, task_id));
            }
        }
        TaskCommand::Delete { list_id, task_id } => {
            if session.apply(|s| s.delete_task(list_id, task_id)) {
                println!("Deleted task {}", task_id);
                if session.store().list(list_id).is_none() {
                    println!("List {} is empty and was removed", list_id);
                }
            } else {
                println!("{}", missing_task(list_id, task_id));
            }
        }
    }
    Ok(())
}

pub fn tui(store: Option<PathBuf>) -> Result<()> {
    let (session, location) = open_session(store)?;
    ui::run(session, location)
}

fn locate(store: Option<PathBuf>) -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    locate_store(&cwd, store)
}

fn open_session(store: Option<PathBuf>) -> Result<(Session, StoreLocation)> {
    let location = locate(store)?;
    let session = Session::open(KvStore::open(&location));
    Ok((session, location))
}

fn report(changed: bool, done: String, missing: String) {
    if changed {
        println!("{}", done);
    } else {
        println!("{}", missing);
    }
}

fn missing_task(list_id: u64, task_id: u64) -> String {
    format!("No task {} in list {}", task_id, list_id)
}

fn parse_group_date(raw: &str) -> Result<NaiveDate> {
    dates::parse_date_string(raw).ok_or_else(|| anyhow!("invalid date (use D/M/YYYY): {}", raw))
}

fn canonical_date(raw: &str) -> Result<String> {
    parse_group_date(raw).map(dates::date_string)
}

fn parse_due(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
        bail!("invalid due date (use YYYY-MM-DD): {}", raw);
    }
    Ok(raw.to_string())
}

fn print_day(store: &TaskStore, day: &DayView<'_>) {
    let caption = store
        .group_caption(day.date)
        .and_then(|c| c.text.as_deref())
        .unwrap_or("Add task group caption");
    println!("{}  {}", dates::format_for_display(day.date), caption);
    match day.status() {
        DayStatus::Incomplete(n) => println!("  Total incomplete: {}", view::plural(n, "task")),
        DayStatus::AllComplete => println!("  All tasks completed!"),
        DayStatus::Nothing => {}
    }
    if day.lists.is_empty() {
        println!("  (no lists)");
    }
    for list in day.lists {
        print_list(list, day.date);
    }
    println!();
}

fn print_list(list: &TaskList, date: &str) {
    let caption = list.caption.text.as_deref().unwrap_or("Add caption");
    let mut flags = Vec::new();
    if !list.expanded {
        flags.push("collapsed");
    }
    if !list.tasks_expanded {
        flags.push("tasks hidden");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    println!(
        "  list {}  {}  {}{}",
        list.id,
        list.category_label(),
        caption,
        flags
    );
    match view::list_status(list) {
        ListStatus::Incomplete(n) => {
            println!("    You have {} incomplete", view::plural(n, "task"))
        }
        ListStatus::AllComplete => println!("    All tasks completed!"),
        ListStatus::Empty => {}
    }
    for task in &list.tasks {
        print_task(task, date);
    }
}

fn print_task(task: &Task, date: &str) {
    let mark = if task.checked { "x" } else { " " };
    println!("    [{}] {}: {}", mark, task.id, task.content);
    let mut meta = vec![format!("created {} {}", task.created_date, task.time)];
    if !task.due_date.is_empty() {
        meta.push(format!("due {}", task.due_date));
    }
    if let Some(edited) = view::edited_after(task, date) {
        meta.push(format!("Edited on {}", edited));
    }
    println!("        {}", meta.join("  "));
}
