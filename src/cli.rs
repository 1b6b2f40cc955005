use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::database::{Database, StorageError};
use crate::draft::{DraftError, TaskDraft};
use crate::events::{timeline_bar, EventStore, TIMELINE_DAYS};
use crate::feed;
use crate::models::{Priority, Status, Subtask, Task};
use crate::notify::{ConsoleNotifier, NotificationScheduler};
use crate::posts::{PostInput, PostStore};
use crate::tasks::{NewTask, SortMode, TaskStore};
use crate::utils::{format_duration, parse_date, parse_time, today};

#[derive(Parser)]
#[command(name = "qplan")]
#[command(about = "Personal planner - day tasks, event timeline, and blog in the terminal")]
#[command(version)]
pub struct Cli {
    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    ToDo,
    InProgress,
    Done,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::ToDo => Status::ToDo,
            StatusArg::InProgress => Status::InProgress,
            StatusArg::Done => Status::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Insertion order
    Created,
    /// High priority first
    Priority,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Created => SortMode::CreatedAt,
            SortArg::Priority => SortMode::Priority,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    AddTask {
        /// Task title
        title: String,
        /// Scheduled day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// End time (HH:MM)
        #[arg(long)]
        end: Option<String>,
        /// Priority
        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,
        /// Emoji shown next to the title
        #[arg(long)]
        emoji: Option<String>,
        /// Checklist item (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
        /// Arm a reminder 5 minutes before the start time
        #[arg(long)]
        notify: bool,
    },
    /// Add a task from a structured AI draft (JSON)
    ImportDraft {
        /// Draft JSON: {title, description, emoji, dateOffset, startTime, endTime, subtasks[]}
        json: String,
        /// Day the offset is relative to (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List tasks for a day
    ListTasks {
        /// Day to list (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Sort mode (defaults to the configured default)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Reorder the tasks of one day; tasks on other days are untouched
    ReorderTasks {
        /// Day whose tasks to reorder (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Task ids in their new order
        ids: Vec<String>,
    },
    /// Update an existing task: status, subtask checkboxes, reminder flag
    UpdateTask {
        /// Task id
        id: String,
        /// New workflow status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Toggle the Nth subtask's checkbox (1-based, repeatable)
        #[arg(long = "toggle-subtask", value_name = "N")]
        toggle_subtasks: Vec<usize>,
        /// Turn the 5-minute reminder on or off
        #[arg(long)]
        notify: Option<bool>,
    },
    /// Delete a task
    DeleteTask {
        /// Task id
        id: String,
    },
    /// Add a new event
    AddEvent {
        /// Event title
        title: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Location
        #[arg(long)]
        location: Option<String>,
    },
    /// Delete an event
    DeleteEvent {
        /// Event id
        id: String,
    },
    /// Show the 90-day event timeline
    Timeline,
    /// Show completed tasks, newest first
    History,
    /// Add a blog post, or update one by passing --id
    AddPost {
        /// Post title
        title: String,
        /// Markdown content
        content: String,
        /// Publish date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Existing post id to update
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a blog post
    DeletePost {
        /// Post id
        id: String,
    },
    /// Print the blog RSS feed (XML)
    Feed,
    /// Run in the foreground: tick the tracked task's timer and fire due reminders
    Watch {
        /// Task id to accrue time on while watching
        #[arg(long)]
        track: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("{0}")]
    DraftError(#[from] DraftError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("{0}")]
    ValidationError(String),
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, CliError> {
    parse_date(raw)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", raw, e)))
}

fn parse_date_or_today(raw: Option<String>) -> Result<NaiveDate, CliError> {
    match raw {
        Some(raw) => parse_date_arg(&raw),
        None => Ok(today()),
    }
}

fn validate_time_arg(raw: Option<String>) -> Result<Option<String>, CliError> {
    match raw {
        Some(raw) => {
            parse_time(&raw).map_err(|e| {
                CliError::TimeParseError(format!("Invalid time format '{}': {}", raw, e))
            })?;
            Ok(Some(raw))
        }
        None => Ok(None),
    }
}

fn require_title(title: &str) -> Result<(), CliError> {
    if title.trim().is_empty() {
        return Err(CliError::ValidationError(
            "Title must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::ToDo => "To Do",
        Status::InProgress => "In Progress",
        Status::Done => "Done",
    }
}

/// Handle the add-task command
#[allow(clippy::too_many_arguments)]
pub fn handle_add_task(
    title: String,
    date: Option<String>,
    description: Option<String>,
    start: Option<String>,
    end: Option<String>,
    priority: PriorityArg,
    emoji: Option<String>,
    subtasks: Vec<String>,
    notify: bool,
    db: &Database,
) -> Result<(), CliError> {
    require_title(&title)?;
    let date = parse_date_or_today(date)?;
    let start_time = validate_time_arg(start)?;
    let end_time = validate_time_arg(end)?;

    // Reminders are inert without a start time; refuse early instead of
    // storing a flag that can never fire.
    if notify && start_time.is_none() {
        return Err(CliError::ValidationError(
            "Notifications require a start time (--start HH:MM)".to_string(),
        ));
    }

    let mut tasks = TaskStore::load(db);
    let id = tasks.add(
        NewTask {
            title,
            description: description.unwrap_or_default(),
            date,
            priority: priority.into(),
            emoji,
            start_time,
            end_time,
            subtasks: subtasks.into_iter().map(Subtask::new).collect(),
            notifications: notify,
        },
        db,
    );

    println!("Task created successfully (ID: {})", id);
    if let Some(task) = tasks.get(&id) {
        if let Some(notice) = reminder_notice(task, Local::now().naive_local()) {
            println!("{}", notice);
        }
    }

    Ok(())
}

/// Reminder line for a freshly created or edited task, or `None` when the
/// alarm can never arm (reminders off, no start time, or fire time already
/// behind `now`).
fn reminder_notice(task: &Task, now: NaiveDateTime) -> Option<String> {
    if !task.notifications {
        return None;
    }
    let fire_at = NotificationScheduler::fire_time(task)?;
    if fire_at <= now {
        return None;
    }
    Some(format!("Reminder will fire at {} (run `qplan watch`)", fire_at))
}

/// Handle the update-task command: apply edits to an existing task
pub fn handle_update_task(
    id: String,
    status: Option<StatusArg>,
    toggle_subtasks: Vec<usize>,
    notify: Option<bool>,
    db: &Database,
) -> Result<(), CliError> {
    if status.is_none() && toggle_subtasks.is_empty() && notify.is_none() {
        return Err(CliError::ValidationError(
            "Nothing to update: pass --status, --toggle-subtask, or --notify".to_string(),
        ));
    }

    let mut tasks = TaskStore::load(db);
    let mut task = tasks
        .get(&id)
        .cloned()
        .ok_or_else(|| CliError::ValidationError(format!("No task with id {}", id)))?;

    if let Some(status) = status {
        task.status = status.into();
    }

    let subtask_count = task.subtasks.len();
    for n in toggle_subtasks {
        let subtask = n
            .checked_sub(1)
            .and_then(|i| task.subtasks.get_mut(i))
            .ok_or_else(|| {
                CliError::ValidationError(format!(
                    "No subtask #{} (task has {})",
                    n, subtask_count
                ))
            })?;
        subtask.completed = !subtask.completed;
    }

    if let Some(notify) = notify {
        if notify && task.start_time.is_none() {
            return Err(CliError::ValidationError(
                "Notifications require the task to have a start time".to_string(),
            ));
        }
        task.notifications = notify;
    }

    tasks.update(task, db);
    println!("Task updated (ID: {})", id);
    if let Some(task) = tasks.get(&id) {
        if let Some(notice) = reminder_notice(task, Local::now().naive_local()) {
            println!("{}", notice);
        }
    }
    Ok(())
}

/// Handle the import-draft command: resolve a structured AI draft into a task
pub fn handle_import_draft(
    json: String,
    date: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    let selected = parse_date_or_today(date)?;
    let draft = TaskDraft::parse(&json)?;
    let new = draft.resolve(selected);

    let mut tasks = TaskStore::load(db);
    let id = tasks.add(new, db);
    let task = tasks
        .get(&id)
        .ok_or_else(|| CliError::ValidationError("Draft task vanished after insert".to_string()))?;

    println!(
        "Task created from draft (ID: {}): {} on {}",
        id, task.title, task.date
    );
    Ok(())
}

/// Handle the list-tasks command
pub fn handle_list_tasks(
    date: Option<String>,
    sort: SortMode,
    db: &Database,
) -> Result<(), CliError> {
    let date = parse_date_or_today(date)?;
    let tasks = TaskStore::load(db);
    let day_tasks = tasks.tasks_on(date, sort);

    if day_tasks.is_empty() {
        println!("No tasks for {}.", date);
        return Ok(());
    }

    println!("Tasks for {}:", date);
    for task in day_tasks {
        let emoji = task.emoji.as_deref().unwrap_or("•");
        let window = match (&task.start_time, &task.end_time) {
            (Some(s), Some(e)) => format!("  {s} → {e}"),
            (Some(s), None) => format!("  {s} →"),
            _ => String::new(),
        };
        println!(
            "{} [{}] {} ({:?}){}",
            emoji,
            status_label(task.status),
            task.title,
            task.priority,
            window
        );
        if task.time_spent > 0 {
            println!("    time tracked: {}", format_duration(task.time_spent));
        }
        if !task.subtasks.is_empty() {
            let done = task.subtasks.iter().filter(|s| s.completed).count();
            println!("    checklist: {}/{}", done, task.subtasks.len());
        }
        println!("    id: {}", task.id);
    }
    Ok(())
}

/// Handle the reorder-tasks command
pub fn handle_reorder_tasks(
    date: String,
    ids: Vec<String>,
    db: &Database,
) -> Result<(), CliError> {
    let date = parse_date_arg(&date)?;
    let mut tasks = TaskStore::load(db);
    tasks.reorder(date, &ids, db);
    println!("Reordered tasks for {}", date);
    Ok(())
}

/// Handle the delete-task command
pub fn handle_delete_task(id: String, db: &Database) -> Result<(), CliError> {
    let mut tasks = TaskStore::load(db);
    if tasks.delete(&id, db) {
        println!("Task deleted (ID: {})", id);
        Ok(())
    } else {
        Err(CliError::ValidationError(format!("No task with id {}", id)))
    }
}

/// Handle the add-event command
pub fn handle_add_event(
    title: String,
    start: String,
    end: String,
    location: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    require_title(&title)?;
    let start_date = parse_date_arg(&start)?;
    let end_date = parse_date_arg(&end)?;
    if end_date < start_date {
        return Err(CliError::ValidationError(
            "Event end date must not be before its start date".to_string(),
        ));
    }

    let mut events = EventStore::load(db);
    let id = events.add(
        title,
        start_date,
        end_date,
        location.unwrap_or_default(),
        db,
    );
    println!("Event created successfully (ID: {})", id);
    Ok(())
}

/// Handle the delete-event command
pub fn handle_delete_event(id: String, db: &Database) -> Result<(), CliError> {
    let mut events = EventStore::load(db);
    if events.delete(&id, db) {
        println!("Event deleted (ID: {})", id);
        Ok(())
    } else {
        Err(CliError::ValidationError(format!(
            "No event with id {}",
            id
        )))
    }
}

/// Handle the timeline command: proportional bars over the next 90 days
pub fn handle_timeline(db: &Database) -> Result<(), CliError> {
    const BAR_WIDTH: usize = 45;

    let events = EventStore::load(db);
    let today = today();
    let visible = events.visible_window(today);

    if visible.is_empty() {
        println!("No upcoming events in the next {} days.", TIMELINE_DAYS);
        return Ok(());
    }

    println!(
        "Event timeline, {} → {}:",
        today,
        today + chrono::Duration::days(TIMELINE_DAYS)
    );
    for event in visible {
        let bar = timeline_bar(event, today);
        let lead = (bar.left_pct / 100.0 * BAR_WIDTH as f64).round() as usize;
        let fill = ((bar.width_pct / 100.0 * BAR_WIDTH as f64).round() as usize).max(1);
        let fill = fill.min(BAR_WIDTH.saturating_sub(lead)).max(1);
        let tail = BAR_WIDTH.saturating_sub(lead + fill);

        let location = if event.location.is_empty() {
            String::new()
        } else {
            format!(" ({})", event.location)
        };
        println!(
            "{}{}  {} → {} [{} day{}]",
            event.title,
            location,
            event.start_date,
            event.end_date,
            bar.duration_days,
            if bar.duration_days == 1 { "" } else { "s" }
        );
        println!(
            "  |{}{}{}|  id: {}",
            " ".repeat(lead),
            "█".repeat(fill),
            " ".repeat(tail),
            event.id
        );
    }
    Ok(())
}

/// Handle the history command: completed tasks, newest first
pub fn handle_history(db: &Database) -> Result<(), CliError> {
    let tasks = TaskStore::load(db);
    let done = tasks.completed();

    if done.is_empty() {
        println!("No completed tasks yet.");
        return Ok(());
    }

    for task in done {
        let emoji = task.emoji.as_deref().unwrap_or("✔");
        println!("{} {}  {}", task.date, emoji, task.title);
        if !task.description.is_empty() {
            println!("    {}", task.description);
        }
        if task.time_spent > 0 {
            println!(
                "    Time tracked: {}m {}s",
                task.time_spent / 60,
                task.time_spent % 60
            );
        }
    }
    Ok(())
}

/// Handle the add-post command (creates, or updates when --id is given)
pub fn handle_add_post(
    title: String,
    content: String,
    date: Option<String>,
    id: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    require_title(&title)?;
    let date = parse_date_or_today(date)?;

    let mut posts = PostStore::load(db);
    let updating = id.is_some();
    match posts.save(
        PostInput {
            id,
            title,
            date,
            content,
        },
        db,
    ) {
        Some(id) if updating => println!("Post updated (ID: {})", id),
        Some(id) => println!("Post created successfully (ID: {})", id),
        None => {
            return Err(CliError::ValidationError(
                "No post with the given id".to_string(),
            ))
        }
    }
    Ok(())
}

/// Handle the delete-post command
pub fn handle_delete_post(id: String, db: &Database) -> Result<(), CliError> {
    let mut posts = PostStore::load(db);
    if posts.delete(&id, db) {
        println!("Post deleted (ID: {})", id);
        Ok(())
    } else {
        Err(CliError::ValidationError(format!("No post with id {}", id)))
    }
}

/// Handle the feed command: print the RSS document to stdout
pub fn handle_feed(site_url: &str, db: &Database) -> Result<(), CliError> {
    let posts = PostStore::load(db);
    print!("{}", feed::render(&posts.posts(), site_url));
    Ok(())
}

/// Handle the watch command: a foreground loop driving the 1-second timer
/// tick and the reminder alarms.
pub fn handle_watch(track: Option<String>, db: &Database) -> Result<(), CliError> {
    let mut tasks = TaskStore::load(db);
    let mut scheduler = NotificationScheduler::new();
    let mut notifier = ConsoleNotifier;

    let now = Local::now().naive_local();
    for task in tasks.tasks() {
        scheduler.rearm(task, now, &mut notifier);
    }

    if let Some(id) = track {
        if tasks.get(&id).is_none() {
            return Err(CliError::ValidationError(format!("No task with id {}", id)));
        }
        tasks.toggle_timer(&id);
        println!("Tracking time on task {}", id);
    }

    println!(
        "Watching ({} reminder(s) armed). Press Ctrl+C to stop.",
        tasks
            .tasks()
            .iter()
            .filter(|t| scheduler.is_armed(&t.id))
            .count()
    );

    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
        tasks.tick(db);
        scheduler.poll(Local::now().naive_local(), &mut notifier);
    }
}
