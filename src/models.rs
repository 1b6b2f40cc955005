use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Workflow state of a task. The wire strings ("To Do", ...) are the ones
/// the original storage layout used, so existing snapshots keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort rank: High sorts before Medium sorts before Low.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            completed: false,
        }
    }
}

/// A schedulable unit of work bound to a single calendar day.
///
/// `date` carries no time-of-day; `start_time`/`end_time` are independent
/// `HH:MM` strings. `time_spent` only grows while the task holds the active
/// timer slot in the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "day")]
    pub date: NaiveDate,
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Accrued timer seconds.
    #[serde(default)]
    pub time_spent: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Inert unless `start_time` is present.
    #[serde(default)]
    pub notifications: bool,
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// A multi-day occurrence shown on the rolling 90-day timeline.
/// Invariant: `end_date >= start_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(with = "day")]
    pub start_date: NaiveDate,
    #[serde(with = "day")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub location: String,
}

/// A blog post. Independent aggregate, no relation to tasks or events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(with = "day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub content: String,
}

/// Serde helpers for calendar-day fields.
///
/// Snapshots written by earlier versions of the app stored full timestamps
/// (e.g. `2024-07-20T00:00:00.000Z`) where only the day matters. The loader
/// repairs both forms into a plain `NaiveDate`; writes always emit
/// `YYYY-MM-DD`.
pub mod day {
    use chrono::{DateTime, NaiveDate};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid calendar day: {raw}")))
    }

    /// Parse a calendar day from either `YYYY-MM-DD` or a full RFC 3339
    /// timestamp.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    }
}
