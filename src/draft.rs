use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Priority, Subtask};
use crate::tasks::NewTask;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft is not valid JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Draft generation failed: {0}")]
    ServiceError(String),
}

/// Seam to the external generative service that turns a free-text prompt
/// into a structured task draft. This crate only consumes the result; the
/// service itself lives elsewhere. A failed call surfaces one retryable
/// error and commits nothing.
pub trait DraftAssistant {
    fn draft_task(&self, prompt: &str, today: NaiveDate) -> Result<TaskDraft, DraftError>;
}

/// The constrained JSON shape the drafting service returns. Every field
/// except the offset defaults to empty; `date_offset` counts days relative
/// to the caller's selected day (0 today, 1 tomorrow, -1 yesterday).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub date_offset: i64,
    pub start_time: String,
    pub end_time: String,
    pub subtasks: Vec<String>,
}

impl TaskDraft {
    pub fn parse(json: &str) -> Result<Self, DraftError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve the draft against the currently selected day: the offset
    /// becomes an absolute date, blank fields get their defaults, subtask
    /// titles become real subtask records.
    pub fn resolve(self, selected: NaiveDate) -> NewTask {
        let title = if self.title.trim().is_empty() {
            "Untitled Task".to_string()
        } else {
            self.title
        };
        NewTask {
            title,
            description: self.description,
            date: selected + Duration::days(self.date_offset),
            priority: Priority::Medium,
            emoji: none_if_empty(self.emoji),
            start_time: none_if_empty(self.start_time),
            end_time: none_if_empty(self.end_time),
            subtasks: self.subtasks.into_iter().map(Subtask::new).collect(),
            notifications: false,
        }
    }
}

fn none_if_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
