use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

use crate::models::Task;

/// Minutes before a task's start time that its alarm fires.
pub const LEAD_MINUTES: i64 = 5;

/// Host notification permission. Everything except `Granted` is an
/// equivalent no-arm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
    Unsupported,
}

/// Delivery seam for notifications. `permission` takes `&mut self` because
/// the first call may lazily request permission from the host environment.
pub trait Notifier {
    fn permission(&mut self) -> Permission;
    fn notify(&mut self, title: &str, body: &str);
}

/// Prints notifications to stdout. Permission is always granted; this is
/// the delivery path for the foreground `watch` loop.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn notify(&mut self, title: &str, body: &str) {
        println!("🔔 {title} — {body}");
    }
}

/// No-op notifier for environments without a notification capability.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn permission(&mut self) -> Permission {
        Permission::Unsupported
    }

    fn notify(&mut self, _title: &str, _body: &str) {}
}

#[derive(Debug, Clone)]
struct Alarm {
    fire_at: NaiveDateTime,
    title: String,
    start_time: String,
}

/// One-shot alarms keyed by task id.
///
/// Each task owns at most one handle. `rearm` always cancels the existing
/// handle before evaluating eligibility, so two rapid edits of the same task
/// can never double-fire. A fired alarm is gone until a future mutation
/// re-arms it.
#[derive(Debug, Default)]
pub struct NotificationScheduler {
    armed: HashMap<String, Alarm>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wall-clock instant the task's alarm should fire: `date` +
    /// `start_time` − 5 minutes. `None` when the task has no start time or
    /// the time string is malformed.
    pub fn fire_time(task: &Task) -> Option<NaiveDateTime> {
        let start = task.start_time.as_deref()?;
        let time = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        Some(task.date.and_time(time) - Duration::minutes(LEAD_MINUTES))
    }

    /// Re-evaluate a task's alarm after a mutation. Cancels any existing
    /// handle, then arms only when the task wants notifications, has a
    /// parseable start time, the fire time is still ahead of `now`, and the
    /// notifier's permission is granted.
    pub fn rearm(&mut self, task: &Task, now: NaiveDateTime, notifier: &mut dyn Notifier) {
        self.armed.remove(&task.id);

        if !task.notifications {
            return;
        }
        let Some(fire_at) = Self::fire_time(task) else {
            return;
        };
        if fire_at <= now {
            return;
        }
        if notifier.permission() != Permission::Granted {
            return;
        }

        let start_time = task.start_time.clone().unwrap_or_default();
        self.armed.insert(
            task.id.clone(),
            Alarm {
                fire_at,
                title: task.title.clone(),
                start_time,
            },
        );
    }

    /// Drop the alarm for a deleted (or edited-away) task.
    pub fn disarm(&mut self, task_id: &str) {
        self.armed.remove(task_id);
    }

    pub fn is_armed(&self, task_id: &str) -> bool {
        self.armed.contains_key(task_id)
    }

    pub fn armed_fire_time(&self, task_id: &str) -> Option<NaiveDateTime> {
        self.armed.get(task_id).map(|a| a.fire_at)
    }

    /// Fire every alarm whose time has come, exactly once each. Returns the
    /// number of notifications delivered.
    pub fn poll(&mut self, now: NaiveDateTime, notifier: &mut dyn Notifier) -> usize {
        let due: Vec<String> = self
            .armed
            .iter()
            .filter(|(_, alarm)| alarm.fire_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &due {
            if let Some(alarm) = self.armed.remove(id) {
                notifier.notify(
                    &format!("Upcoming Task: {}", alarm.title),
                    &format!("Starts at {}", alarm.start_time),
                );
            }
        }
        due.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use chrono::{NaiveDate, TimeZone, Utc};

    struct RecordingNotifier {
        permission: Permission,
        permission_requests: usize,
        delivered: Vec<(String, String)>,
    }

    impl RecordingNotifier {
        fn granted() -> Self {
            Self {
                permission: Permission::Granted,
                permission_requests: 0,
                delivered: Vec::new(),
            }
        }

        fn with(permission: Permission) -> Self {
            Self {
                permission,
                ..Self::granted()
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission(&mut self) -> Permission {
            self.permission_requests += 1;
            self.permission
        }

        fn notify(&mut self, title: &str, body: &str) {
            self.delivered.push((title.to_string(), body.to_string()));
        }
    }

    fn task_at(id: &str, date: NaiveDate, start_time: Option<&str>, notifications: bool) -> Task {
        Task {
            id: id.to_string(),
            title: "Sync".to_string(),
            description: String::new(),
            date,
            status: Status::ToDo,
            priority: Priority::Medium,
            time_spent: 0,
            created_at: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            emoji: None,
            start_time: start_time.map(str::to_string),
            end_time: None,
            subtasks: Vec::new(),
            notifications,
        }
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn july_20() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
    }

    #[test]
    fn arms_five_minutes_before_start() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let task = task_at("t", july_20(), Some("14:00"), true);

        scheduler.rearm(&task, at(july_20(), 9, 0), &mut notifier);
        assert_eq!(
            scheduler.armed_fire_time("t"),
            Some(at(july_20(), 13, 55))
        );
    }

    #[test]
    fn fires_once_then_stays_silent() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let task = task_at("t", july_20(), Some("14:00"), true);
        scheduler.rearm(&task, at(july_20(), 9, 0), &mut notifier);

        assert_eq!(scheduler.poll(at(july_20(), 13, 54), &mut notifier), 0);
        assert_eq!(scheduler.poll(at(july_20(), 13, 55), &mut notifier), 1);
        // Terminal until re-armed.
        assert_eq!(scheduler.poll(at(july_20(), 13, 56), &mut notifier), 0);

        assert_eq!(
            notifier.delivered,
            vec![("Upcoming Task: Sync".to_string(), "Starts at 14:00".to_string())]
        );
    }

    #[test]
    fn rearm_cancels_the_previous_alarm() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let now = at(july_20(), 9, 0);

        let task = task_at("t", july_20(), Some("14:00"), true);
        scheduler.rearm(&task, now, &mut notifier);

        // Rapid second edit moves the start time; the old handle must go.
        let mut edited = task.clone();
        edited.start_time = Some("16:00".to_string());
        scheduler.rearm(&edited, now, &mut notifier);

        assert_eq!(scheduler.poll(at(july_20(), 13, 55), &mut notifier), 0);
        assert_eq!(scheduler.poll(at(july_20(), 15, 55), &mut notifier), 1);
        assert_eq!(notifier.delivered.len(), 1);
    }

    #[test]
    fn edit_away_from_eligibility_disarms() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let now = at(july_20(), 9, 0);

        let task = task_at("t", july_20(), Some("14:00"), true);
        scheduler.rearm(&task, now, &mut notifier);
        assert!(scheduler.is_armed("t"));

        let mut muted = task.clone();
        muted.notifications = false;
        scheduler.rearm(&muted, now, &mut notifier);
        assert!(!scheduler.is_armed("t"));
    }

    #[test]
    fn only_granted_permission_arms() {
        for permission in [
            Permission::Denied,
            Permission::Undetermined,
            Permission::Unsupported,
        ] {
            let mut scheduler = NotificationScheduler::new();
            let mut notifier = RecordingNotifier::with(permission);
            let task = task_at("t", july_20(), Some("14:00"), true);
            scheduler.rearm(&task, at(july_20(), 9, 0), &mut notifier);
            assert!(!scheduler.is_armed("t"), "{permission:?} must not arm");
        }
    }

    #[test]
    fn past_fire_time_does_not_arm() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let task = task_at("t", july_20(), Some("14:00"), true);

        scheduler.rearm(&task, at(july_20(), 13, 55), &mut notifier);
        assert!(!scheduler.is_armed("t"));
    }

    #[test]
    fn no_start_time_means_inert() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let task = task_at("t", july_20(), None, true);

        scheduler.rearm(&task, at(july_20(), 9, 0), &mut notifier);
        assert!(!scheduler.is_armed("t"));
        // Eligibility checks run before the permission request.
        assert_eq!(notifier.permission_requests, 0);
    }

    #[test]
    fn disarm_on_delete() {
        let mut scheduler = NotificationScheduler::new();
        let mut notifier = RecordingNotifier::granted();
        let task = task_at("t", july_20(), Some("14:00"), true);
        scheduler.rearm(&task, at(july_20(), 9, 0), &mut notifier);

        scheduler.disarm("t");
        assert_eq!(scheduler.poll(at(july_20(), 23, 0), &mut notifier), 0);
    }
}
