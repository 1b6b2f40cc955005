use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

use crate::database::{load_snapshot, save_snapshot, SnapshotStore, TASKS_KEY};
use crate::models::{Status, Subtask, Task};

/// Sort mode for the per-day task view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Insertion order: `created_at` ascending.
    CreatedAt,
    /// High before Medium before Low; ties keep insertion order.
    Priority,
}

/// Input for creating a task. Everything the store derives itself (id,
/// status, timer, creation timestamp) is absent on purpose.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub priority: crate::models::Priority,
    pub emoji: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub subtasks: Vec<Subtask>,
    pub notifications: bool,
}

/// In-memory task collection plus the single active-timer slot.
///
/// Mutations are synchronous; each one flushes the whole collection back
/// through the snapshot store before returning, so a flush never lags the
/// state it reflects. The active task id is deliberately owned here rather
/// than floating in ambient scope: at most one task accrues time at any
/// instant.
pub struct TaskStore {
    tasks: Vec<Task>,
    active_task_id: Option<String>,
}

impl TaskStore {
    /// Hydrate from the snapshot store. Missing or unreadable snapshots
    /// degrade to an empty collection.
    pub fn load(store: &dyn SnapshotStore) -> Self {
        let tasks: Vec<Task> = load_snapshot(store, TASKS_KEY).unwrap_or_default();
        Self {
            tasks,
            active_task_id: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    fn flush(&self, store: &dyn SnapshotStore) {
        save_snapshot(store, TASKS_KEY, &self.tasks);
    }

    /// Create a task: fresh id, ToDo, zero time, created-at now. Appends to
    /// the collection, flushes, and returns the new id.
    pub fn add(&mut self, new: NewTask, store: &dyn SnapshotStore) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let task = Task {
            id: id.clone(),
            title: new.title,
            description: new.description,
            date: new.date,
            status: Status::ToDo,
            priority: new.priority,
            time_spent: 0,
            created_at: Utc::now(),
            emoji: new.emoji,
            start_time: new.start_time,
            end_time: new.end_time,
            subtasks: new.subtasks,
            notifications: new.notifications,
        };
        self.tasks.push(task);
        self.flush(store);
        id
    }

    /// Replace the stored record matching `task.id` wholesale. Returns false
    /// (and leaves the collection untouched) when the id is unknown.
    pub fn update(&mut self, task: Task, store: &dyn SnapshotStore) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                self.flush(store);
                true
            }
            None => false,
        }
    }

    /// Remove a task by id. Clears the active-timer slot when the deleted
    /// task holds it, so no orphaned timer keeps ticking.
    pub fn delete(&mut self, id: &str, store: &dyn SnapshotStore) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return false;
        }
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        }
        self.flush(store);
        true
    }

    /// Tasks scheduled on `date` (calendar-day equality only), in the
    /// requested sort order.
    pub fn tasks_on(&self, date: NaiveDate, sort: SortMode) -> Vec<&Task> {
        let mut day_tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.date == date).collect();
        match sort {
            SortMode::CreatedAt => day_tasks.sort_by_key(|t| t.created_at),
            SortMode::Priority => day_tasks.sort_by_key(|t| t.priority.rank()),
        }
        day_tasks
    }

    /// Replace the relative ordering of tasks scheduled on `date` without
    /// disturbing tasks on other days: the day's slots in the collection are
    /// spliced and refilled, everything else stays where it was.
    ///
    /// Ids in `new_order` that do not belong to that day are ignored; day
    /// tasks missing from `new_order` keep their old relative order at the
    /// end.
    pub fn reorder(&mut self, date: NaiveDate, new_order: &[String], store: &dyn SnapshotStore) {
        let slots: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.date == date)
            .map(|(i, _)| i)
            .collect();
        if slots.is_empty() {
            return;
        }

        let mut day_tasks: HashMap<String, Task> = slots
            .iter()
            .map(|&i| (self.tasks[i].id.clone(), self.tasks[i].clone()))
            .collect();

        let mut sequence: Vec<Task> = Vec::with_capacity(slots.len());
        for id in new_order {
            if let Some(task) = day_tasks.remove(id) {
                sequence.push(task);
            }
        }
        // Leftovers keep their original relative order.
        for &i in &slots {
            if let Some(task) = day_tasks.remove(&self.tasks[i].id) {
                sequence.push(task);
            }
        }

        for (&slot, task) in slots.iter().zip(sequence) {
            self.tasks[slot] = task;
        }
        self.flush(store);
    }

    /// Toggle the timer for `id`. Toggling the active task pauses it;
    /// toggling another task steals the single active slot.
    pub fn toggle_timer(&mut self, id: &str) -> Option<&str> {
        if self.get(id).is_none() {
            return self.active_task_id.as_deref();
        }
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        } else {
            self.active_task_id = Some(id.to_string());
        }
        self.active_task_id.as_deref()
    }

    /// One second of timer accrual for the active task, flushed immediately.
    /// A no-op when no task is active.
    pub fn tick(&mut self, store: &dyn SnapshotStore) {
        let Some(id) = self.active_task_id.clone() else {
            return;
        };
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.time_spent += 1;
            self.flush(store);
        }
    }

    /// Done tasks, newest scheduled day first (the history view).
    pub fn completed(&self) -> Vec<&Task> {
        let mut done: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.status == Status::Done)
            .collect();
        done.sort_by(|a, b| b.date.cmp(&a.date));
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::Priority;

    fn new_task(title: &str, date: NaiveDate) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            date,
            priority: Priority::Medium,
            emoji: None,
            start_time: None,
            end_time: None,
            subtasks: Vec::new(),
            notifications: false,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_assigns_defaults() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let id = tasks.add(new_task("Sync", day(2024, 7, 20)), &mem);

        let task = tasks.get(&id).unwrap();
        assert_eq!(task.status, Status::ToDo);
        assert_eq!(task.time_spent, 0);

        // Mutation already flushed: a fresh store sees the task.
        let reloaded = TaskStore::load(&mem);
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.tasks()[0].title, "Sync");
    }

    #[test]
    fn tasks_on_matches_calendar_day_only() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        tasks.add(new_task("a", day(2024, 7, 20)), &mem);
        tasks.add(new_task("b", day(2024, 7, 21)), &mem);

        // Old snapshots stored the day as a full timestamp; the loader
        // repairs it and day matching still works.
        let json = r#"[{
            "id": "legacy", "title": "c", "status": "To Do",
            "date": "2024-07-20T15:30:00.000Z",
            "createdAt": "2024-07-01T00:00:00Z"
        }]"#;
        mem.save_raw(TASKS_KEY, json).unwrap();
        let legacy = TaskStore::load(&mem);
        let on_20th = legacy.tasks_on(day(2024, 7, 20), SortMode::CreatedAt);
        assert_eq!(on_20th.len(), 1);
        assert_eq!(on_20th[0].id, "legacy");
    }

    #[test]
    fn sort_modes() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let d = day(2024, 7, 20);

        let mut low = new_task("low", d);
        low.priority = Priority::Low;
        let mut high = new_task("high", d);
        high.priority = Priority::High;

        tasks.add(low, &mem);
        tasks.add(high, &mem);

        let by_created: Vec<&str> = tasks
            .tasks_on(d, SortMode::CreatedAt)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(by_created, vec!["low", "high"]);

        let by_priority: Vec<&str> = tasks
            .tasks_on(d, SortMode::Priority)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(by_priority, vec!["high", "low"]);
    }

    #[test]
    fn single_active_timer_slot() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let a = tasks.add(new_task("a", day(2024, 7, 20)), &mem);
        let b = tasks.add(new_task("b", day(2024, 7, 20)), &mem);

        tasks.toggle_timer(&a);
        assert_eq!(tasks.active_task_id(), Some(a.as_str()));

        // Activating b deactivates a.
        tasks.toggle_timer(&b);
        assert_eq!(tasks.active_task_id(), Some(b.as_str()));

        // Toggling the active task is a pause.
        tasks.toggle_timer(&b);
        assert_eq!(tasks.active_task_id(), None);
    }

    #[test]
    fn tick_accrues_only_while_active() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let id = tasks.add(new_task("a", day(2024, 7, 20)), &mem);

        tasks.tick(&mem); // no active task
        assert_eq!(tasks.get(&id).unwrap().time_spent, 0);

        tasks.toggle_timer(&id);
        tasks.tick(&mem);
        tasks.tick(&mem);
        assert_eq!(tasks.get(&id).unwrap().time_spent, 2);

        tasks.toggle_timer(&id); // pause
        tasks.tick(&mem);
        assert_eq!(tasks.get(&id).unwrap().time_spent, 2);

        // Accrual reached the snapshot store too.
        let reloaded = TaskStore::load(&mem);
        assert_eq!(reloaded.get(&id).unwrap().time_spent, 2);
    }

    #[test]
    fn deleting_active_task_clears_the_slot() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let id = tasks.add(new_task("a", day(2024, 7, 20)), &mem);

        tasks.toggle_timer(&id);
        assert!(tasks.delete(&id, &mem));
        assert_eq!(tasks.active_task_id(), None);

        // Subsequent tick has no effect and no orphaned counter.
        tasks.tick(&mem);
        assert!(tasks.tasks().is_empty());
    }

    #[test]
    fn update_replaces_wholesale_and_reports_missing_ids() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let id = tasks.add(new_task("a", day(2024, 7, 20)), &mem);

        let mut edited = tasks.get(&id).unwrap().clone();
        edited.status = Status::Done;
        edited.subtasks.push(Subtask::new("step".to_string()));
        assert!(tasks.update(edited, &mem));
        assert_eq!(tasks.get(&id).unwrap().status, Status::Done);

        let mut ghost = tasks.get(&id).unwrap().clone();
        ghost.id = "missing".to_string();
        assert!(!tasks.update(ghost, &mem));
    }

    #[test]
    fn subtask_completion_does_not_derive_status() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let mut input = new_task("a", day(2024, 7, 20));
        input.subtasks = vec![Subtask::new("only".to_string())];
        let id = tasks.add(input, &mem);

        let mut edited = tasks.get(&id).unwrap().clone();
        edited.subtasks[0].completed = true;
        tasks.update(edited, &mem);

        // All subtasks complete, status untouched.
        assert_eq!(tasks.get(&id).unwrap().status, Status::ToDo);
    }

    #[test]
    fn reorder_is_scoped_to_one_day() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let d = day(2024, 7, 20);
        let other = day(2024, 7, 21);

        let a = tasks.add(new_task("a", d), &mem);
        let x = tasks.add(new_task("x", other), &mem);
        let b = tasks.add(new_task("b", d), &mem);
        let y = tasks.add(new_task("y", other), &mem);
        let c = tasks.add(new_task("c", d), &mem);

        tasks.reorder(d, &[c.clone(), a.clone(), b.clone()], &mem);

        let titles: Vec<&str> = tasks.tasks().iter().map(|t| t.title.as_str()).collect();
        // Day slots (0, 2, 4) now hold c, a, b; the other day's tasks are
        // untouched in their original positions.
        assert_eq!(titles, vec!["c", "x", "a", "y", "b"]);

        let other_ids: Vec<&str> = tasks
            .tasks_on(other, SortMode::CreatedAt)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(other_ids, vec![x.as_str(), y.as_str()]);
    }

    #[test]
    fn reorder_keeps_unlisted_tasks_in_order() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let d = day(2024, 7, 20);
        let a = tasks.add(new_task("a", d), &mem);
        tasks.add(new_task("b", d), &mem);
        tasks.add(new_task("c", d), &mem);

        // Only "a" listed: it moves first, b and c follow unchanged.
        tasks.reorder(d, &[a], &mem);
        let titles: Vec<&str> = tasks.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn completed_lists_done_tasks_newest_first() {
        let mem = MemoryStore::new();
        let mut tasks = TaskStore::load(&mem);
        let early = tasks.add(new_task("early", day(2024, 7, 1)), &mem);
        let late = tasks.add(new_task("late", day(2024, 7, 9)), &mem);
        tasks.add(new_task("open", day(2024, 7, 5)), &mem);

        for id in [&early, &late] {
            let mut t = tasks.get(id).unwrap().clone();
            t.status = Status::Done;
            tasks.update(t, &mem);
        }

        let titles: Vec<&str> = tasks.completed().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["late", "early"]);
    }
}
