use chrono::{Duration, NaiveDate};

use crate::database::{load_snapshot, save_snapshot, SnapshotStore, EVENTS_KEY};
use crate::models::Event;

/// Length of the rolling timeline window, in days.
pub const TIMELINE_DAYS: i64 = 90;

/// Geometry of one event's bar within the timeline window. Percentages are
/// relative to the full window width; `width_pct` is clamped so the bar
/// never runs past the 100% mark.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBar {
    /// Days between today and the event start, floored at zero for events
    /// already underway.
    pub start_offset_days: i64,
    /// Inclusive day count: a one-day event has duration 1.
    pub duration_days: i64,
    pub left_pct: f64,
    pub width_pct: f64,
}

/// Compute the proportional bar for an event as seen from `today`.
pub fn timeline_bar(event: &Event, today: NaiveDate) -> TimelineBar {
    let start_offset_days = (event.start_date - today).num_days().max(0);
    let duration_days = (event.end_date - event.start_date).num_days() + 1;

    let left_pct = start_offset_days as f64 / TIMELINE_DAYS as f64 * 100.0;
    let width_pct = (duration_days as f64 / TIMELINE_DAYS as f64 * 100.0)
        .min(100.0 - left_pct)
        .max(0.0);

    TimelineBar {
        start_offset_days,
        duration_days,
        left_pct,
        width_pct,
    }
}

/// In-memory event collection. Same flush discipline as the task store:
/// every mutation writes the whole snapshot back.
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    /// Hydrate from the snapshot store. An absent or unreadable snapshot
    /// falls back to the starter events, which are persisted immediately so
    /// the fallback only happens once.
    pub fn load(store: &dyn SnapshotStore) -> Self {
        match load_snapshot(store, EVENTS_KEY) {
            Some(events) => Self { events },
            None => {
                let events = seed_events();
                save_snapshot(store, EVENTS_KEY, &events);
                Self { events }
            }
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    fn flush(&self, store: &dyn SnapshotStore) {
        save_snapshot(store, EVENTS_KEY, &self.events);
    }

    /// Append an event with a fresh id and flush. Returns the new id.
    pub fn add(
        &mut self,
        title: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        location: String,
        store: &dyn SnapshotStore,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.events.push(Event {
            id: id.clone(),
            title,
            start_date,
            end_date,
            location,
        });
        self.flush(store);
        id
    }

    pub fn delete(&mut self, id: &str, store: &dyn SnapshotStore) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            return false;
        }
        self.flush(store);
        true
    }

    /// Events overlapping the window `[today, today + 90 days]`, sorted by
    /// start date ascending. Events already over are excluded; so are events
    /// starting beyond the horizon.
    pub fn visible_window(&self, today: NaiveDate) -> Vec<&Event> {
        let horizon = today + Duration::days(TIMELINE_DAYS);
        let mut visible: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| e.end_date >= today && e.start_date <= horizon)
            .collect();
        visible.sort_by_key(|e| e.start_date);
        visible
    }
}

/// Starter events shown on a fresh installation.
fn seed_events() -> Vec<Event> {
    fn seed(id: &str, title: &str, start: &str, end: &str, location: &str) -> Option<Event> {
        Some(Event {
            id: id.to_string(),
            title: title.to_string(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?,
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?,
            location: location.to_string(),
        })
    }
    [
        seed("1", "Louder Than Life", "2024-09-26", "2024-09-29", "Louisville, KY"),
        seed("2", "ETHDenver 2025", "2025-02-24", "2025-03-05", "Denver, CO"),
        seed("3", "TechCrunch Disrupt", "2024-10-28", "2024-10-30", "San Francisco, CA"),
    ]
    .into_iter()
    .flatten()
    .collect()
}
