use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// Opaque task identifier, stored as a string in the persisted blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> TaskId {
        TaskId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
}

// Issues creation-time derived ids.
// Every id is strictly greater than the previous one, so two tasks created in
// the same millisecond (or after the clock stepped back) never share an id.
// Once the numeric range is used up, ids become `<i64::MAX>-<n>`.
pub struct TaskIdGenerator {
    last: i64,
    overflow: u64,
    taken: HashSet<String>,
    clock: fn() -> i64,
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        TaskIdGenerator::with_clock(|| Utc::now().timestamp_millis())
    }
}

impl TaskIdGenerator {
    pub fn with_clock(clock: fn() -> i64) -> TaskIdGenerator {
        TaskIdGenerator {
            last: i64::MIN,
            overflow: 0,
            taken: HashSet::new(),
            clock,
        }
    }

    // Make sure ids already in use are never issued again
    pub fn observe(&mut self, tasks: &[Task]) {
        for task in tasks {
            if let Ok(value) = task.id.as_str().parse::<i64>() {
                self.last = self.last.max(value);
            }
            self.taken.insert(task.id.as_str().to_string());
        }
    }

    pub fn next_id(&mut self) -> TaskId {
        loop {
            let candidate = self.candidate();
            if self.taken.insert(candidate.clone()) {
                return TaskId(candidate);
            }
        }
    }

    // Never repeats within one generator
    fn candidate(&mut self) -> String {
        if self.last == i64::MAX {
            self.overflow += 1;
            return format!("{}-{}", i64::MAX, self.overflow);
        }
        let now = (self.clock)();
        self.last = if now > self.last { now } else { self.last + 1 };
        self.last.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {:.4}   Lng: {:.4}", self.latitude, self.longitude)
    }
}

// Reference to a captured image; the app only displays it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    Granted,
    #[default]
    Denied,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_when_clock_stands_still() {
        let mut ids = TaskIdGenerator::with_clock(|| 1_700_000_000_000);
        let first = ids.next_id();
        let second = ids.next_id();
        let third = ids.next_id();
        assert_eq!(first.as_str(), "1700000000000");
        assert_eq!(second.as_str(), "1700000000001");
        assert_eq!(third.as_str(), "1700000000002");
    }

    #[test]
    fn ids_skip_past_observed_tasks() {
        let mut ids = TaskIdGenerator::with_clock(|| 10);
        ids.observe(&[
            Task {
                id: TaskId::new("42"),
                title: "old".into(),
            },
            Task {
                id: TaskId::new("not-a-number"),
                title: "legacy".into(),
            },
        ]);
        assert_eq!(ids.next_id().as_str(), "43");
    }

    #[test]
    fn ids_stay_unique_past_the_numeric_range() {
        let max = i64::MAX.to_string();
        let mut ids = TaskIdGenerator::with_clock(|| 10);
        ids.observe(&[
            Task {
                id: TaskId::new(max.clone()),
                title: "old".into(),
            },
            Task {
                id: TaskId::new(format!("{max}-1")),
                title: "older".into(),
            },
        ]);
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first.as_str(), format!("{max}-2"));
        assert_eq!(second.as_str(), format!("{max}-3"));
    }

    #[test]
    fn clock_landing_on_a_loaded_id_is_skipped() {
        let mut ids = TaskIdGenerator::with_clock(|| 5);
        ids.observe(&[Task {
            id: TaskId::new("5"),
            title: "same millisecond".into(),
        }]);
        assert_eq!(ids.next_id().as_str(), "6");
    }

    #[test]
    fn task_serializes_as_plain_record() {
        let task = Task {
            id: TaskId::new("1"),
            title: "Buy milk".into(),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"id":"1","title":"Buy milk"}"#);
    }

    #[test]
    fn coordinates_render_with_four_decimals() {
        let coords = Coordinates {
            latitude: 31.230416,
            longitude: 121.473701,
        };
        assert_eq!(coords.to_string(), "Lat: 31.2304   Lng: 121.4737");
    }
}
