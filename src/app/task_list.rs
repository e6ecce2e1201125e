use log::{debug, error, info, warn};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::*;
use std::collections::HashSet;

use crate::app::error::{LoadError, StorageError};
use crate::app::models::{Task, TaskId, TaskIdGenerator};
use crate::app::storage::KeyValueStore;

// Key under which the whole list is stored
pub const STORAGE_KEY: &str = "@todos";

// Outcome of a list mutation.
// The in-memory list is the truth even when the store write failed.
#[derive(Debug)]
pub enum Mutation {
    Unchanged,
    Persisted,
    NotPersisted(StorageError),
}

impl Mutation {
    pub fn changed(&self) -> bool {
        !matches!(self, Mutation::Unchanged)
    }
}

/// Returns `current` with a new task prepended, or `current` unchanged when
/// `raw_title` is blank.
pub fn add(current: &[Task], raw_title: &str, ids: &mut TaskIdGenerator) -> Vec<Task> {
    let title = raw_title.trim();
    if title.is_empty() {
        return current.to_vec();
    }

    let mut tasks = Vec::with_capacity(current.len() + 1);
    tasks.push(Task {
        id: ids.next_id(),
        title: title.to_string(),
    });
    tasks.extend_from_slice(current);
    tasks
}

/// Returns `current` without the task identified by `id`.
pub fn remove(current: &[Task], id: &TaskId) -> Vec<Task> {
    current
        .iter()
        .filter(|task| &task.id != id)
        .cloned()
        .collect()
}

pub fn serialize(tasks: &[Task]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Parses a stored blob, dropping records that break the list invariants
/// (blank titles, repeated ids).
pub fn deserialize(blob: &str) -> Result<Vec<Task>, LoadError> {
    let parsed: Vec<Task> = serde_json::from_str(blob).map_err(LoadError::Corrupt)?;

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(parsed.len());
    for task in parsed {
        let title = task.title.trim();
        if title.is_empty() {
            warn!(
                "event=task_load module=task_list status=skipped reason=empty_title id={}",
                task.id
            );
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warn!(
                "event=task_load module=task_list status=skipped reason=duplicate_id id={}",
                task.id
            );
            continue;
        }
        tasks.push(Task {
            id: task.id,
            title: title.to_string(),
        });
    }
    Ok(tasks)
}

// Owner of the task list; every change goes through here and is mirrored to the store
pub struct TaskList<'a> {
    pub state: ListState,
    items: Vec<Task>,
    storage: &'a dyn KeyValueStore,
    ids: TaskIdGenerator,
    load_error: Option<LoadError>,
    unsynced: bool,
}

impl<'a> TaskList<'a> {
    // Initialize a task list with the items found in the store
    pub fn initialize(storage: &'a dyn KeyValueStore) -> TaskList<'a> {
        TaskList::initialize_with(storage, TaskIdGenerator::default())
    }

    pub fn initialize_with(
        storage: &'a dyn KeyValueStore,
        mut ids: TaskIdGenerator,
    ) -> TaskList<'a> {
        let loaded = match storage.read(STORAGE_KEY) {
            // An empty value counts as nothing stored
            Ok(Some(blob)) if blob.is_empty() => Ok(Vec::new()),
            Ok(Some(blob)) => deserialize(&blob),
            Ok(None) => Ok(Vec::new()),
            Err(err) => Err(LoadError::Read(err)),
        };

        let (items, load_error) = match loaded {
            Ok(items) => {
                info!("event=task_load module=task_list status=ok count={}", items.len());
                (items, None)
            }
            Err(err) => {
                error!("event=task_load module=task_list status=error error={err}");
                (Vec::new(), Some(err))
            }
        };
        ids.observe(&items);

        TaskList {
            state: ListState::default(),
            items,
            storage,
            ids,
            load_error,
            unsynced: false,
        }
    }

    pub fn items(&self) -> &[Task] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // Items and selection state, borrowed together for rendering
    pub fn view(&mut self) -> (&[Task], &mut ListState) {
        (&self.items, &mut self.state)
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    // True while the store misses the latest snapshot
    pub fn pending_sync(&self) -> bool {
        self.unsynced
    }

    pub fn add(&mut self, raw_title: &str) -> Mutation {
        let tasks = add(&self.items, raw_title, &mut self.ids);
        if tasks.len() == self.items.len() {
            return Mutation::Unchanged;
        }
        debug!("event=task_add module=task_list id={}", tasks[0].id);

        // Keep the same task highlighted after the prepend
        if let Some(i) = self.state.selected() {
            self.state.select(Some(i + 1));
        }
        self.items = tasks;
        self.persist()
    }

    pub fn remove(&mut self, id: &TaskId) -> Mutation {
        let position = match self.items.iter().position(|task| &task.id == id) {
            Some(position) => position,
            None => return Mutation::Unchanged,
        };
        debug!("event=task_remove module=task_list id={id}");

        self.items = remove(&self.items, id);
        self.fix_selection_after_removal(position);
        self.persist()
    }

    // Delete the selected task
    pub fn remove_selected(&mut self) -> Mutation {
        match self.selected_id() {
            Some(id) => self.remove(&id),
            None => Mutation::Unchanged,
        }
    }

    // Write the snapshot again if the last write did not make it
    pub fn retry_sync(&mut self) -> Mutation {
        if !self.unsynced {
            return Mutation::Unchanged;
        }
        info!("event=task_sync module=task_list status=retry");
        self.persist()
    }

    fn persist(&mut self) -> Mutation {
        let written =
            serialize(&self.items).and_then(|blob| self.storage.write(STORAGE_KEY, &blob));
        match written {
            Ok(()) => {
                self.unsynced = false;
                Mutation::Persisted
            }
            Err(err) => {
                warn!(
                    "event=task_sync module=task_list status=error count={} error={err}",
                    self.items.len()
                );
                self.unsynced = true;
                Mutation::NotPersisted(err)
            }
        }
    }

    fn fix_selection_after_removal(&mut self, removed: usize) {
        let selected = match self.state.selected() {
            Some(i) => i,
            None => return,
        };
        if self.items.is_empty() {
            self.state.select(None);
        } else if removed < selected {
            self.state.select(Some(selected - 1));
        } else {
            self.state.select(Some(selected.min(self.items.len() - 1)));
        }
    }

    // Move the selection to the next item
    pub fn next(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if self.items.is_empty() || i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.select(i);
    }

    // Move the selection to the previous item
    pub fn previous(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if self.items.is_empty() {
                    0
                } else if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.select(i);
    }

    fn select(&mut self, i: usize) {
        if self.items.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(i));
        }
    }

    pub fn unselect(&mut self) {
        self.state.select(None);
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.state
            .selected()
            .and_then(|i| self.items.get(i))
            .map(|task| task.id.clone())
    }

    // Id of the task drawn at `row` of the visible list area
    pub fn id_at_row(&self, row: usize) -> Option<TaskId> {
        self.items
            .get(self.state.offset() + row)
            .map(|task| task.id.clone())
    }
}

// Build the UI (list) for the task list
pub fn get_list_items_ui(tasks: &[Task]) -> Vec<ListItem<'_>> {
    tasks
        .iter()
        .map(|task| {
            ListItem::new(Line::from(task.title.as_str())).style(Style::default().fg(Color::White))
        })
        .collect()
}

// Build the UI (lines) for the instructions infobox
pub fn get_instructions_ui<'a>() -> Vec<Line<'a>> {
    vec![
        "Enter / [+] - add a task".into(),
        "Up/Down - select, Ctrl+U - clear selection".into(),
        "Ctrl+D / hold click - delete".into(),
        "F2 - camera".into(),
        "Esc - quit".into(),
    ]
}
