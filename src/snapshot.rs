//! Persisted shape of the task store: one field per storage key.
//!
//! The model keeps lists and tasks in a single owned tree; on disk the same
//! state is spread across parallel maps keyed by list id or date. `capture`
//! flattens the tree and `TaskStore::from_snapshot` reassembles it, dropping
//! any per-list entry that no day references.

use crate::model::{
    Caption, Category, GroupId, IdGen, ListId, Task, TaskGroup, TaskId, TaskList, TaskStore,
    CATEGORY_PLACEHOLDER,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

pub const KEY_TASK_GROUPS: &str = "newTaskGroup";
pub const KEY_TASK_LISTS: &str = "taskLists";
pub const KEY_TASKS: &str = "tasks";
pub const KEY_LIST_CATEGORIES: &str = "listCategories";
pub const KEY_INCOMPLETE_COUNTS: &str = "incompleteCounts";
pub const KEY_EXPANDED_STATES: &str = "expandedStates";
pub const KEY_TASKS_EXPANDED_STATES: &str = "tasksExpandedStates";
pub const KEY_LIST_CAPTIONS: &str = "listCaptions";
pub const KEY_EDITED_CAPTIONS: &str = "editedCaptions";
pub const KEY_TASK_GROUP_CAPTIONS: &str = "taskGroupCaptions";
pub const KEY_EDITED_TASK_GROUP_CAPTIONS: &str = "editedTaskGroupCaptions";

pub const KNOWN_KEYS: [&str; 11] = [
    KEY_TASK_GROUPS,
    KEY_TASK_LISTS,
    KEY_TASKS,
    KEY_LIST_CATEGORIES,
    KEY_INCOMPLETE_COUNTS,
    KEY_EXPANDED_STATES,
    KEY_TASKS_EXPANDED_STATES,
    KEY_LIST_CAPTIONS,
    KEY_EDITED_CAPTIONS,
    KEY_TASK_GROUP_CAPTIONS,
    KEY_EDITED_TASK_GROUP_CAPTIONS,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRef {
    pub id: ListId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRecord {
    pub id: TaskId,
    pub time: String,
    pub content: String,
    pub checked: bool,
    pub due_date: String,
    pub created_date: String,
    pub last_edited_date: String,
}

impl Default for TaskRecord {
    fn default() -> Self {
        TaskRecord {
            id: 0,
            time: String::new(),
            content: crate::model::TASK_PLACEHOLDER.to_string(),
            checked: false,
            due_date: String::new(),
            created_date: String::new(),
            last_edited_date: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub task_groups: Vec<GroupRecord>,
    pub task_lists: BTreeMap<String, Vec<ListRef>>,
    pub tasks: BTreeMap<ListId, Vec<TaskRecord>>,
    pub list_categories: BTreeMap<ListId, String>,
    pub incomplete_counts: BTreeMap<ListId, u32>,
    pub expanded_states: BTreeMap<ListId, bool>,
    pub tasks_expanded_states: BTreeMap<ListId, bool>,
    pub list_captions: BTreeMap<ListId, String>,
    pub edited_captions: BTreeMap<ListId, bool>,
    pub task_group_captions: BTreeMap<String, String>,
    pub edited_task_group_captions: BTreeMap<String, bool>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord {
            id: task.id,
            time: task.time.clone(),
            content: task.content.clone(),
            checked: task.checked,
            due_date: task.due_date.clone(),
            created_date: task.created_date.clone(),
            last_edited_date: task.last_edited_date.clone(),
        }
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Task {
            id: record.id,
            content: record.content,
            checked: record.checked,
            due_date: record.due_date,
            created_date: record.created_date,
            last_edited_date: record.last_edited_date,
            time: record.time,
        }
    }
}

impl Snapshot {
    pub fn capture(store: &TaskStore) -> Self {
        let mut snap = Snapshot {
            task_groups: store
                .groups()
                .iter()
                .map(|g| GroupRecord {
                    id: g.id,
                    date: g.date.clone(),
                })
                .collect(),
            ..Snapshot::default()
        };
        for (date, lists) in store.days() {
            snap.task_lists.insert(
                date.to_string(),
                lists.iter().map(|l| ListRef { id: l.id }).collect(),
            );
            for list in lists {
                snap.tasks
                    .insert(list.id, list.tasks.iter().map(TaskRecord::from).collect());
                snap.list_categories.insert(list.id, list.category_label());
                snap.incomplete_counts.insert(list.id, list.incomplete);
                snap.expanded_states.insert(list.id, list.expanded);
                snap.tasks_expanded_states
                    .insert(list.id, list.tasks_expanded);
                if let Some(text) = &list.caption.text {
                    snap.list_captions.insert(list.id, text.clone());
                }
                snap.edited_captions.insert(list.id, list.caption.edited);
            }
        }
        for (date, caption) in store.group_captions() {
            if let Some(text) = &caption.text {
                snap.task_group_captions.insert(date.clone(), text.clone());
            }
            snap.edited_task_group_captions
                .insert(date.clone(), caption.edited);
        }
        snap
    }

    fn max_id(&self) -> u64 {
        let groups = self.task_groups.iter().map(|g| g.id);
        let lists = self.task_lists.values().flatten().map(|l| l.id);
        let tasks = self.tasks.values().flatten().map(|t| t.id);
        groups.chain(lists).chain(tasks).max().unwrap_or(0)
    }
}

impl TaskStore {
    pub fn from_snapshot(mut snap: Snapshot) -> Self {
        let ids = IdGen::seeded(snap.max_id());
        let groups = snap
            .task_groups
            .iter()
            .map(|g| TaskGroup {
                id: g.id,
                date: g.date.clone(),
            })
            .collect();

        let mut adopted = HashSet::new();
        let mut days = BTreeMap::new();
        for (date, refs) in std::mem::take(&mut snap.task_lists) {
            let mut lists = Vec::with_capacity(refs.len());
            for ListRef { id } in refs {
                if !adopted.insert(id) {
                    warn!(list = id, date = %date, "list referenced by more than one day; keeping first");
                    continue;
                }
                lists.push(adopt_list(id, &mut snap));
            }
            if lists.is_empty() {
                debug!(date = %date, "skipping day without lists");
                continue;
            }
            days.insert(date, lists);
        }

        let orphans: HashSet<ListId> = snap
            .tasks
            .keys()
            .chain(snap.list_categories.keys())
            .chain(snap.incomplete_counts.keys())
            .chain(snap.expanded_states.keys())
            .chain(snap.tasks_expanded_states.keys())
            .chain(snap.list_captions.keys())
            .chain(snap.edited_captions.keys())
            .copied()
            .collect();
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "dropping state for lists no day references");
        }

        let mut group_captions: BTreeMap<String, Caption> = BTreeMap::new();
        for (date, text) in snap.task_group_captions {
            group_captions.entry(date).or_default().text = Some(text);
        }
        for (date, edited) in snap.edited_task_group_captions {
            group_captions.entry(date).or_default().edited = edited;
        }

        TaskStore::from_parts(groups, days, group_captions, ids)
    }
}

fn adopt_list(id: ListId, snap: &mut Snapshot) -> TaskList {
    let category = match snap.list_categories.remove(&id) {
        Some(raw) if raw != CATEGORY_PLACEHOLDER => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(err) => {
                warn!(list = id, %err, "resetting unrecognized category");
                None
            }
        },
        _ => None,
    };
    snap.incomplete_counts.remove(&id);
    TaskList {
        id,
        category,
        caption: Caption {
            text: snap.list_captions.remove(&id),
            edited: snap.edited_captions.remove(&id).unwrap_or(false),
        },
        expanded: snap.expanded_states.remove(&id).unwrap_or(false),
        tasks_expanded: snap.tasks_expanded_states.remove(&id).unwrap_or(false),
        incomplete: 0,
        tasks: snap
            .tasks
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .map(Task::from)
            .collect(),
    }
}
