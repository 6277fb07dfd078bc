use crate::dates;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type GroupId = u64;
pub type ListId = u64;
pub type TaskId = u64;

pub const TASK_PLACEHOLDER: &str = "Add task...";
pub const CATEGORY_PLACEHOLDER: &str = "categories";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub id: GroupId,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub content: String,
    pub checked: bool,
    pub due_date: String,
    pub created_date: String,
    pub last_edited_date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caption {
    pub text: Option<String>,
    pub edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub id: ListId,
    pub category: Option<Category>,
    pub caption: Caption,
    pub expanded: bool,
    pub tasks_expanded: bool,
    pub incomplete: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Groceries,
    Shopping,
    Personal,
    General,
    Ideas,
    Project,
    Important,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(String);

#[derive(thiserror::Error, Debug)]
#[error("direction must be `up` or `down`, got {0}")]
pub struct ParseDirectionError(String);

/// Hands out timestamp-derived ids that never repeat within a process.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    last: u64,
}

/// Authoritative in-memory state: group records plus the day → list → task tree.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    groups: Vec<TaskGroup>,
    days: BTreeMap<String, Vec<TaskList>>,
    group_captions: BTreeMap<String, Caption>,
    open_picker: Option<ListId>,
    ids: IdGen,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Shopping,
        Category::Personal,
        Category::General,
        Category::Ideas,
        Category::Project,
        Category::Important,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::Shopping => "Shopping",
            Category::Personal => "Personal",
            Category::General => "General",
            Category::Ideas => "Ideas",
            Category::Project => "Project",
            Category::Important => "Important",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Category::Groceries => "🍉",
            Category::Shopping => "🛒",
            Category::Personal => "✨",
            Category::General => "📝",
            Category::Ideas => "💡",
            Category::Project => "📐",
            Category::Important => "‼️",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.label())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        // persisted labels carry their glyph in front
        let label = raw.rsplit(' ').next().unwrap_or(raw);
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl Caption {
    fn set(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.text = None;
            self.edited = false;
        } else {
            self.text = Some(trimmed.to_string());
            self.edited = true;
        }
    }
}

impl IdGen {
    pub fn seeded(last: u64) -> Self {
        IdGen { last }
    }

    pub fn next(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last.saturating_add(1));
        self.last
    }
}

impl Task {
    fn new(id: TaskId) -> Self {
        let today = dates::current_date_string();
        Task {
            id,
            content: TASK_PLACEHOLDER.to_string(),
            checked: false,
            due_date: String::new(),
            created_date: today.clone(),
            last_edited_date: today,
            time: dates::current_time_label(),
        }
    }

    fn touch(&mut self) {
        self.last_edited_date = dates::current_date_string();
    }
}

impl TaskList {
    fn new(id: ListId) -> Self {
        TaskList {
            id,
            category: None,
            caption: Caption::default(),
            expanded: true,
            tasks_expanded: true,
            incomplete: 0,
            tasks: Vec::new(),
        }
    }

    pub fn category_label(&self) -> String {
        self.category
            .map(|c| c.to_string())
            .unwrap_or_else(|| CATEGORY_PLACEHOLDER.to_string())
    }

    pub fn unchecked(&self) -> u32 {
        self.tasks.iter().filter(|t| !t.checked).count() as u32
    }

    fn task_index(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}

impl TaskStore {
    pub(crate) fn from_parts(
        groups: Vec<TaskGroup>,
        days: BTreeMap<String, Vec<TaskList>>,
        group_captions: BTreeMap<String, Caption>,
        ids: IdGen,
    ) -> Self {
        let mut store = TaskStore {
            groups,
            days,
            group_captions,
            open_picker: None,
            ids,
        };
        store.recount();
        store
    }

    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    pub fn days(&self) -> impl Iterator<Item = (&str, &[TaskList])> {
        self.days.iter().map(|(d, l)| (d.as_str(), l.as_slice()))
    }

    pub fn lists(&self, date: &str) -> &[TaskList] {
        self.days.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_day(&self, date: &str) -> bool {
        self.days.contains_key(date)
    }

    pub fn list(&self, list_id: ListId) -> Option<&TaskList> {
        self.days.values().flatten().find(|l| l.id == list_id)
    }

    pub fn task(&self, list_id: ListId, task_id: TaskId) -> Option<&Task> {
        self.list(list_id)?.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn date_of_list(&self, list_id: ListId) -> Option<&str> {
        self.days
            .iter()
            .find(|(_, lists)| lists.iter().any(|l| l.id == list_id))
            .map(|(d, _)| d.as_str())
    }

    pub fn group_caption(&self, date: &str) -> Option<&Caption> {
        self.group_captions.get(date)
    }

    pub(crate) fn group_captions(&self) -> &BTreeMap<String, Caption> {
        &self.group_captions
    }

    pub fn open_picker(&self) -> Option<ListId> {
        self.open_picker
    }

    pub fn incomplete_count(&self, list_id: ListId) -> u32 {
        self.list(list_id).map(|l| l.incomplete).unwrap_or(0)
    }

    pub fn create_task_group(&mut self) -> GroupId {
        self.create_task_group_on(&dates::current_date_string())
    }

    /// Prepends a group record; same-day duplicates are kept and merged only for display.
    pub fn create_task_group_on(&mut self, date: &str) -> GroupId {
        let id = self.ids.next();
        self.groups.insert(
            0,
            TaskGroup {
                id,
                date: date.to_string(),
            },
        );
        id
    }

    /// Drops every group record for the date together with all of its lists and captions.
    pub fn delete_task_group(&mut self, date: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.date != date);
        let removed_lists = self.days.remove(date);
        let removed_caption = self.group_captions.remove(date).is_some();
        if let (Some(open), Some(lists)) = (self.open_picker, removed_lists.as_ref()) {
            if lists.iter().any(|l| l.id == open) {
                self.open_picker = None;
            }
        }
        self.recount();
        before != self.groups.len() || removed_lists.is_some() || removed_caption
    }

    pub fn create_list(&mut self, date: &str) -> ListId {
        let id = self.ids.next();
        self.days
            .entry(date.to_string())
            .or_default()
            .push(TaskList::new(id));
        id
    }

    pub fn create_task(&mut self, list_id: ListId) -> Option<TaskId> {
        let id = self.ids.next();
        let list = self.list_mut(list_id)?;
        list.tasks.push(Task::new(id));
        list.incomplete += 1;
        self.recount();
        Some(id)
    }

    /// Removes a task; a list left without tasks is destroyed, and a day left without lists is pruned.
    pub fn delete_task(&mut self, list_id: ListId, task_id: TaskId) -> bool {
        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        let Some(idx) = list.task_index(task_id) else {
            return false;
        };
        let task = list.tasks.remove(idx);
        if !task.checked {
            list.incomplete = list.incomplete.saturating_sub(1);
        }
        if list.tasks.is_empty() {
            self.destroy_list(list_id);
        }
        self.recount();
        true
    }

    pub fn update_task_content(&mut self, list_id: ListId, task_id: TaskId, text: &str) -> bool {
        self.update_task(list_id, task_id, |task| task.content = text.to_string())
    }

    pub fn update_task_checked(&mut self, list_id: ListId, task_id: TaskId, checked: bool) -> bool {
        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        let Some(idx) = list.task_index(task_id) else {
            return false;
        };
        let was = list.tasks[idx].checked;
        list.tasks[idx].checked = checked;
        list.tasks[idx].touch();
        match (was, checked) {
            (false, true) => list.incomplete = list.incomplete.saturating_sub(1),
            (true, false) => list.incomplete += 1,
            _ => {}
        }
        self.recount();
        true
    }

    pub fn update_task_due_date(&mut self, list_id: ListId, task_id: TaskId, due: &str) -> bool {
        self.update_task(list_id, task_id, |task| task.due_date = due.to_string())
    }

    /// Swaps a task with its neighbour. Boundaries and unknown ids leave the order untouched.
    pub fn move_task(&mut self, list_id: ListId, task_id: TaskId, direction: Direction) -> bool {
        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        let Some(idx) = list.task_index(task_id) else {
            return false;
        };
        let target = match direction {
            Direction::Up if idx > 0 => idx - 1,
            Direction::Down if idx + 1 < list.tasks.len() => idx + 1,
            _ => return false,
        };
        list.tasks.swap(idx, target);
        true
    }

    pub fn set_category(&mut self, list_id: ListId, category: Category) -> bool {
        self.open_picker = None;
        match self.list_mut(list_id) {
            Some(list) => {
                list.category = Some(category);
                true
            }
            None => false,
        }
    }

    pub fn toggle_category_picker(&mut self, list_id: ListId) {
        self.open_picker = if self.open_picker == Some(list_id) {
            None
        } else {
            Some(list_id)
        };
    }

    pub fn set_list_caption(&mut self, list_id: ListId, text: &str) -> bool {
        match self.list_mut(list_id) {
            Some(list) => {
                list.caption.set(text);
                true
            }
            None => false,
        }
    }

    pub fn set_task_group_caption(&mut self, date: &str, text: &str) -> bool {
        if !self.groups.iter().any(|g| g.date == date) {
            return false;
        }
        self.group_captions
            .entry(date.to_string())
            .or_default()
            .set(text);
        true
    }

    /// Collapses every list of the day when all are expanded, otherwise expands all of them.
    pub fn toggle_group_expansion(&mut self, date: &str) -> bool {
        let Some(lists) = self.days.get_mut(date) else {
            return false;
        };
        let all_expanded = lists.iter().all(|l| l.expanded);
        for list in lists.iter_mut() {
            list.expanded = !all_expanded;
        }
        true
    }

    pub fn toggle_list_tasks_expansion(&mut self, list_id: ListId) -> bool {
        match self.list_mut(list_id) {
            Some(list) => {
                list.tasks_expanded = !list.tasks_expanded;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = TaskStore::default();
    }

    pub fn recount(&mut self) {
        for list in self.days.values_mut().flatten() {
            list.incomplete = list.unchecked();
        }
    }

    fn update_task<F>(&mut self, list_id: ListId, task_id: TaskId, f: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        let Some(task) = self
            .list_mut(list_id)
            .and_then(|l| l.tasks.iter_mut().find(|t| t.id == task_id))
        else {
            return false;
        };
        f(task);
        task.touch();
        true
    }

    fn list_mut(&mut self, list_id: ListId) -> Option<&mut TaskList> {
        self.days.values_mut().flatten().find(|l| l.id == list_id)
    }

    fn destroy_list(&mut self, list_id: ListId) {
        let Some(date) = self.date_of_list(list_id).map(str::to_string) else {
            return;
        };
        if let Some(lists) = self.days.get_mut(&date) {
            lists.retain(|l| l.id != list_id);
            if lists.is_empty() {
                self.days.remove(&date);
            }
        }
        if self.open_picker == Some(list_id) {
            self.open_picker = None;
        }
    }
}
