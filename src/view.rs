use crate::dates;
use crate::model::{Task, TaskGroup, TaskList, TaskStore};

/// One display bucket: every group record sharing a date key.
#[derive(Debug, Clone)]
pub struct DayView<'a> {
    pub date: &'a str,
    pub groups: Vec<&'a TaskGroup>,
    pub lists: &'a [TaskList],
    pub total_incomplete: u32,
    pub has_tasks: bool,
    pub all_expanded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Incomplete(u32),
    AllComplete,
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Incomplete(u32),
    AllComplete,
    Empty,
}

impl DayView<'_> {
    pub fn status(&self) -> DayStatus {
        if self.total_incomplete > 0 {
            DayStatus::Incomplete(self.total_incomplete)
        } else if self.has_tasks && !self.lists.is_empty() {
            DayStatus::AllComplete
        } else {
            DayStatus::Nothing
        }
    }
}

/// Buckets group records by date in first-seen order of the group sequence.
pub fn days(store: &TaskStore) -> Vec<DayView<'_>> {
    let mut out: Vec<DayView<'_>> = Vec::new();
    for group in store.groups() {
        if let Some(day) = out.iter_mut().find(|d| d.date == group.date) {
            day.groups.push(group);
            continue;
        }
        let lists = store.lists(&group.date);
        out.push(DayView {
            date: &group.date,
            groups: vec![group],
            lists,
            total_incomplete: total_incomplete(lists),
            has_tasks: lists.iter().any(|l| !l.tasks.is_empty()),
            all_expanded: lists.iter().all(|l| l.expanded),
        });
    }
    out
}

pub fn days_after<'a>(store: &'a TaskStore, date: &str) -> Vec<DayView<'a>> {
    days(store)
        .into_iter()
        .filter(|d| dates::is_after(d.date, date))
        .collect()
}

pub fn total_incomplete(lists: &[TaskList]) -> u32 {
    lists.iter().map(|l| l.incomplete).sum()
}

pub fn list_status(list: &TaskList) -> ListStatus {
    if list.incomplete > 0 {
        ListStatus::Incomplete(list.incomplete)
    } else if !list.tasks.is_empty() {
        ListStatus::AllComplete
    } else {
        ListStatus::Empty
    }
}

/// The task's last edit date, when that falls on a later day than its group's date.
pub fn edited_after<'a>(task: &'a Task, date: &str) -> Option<&'a str> {
    if task.last_edited_date.is_empty() || !dates::is_after(&task.last_edited_date, date) {
        return None;
    }
    Some(&task.last_edited_date)
}

pub fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_edited_on(date: &str) -> Task {
        Task {
            id: 1,
            content: "water plants".into(),
            checked: false,
            due_date: String::new(),
            created_date: "5/6/2024".into(),
            last_edited_date: date.into(),
            time: "09:00 AM".into(),
        }
    }

    #[test]
    fn edited_marker_only_for_later_days() {
        let task = task_edited_on("7/6/2024");
        assert_eq!(edited_after(&task, "5/6/2024"), Some("7/6/2024"));
        assert_eq!(edited_after(&task, "7/6/2024"), None);
        assert_eq!(edited_after(&task, "8/6/2024"), None);
        assert_eq!(edited_after(&task_edited_on(""), "5/6/2024"), None);
        assert_eq!(edited_after(&task_edited_on("garbage"), "5/6/2024"), None);
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let mut store = TaskStore::default();
        let a = store.create_task_group_on("5/6/2024");
        let b = store.create_task_group_on("7/6/2024");
        let c = store.create_task_group_on("5/6/2024");
        // sequence is now [c(5/6), b(7/6), a(5/6)]
        let days = days(&store);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "5/6/2024");
        assert_eq!(days[1].date, "7/6/2024");
        let ids: Vec<_> = days[0].groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![c, a]);
        assert_eq!(days[1].groups[0].id, b);
    }

    #[test]
    fn newest_group_comes_first_not_calendar_order() {
        let mut store = TaskStore::default();
        store.create_task_group_on("9/6/2024");
        store.create_task_group_on("1/6/2024");
        let order: Vec<_> = days(&store).iter().map(|d| d.date.to_string()).collect();
        assert_eq!(order, vec!["1/6/2024", "9/6/2024"]);
    }

    #[test]
    fn scenario_counts_and_affirmation() {
        let mut store = TaskStore::default();
        store.create_task_group_on("5/6/2024");
        let l1 = store.create_list("5/6/2024");
        let t1 = store.create_task(l1).unwrap();

        let snapshot = days(&store);
        let day = &snapshot[0];
        assert_eq!(store.incomplete_count(l1), 1);
        assert_eq!(day.total_incomplete, 1);
        assert_eq!(day.status(), DayStatus::Incomplete(1));

        store.update_task_checked(l1, t1, true);
        let snapshot = days(&store);
        let day = &snapshot[0];
        assert_eq!(day.total_incomplete, 0);
        assert_eq!(day.status(), DayStatus::AllComplete);
        assert_eq!(list_status(store.list(l1).unwrap()), ListStatus::AllComplete);

        store.delete_task(l1, t1);
        assert!(!store.has_day("5/6/2024"));
        let days = days(&store);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].groups.len(), 1);
        assert_eq!(days[0].status(), DayStatus::Nothing);
        assert!(days[0].lists.is_empty());
    }

    #[test]
    fn totals_sum_across_lists() {
        let mut store = TaskStore::default();
        store.create_task_group_on("5/6/2024");
        let l1 = store.create_list("5/6/2024");
        let l2 = store.create_list("5/6/2024");
        store.create_task(l1);
        store.create_task(l1);
        let t = store.create_task(l2).unwrap();
        store.create_task(l2);
        store.update_task_checked(l2, t, true);
        assert_eq!(days(&store)[0].total_incomplete, 3);
    }

    #[test]
    fn empty_lists_show_nothing() {
        let mut store = TaskStore::default();
        store.create_task_group_on("5/6/2024");
        let l1 = store.create_list("5/6/2024");
        let snapshot = days(&store);
        let day = &snapshot[0];
        assert!(!day.has_tasks);
        assert_eq!(day.status(), DayStatus::Nothing);
        assert_eq!(list_status(store.list(l1).unwrap()), ListStatus::Empty);
    }

    #[test]
    fn all_expanded_tracks_toggle() {
        let mut store = TaskStore::default();
        store.create_task_group_on("5/6/2024");
        store.create_list("5/6/2024");
        assert!(days(&store)[0].all_expanded);
        store.toggle_group_expansion("5/6/2024");
        assert!(!days(&store)[0].all_expanded);
    }

    #[test]
    fn days_after_filters_by_calendar() {
        let mut store = TaskStore::default();
        store.create_task_group_on("1/6/2024");
        store.create_task_group_on("10/6/2024");
        store.create_task_group_on("bogus");
        let after: Vec<_> = days_after(&store, "5/6/2024")
            .iter()
            .map(|d| d.date.to_string())
            .collect();
        assert_eq!(after, vec!["10/6/2024"]);
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "task"), "1 task");
        assert_eq!(plural(0, "task"), "0 tasks");
        assert_eq!(plural(3, "task"), "3 tasks");
    }
}
