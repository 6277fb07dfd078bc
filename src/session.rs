use crate::model::TaskStore;
use crate::snapshot::Snapshot;
use crate::storage::KvStore;
use tracing::{info, warn};

/// Owns the task store and writes the full snapshot after every mutation.
pub struct Session {
    kv: KvStore,
    store: TaskStore,
}

impl Session {
    pub fn open(kv: KvStore) -> Self {
        if !kv.tasks_namespace_intact() {
            warn!(root = ?kv.root(), "task storage is corrupted; starting from empty state");
            kv.wipe();
        }
        let store = TaskStore::from_snapshot(kv.load_snapshot());
        info!(groups = store.groups().len(), "loaded task store");
        Session { kv, store }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub fn apply<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut TaskStore) -> R,
    {
        let result = f(&mut self.store);
        self.persist();
        result
    }

    pub fn persist(&self) {
        self.kv.save_snapshot(&Snapshot::capture(&self.store));
    }

    pub fn clear(&mut self) {
        self.kv.wipe();
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StoreLocation, StoreScope};
    use crate::view;
    use std::fs;
    use tempfile::TempDir;

    fn kv(temp: &TempDir) -> KvStore {
        KvStore::open(&StoreLocation {
            path: temp.path().to_path_buf(),
            scope: StoreScope::Explicit,
        })
    }

    #[test]
    fn mutations_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(kv(&temp));
        let list = session.apply(|s| {
            s.create_task_group_on("5/6/2024");
            s.create_list("5/6/2024")
        });
        let task = session.apply(|s| s.create_task(list)).unwrap();
        session.apply(|s| s.update_task_content(list, task, "pay rent"));

        let reopened = Session::open(kv(&temp));
        let store = reopened.store();
        assert_eq!(store.task(list, task).unwrap().content, "pay rent");
        assert_eq!(store.incomplete_count(list), 1);
        assert_eq!(view::days(store)[0].total_incomplete, 1);
    }

    #[test]
    fn corrupted_tasks_wipe_everything() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(kv(&temp));
        session.apply(|s| {
            s.create_task_group_on("5/6/2024");
            let list = s.create_list("5/6/2024");
            s.create_task(list);
        });
        session.kv().save("theme", &"dark");
        fs::write(temp.path().join("tasks.json"), r#"{"1": "broken"}"#).unwrap();

        let reopened = Session::open(kv(&temp));
        assert!(reopened.store().groups().is_empty());
        assert_eq!(reopened.store().days().count(), 0);
        assert!(reopened.kv().raw("newTaskGroup").is_none());
        assert_eq!(reopened.kv().load("theme", String::new()), "dark");
    }

    #[test]
    fn clear_removes_persisted_state() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(kv(&temp));
        session.apply(|s| s.create_task_group_on("5/6/2024"));
        session.clear();
        assert!(session.store().groups().is_empty());
        let reopened = Session::open(kv(&temp));
        assert!(reopened.store().groups().is_empty());
    }
}
