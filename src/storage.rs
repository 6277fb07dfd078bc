use crate::snapshot::{Snapshot, KEY_TASKS, KEY_TASK_LISTS, KNOWN_KEYS};
use crate::snapshot::{
    KEY_EDITED_CAPTIONS, KEY_EDITED_TASK_GROUP_CAPTIONS, KEY_EXPANDED_STATES,
    KEY_INCOMPLETE_COUNTS, KEY_LIST_CAPTIONS, KEY_LIST_CATEGORIES, KEY_TASKS_EXPANDED_STATES,
    KEY_TASK_GROUPS, KEY_TASK_GROUP_CAPTIONS,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

pub const PROJECT_DIR: &str = ".daylist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Explicit,
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub scope: StoreScope,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed value under {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("value under {key} is not an object")]
    Shape { key: String },
}

/// Durable named slots, one JSON document per key inside a directory.
#[derive(Debug, Clone)]
pub struct KvStore {
    root: PathBuf,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Explicit => "explicit",
            StoreScope::Project => "project",
            StoreScope::Global => "global",
        }
    }
}

pub fn init_project_store() -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    let path = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&path).with_context(|| format!("creating {:?}", path))?;
    Ok(StoreLocation {
        path,
        scope: StoreScope::Project,
    })
}

pub fn locate_store(start: &Path, explicit: Option<PathBuf>) -> Result<StoreLocation> {
    if let Some(path) = explicit {
        return Ok(StoreLocation {
            path,
            scope: StoreScope::Explicit,
        });
    }
    if let Some(project_path) = find_project_store(start) {
        return Ok(StoreLocation {
            path: project_path,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        path: global_store_path()?,
        scope: StoreScope::Global,
    })
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "daylist").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

impl KvStore {
    pub fn open(location: &StoreLocation) -> Self {
        KvStore {
            root: location.path.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads a value, falling back to `default` on absence or any decoding problem.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_load(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                warn!(key, %err, "falling back to default");
                default
            }
        }
    }

    /// Writes a value. Failures are logged and the previous durable value stays in place.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = self.try_save(key, value) {
            error!(key, %err, "could not persist value");
        }
    }

    pub fn remove(&self, key: &str) {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => debug!(key, "removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => error!(key, %err, "could not remove value"),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    /// False when some entry of the `tasks` map is present but is not an array.
    pub fn tasks_namespace_intact(&self) -> bool {
        let Some(text) = self.raw(KEY_TASKS) else {
            return true;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map.values().all(Value::is_array),
            _ => true,
        }
    }

    pub fn wipe(&self) {
        for key in KNOWN_KEYS {
            self.remove(key);
        }
    }

    pub fn load_snapshot(&self) -> Snapshot {
        Snapshot {
            task_groups: self.load(KEY_TASK_GROUPS, Vec::new()),
            task_lists: self.load(KEY_TASK_LISTS, Default::default()),
            tasks: self.load(KEY_TASKS, Default::default()),
            list_categories: self.load(KEY_LIST_CATEGORIES, Default::default()),
            incomplete_counts: self.load(KEY_INCOMPLETE_COUNTS, Default::default()),
            expanded_states: self.load(KEY_EXPANDED_STATES, Default::default()),
            tasks_expanded_states: self.load(KEY_TASKS_EXPANDED_STATES, Default::default()),
            list_captions: self.load(KEY_LIST_CAPTIONS, Default::default()),
            edited_captions: self.load(KEY_EDITED_CAPTIONS, Default::default()),
            task_group_captions: self.load(KEY_TASK_GROUP_CAPTIONS, Default::default()),
            edited_task_group_captions: self
                .load(KEY_EDITED_TASK_GROUP_CAPTIONS, Default::default()),
        }
    }

    pub fn save_snapshot(&self, snap: &Snapshot) {
        self.save(KEY_TASK_GROUPS, &snap.task_groups);
        self.save(KEY_TASK_LISTS, &snap.task_lists);
        self.save(KEY_TASKS, &snap.tasks);
        self.save(KEY_LIST_CATEGORIES, &snap.list_categories);
        self.save(KEY_INCOMPLETE_COUNTS, &snap.incomplete_counts);
        self.save(KEY_EXPANDED_STATES, &snap.expanded_states);
        self.save(KEY_TASKS_EXPANDED_STATES, &snap.tasks_expanded_states);
        self.save(KEY_LIST_CAPTIONS, &snap.list_captions);
        self.save(KEY_EDITED_CAPTIONS, &snap.edited_captions);
        self.save(KEY_TASK_GROUP_CAPTIONS, &snap.task_group_captions);
        self.save(KEY_EDITED_TASK_GROUP_CAPTIONS, &snap.edited_task_group_captions);
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let path = self.key_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        let json_err = |source| StorageError::Json {
            key: key.to_string(),
            source,
        };
        let mut value: Value = serde_json::from_str(&text).map_err(json_err)?;
        if key == KEY_TASKS || key == KEY_TASK_LISTS {
            repair_sequences(key, &mut value)?;
        }
        serde_json::from_value(value).map(Some).map_err(json_err)
    }

    fn try_save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;
        let path = self.key_path(key);
        write_atomic(&path, text.as_bytes()).map_err(|source| StorageError::Io { path, source })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

/// Coerces every non-array entry of an id-indexed collection to an empty array.
fn repair_sequences(key: &str, value: &mut Value) -> Result<(), StorageError> {
    let Value::Object(map) = value else {
        return Err(StorageError::Shape {
            key: key.to_string(),
        });
    };
    for (id, entry) in map.iter_mut() {
        if !entry.is_array() {
            warn!(key, id = %id, "replacing non-sequence entry with an empty one");
            *entry = Value::Array(Vec::new());
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{GroupRecord, ListRef, TaskRecord};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, KvStore) {
        let temp = TempDir::new().unwrap();
        let store = KvStore::open(&StoreLocation {
            path: temp.path().join("store"),
            scope: StoreScope::Explicit,
        });
        (temp, store)
    }

    #[test]
    fn missing_key_yields_default() {
        let (_temp, kv) = temp_store();
        let groups: Vec<GroupRecord> = kv.load(KEY_TASK_GROUPS, Vec::new());
        assert!(groups.is_empty());
        assert_eq!(kv.load("anything", 7u32), 7);
    }

    #[test]
    fn garbage_and_empty_text_yield_default() {
        let (_temp, kv) = temp_store();
        fs::create_dir_all(kv.root()).unwrap();
        fs::write(kv.root().join("listCategories.json"), "{not json").unwrap();
        fs::write(kv.root().join("expandedStates.json"), "").unwrap();
        fs::write(kv.root().join("incompleteCounts.json"), "[1,2]").unwrap();

        let cats: BTreeMap<u64, String> = kv.load(KEY_LIST_CATEGORIES, BTreeMap::new());
        assert!(cats.is_empty());
        let expanded: BTreeMap<u64, bool> = kv.load(KEY_EXPANDED_STATES, BTreeMap::new());
        assert!(expanded.is_empty());
        let counts: BTreeMap<u64, u32> = kv.load(KEY_INCOMPLETE_COUNTS, BTreeMap::new());
        assert!(counts.is_empty());
    }

    #[test]
    fn round_trip_every_key_shape() {
        let (_temp, kv) = temp_store();
        let groups = vec![
            GroupRecord {
                id: 3,
                date: "6/6/2024".into(),
            },
            GroupRecord {
                id: 1,
                date: "5/6/2024".into(),
            },
        ];
        kv.save(KEY_TASK_GROUPS, &groups);
        assert_eq!(kv.load(KEY_TASK_GROUPS, Vec::<GroupRecord>::new()), groups);

        let mut lists = BTreeMap::new();
        lists.insert("5/6/2024".to_string(), vec![ListRef { id: 10 }, ListRef { id: 11 }]);
        kv.save(KEY_TASK_LISTS, &lists);
        let loaded: BTreeMap<String, Vec<ListRef>> = kv.load(KEY_TASK_LISTS, BTreeMap::new());
        assert_eq!(loaded, lists);

        let mut tasks = BTreeMap::new();
        tasks.insert(
            10u64,
            vec![TaskRecord {
                id: 20,
                time: "09:05 AM".into(),
                content: "water plants".into(),
                checked: true,
                due_date: "2024-06-10".into(),
                created_date: "5/6/2024".into(),
                last_edited_date: "6/6/2024".into(),
            }],
        );
        kv.save(KEY_TASKS, &tasks);
        let loaded: BTreeMap<u64, Vec<TaskRecord>> = kv.load(KEY_TASKS, BTreeMap::new());
        assert_eq!(loaded, tasks);

        let mut flags = BTreeMap::new();
        flags.insert(10u64, true);
        flags.insert(11u64, false);
        kv.save(KEY_EXPANDED_STATES, &flags);
        let loaded: BTreeMap<u64, bool> = kv.load(KEY_EXPANDED_STATES, BTreeMap::new());
        assert_eq!(loaded, flags);

        let mut captions = BTreeMap::new();
        captions.insert("5/6/2024".to_string(), "Wednesday".to_string());
        kv.save(KEY_TASK_GROUP_CAPTIONS, &captions);
        let loaded: BTreeMap<String, String> = kv.load(KEY_TASK_GROUP_CAPTIONS, BTreeMap::new());
        assert_eq!(loaded, captions);
    }

    #[test]
    fn snapshot_round_trip() {
        let (_temp, kv) = temp_store();
        let mut snap = Snapshot::default();
        snap.task_groups.push(GroupRecord {
            id: 1,
            date: "5/6/2024".into(),
        });
        snap.task_lists
            .insert("5/6/2024".into(), vec![ListRef { id: 2 }]);
        snap.tasks.insert(2, vec![TaskRecord::default()]);
        snap.list_categories.insert(2, "categories".into());
        snap.incomplete_counts.insert(2, 1);
        snap.expanded_states.insert(2, true);
        snap.tasks_expanded_states.insert(2, false);
        snap.list_captions.insert(2, "errands".into());
        snap.edited_captions.insert(2, true);
        snap.task_group_captions.insert("5/6/2024".into(), "Wed".into());
        snap.edited_task_group_captions.insert("5/6/2024".into(), true);

        kv.save_snapshot(&snap);
        assert_eq!(kv.load_snapshot(), snap);
    }

    #[test]
    fn non_sequence_task_entries_are_coerced() {
        let (_temp, kv) = temp_store();
        fs::create_dir_all(kv.root()).unwrap();
        fs::write(
            kv.root().join("tasks.json"),
            r#"{"1": [], "2": {"oops": true}, "3": 5}"#,
        )
        .unwrap();
        fs::write(kv.root().join("taskLists.json"), r#"{"5/6/2024": "x"}"#).unwrap();

        let tasks: BTreeMap<u64, Vec<TaskRecord>> = kv.load(KEY_TASKS, BTreeMap::new());
        assert_eq!(tasks.len(), 3);
        assert!(tasks.values().all(Vec::is_empty));
        let lists: BTreeMap<String, Vec<ListRef>> = kv.load(KEY_TASK_LISTS, BTreeMap::new());
        assert_eq!(lists["5/6/2024"], Vec::new());
    }

    #[test]
    fn non_object_tasks_falls_back() {
        let (_temp, kv) = temp_store();
        fs::create_dir_all(kv.root()).unwrap();
        fs::write(kv.root().join("tasks.json"), "null").unwrap();
        let tasks: BTreeMap<u64, Vec<TaskRecord>> = kv.load(KEY_TASKS, BTreeMap::new());
        assert!(tasks.is_empty());
    }

    #[test]
    fn integrity_check_flags_bad_tasks_entries() {
        let (_temp, kv) = temp_store();
        assert!(kv.tasks_namespace_intact());
        fs::create_dir_all(kv.root()).unwrap();
        fs::write(kv.root().join("tasks.json"), r#"{"1": []}"#).unwrap();
        assert!(kv.tasks_namespace_intact());
        fs::write(kv.root().join("tasks.json"), r#"{"1": [], "2": "broken"}"#).unwrap();
        assert!(!kv.tasks_namespace_intact());
    }

    #[test]
    fn wipe_removes_known_keys_only() {
        let (_temp, kv) = temp_store();
        kv.save_snapshot(&Snapshot::default());
        kv.save("theme", &"light");
        kv.wipe();
        for key in KNOWN_KEYS {
            assert!(kv.raw(key).is_none(), "{} survived", key);
        }
        assert_eq!(kv.load("theme", String::new()), "light");
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let (_temp, kv) = temp_store();
        kv.save(KEY_INCOMPLETE_COUNTS, &vec![1u32]);
        // a directory squatting on the temp path makes the write fail
        fs::create_dir_all(kv.root().join("incompleteCounts.json.tmp")).unwrap();
        kv.save(KEY_INCOMPLETE_COUNTS, &vec![2u32]);
        assert_eq!(kv.load(KEY_INCOMPLETE_COUNTS, Vec::<u32>::new()), vec![1]);
    }

    #[test]
    fn locate_prefers_explicit_then_project() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(temp.path().join(PROJECT_DIR)).unwrap();

        let found = locate_store(&nested, None).unwrap();
        assert_eq!(found.scope, StoreScope::Project);
        assert_eq!(found.path, temp.path().join(PROJECT_DIR));

        let explicit = locate_store(&nested, Some(temp.path().join("elsewhere"))).unwrap();
        assert_eq!(explicit.scope, StoreScope::Explicit);
    }
}
