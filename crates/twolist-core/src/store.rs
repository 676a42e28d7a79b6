//! The to-do store
//!
//! Owns the item snapshot and the current mode, mirrored to a [`Storage`]
//! backend under two keys. Every mutation builds the next snapshot, writes
//! it, and only then replaces the in-memory copy; a failed write leaves the
//! store exactly as it was.

use crate::config::LoadPolicy;
use crate::confirm::Confirm;
use crate::id::{IdClock, ItemId};
use crate::item::{Item, Mode, Todos};
use crate::storage::Storage;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

/// Storage key of the item map
pub const TODOS_KEY: &str = "@toDos";
/// Storage key of the selected mode
pub const MODE_KEY: &str = "@mode";

const DELETE_TITLE: &str = "Delete To Do?";
const DELETE_MESSAGE: &str = "Are you sure?";

/// Load the item map; a store that was never written is empty
pub fn load<S: Storage>(storage: &mut S, policy: LoadPolicy) -> Result<Todos> {
    Ok(read_blob(storage, TODOS_KEY, policy)?.unwrap_or_default())
}

/// Load the selected mode, `Work` if it was never written
pub fn load_mode<S: Storage>(storage: &mut S, policy: LoadPolicy) -> Result<Mode> {
    Ok(read_blob(storage, MODE_KEY, policy)?.unwrap_or_default())
}

/// Read and parse one blob
///
/// Absent, blank and `null` values all read as `None`.
fn read_blob<S, T>(storage: &mut S, key: &str, policy: LoadPolicy) -> Result<Option<T>>
where
    S: Storage,
    T: DeserializeOwned,
{
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => Ok(value),
        Err(source) => match policy {
            LoadPolicy::Strict => Err(Error::Parse {
                key: key.to_string(),
                source,
            }),
            LoadPolicy::Recover => {
                let backup = format!("{}.corrupt", key);
                warn!(key, %source, %backup, "stored value unreadable, starting empty");
                if let Err(e) = storage.set(&backup, &raw) {
                    error!(key, error = %e, "could not back up unreadable value");
                }
                Ok(None)
            }
        },
    }
}

/// Item map and mode, persisted on every change
pub struct TodoStore<S> {
    storage: S,
    todos: Todos,
    mode: Mode,
    clock: IdClock,
}

impl<S: Storage> TodoStore<S> {
    /// Load both keys from `storage`
    pub fn open(mut storage: S, policy: LoadPolicy) -> Result<Self> {
        let todos = load(&mut storage, policy)?;
        let mode = load_mode(&mut storage, policy)?;

        let mut clock = IdClock::new();
        if let Some(max) = todos.max_id() {
            clock.observe(max);
        }

        info!(items = todos.len(), %mode, "opened store");
        Ok(Self {
            storage,
            todos,
            mode,
            clock,
        })
    }

    pub fn todos(&self) -> &Todos {
        &self.todos
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.todos.get(id)
    }

    /// Currently selected mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Items of `mode`, in creation order; computed on every call
    pub fn visible_items(&self, mode: Mode) -> impl Iterator<Item = &Item> {
        self.todos.visible(mode)
    }

    /// (open, done) counts for `mode`
    pub fn counts(&self, mode: Mode) -> (usize, usize) {
        self.todos.counts(mode)
    }

    /// Write the current snapshot
    pub fn save(&mut self) -> Result<()> {
        write_blob(&mut self.storage, TODOS_KEY, &self.todos)
    }

    /// Add an item to `mode`
    ///
    /// Empty text is ignored and returns `None` without touching storage.
    pub fn add(&mut self, text: &str, mode: Mode) -> Result<Option<ItemId>> {
        if text.is_empty() {
            return Ok(None);
        }

        let id = self.clock.next().ok_or(Error::IdsExhausted)?;
        let mut next = self.todos.clone();
        next.insert(Item::new(id, text, mode));
        self.commit(next)?;

        debug!(%id, %mode, "added item");
        Ok(Some(id))
    }

    /// Delete an item once `confirm` agrees
    ///
    /// Returns false, without prompting, if the item does not exist, and
    /// false if the user declines.
    pub fn remove<C>(&mut self, id: ItemId, confirm: &mut C) -> Result<bool>
    where
        C: Confirm + ?Sized,
    {
        if !self.todos.contains(id) {
            return Ok(false);
        }
        if !confirm.confirm(DELETE_TITLE, DELETE_MESSAGE) {
            debug!(%id, "delete declined");
            return Ok(false);
        }

        let mut next = self.todos.clone();
        next.remove(id);
        self.commit(next)?;

        debug!(%id, "removed item");
        Ok(true)
    }

    /// Flip the done flag; false if the item does not exist
    pub fn toggle_done(&mut self, id: ItemId) -> Result<bool> {
        let mut next = self.todos.clone();
        if !next.toggle_done(id) {
            return Ok(false);
        }
        self.commit(next)?;

        debug!(%id, "toggled item");
        Ok(true)
    }

    /// Replace an item's text
    ///
    /// Empty text and unknown IDs are ignored.
    pub fn edit_text(&mut self, id: ItemId, text: &str) -> Result<bool> {
        let mut next = self.todos.clone();
        if !next.edit_text(id, text) {
            return Ok(false);
        }
        self.commit(next)?;

        debug!(%id, "edited item");
        Ok(true)
    }

    /// Select a mode and persist it
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        write_blob(&mut self.storage, MODE_KEY, &mode)?;
        self.mode = mode;
        debug!(%mode, "switched mode");
        Ok(())
    }

    fn commit(&mut self, next: Todos) -> Result<()> {
        write_blob(&mut self.storage, TODOS_KEY, &next)?;
        self.todos = next;
        Ok(())
    }
}

fn write_blob<S: Storage, T: Serialize>(storage: &mut S, key: &str, value: &T) -> Result<()> {
    let blob = serde_json::to_string(value)?;
    storage.set(key, &blob).inspect_err(|e| {
        error!(key, error = %e, "failed to persist");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::Answer;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    fn open_empty() -> TodoStore<MemoryStorage> {
        TodoStore::open(MemoryStorage::new(), LoadPolicy::Strict).unwrap()
    }

    fn visible_texts<S: Storage>(store: &TodoStore<S>, mode: Mode) -> Vec<(String, bool)> {
        store
            .visible_items(mode)
            .map(|i| (i.text().to_string(), i.is_done()))
            .collect()
    }

    #[test]
    fn test_first_run_is_empty_work() {
        let store = open_empty();
        assert!(store.todos().is_empty());
        assert_eq!(store.mode(), Mode::Work);
    }

    #[test]
    fn test_null_blobs_read_as_first_run() {
        let storage = MemoryStorage::new()
            .with(TODOS_KEY, "null")
            .with(MODE_KEY, "null");
        let store = TodoStore::open(storage, LoadPolicy::Strict).unwrap();
        assert!(store.todos().is_empty());
        assert_eq!(store.mode(), Mode::Work);
    }

    #[test]
    fn test_add_counts_only_its_mode() {
        let mut store = open_empty();
        store.add("one", Mode::Travel).unwrap();

        let work_before = store.visible_items(Mode::Work).count();
        let travel_before = store.visible_items(Mode::Travel).count();

        store.add("Buy milk", Mode::Work).unwrap();

        assert_eq!(store.visible_items(Mode::Work).count(), work_before + 1);
        assert_eq!(store.visible_items(Mode::Travel).count(), travel_before);
    }

    #[test]
    fn test_empty_add_is_noop() {
        let mut store = open_empty();
        store.add("x", Mode::Work).unwrap();
        let before = store.todos().clone();

        assert_eq!(store.add("", Mode::Work).unwrap(), None);
        assert_eq!(store.add("", Mode::Travel).unwrap(), None);
        assert_eq!(store.todos(), &before);
    }

    #[test]
    fn test_whitespace_add_counts() {
        let mut store = open_empty();
        let id = store.add(" ", Mode::Work).unwrap().unwrap();

        assert_eq!(store.visible_items(Mode::Work).count(), 1);
        assert_eq!(store.get(id).unwrap().text(), " ");
    }

    #[test]
    fn test_empty_add_writes_nothing() {
        let mut store = open_empty();
        store.add("", Mode::Work).unwrap();
        assert_eq!(store.storage().get(TODOS_KEY).unwrap(), None);
    }

    #[test]
    fn test_double_toggle_restores_done() {
        let mut store = open_empty();
        let id = store.add("Pay rent", Mode::Work).unwrap().unwrap();

        assert!(store.toggle_done(id).unwrap());
        assert!(store.get(id).unwrap().is_done());

        assert!(store.toggle_done(id).unwrap());
        assert!(!store.get(id).unwrap().is_done());
    }

    #[test]
    fn test_remove_twice() {
        let mut store = open_empty();
        let id = store.add("gone", Mode::Work).unwrap().unwrap();

        assert!(store.remove(id, &mut Answer::Yes).unwrap());
        let after_first = store.todos().clone();
        assert!(!store.remove(id, &mut Answer::Yes).unwrap());
        assert_eq!(store.todos(), &after_first);
    }

    #[test]
    fn test_declined_remove_keeps_item() {
        let mut store = open_empty();
        let id = store.add("keep me", Mode::Work).unwrap().unwrap();

        assert!(!store.remove(id, &mut Answer::No).unwrap());
        assert!(store.get(id).is_some());
    }

    #[test]
    fn test_remove_missing_does_not_prompt() {
        let mut store = open_empty();
        let mut asked = false;
        let mut prompt = |_: &str, _: &str| {
            asked = true;
            true
        };
        let removed = store
            .remove(ItemId::from_millis(1), &mut prompt)
            .unwrap();
        assert!(!removed);
        assert!(!asked);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = open_empty();
        store.add("a", Mode::Work).unwrap();
        let b = store.add("b", Mode::Travel).unwrap().unwrap();
        store.toggle_done(b).unwrap();
        store.save().unwrap();

        let expected = store.todos().clone();
        let mut storage = store.into_storage();
        assert_eq!(load(&mut storage, LoadPolicy::Strict).unwrap(), expected);
    }

    #[test]
    fn test_mode_switch_scenario() {
        let mut store = open_empty();
        store.add("Buy milk", Mode::Work).unwrap();
        assert_eq!(visible_texts(&store, Mode::Work), [("Buy milk".to_string(), false)]);

        store.set_mode(Mode::Travel).unwrap();
        assert!(visible_texts(&store, store.mode()).is_empty());

        store.set_mode(Mode::Work).unwrap();
        assert_eq!(
            visible_texts(&store, store.mode()),
            [("Buy milk".to_string(), false)]
        );
    }

    #[test]
    fn test_edit_scenario() {
        let mut store = open_empty();
        let id = store.add("Old name", Mode::Work).unwrap().unwrap();

        assert!(store.edit_text(id, "New name").unwrap());
        let item = store.get(id).unwrap();
        assert_eq!(item.id(), id);
        assert_eq!(item.text(), "New name");
        assert_eq!(item.mode(), Mode::Work);
        assert!(!item.is_done());

        assert!(!store.edit_text(id, "").unwrap());
        assert_eq!(store.get(id).unwrap().text(), "New name");
    }

    #[test]
    fn test_failed_write_keeps_memory() {
        let mut store = open_empty();
        let id = store.add("stable", Mode::Work).unwrap().unwrap();
        let before = store.todos().clone();

        store.storage_mut().set_fail_writes(true);
        assert!(store.add("lost", Mode::Work).is_err());
        assert!(store.toggle_done(id).is_err());
        assert!(store.edit_text(id, "changed").is_err());
        assert!(store.remove(id, &mut Answer::Yes).is_err());
        assert!(store.set_mode(Mode::Travel).is_err());

        assert_eq!(store.todos(), &before);
        assert_eq!(store.mode(), Mode::Work);

        store.storage_mut().set_fail_writes(false);
        assert!(store.toggle_done(id).unwrap());
    }

    #[test]
    fn test_ids_exceed_loaded_ids() {
        let future = u64::MAX / 4;
        let json = format!(r#"{{"{future}": {{"text": "later", "working": true, "done": false}}}}"#);
        let storage = MemoryStorage::new().with(TODOS_KEY, &json);
        let mut store = TodoStore::open(storage, LoadPolicy::Strict).unwrap();

        let id = store.add("next", Mode::Work).unwrap().unwrap();
        assert!(id.as_millis() > future);
        assert_eq!(store.todos().len(), 2);
    }

    #[test]
    fn test_add_after_largest_id_errors() {
        let json = format!(
            r#"{{"{}": {{"text": "end", "working": true, "done": false}}}}"#,
            u64::MAX
        );
        let storage = MemoryStorage::new().with(TODOS_KEY, &json);
        let mut store = TodoStore::open(storage, LoadPolicy::Strict).unwrap();
        let before = store.todos().clone();

        assert!(matches!(store.add("next", Mode::Work), Err(Error::IdsExhausted)));
        assert_eq!(store.todos(), &before);
        assert_eq!(
            store.storage().get(TODOS_KEY).unwrap().as_deref(),
            Some(json.as_str())
        );
    }

    #[test]
    fn test_malformed_strict() {
        let storage = MemoryStorage::new().with(TODOS_KEY, "{not json");
        let result = TodoStore::open(storage, LoadPolicy::Strict);
        assert!(matches!(result, Err(Error::Parse { ref key, .. }) if key == TODOS_KEY));
    }

    #[test]
    fn test_malformed_recover_backs_up() {
        let storage = MemoryStorage::new()
            .with(TODOS_KEY, "{not json")
            .with(MODE_KEY, "\"sideways\"");
        let store = TodoStore::open(storage, LoadPolicy::Recover).unwrap();

        assert!(store.todos().is_empty());
        assert_eq!(store.mode(), Mode::Work);
        assert_eq!(
            store.storage().get("@toDos.corrupt").unwrap().as_deref(),
            Some("{not json")
        );
        assert_eq!(
            store.storage().get("@mode.corrupt").unwrap().as_deref(),
            Some("\"sideways\"")
        );
    }

    #[test]
    fn test_recover_on_file_storage() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("toDos.json"), "{not json").unwrap();

        let mut store =
            TodoStore::open(FileStorage::new(dir.path()), LoadPolicy::Recover).unwrap();
        assert!(store.todos().is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("toDos.corrupt.json")).unwrap(),
            "{not json"
        );

        let id = store.add("fresh", Mode::Work).unwrap().unwrap();
        let store = TodoStore::open(FileStorage::new(dir.path()), LoadPolicy::Strict).unwrap();
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.get(id).unwrap().text(), "fresh");
        assert!(!dir.path().join("toDos.json.tmp").exists());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();

        let id = {
            let mut store =
                TodoStore::open(FileStorage::new(dir.path()), LoadPolicy::Strict).unwrap();
            let id = store.add("Lisbon", Mode::Travel).unwrap().unwrap();
            store.toggle_done(id).unwrap();
            store.set_mode(Mode::Travel).unwrap();
            id
        };

        let store = TodoStore::open(FileStorage::new(dir.path()), LoadPolicy::Strict).unwrap();
        assert_eq!(store.mode(), Mode::Travel);
        let item = store.get(id).unwrap();
        assert_eq!(item.text(), "Lisbon");
        assert_eq!(item.mode(), Mode::Travel);
        assert!(item.is_done());
    }
}
