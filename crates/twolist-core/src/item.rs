//! Item data model for twolist
//!
//! Persisted layout, one entry per item keyed by ID:
//! `{ "<id>": { "text": "...", "working": true, "done": false } }`.

use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the two lists an item belongs to
///
/// Stored as a boolean (`true` = Work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Mode {
    #[default]
    Work,
    Travel,
}

impl Mode {
    pub fn is_work(&self) -> bool {
        matches!(self, Mode::Work)
    }

    /// The other list
    pub fn toggled(&self) -> Self {
        match self {
            Mode::Work => Mode::Travel,
            Mode::Travel => Mode::Work,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::Travel => "Travel",
        }
    }

    /// Hint shown in an empty input line
    pub fn placeholder(&self) -> &'static str {
        match self {
            Mode::Work => "Add a To Do",
            Mode::Travel => "Where do you want to go?",
        }
    }
}

impl From<bool> for Mode {
    fn from(working: bool) -> Self {
        if working { Mode::Work } else { Mode::Travel }
    }
}

impl From<Mode> for bool {
    fn from(mode: Mode) -> Self {
        mode.is_work()
    }
}

impl std::str::FromStr for Mode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "work" | "w" => Ok(Mode::Work),
            "travel" | "t" => Ok(Mode::Travel),
            _ => Err(crate::Error::InvalidMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Work => write!(f, "work"),
            Mode::Travel => write!(f, "travel"),
        }
    }
}

/// A single to-do entry
///
/// `id` and `mode` are fixed at construction; only `text` and `done` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    text: String,
    #[serde(rename = "working")]
    mode: Mode,
    done: bool,
}

impl Item {
    pub fn new(id: ItemId, text: impl Into<String>, mode: Mode) -> Self {
        Self {
            id,
            text: text.into(),
            mode,
            done: false,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.done { "x" } else { " " };
        write!(f, "{} [{}] [{}] {}", self.id, mark, self.mode, self.text)
    }
}

/// Wire form of an item; the ID lives in the map key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoRecord {
    pub text: String,
    pub working: bool,
    #[serde(default)]
    pub done: bool,
}

/// Snapshot of every item, keyed and ordered by ID (creation order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ItemId, TodoRecord>",
    into = "BTreeMap<ItemId, TodoRecord>"
)]
pub struct Todos {
    items: BTreeMap<ItemId, Item>,
}

impl From<BTreeMap<ItemId, TodoRecord>> for Todos {
    fn from(records: BTreeMap<ItemId, TodoRecord>) -> Self {
        let items = records
            .into_iter()
            .map(|(id, record)| {
                let item = Item {
                    id,
                    text: record.text,
                    mode: Mode::from(record.working),
                    done: record.done,
                };
                (id, item)
            })
            .collect();
        Self { items }
    }
}

impl From<Todos> for BTreeMap<ItemId, TodoRecord> {
    fn from(todos: Todos) -> Self {
        todos
            .items
            .into_values()
            .map(|item| {
                let record = TodoRecord {
                    text: item.text,
                    working: item.mode.is_work(),
                    done: item.done,
                };
                (item.id, record)
            })
            .collect()
    }
}

impl Todos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// All items in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Items belonging to `mode`, in creation order
    pub fn visible(&self, mode: Mode) -> impl Iterator<Item = &Item> {
        self.items.values().filter(move |item| item.mode == mode)
    }

    /// (open, done) counts for `mode`
    pub fn counts(&self, mode: Mode) -> (usize, usize) {
        self.visible(mode).fold((0, 0), |(open, done), item| {
            if item.done {
                (open, done + 1)
            } else {
                (open + 1, done)
            }
        })
    }

    pub fn max_id(&self) -> Option<ItemId> {
        self.items.keys().next_back().copied()
    }

    /// Insert an item, replacing any item with the same ID
    pub fn insert(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.items.remove(&id)
    }

    /// Flip `done`; false if the ID is absent
    pub fn toggle_done(&mut self, id: ItemId) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                item.done = !item.done;
                true
            }
            None => false,
        }
    }

    /// Replace the text; false if the ID is absent or the text is empty
    pub fn edit_text(&mut self, id: ItemId, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.items.get_mut(&id) {
            Some(item) => {
                item.text = text.to_string();
                true
            }
            None => false,
        }
    }
}
