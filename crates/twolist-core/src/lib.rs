//! twolist-core: Core library for twolist
//!
//! Two independent to-do lists ("Work" and "Travel") kept in one item map,
//! persisted as JSON blobs in a key-value store. No daemon, no database.

pub mod config;
pub mod confirm;
pub mod error;
pub mod id;
pub mod item;
pub mod storage;
pub mod store;

pub use config::{Config, LoadPolicy};
pub use confirm::{Answer, Confirm};
pub use error::Error;
pub use id::{IdClock, ItemId};
pub use item::{Item, Mode, Todos};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::TodoStore;

/// Result type for twolist operations
pub type Result<T> = std::result::Result<T, Error>;
