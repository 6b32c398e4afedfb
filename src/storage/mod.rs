//! Persistent state is kept in a small key-value store with string keys and string values.
//!  - [kv_store::KeyValueStore] abstracts the store so the rest of the application (and tests)
//!    never touch the filesystem directly.
//!  - [kv_store::FileStore] keeps one file per key inside the storage directory.
//!  - [entities] describes how values are encoded inside the store.

pub mod entities;
pub mod kv_store;

/// Key of the JSON encoded task list.
pub const TASKS_KEY: &str = "divergify:tasks";
/// Key of the privacy ("Tin Foil Hat") flag, stored as `1` or `0`.
pub const PRIVACY_KEY: &str = "divergify:tinfoil";
/// Key of the last time the application went to the background, in epoch milliseconds.
pub const LAST_BACKGROUND_KEY: &str = "divergify:last_bg_time";

/// Name of the directory inside the application directory that holds the store.
pub const STORAGE_DIR: &str = "storage";
