//! The persisted half of the application: the task list and the privacy setting.
//!
//! [TaskManager] hydrates both values from a [KeyValueStore] once, and from then on writes them
//! back after every change. Nothing is written before hydration finished, otherwise the defaults
//! the manager starts with would clobber whatever was stored.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::storage::{
    entities::{decode_flag, decode_task_list, encode_flag, encode_task_list, Task},
    kv_store::KeyValueStore,
    PRIVACY_KEY, TASKS_KEY,
};

pub struct TaskManager<S> {
    store: S,
    tasks: Vec<Task>,
    privacy_mode: bool,
    ready: bool,
}

impl<S: KeyValueStore> TaskManager<S> {
    /// Creates a manager holding the defaults. Call [TaskManager::hydrate] before relying on its
    /// contents.
    pub fn new(store: S) -> Self {
        Self {
            store,
            tasks: vec![],
            privacy_mode: false,
            ready: false,
        }
    }

    /// Creates a manager and hydrates it from `store`.
    pub async fn load(store: S) -> Self {
        let mut manager = Self::new(store);
        manager.hydrate().await;
        manager
    }

    /// Reads the task list and the privacy flag. Both reads are issued together and any failure
    /// keeps the corresponding default. The manager is ready once both finished.
    pub async fn hydrate(&mut self) {
        let (tasks, privacy) = tokio::join!(
            self.store.get_item(TASKS_KEY),
            self.store.get_item(PRIVACY_KEY)
        );

        match tasks {
            Ok(Some(value)) if !value.is_empty() => {
                if let Some(tasks) = decode_task_list(&value) {
                    self.tasks = tasks;
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read stored tasks {e:?}"),
        }

        match privacy {
            Ok(Some(value)) if !value.is_empty() => self.privacy_mode = decode_flag(&value),
            Ok(_) => {}
            Err(e) => warn!("Failed to read stored privacy mode {e:?}"),
        }

        self.ready = true;
        debug!(
            "Hydrated {} tasks, privacy mode {}",
            self.tasks.len(),
            self.privacy_mode
        );
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn privacy_mode(&self) -> bool {
        self.privacy_mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends a task built from `text`. Returns `false` without touching anything when the
    /// text is blank.
    pub async fn add_task(&mut self, text: &str) -> bool {
        let Some(task) = Task::parse(text) else {
            debug!("Ignoring blank task");
            return false;
        };
        info!("Adding task {task}");
        self.tasks.push(task);
        self.persist_tasks().await;
        true
    }

    /// Removes the task at its current position. Positions shift after every removal, so callers
    /// must use indexes from the latest view of [TaskManager::tasks].
    pub async fn remove_task(&mut self, index: usize) -> Option<Task> {
        if index >= self.tasks.len() {
            debug!("Ignoring removal of missing task {index}");
            return None;
        }
        let task = self.tasks.remove(index);
        info!("Removed task {task}");
        self.persist_tasks().await;
        Some(task)
    }

    /// Flips privacy mode and returns the new value. Stored tasks are never purged; switching
    /// privacy off writes the current list so storage catches up with memory.
    pub async fn toggle_privacy(&mut self) -> bool {
        self.privacy_mode = !self.privacy_mode;
        info!("Privacy mode is now {}", self.privacy_mode);
        self.persist_privacy().await;
        if !self.privacy_mode {
            self.persist_tasks().await;
        }
        self.privacy_mode
    }

    async fn persist_tasks(&self) {
        if !self.ready {
            debug!("Skipping task write before hydration");
            return;
        }
        if self.privacy_mode {
            debug!("Privacy mode is on, tasks stay in memory");
            return;
        }
        let result = async {
            let value = encode_task_list(&self.tasks)?;
            self.store.set_item(TASKS_KEY, &value).await
        }
        .await;
        swallow_write_error(TASKS_KEY, result);
    }

    async fn persist_privacy(&self) {
        if !self.ready {
            debug!("Skipping privacy write before hydration");
            return;
        }
        let result = self
            .store
            .set_item(PRIVACY_KEY, encode_flag(self.privacy_mode))
            .await;
        swallow_write_error(PRIVACY_KEY, result);
    }
}

/// Writes are fire-and-forget. A failed write leaves storage behind until the next successful
/// write of the same key.
fn swallow_write_error(key: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Failed to write {key} {e:?}");
    }
}
