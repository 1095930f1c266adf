//! Keyed pool of background tasks, at most one live task per key.

use std::collections::HashMap;

use tokio::task::JoinHandle;

/// Clone and update work runs on blocking worker threads; the single
/// coordinator drains results by key, in whatever order it wants.
///
/// Submitting a key that is already in flight (or whose result was never
/// drained) evicts the previous task.
#[derive(Debug)]
pub struct TaskPool<T> {
    tasks: HashMap<String, JoinHandle<T>>,
}

impl<T> Default for TaskPool<T> {
    fn default() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }
}

impl<T: Send + 'static> TaskPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` on a blocking worker thread under `key`.
    pub fn defer<F>(&mut self, key: &str, task: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(task);
        if let Some(prior) = self.tasks.insert(key.to_string(), handle) {
            prior.abort();
        }
    }

    /// Remove and return the pending task for `key`, if any. Awaiting the
    /// returned handle consumes the future.
    pub fn take(&mut self, key: &str) -> Option<JoinHandle<T>> {
        self.tasks.remove(key)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
