//! Document store seam.
//!
//! Documents are JSON objects addressed by `/`-separated paths such as
//! `users/<uid>/budget/model`. Writes are last-write-wins shallow
//! merge-patches: each top-level key in a patch replaces the stored value
//! wholesale. Subscribers receive the full document after every committed
//! write.

pub mod json_backend;
pub mod memory;
pub mod user_doc;

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
pub use user_doc::UserDoc;

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, Weak},
};

use serde_json::{Map, Value};

use crate::errors::{FinanceError, Result};

/// Partial document: top-level fields to overwrite.
pub type DocPatch = Map<String, Value>;

/// Invoked with the current document, or `None` once it no longer exists.
pub type ChangeCallback = Box<dyn Fn(Option<&Value>) + Send + Sync>;

/// Abstraction over document persistence backends.
pub trait DocumentStore: Send + Sync {
    fn read(&self, path: &DocPath) -> Result<Option<Value>>;

    /// Creates the document with `default` unless it already exists.
    /// Returns true when it was created.
    fn ensure_exists(&self, path: &DocPath, default: &Value) -> Result<bool>;

    /// Registers `on_change`, immediately delivers the current document, and
    /// keeps delivering after each write until the handle is dropped.
    fn subscribe(&self, path: &DocPath, on_change: ChangeCallback) -> Result<Subscription>;

    /// Shallow-merges `patch` into an existing document.
    fn patch(&self, path: &DocPath, patch: DocPatch) -> Result<()>;
}

/// Validated document path with an even number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split('/').collect();
        let valid_segment =
            |s: &&str| !s.is_empty() && *s != "." && *s != ".." && !s.contains('\\');
        if segments.len() < 2 || segments.len() % 2 != 0 || !segments.iter().all(valid_segment) {
            return Err(FinanceError::InvalidPath(raw.to_string()));
        }
        Ok(DocPath(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl FromStr for DocPath {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self> {
        DocPath::parse(s)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applies a shallow merge-patch to `document`.
pub fn merge_patch(document: &mut Value, patch: DocPatch) -> Result<()> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| FinanceError::StorageError("document is not an object".into()))?;
    object.extend(patch);
    Ok(())
}

type SharedCallback = Arc<ChangeCallback>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_path: HashMap<String, Vec<(u64, SharedCallback)>>,
}

/// Subscriber bookkeeping shared by the backends.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: &DocPath, callback: ChangeCallback) -> Result<(Subscription, SharedCallbackHandle)> {
        let mut listeners = self.lock()?;
        listeners.next_id += 1;
        let id = listeners.next_id;
        let callback: SharedCallback = Arc::new(callback);
        listeners
            .by_path
            .entry(path.as_str().to_string())
            .or_default()
            .push((id, Arc::clone(&callback)));
        let subscription = Subscription {
            id,
            path: path.as_str().to_string(),
            registry: Arc::downgrade(&self.inner),
        };
        Ok((subscription, SharedCallbackHandle(callback)))
    }

    /// Delivers `document` to every subscriber of `path`. Callbacks run
    /// outside the registry lock.
    pub fn notify(&self, path: &DocPath, document: Option<&Value>) -> Result<()> {
        let callbacks: Vec<SharedCallback> = {
            let listeners = self.lock()?;
            listeners
                .by_path
                .get(path.as_str())
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(document);
        }
        Ok(())
    }

    pub fn subscriber_count(&self, path: &DocPath) -> usize {
        self.lock()
            .map(|listeners| listeners.by_path.get(path.as_str()).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Listeners>> {
        self.inner
            .lock()
            .map_err(|_| FinanceError::StorageError("listener registry poisoned".into()))
    }
}

/// Callback returned from registration so the backend can deliver the
/// initial snapshot.
pub struct SharedCallbackHandle(SharedCallback);

impl SharedCallbackHandle {
    pub fn deliver(&self, document: Option<&Value>) {
        (self.0)(document);
    }
}

/// Live subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    path: String,
    registry: Weak<Mutex<Listeners>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut listeners) = registry.lock() else {
            return;
        };
        if let Some(entries) = listeners.by_path.get_mut(&self.path) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                listeners.by_path.remove(&self.path);
            }
        }
    }
}
