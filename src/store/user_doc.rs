use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{DocPatch, DocPath, DocumentStore, Subscription};
use crate::errors::{FinanceError, Result};

struct DocState<T> {
    data: Option<T>,
    raw: Option<Value>,
    /// Why the latest snapshot failed to type, if it did.
    unreadable: Option<String>,
    ready: bool,
}

/// Live, typed view of one user document.
///
/// Opening ensures the document exists with `defaults` and subscribes to it.
/// When the store fails the handle falls back to `defaults` and still
/// reports ready; the failure is only logged. Without a path (no signed-in
/// user) the handle stays empty and updates are no-ops.
///
/// A snapshot that does not deserialize as `T` leaves [`data`](Self::data)
/// empty and blocks [`update`](Self::update) until a readable snapshot
/// arrives, so callers that read-modify-write never persist defaults over
/// stored records.
pub struct UserDoc<T> {
    store: Arc<dyn DocumentStore>,
    path: Option<DocPath>,
    defaults: T,
    state: Arc<Mutex<DocState<T>>>,
    _subscription: Option<Subscription>,
}

impl<T> UserDoc<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn open(store: Arc<dyn DocumentStore>, path: Option<DocPath>, defaults: T) -> Self {
        let state = Arc::new(Mutex::new(DocState {
            data: None,
            raw: None,
            unreadable: None,
            ready: false,
        }));
        let mut doc = Self {
            store,
            path,
            defaults,
            state,
            _subscription: None,
        };
        if let Some(path) = doc.path.clone() {
            match doc.connect(&path) {
                Ok(subscription) => doc._subscription = Some(subscription),
                Err(err) => {
                    warn!(%path, error = %err, "document unavailable, using defaults");
                    doc.fall_back_to_defaults();
                }
            }
        }
        doc
    }

    fn connect(&self, path: &DocPath) -> Result<Subscription> {
        let default_json = serde_json::to_value(&self.defaults)?;
        if self.store.ensure_exists(path, &default_json)? {
            info!(%path, "document initialised");
        }

        let state = Arc::clone(&self.state);
        let watched = path.clone();
        self.store.subscribe(
            path,
            Box::new(move |document| {
                let Ok(mut state) = state.lock() else {
                    return;
                };
                state.ready = true;
                state.raw = document.cloned();
                let typed = document.map(|value| serde_json::from_value::<T>(value.clone()));
                let (data, unreadable) = match typed {
                    Some(Ok(data)) => (Some(data), None),
                    Some(Err(err)) => {
                        warn!(path = %watched, error = %err, "unreadable document, writes blocked");
                        (None, Some(err.to_string()))
                    }
                    None => (None, None),
                };
                state.data = data;
                state.unreadable = unreadable;
            }),
        )
    }

    fn fall_back_to_defaults(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.data = Some(self.defaults.clone());
            state.raw = serde_json::to_value(&self.defaults).ok();
            state.ready = true;
        }
    }

    pub fn path(&self) -> Option<&DocPath> {
        self.path.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().map(|s| s.ready).unwrap_or(false)
    }

    /// False while the stored document does not deserialize.
    pub fn is_readable(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.unreadable.is_none())
            .unwrap_or(false)
    }

    /// Latest document, `None` before the first snapshot or after deletion.
    pub fn data(&self) -> Option<T> {
        self.state.lock().ok().and_then(|s| s.data.clone())
    }

    pub fn data_or_default(&self) -> T {
        self.data().unwrap_or_else(|| self.defaults.clone())
    }

    /// Latest document as stored, before typing.
    pub fn raw(&self) -> Option<Value> {
        self.state.lock().ok().and_then(|s| s.raw.clone())
    }

    pub fn defaults(&self) -> &T {
        &self.defaults
    }

    /// Merge-patches the document. A no-op without a path; refused while
    /// the stored document is unreadable.
    pub fn update(&self, patch: DocPatch) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if patch.is_empty() {
            return Ok(());
        }
        let unreadable = self
            .state
            .lock()
            .map_err(|_| FinanceError::StorageError("document state poisoned".into()))?
            .unreadable
            .clone();
        if let Some(reason) = unreadable {
            return Err(FinanceError::UnreadableDocument {
                path: path.to_string(),
                reason,
            });
        }
        self.store.patch(path, patch)
    }

    /// Overwrites every field of the document with `value`.
    pub fn replace_fields(&self, value: &T) -> Result<()> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => self.update(fields),
            _ => Err(FinanceError::InvalidInput(
                "document must serialize to an object".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(default)]
        count: u32,
    }

    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn read(&self, _: &DocPath) -> Result<Option<Value>> {
            Err(FinanceError::StorageError("offline".into()))
        }
        fn ensure_exists(&self, _: &DocPath, _: &Value) -> Result<bool> {
            Err(FinanceError::StorageError("offline".into()))
        }
        fn subscribe(&self, _: &DocPath, _: super::super::ChangeCallback) -> Result<Subscription> {
            Err(FinanceError::StorageError("offline".into()))
        }
        fn patch(&self, _: &DocPath, _: DocPatch) -> Result<()> {
            Err(FinanceError::StorageError("offline".into()))
        }
    }

    fn path() -> Option<DocPath> {
        Some(DocPath::parse("users/u1/counter/model").unwrap())
    }

    #[test]
    fn open_creates_and_tracks_updates() {
        let store = Arc::new(MemoryStore::new());
        let doc = UserDoc::open(store.clone(), path(), Counter { count: 1 });
        assert!(doc.is_ready());
        assert_eq!(doc.data(), Some(Counter { count: 1 }));

        let mut patch = DocPatch::new();
        patch.insert("count".into(), json!(4));
        doc.update(patch).unwrap();
        assert_eq!(doc.data(), Some(Counter { count: 4 }));
    }

    #[test]
    fn store_failures_fall_back_to_ready_defaults() {
        let doc = UserDoc::open(Arc::new(BrokenStore), path(), Counter { count: 3 });
        assert!(doc.is_ready());
        assert_eq!(doc.data(), Some(Counter { count: 3 }));
        assert!(doc.update(DocPatch::from_iter([("count".to_string(), json!(1))])).is_err());
    }

    #[test]
    fn no_path_means_no_writes() {
        let store = Arc::new(MemoryStore::new());
        let doc = UserDoc::open(store, None, Counter::default());
        assert!(!doc.is_ready());
        assert_eq!(doc.data(), None);
        assert!(doc.update(DocPatch::from_iter([("count".to_string(), json!(1))])).is_ok());
    }

    #[test]
    fn unreadable_documents_block_writes_until_fixed() {
        let store = Arc::new(MemoryStore::new());
        let p = path().unwrap();
        store.put(&p, json!({"count": "many"})).unwrap();
        let doc = UserDoc::open(store.clone(), Some(p.clone()), Counter { count: 2 });
        assert!(doc.is_ready());
        assert!(!doc.is_readable());
        assert_eq!(doc.data(), None);
        assert_eq!(doc.data_or_default(), Counter { count: 2 });
        assert_eq!(doc.raw(), Some(json!({"count": "many"})));

        let err = doc.replace_fields(&Counter { count: 9 }).unwrap_err();
        assert!(matches!(err, FinanceError::UnreadableDocument { .. }));
        assert_eq!(store.read(&p).unwrap(), Some(json!({"count": "many"})));

        store.put(&p, json!({"count": 5})).unwrap();
        assert!(doc.is_readable());
        assert_eq!(doc.data(), Some(Counter { count: 5 }));
        doc.replace_fields(&Counter { count: 6 }).unwrap();
        assert_eq!(doc.data(), Some(Counter { count: 6 }));
    }
}
