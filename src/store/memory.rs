use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use serde_json::Value;
use tracing::debug;

use super::{merge_patch, ChangeCallback, DocPatch, DocPath, DocumentStore, ListenerRegistry, Subscription};
use crate::errors::{FinanceError, Result};

/// In-process store; documents live for the lifetime of the value.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
    listeners: ListenerRegistry,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a document outright, as another session writing the whole
    /// document would.
    pub fn put(&self, path: &DocPath, document: Value) -> Result<()> {
        self.documents()?
            .insert(path.as_str().to_string(), document.clone());
        self.listeners.notify(path, Some(&document))
    }

    pub fn remove(&self, path: &DocPath) -> Result<()> {
        self.documents()?.remove(path.as_str());
        self.listeners.notify(path, None)
    }

    pub fn subscriber_count(&self, path: &DocPath) -> usize {
        self.listeners.subscriber_count(path)
    }

    fn documents(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>> {
        self.documents
            .lock()
            .map_err(|_| FinanceError::StorageError("memory store poisoned".into()))
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &DocPath) -> Result<Option<Value>> {
        Ok(self.documents()?.get(path.as_str()).cloned())
    }

    fn ensure_exists(&self, path: &DocPath, default: &Value) -> Result<bool> {
        let created = {
            let mut documents = self.documents()?;
            if documents.contains_key(path.as_str()) {
                false
            } else {
                documents.insert(path.as_str().to_string(), default.clone());
                true
            }
        };
        if created {
            debug!(%path, "document created with defaults");
            self.listeners.notify(path, Some(default))?;
        }
        Ok(created)
    }

    fn subscribe(&self, path: &DocPath, on_change: ChangeCallback) -> Result<Subscription> {
        let (subscription, callback) = self.listeners.register(path, on_change)?;
        let current = self.read(path)?;
        callback.deliver(current.as_ref());
        Ok(subscription)
    }

    fn patch(&self, path: &DocPath, patch: DocPatch) -> Result<()> {
        let updated = {
            let mut documents = self.documents()?;
            let document = documents
                .get_mut(path.as_str())
                .ok_or_else(|| FinanceError::DocumentNotFound(path.to_string()))?;
            merge_patch(document, patch)?;
            document.clone()
        };
        self.listeners.notify(path, Some(&updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn path() -> DocPath {
        DocPath::parse("users/u1/budget/model").unwrap()
    }

    #[test]
    fn ensure_exists_only_creates_once() {
        let store = MemoryStore::new();
        assert!(store.ensure_exists(&path(), &json!({"target": 1})).unwrap());
        assert!(!store.ensure_exists(&path(), &json!({"target": 2})).unwrap());
        assert_eq!(store.read(&path()).unwrap(), Some(json!({"target": 1})));
    }

    #[test]
    fn patching_a_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store.patch(&path(), DocPatch::new()).unwrap_err();
        assert!(matches!(err, FinanceError::DocumentNotFound(_)));
    }

    #[test]
    fn subscribers_see_initial_and_patched_documents() {
        let store = MemoryStore::new();
        store.ensure_exists(&path(), &json!({"target": 1})).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store
            .subscribe(
                &path(),
                Box::new(move |doc| sink.lock().unwrap().push(doc.cloned())),
            )
            .unwrap();

        let mut patch = DocPatch::new();
        patch.insert("target".into(), json!(7));
        store.patch(&path(), patch).unwrap();
        drop(subscription);
        store.put(&path(), json!({"target": 9})).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![Some(json!({"target": 1})), Some(json!({"target": 7}))]
        );
    }
}
