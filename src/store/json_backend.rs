use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::Value;
use tracing::{debug, info};

use super::{merge_patch, ChangeCallback, DocPatch, DocPath, DocumentStore, ListenerRegistry, Subscription};
use crate::{
    errors::{FinanceError, Result},
    utils::persistence::{read_json, write_json_atomic},
};

/// File-backed store: one pretty-printed JSON file per document under
/// `root`, e.g. `root/users/<uid>/budget/model.json`.
pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
    listeners: ListenerRegistry,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(root = %root.display(), "json document store opened");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            listeners: ListenerRegistry::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, path: &DocPath) -> PathBuf {
        let mut file = self.root.clone();
        for segment in path.segments() {
            file.push(segment);
        }
        file.set_extension("json");
        file
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| FinanceError::StorageError("json store write lock poisoned".into()))
    }
}

impl DocumentStore for JsonFileStore {
    fn read(&self, path: &DocPath) -> Result<Option<Value>> {
        read_json(&self.document_path(path))
    }

    fn ensure_exists(&self, path: &DocPath, default: &Value) -> Result<bool> {
        {
            let _guard = self.lock_writes()?;
            let file = self.document_path(path);
            if file.exists() {
                return Ok(false);
            }
            write_json_atomic(&file, default)?;
        }
        debug!(%path, "document created with defaults");
        self.listeners.notify(path, Some(default))?;
        Ok(true)
    }

    fn subscribe(&self, path: &DocPath, on_change: ChangeCallback) -> Result<Subscription> {
        let (subscription, callback) = self.listeners.register(path, on_change)?;
        let current = self.read(path)?;
        callback.deliver(current.as_ref());
        Ok(subscription)
    }

    fn patch(&self, path: &DocPath, patch: DocPatch) -> Result<()> {
        let updated = {
            let _guard = self.lock_writes()?;
            let file = self.document_path(path);
            let mut document =
                read_json(&file)?.ok_or_else(|| FinanceError::DocumentNotFound(path.to_string()))?;
            merge_patch(&mut document, patch)?;
            write_json_atomic(&file, &document)?;
            document
        };
        self.listeners.notify(path, Some(&updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn documents_map_to_nested_files() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let path = DocPath::parse("users/u1/budget/model").unwrap();
        store.ensure_exists(&path, &json!({"incomes": []})).unwrap();
        let file = dir.path().join("users/u1/budget/model.json");
        assert!(file.exists());
        assert_eq!(store.document_path(&path), file);
    }

    #[test]
    fn patches_persist_across_instances() {
        let dir = tempdir().unwrap();
        let path = DocPath::parse("users/u1/savings/model").unwrap();
        {
            let store = JsonFileStore::new(dir.path()).unwrap();
            store.ensure_exists(&path, &json!({"goals": []})).unwrap();
            let mut patch = DocPatch::new();
            patch.insert("goals".into(), json!([{"label": "Car"}]));
            store.patch(&path, patch).unwrap();
        }
        let reopened = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(
            reopened.read(&path).unwrap(),
            Some(json!({"goals": [{"label": "Car"}]}))
        );
    }

    #[test]
    fn corrupt_documents_surface_errors() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let path = DocPath::parse("users/u1/profile/setup").unwrap();
        let file = store.document_path(&path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "{not json").unwrap();
        assert!(matches!(store.read(&path), Err(FinanceError::Serde(_))));
    }
}
