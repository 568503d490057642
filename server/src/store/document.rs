use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::{Notifier, StoreError, StoreEvent, TodoStore};
use crate::todo::{Todo, TodoPatch};

/// Document collection persisted as a JSON array.
///
/// Reads are ordered newest first by `createdAt`. Every mutation is applied
/// to a copy of the collection, written to `<file>.tmp`, synced and renamed
/// over the data file; the in-memory copy only changes once the write has
/// succeeded.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    docs: RwLock<BTreeMap<String, Todo>>,
    notifier: Notifier,
}

impl DocumentStore {
    /// Load the collection at `path`. A missing file is an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let docs = match fs::read(&path).await {
            Ok(bytes) => {
                let todos: Vec<Todo> = serde_json::from_slice(&bytes)?;
                let records = todos.len();
                let docs: BTreeMap<String, Todo> =
                    todos.into_iter().map(|todo| (todo.id.clone(), todo)).collect();
                if docs.len() < records {
                    warn!(
                        path = %path.display(),
                        duplicates = records - docs.len(),
                        "document repeats todo ids; keeping the last record for each"
                    );
                }
                docs
            }
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), count = docs.len(), "document store opened");

        Ok(Self {
            path,
            docs: RwLock::new(docs),
            notifier: Notifier::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set-by-id write: inserts or overwrites without a conflict check.
    ///
    /// The HTTP layer does not use this; `create` is the conflict-checked path.
    pub async fn upsert(&self, todo: Todo) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let mut next = docs.clone();
        let existed = next.insert(todo.id.clone(), todo.clone()).is_some();
        self.persist(&next).await?;
        *docs = next;
        drop(docs);

        let event = if existed {
            StoreEvent::Updated(todo)
        } else {
            StoreEvent::Created(todo)
        };
        self.notifier.publish(event);
        Ok(())
    }

    async fn persist(&self, docs: &BTreeMap<String, Todo>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let snapshot: Vec<&Todo> = docs.values().collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), count = docs.len(), "document store persisted");
        Ok(())
    }
}

#[async_trait]
impl TodoStore for DocumentStore {
    async fn get_all(&self) -> Result<Vec<Todo>, StoreError> {
        let docs = self.docs.read().await;
        let mut todos: Vec<Todo> = docs.values().cloned().collect();
        // Stable sort keeps id order among equal timestamps.
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn create(&self, todo: Todo) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&todo.id) {
            return Err(StoreError::Conflict(todo.id));
        }
        let mut next = docs.clone();
        next.insert(todo.id.clone(), todo.clone());
        self.persist(&next).await?;
        *docs = next;
        drop(docs);

        self.notifier.publish(StoreEvent::Created(todo));
        Ok(())
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        let mut next = docs.clone();
        let Some(todo) = next.get_mut(id) else {
            return Ok(false);
        };
        patch.apply(todo);
        let updated = todo.clone();
        self.persist(&next).await?;
        *docs = next;
        drop(docs);

        self.notifier.publish(StoreEvent::Updated(updated));
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        if !docs.contains_key(id) {
            return Ok(false);
        }
        let mut next = docs.clone();
        next.remove(id);
        self.persist(&next).await?;
        *docs = next;
        drop(docs);

        self.notifier.publish(StoreEvent::Deleted(id.to_string()));
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn todo(id: &str, created_at: &str) -> Todo {
        Todo {
            id: id.to_string(),
            text: format!("todo {id}"),
            is_completed: false,
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("todos.json")).await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn repeated_ids_keep_last_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let mut second = todo("1", "2024-01-01T00:00:00.000Z");
        second.text = "Buy oat milk".to_string();
        let records = vec![
            todo("1", "2024-01-01T00:00:00.000Z"),
            todo("2", "2024-01-02T00:00:00.000Z"),
            second.clone(),
        ];
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let store = DocumentStore::open(&path).await.unwrap();
        assert_eq!(
            store.get_all().await.unwrap(),
            vec![todo("2", "2024-01-02T00:00:00.000Z"), second]
        );
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("todos.json")).await.unwrap();
        store.create(todo("a", "2024-01-01T00:00:00.000Z")).await.unwrap();
        store.create(todo("b", "2024-03-01T00:00:00.000Z")).await.unwrap();
        store.create(todo("c", "2024-02-01T00:00:00.000Z")).await.unwrap();

        let ids: Vec<_> = store.get_all().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("todos.json");
        {
            let store = DocumentStore::open(&path).await.unwrap();
            store.create(todo("1", "2024-01-01T00:00:00.000Z")).await.unwrap();
            store.create(todo("2", "2024-01-02T00:00:00.000Z")).await.unwrap();
            store.delete("2").await.unwrap();
        }

        let reopened = DocumentStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get_all().await.unwrap(),
            vec![todo("1", "2024-01-01T00:00:00.000Z")]
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn create_conflicts_but_upsert_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("todos.json")).await.unwrap();
        store.create(todo("1", "2024-01-01T00:00:00.000Z")).await.unwrap();

        let mut replacement = todo("1", "2024-01-01T00:00:00.000Z");
        replacement.text = "replaced".to_string();
        assert!(matches!(
            store.create(replacement.clone()).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.find_by_id("1").await.unwrap().unwrap().text, "todo 1");

        store.upsert(replacement).await.unwrap();
        assert_eq!(store.find_by_id("1").await.unwrap().unwrap().text, "replaced");
    }

    #[tokio::test]
    async fn update_and_delete_report_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("todos.json")).await.unwrap();

        assert!(!store.update("nope", TodoPatch::default()).await.unwrap());
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = DocumentStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
