use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::{Notifier, StoreError, StoreEvent, TodoStore};
use crate::todo::{Todo, TodoPatch};

/// Ephemeral store that keeps todos in insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    todos: RwLock<Vec<Todo>>,
    notifier: Notifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_todos(Vec::new())
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: RwLock::new(todos),
            notifier: Notifier::new(),
        }
    }

    /// A store holding one open and one completed sample todo.
    pub fn seeded() -> Self {
        Self::with_todos(vec![
            Todo::new("Learn axum", false),
            Todo::new("Build a todo app", true),
        ])
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.todos.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().find(|todo| todo.id == id).cloned())
    }

    async fn create(&self, todo: Todo) -> Result<(), StoreError> {
        let mut todos = self.todos.write().await;
        if todos.iter().any(|existing| existing.id == todo.id) {
            return Err(StoreError::Conflict(todo.id));
        }
        todos.push(todo.clone());
        drop(todos);

        debug!(id = %todo.id, "memory store: created");
        self.notifier.publish(StoreEvent::Created(todo));
        Ok(())
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<bool, StoreError> {
        let mut todos = self.todos.write().await;
        let Some(todo) = todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(false);
        };
        patch.apply(todo);
        let updated = todo.clone();
        drop(todos);

        debug!(%id, "memory store: updated");
        self.notifier.publish(StoreEvent::Updated(updated));
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut todos = self.todos.write().await;
        let Some(index) = todos.iter().position(|todo| todo.id == id) else {
            return Ok(false);
        };
        todos.remove(index);
        drop(todos);

        debug!(%id, "memory store: deleted");
        self.notifier.publish(StoreEvent::Deleted(id.to_string()));
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, text: &str) -> Todo {
        Todo {
            id: id.to_string(),
            text: text.to_string(),
            is_completed: false,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_list_returns_record_intact() {
        let store = MemoryStore::new();
        store.create(todo("1", "Buy milk")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all, vec![todo("1", "Buy milk")]);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryStore::new();
        store.create(todo("b", "second")).await.unwrap();
        store.create(todo("a", "first")).await.unwrap();

        let ids: Vec<_> = store.get_all().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_and_keeps_original() {
        let store = MemoryStore::new();
        store.create(todo("1", "Buy milk")).await.unwrap();

        let err = store.create(todo("1", "Sell milk")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "1"));
        assert_eq!(
            store.find_by_id("1").await.unwrap().unwrap().text,
            "Buy milk"
        );
    }

    #[tokio::test]
    async fn update_unknown_id_changes_nothing() {
        let store = MemoryStore::with_todos(vec![todo("1", "Buy milk")]);
        let patch = TodoPatch {
            text: Some("Nope".to_string()),
            is_completed: Some(true),
        };

        assert!(!store.update("2", patch).await.unwrap());
        assert_eq!(store.get_all().await.unwrap(), vec![todo("1", "Buy milk")]);
    }

    #[tokio::test]
    async fn update_completion_leaves_other_fields() {
        let store = MemoryStore::with_todos(vec![todo("1", "Buy milk")]);
        let patch = TodoPatch {
            text: None,
            is_completed: Some(true),
        };

        assert!(store.update("1", patch).await.unwrap());
        let updated = store.find_by_id("1").await.unwrap().unwrap();
        assert!(updated.is_completed);
        assert_eq!(updated.text, "Buy milk");
        assert_eq!(updated.created_at, "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn delete_twice_reports_missing_second_time() {
        let store = MemoryStore::with_todos(vec![todo("1", "Buy milk")]);

        assert!(store.delete("1").await.unwrap());
        assert!(!store.exists("1").await.unwrap());
        assert!(!store.delete("1").await.unwrap());
    }

    #[tokio::test]
    async fn mutations_are_published() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        store.create(todo("1", "Buy milk")).await.unwrap();
        store.delete("1").await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Created(todo("1", "Buy milk"))
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Deleted("1".to_string())
        );
    }

    #[tokio::test]
    async fn seeded_store_has_open_and_done_items() {
        let all = MemoryStore::seeded().get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all[0].is_completed);
        assert!(all[1].is_completed);
    }
}
