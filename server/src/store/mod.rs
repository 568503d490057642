//! Persistence abstraction for todo records.
//!
//! # Design
//! Handlers only ever see `Arc<dyn TodoStore>`, so tests and the binary pick
//! a backend at construction time. Both backends refuse to create a record
//! whose id already exists and publish every successful mutation on a
//! broadcast channel that feeds the live `/todo/events` stream.

mod document;
mod memory;

pub use document::DocumentStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::todo::{Todo, TodoPatch};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo {0} already exists")]
    Conflict(String),

    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A change that has been applied to a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Created(Todo),
    Updated(Todo),
    Deleted(String),
}

#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    async fn get_all(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Insert a new record. Fails with `StoreError::Conflict` if the id is taken.
    async fn create(&self, todo: Todo) -> Result<(), StoreError>;

    /// Merge `patch` into the record. Returns `false` if `id` is unknown.
    async fn update(&self, id: &str, patch: TodoPatch) -> Result<bool, StoreError>;

    /// Remove the record. Returns `false` if `id` is unknown.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

#[derive(Debug)]
struct Notifier {
    tx: broadcast::Sender<StoreEvent>,
}

impl Notifier {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    fn publish(&self, event: StoreEvent) {
        // No receivers is the common case outside of live clients.
        let _ = self.tx.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
