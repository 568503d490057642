//! Command-line and environment configuration for the server binary.

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, ValueEnum};

use crate::store::{DocumentStore, MemoryStore, StoreError, TodoStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Ephemeral, lost on restart.
    Memory,
    /// JSON document file, newest first.
    Document,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "todo-server", about = "REST API for the todo list")]
pub struct Config {
    #[arg(long, env = "TODO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "TODO_STORE", value_enum, default_value_t = StoreBackend::Memory)]
    pub store: StoreBackend,

    /// Collection file used by the document backend.
    #[arg(long, env = "TODO_DATA_FILE", default_value = "todos.json")]
    pub data_file: PathBuf,

    /// Start the memory backend with sample todos.
    #[arg(long, env = "TODO_SEED")]
    pub seed: bool,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn open_store(&self) -> Result<Arc<dyn TodoStore>, StoreError> {
        let store: Arc<dyn TodoStore> = match self.store {
            StoreBackend::Memory if self.seed => Arc::new(MemoryStore::seeded()),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Document => Arc::new(DocumentStore::open(&self.data_file).await?),
        };
        Ok(store)
    }
}
