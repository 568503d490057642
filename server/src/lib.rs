//! REST service for the todo list.
//!
//! # Overview
//! Serves `GET/POST /todo`, `GET/PUT/DELETE /todo/{id}` and a live
//! `GET /todo/events` stream over an injected `TodoStore`.
//!
//! # Design
//! - The router never owns a global collection; callers hand it an
//!   `Arc<dyn TodoStore>` (in-memory or JSON document file).
//! - DTOs are defined independently from the `todo-core` client crate;
//!   the client's integration tests catch schema drift.

pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod todo;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::{Config, StoreBackend};
pub use error::AppError;
pub use store::{DocumentStore, MemoryStore, StoreError, StoreEvent, TodoStore};
pub use todo::{Ack, Todo, TodoPatch};

pub fn app(store: Arc<dyn TodoStore>) -> Router {
    api::router(store)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run(listener: TcpListener, store: Arc<dyn TodoStore>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}
