//! REST handlers for the `/todo` resource.
//!
//! Request bodies are taken as raw bytes and decoded here, so a body that is
//! not JSON (or has no content type) gets the same 400 as one with missing
//! fields instead of axum's default rejection statuses.

use std::{convert::Infallible, sync::Arc};

use async_stream::stream;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::store::TodoStore;
use crate::todo::{Ack, Todo, TodoPayload};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

pub fn router(store: Arc<dyn TodoStore>) -> Router {
    Router::new()
        .route("/todo", get(list_todos).post(create_todo))
        .route("/todo/events", get(stream_todos))
        .route(
            "/todo/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(AppState { store })
}

fn parse_payload(body: &Bytes) -> Result<TodoPayload, AppError> {
    serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "rejected request body");
        AppError::InvalidJson
    })
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(state.store.get_all().await?))
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    state
        .store
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Ack>), AppError> {
    let todo = parse_payload(&body)?
        .into_new_todo()
        .map_err(AppError::MissingFields)?;

    if state.store.exists(&todo.id).await? {
        warn!(id = %todo.id, "create rejected: id already exists");
        return Err(AppError::Conflict);
    }
    let id = todo.id.clone();
    state.store.create(todo).await?;

    info!(%id, "todo created");
    Ok((StatusCode::CREATED, Json(Ack::ok())))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Ack>, AppError> {
    let patch = parse_payload(&body)?
        .into_patch()
        .map_err(AppError::MissingFields)?;

    if !state.store.update(&id, patch).await? {
        return Err(AppError::NotFound);
    }
    info!(%id, "todo updated");
    Ok(Json(Ack::ok()))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, AppError> {
    if !state.store.delete(&id).await? {
        return Err(AppError::NotFound);
    }
    info!(%id, "todo deleted");
    Ok(Json(Ack::ok()))
}

/// Server-sent events: a `snapshot` of the whole collection on connect and
/// after every store change.
async fn stream_todos(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the first read so no change can slip in between.
    let mut changes = state.store.subscribe();
    let store = state.store;

    let events = stream! {
        loop {
            match store.get_all().await {
                Ok(todos) => match Event::default().event("snapshot").json_data(&todos) {
                    Ok(event) => yield Ok(event),
                    Err(err) => warn!(error = %err, "failed to encode snapshot"),
                },
                Err(err) => warn!(error = %err, "failed to read snapshot"),
            }

            match changes.recv().await {
                Ok(change) => debug!(?change, "pushing snapshot"),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live subscriber lagged, resending snapshot");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
