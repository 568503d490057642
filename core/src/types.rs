//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item as the API returns it. Also the body of `POST /todo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    #[serde(alias = "todo")]
    pub text: String,
    pub is_completed: bool,
    pub created_at: String,
}

impl Todo {
    /// A fresh, open todo with a random id and the current UTC timestamp.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed: false,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Body of `PUT /todo/{id}`. The server requires all three fields and
/// ignores `created_at`, so callers send back the value they loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    pub text: String,
    pub is_completed: bool,
    pub created_at: String,
}

impl UpdateTodo {
    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            text: todo.text.clone(),
            is_completed: todo.is_completed,
            created_at: todo.created_at.clone(),
        }
    }
}

/// `{"success": true}` acknowledgement from mutating routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
}

/// `{"error": "..."}` body of failed requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
