//! Wire and storage types for todo records.
//!
//! # Design
//! `Todo` is both the stored record and the JSON shape returned by the API.
//! Request bodies go through `TodoPayload` instead, whose fields are all
//! optional so a handler can report every missing field at once rather than
//! failing on the first one.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    #[serde(alias = "todo")]
    pub text: String,
    pub is_completed: bool,
    pub created_at: String,
}

impl Todo {
    /// Build a todo with a store-assigned id and the current timestamp.
    pub fn new(text: impl Into<String>, is_completed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed,
            created_at: now_timestamp(),
        }
    }
}

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fields merged into an existing todo by `TodoStore::update`.
///
/// There is no `created_at`; it is fixed at creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub is_completed: Option<bool>,
}

impl TodoPatch {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(text) = self.text {
            todo.text = text;
        }
        if let Some(is_completed) = self.is_completed {
            todo.is_completed = is_completed;
        }
    }
}

/// Body of `POST /todo` and `PUT /todo/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    pub id: Option<String>,
    #[serde(alias = "todo")]
    pub text: Option<String>,
    pub is_completed: Option<bool>,
    pub created_at: Option<String>,
}

impl TodoPayload {
    /// Validate a creation body. All four fields are required.
    pub fn into_new_todo(self) -> Result<Todo, Vec<&'static str>> {
        let mut missing = Vec::new();
        if !present(&self.id) {
            missing.push("id");
        }
        missing.extend(self.missing_update_fields());

        match (self.id, self.text, self.is_completed, self.created_at) {
            (Some(id), Some(text), Some(is_completed), Some(created_at)) if missing.is_empty() => {
                Ok(Todo {
                    id,
                    text,
                    is_completed,
                    created_at,
                })
            }
            _ => Err(missing),
        }
    }

    /// Validate a replacement body. `createdAt` must be sent back but is
    /// never applied.
    pub fn into_patch(self) -> Result<TodoPatch, Vec<&'static str>> {
        let missing = self.missing_update_fields();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(TodoPatch {
            text: self.text,
            is_completed: self.is_completed,
        })
    }

    fn missing_update_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.text) {
            missing.push("text");
        }
        if self.is_completed.is_none() {
            missing.push("isCompleted");
        }
        if !present(&self.created_at) {
            missing.push("createdAt");
        }
        missing
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.is_empty())
}

/// Success acknowledgement returned by mutating routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
