//! View model for a single-page todo list.
//!
//! # Design
//! `TodoBoard` owns the local UI state that sits on top of server state:
//! the new-todo input, a per-item `Viewing`/`Editing` status with its draft,
//! the set of operations in flight, the duplicate-entry modal and the
//! page-level status. Like `TodoClient` it never performs I/O. Actions return
//! the `HttpRequest` to execute; the host feeds the matching `HttpResponse`
//! back through `complete` (or reports a transport failure through
//! `network_error`).
//!
//! In-flight operations are tracked as a set of `PendingKey`s. Submitting an
//! operation whose key is already pending is a no-op, so a double click
//! never produces two requests.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Todo, UpdateTodo};

const DUPLICATE_TITLE: &str = "This todo already exists";

/// Whether the list can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Loading,
    Ready,
    Error,
}

/// How the board learns about server changes after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-fetch the whole list after every successful mutation.
    Refetch,
    /// Snapshots arrive from the event stream via `apply_snapshot`.
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Viewing,
    Editing { draft: String },
}

/// A todo plus its local, never-persisted view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub todo: Todo,
    pub status: ItemStatus,
}

impl TodoItem {
    pub fn draft(&self) -> Option<&str> {
        match &self.status {
            ItemStatus::Editing { draft } => Some(draft),
            ItemStatus::Viewing => None,
        }
    }
}

/// An operation that may be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingKey {
    Add,
    Edit(String),
    Toggle(String),
    Delete(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modal {
    pub open: bool,
    pub title: String,
}

/// Outcome of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Execute this request, then call `TodoBoard::complete` with the key.
    Send(PendingKey, HttpRequest),
    /// Nothing to do: blank input, unknown item, or already in flight.
    Ignored,
    /// The input matches an existing todo; the duplicate modal is open.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct TodoBoard {
    client: TodoClient,
    policy: RefreshPolicy,
    status: PageStatus,
    items: Vec<TodoItem>,
    input: String,
    pending: HashSet<PendingKey>,
    modal: Modal,
}

impl TodoBoard {
    pub fn new(client: TodoClient, policy: RefreshPolicy) -> Self {
        Self {
            client,
            policy,
            status: PageStatus::Loading,
            items: Vec::new(),
            input: String::new(),
            pending: HashSet::new(),
            modal: Modal::default(),
        }
    }

    pub fn status(&self) -> PageStatus {
        self.status
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.todo.id == id)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Also the `disabled` state of the button that triggers `key`.
    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.pending.contains(key)
    }

    /// Initial fetch of the collection.
    pub fn load(&mut self) -> HttpRequest {
        self.status = PageStatus::Loading;
        self.client.build_list_todos()
    }

    /// Handle the response to a list request built by `load` or `complete`.
    pub fn receive_list(&mut self, response: HttpResponse) -> Result<(), ApiError> {
        match self.client.parse_list_todos(response) {
            Ok(todos) => {
                self.apply_snapshot(todos);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load todos");
                self.status = PageStatus::Error;
                Err(err)
            }
        }
    }

    /// Replace the list with server state. Items still being edited keep
    /// their draft.
    pub fn apply_snapshot(&mut self, todos: Vec<Todo>) {
        let previous = std::mem::take(&mut self.items);
        self.items = todos
            .into_iter()
            .map(|todo| {
                let status = previous
                    .iter()
                    .find(|item| item.todo.id == todo.id)
                    .map(|item| item.status.clone())
                    .unwrap_or(ItemStatus::Viewing);
                TodoItem { todo, status }
            })
            .collect();
        self.status = PageStatus::Ready;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn close_modal(&mut self) {
        self.modal.open = false;
    }

    /// Create a todo from the input, unless it is blank or duplicates an
    /// existing todo's text (case-insensitive).
    pub fn submit_add(&mut self) -> Result<Submission, ApiError> {
        if self.pending.contains(&PendingKey::Add) {
            return Ok(Submission::Ignored);
        }
        let text = self.input.trim();
        if text.is_empty() {
            return Ok(Submission::Ignored);
        }

        let needle = text.to_lowercase();
        if self
            .items
            .iter()
            .any(|item| item.todo.text.trim().to_lowercase() == needle)
        {
            debug!(text, "duplicate todo rejected locally");
            self.modal = Modal {
                open: true,
                title: DUPLICATE_TITLE.to_string(),
            };
            return Ok(Submission::Duplicate);
        }

        let todo = Todo::new(text);
        let request = self.client.build_create_todo(&todo)?;
        Ok(self.send(PendingKey::Add, request))
    }

    /// Enter edit mode, seeding the draft with the current text.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        match self.item_mut(id) {
            Some(item) if item.status == ItemStatus::Viewing => {
                item.status = ItemStatus::Editing {
                    draft: item.todo.text.clone(),
                };
                true
            }
            _ => false,
        }
    }

    pub fn set_draft(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.item_mut(id).map(|item| &mut item.status) {
            Some(ItemStatus::Editing { draft }) => {
                *draft = text.into();
                true
            }
            _ => false,
        }
    }

    /// Leave edit mode, discarding the draft. No request is made.
    pub fn cancel_edit(&mut self, id: &str) -> bool {
        match self.item_mut(id) {
            Some(item) if item.draft().is_some() => {
                item.status = ItemStatus::Viewing;
                true
            }
            _ => false,
        }
    }

    /// Leave edit mode and send the draft as the new text.
    pub fn submit_edit(&mut self, id: &str) -> Result<Submission, ApiError> {
        let key = PendingKey::Edit(id.to_string());
        if self.pending.contains(&key) {
            return Ok(Submission::Ignored);
        }
        let Some(item) = self.item_mut(id) else {
            return Ok(Submission::Ignored);
        };
        let text = match item.draft().map(str::trim) {
            Some(draft) if !draft.is_empty() => draft.to_string(),
            _ => return Ok(Submission::Ignored),
        };

        let input = UpdateTodo {
            text,
            ..UpdateTodo::from_todo(&item.todo)
        };
        item.status = ItemStatus::Viewing;
        let request = self.client.build_update_todo(id, &input)?;
        Ok(self.send(key, request))
    }

    pub fn submit_toggle(&mut self, id: &str) -> Result<Submission, ApiError> {
        let key = PendingKey::Toggle(id.to_string());
        if self.pending.contains(&key) {
            return Ok(Submission::Ignored);
        }
        let Some(item) = self.item(id) else {
            return Ok(Submission::Ignored);
        };

        let mut input = UpdateTodo::from_todo(&item.todo);
        input.is_completed = !input.is_completed;
        let request = self.client.build_update_todo(id, &input)?;
        Ok(self.send(key, request))
    }

    pub fn submit_delete(&mut self, id: &str) -> Result<Submission, ApiError> {
        let key = PendingKey::Delete(id.to_string());
        if self.pending.contains(&key) || self.item(id).is_none() {
            return Ok(Submission::Ignored);
        }
        let request = self.client.build_delete_todo(id);
        Ok(self.send(key, request))
    }

    /// Finish the operation `key` with the server's response.
    ///
    /// On success returns the follow-up list request under
    /// `RefreshPolicy::Refetch`. API errors are logged and returned; the page
    /// stays usable.
    pub fn complete(
        &mut self,
        key: &PendingKey,
        response: HttpResponse,
    ) -> Result<Option<HttpRequest>, ApiError> {
        if !self.pending.remove(key) {
            debug!(?key, "completion for an operation that was not pending");
        }

        let outcome = match key {
            PendingKey::Add => self.client.parse_create_todo(response),
            PendingKey::Edit(_) | PendingKey::Toggle(_) => self.client.parse_update_todo(response),
            PendingKey::Delete(_) => self.client.parse_delete_todo(response),
        };
        if let Err(err) = outcome {
            warn!(?key, error = %err, "todo operation failed");
            return Err(err);
        }

        if *key == PendingKey::Add {
            self.input.clear();
        }
        Ok(match self.policy {
            RefreshPolicy::Refetch => Some(self.client.build_list_todos()),
            RefreshPolicy::Live => None,
        })
    }

    /// The host could not reach the server. Clears `key` (if any) and puts
    /// the page into the error state.
    pub fn network_error(&mut self, key: Option<&PendingKey>, message: &str) {
        if let Some(key) = key {
            self.pending.remove(key);
        }
        warn!(?key, message, "request failed to reach the server");
        self.status = PageStatus::Error;
    }

    fn send(&mut self, key: PendingKey, request: HttpRequest) -> Submission {
        debug!(?key, method = %request.method, path = %request.path, "sending");
        self.pending.insert(key.clone());
        Submission::Send(key, request)
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut TodoItem> {
        self.items.iter_mut().find(|item| item.todo.id == id)
    }
}
