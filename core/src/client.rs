//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Ack, ErrorBody, Todo, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "/todo".to_string())
    }

    pub fn build_get_todo(&self, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Get, item_path(id))
    }

    pub fn build_create_todo(&self, todo: &Todo) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, "/todo".to_string(), todo)
    }

    pub fn build_update_todo(&self, id: &str, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, item_path(id), input)
    }

    pub fn build_delete_todo(&self, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Delete, item_path(id))
    }

    /// Request that opens the live `snapshot` event stream.
    pub fn build_subscribe(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "/todo/events".to_string())
            .with_header("accept", "text/event-stream")
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode(&response.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 201)?;
        parse_ack(&response.body)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)?;
        parse_ack(&response.body)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)?;
        parse_ack(&response.body)
    }

    /// Decode the `data:` payload of one `snapshot` stream event.
    pub fn parse_snapshot(&self, data: &str) -> Result<Vec<Todo>, ApiError> {
        decode(data)
    }

    fn bare(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest::new(method, format!("{}{path}", self.base_url))
    }

    fn with_json<T: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.bare(method, path).with_json(body))
    }
}

/// Path of a single todo. Ids are caller-chosen strings, so the segment is
/// percent-encoded.
fn item_path(id: &str) -> String {
    format!("/todo/{}", urlencoding::encode(id))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn parse_ack(body: &str) -> Result<(), ApiError> {
    let ack: Ack = decode(body)?;
    if ack.success {
        Ok(())
    } else {
        Err(ApiError::DeserializationError(
            "acknowledgement without success".to_string(),
        ))
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        status if status == expected => Ok(()),
        400 => {
            let message = serde_json::from_str::<ErrorBody>(&response.body)
                .map(|body| body.error)
                .unwrap_or_else(|_| response.body.clone());
            Err(ApiError::BadRequest(message))
        }
        404 => Err(ApiError::NotFound),
        409 => Err(ApiError::Conflict),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
