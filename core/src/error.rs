//! Error types for the todo API client.
//!
//! # Design
//! The statuses the service documents (400, 404, 409) get dedicated variants
//! so callers can react to them without inspecting codes. Every other
//! unexpected status lands in `HttpError` with the raw status and body.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: missing fields or malformed JSON; carries the server's message.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 404: the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// 409: a todo with the same id already exists.
    #[error("todo already exists")]
    Conflict,

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
