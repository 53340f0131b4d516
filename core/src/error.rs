//! Error types for the car inventory client.
//!
//! # Design
//! `NotFound` gets its own variant because the bulk owner update reports
//! "no matching cars" with a 404 and callers surface a dedicated message for
//! it. Every other non-2xx response lands in `HttpError` with the raw status
//! and body. `Transport` covers requests that never produced a response.

use thiserror::Error;

/// Errors produced while building requests, executing them, or parsing
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request could not be sent or no response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A configuration value could not be parsed.
    #[error("invalid config value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },

    /// The operation is switched off in `InventoryConfig`.
    #[error("{0} is disabled")]
    Disabled(&'static str),
}
