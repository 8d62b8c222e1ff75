//! Error types for the sync core.
//!
//! # Design
//! Configuration errors (`MissingUrl`, `MissingModel`) are raised before any
//! request is issued, so a failed call never leaves partial state behind.
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status"; all other non-2xx responses land in `Server` with the raw status
//! code and body for debugging.

use thiserror::Error;

/// Errors returned by endpoint and sync-adapter operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// No URL was available from the option bag, the entity, or the endpoint.
    #[error("no \"url\" available: supply one on the options, the entity, or the endpoint")]
    MissingUrl,

    /// A fetch needed a model type and neither the options nor the collection
    /// provided one.
    #[error("no \"model\" type available: supply one on the options or the collection")]
    MissingModel,

    /// The server returned 404 — the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// The transport failed before a response was produced.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The response body could not be deserialized as JSON.
    #[error("deserialization failed: {0}")]
    Deserialize(String),
}
