//! HTTP types for the injectable-transport pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and interprets `HttpResponse` values; the
//! transport implementation is responsible for executing the actual network
//! round-trip. This separation keeps the core deterministic and easy to test.
//!
//! All fields use owned types (`String`, `Vec`, maps) so requests can be
//! recorded, replayed, and handed to any transport without lifetime concerns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// The uppercase wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by the sync adapter. A [`Transport`](crate::sync::Transport)
/// implementation executes it and returns the corresponding [`HttpResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Caller-supplied settings the core does not recognize. Copied verbatim
    /// from the operation's option bag; the transport is free to interpret
    /// them (timeouts, credentials, ...) or ignore them.
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
