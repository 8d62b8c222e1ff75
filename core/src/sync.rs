//! CRUD-to-HTTP translation and the transport seam.
//!
//! # Design
//! The adapter is split into a pure `build_request` (verb + payload + options
//! in, [`HttpRequest`] out) and an async `dispatch` that sends the request
//! through the injected [`Transport`] and interprets the status. Legacy-server
//! emulation (form bodies, method override) is per-adapter configuration, not
//! process-wide state. The transport completes exactly once and never
//! interprets the request's `extensions`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A CRUD operation, with its fixed HTTP method mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    /// create→POST, read→GET, update→PUT, delete→DELETE.
    pub fn http_method(self) -> HttpMethod {
        match self {
            Verb::Create => HttpMethod::Post,
            Verb::Read => HttpMethod::Get,
            Verb::Update => HttpMethod::Put,
            Verb::Delete => HttpMethod::Delete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

/// Per-adapter emulation flags for legacy servers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Rewrite PUT/DELETE to POST, carrying the real method in an
    /// `x-http-method-override` header (and a `_method` form field when
    /// `emulate_json` is also set). For servers that cannot accept those
    /// verbs directly.
    #[serde(default)]
    pub emulate_http: bool,
    /// Re-encode the body as a single `model` form field with
    /// `application/x-www-form-urlencoded`. For servers that cannot read
    /// JSON request bodies.
    #[serde(default)]
    pub emulate_json: bool,
}

/// Resolved per-call parameters handed to the adapter.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// The resolved target URL. Required; the adapter fails fast without it.
    pub url: Option<String>,
    /// Explicit body override. Suppresses the automatic JSON body.
    pub body: Option<String>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Unrecognized caller options, passed through to the transport verbatim.
    pub extensions: BTreeMap<String, Value>,
}

/// The injected network primitive.
///
/// Implementations execute the request asynchronously and complete exactly
/// once with the raw response or a transport failure. The core is
/// single-threaded by contract, so the returned futures need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError>;
}

/// Translates CRUD verbs into concrete requests and runs them through the
/// transport.
#[derive(Debug)]
pub struct SyncAdapter<T> {
    transport: T,
    config: SyncConfig,
}

impl<T: Transport> SyncAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_config(&mut self, config: SyncConfig) {
        self.config = config;
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Build the concrete request for `verb` without touching the network.
    ///
    /// Attaches a JSON-encoded `payload` body for create/update when no
    /// explicit body override is given, then applies the emulation modes.
    pub fn build_request(
        &self,
        verb: Verb,
        payload: Option<&Value>,
        options: &SyncOptions,
    ) -> Result<HttpRequest, RestError> {
        let url = options
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(RestError::MissingUrl)?;

        let mut method = verb.http_method();
        let mut headers = options.headers.clone();
        let mut body = options.body.clone();

        if body.is_none() && matches!(verb, Verb::Create | Verb::Update) {
            if let Some(payload) = payload {
                let encoded = serde_json::to_string(payload)
                    .map_err(|e| RestError::Serialize(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                body = Some(encoded);
            }
        }

        if self.config.emulate_json {
            let mut form = form_urlencoded::Serializer::new(String::new());
            if let Some(data) = &body {
                form.append_pair("model", data);
            }
            if self.config.emulate_http
                && matches!(method, HttpMethod::Put | HttpMethod::Delete)
            {
                form.append_pair("_method", method.as_str());
            }
            body = Some(form.finish());
            headers.retain(|(name, _)| name != "content-type");
            headers.push((
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
        }

        if self.config.emulate_http && matches!(method, HttpMethod::Put | HttpMethod::Delete) {
            headers.push((
                "x-http-method-override".to_string(),
                method.as_str().to_string(),
            ));
            method = HttpMethod::Post;
        }

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            extensions: options.extensions.clone(),
        })
    }

    /// Build, send, and interpret the status: 2xx passes through, anything
    /// else becomes an error. The entity is never touched on this path.
    pub async fn dispatch(
        &self,
        verb: Verb,
        payload: Option<&Value>,
        options: &SyncOptions,
    ) -> Result<HttpResponse, RestError> {
        let request = self.build_request(verb, payload, options)?;
        debug!(
            verb = verb.as_str(),
            method = request.method.as_str(),
            url = %request.url,
            "dispatching"
        );
        let response = self.transport.send(request).await?;
        check_status(response)
    }
}

/// Map non-success statuses to the appropriate `RestError` variant.
fn check_status(response: HttpResponse) -> Result<HttpResponse, RestError> {
    if response.is_success() {
        return Ok(response);
    }
    if response.status == 404 {
        return Err(RestError::NotFound);
    }
    Err(RestError::Server {
        status: response.status,
        body: response.body,
    })
}
