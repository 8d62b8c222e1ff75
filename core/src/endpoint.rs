//! CRUD orchestration: URL resolution, dispatch, and entity lifecycle.
//!
//! # Design
//! An [`Endpoint`] is stateless per call: it receives models and collections
//! as parameters, resolves the target URL and verb, dispatches through its
//! [`SyncAdapter`], and applies the server response back onto the entity on
//! the success path. Operations are async and complete exactly once; two
//! in-flight operations on one collection interleave in completion order,
//! not issue order, and callers needing sequencing chain on the returned
//! futures.
//!
//! A vetoed response application (`set` returning false) is not an error:
//! the outcome reports [`Saved::Vetoed`] and every downstream effect of that
//! success path (such as `add`'s collection push) is suppressed.

use std::collections::BTreeMap;
use std::rc::Rc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{debug, trace};

use crate::collection::Collection;
use crate::error::RestError;
use crate::http::HttpResponse;
use crate::model::{Model, ModelType};
use crate::sync::{SyncAdapter, SyncConfig, SyncOptions, Transport, Verb};

// Escape everything in an identity segment except unreserved characters and
// the few marks that are safe inside a path segment.
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Custom URL mapping, replacing the default resolution rule entirely.
pub type UrlResolver = Rc<dyn Fn(&Model) -> Option<String>>;

/// Option bag for model-centric operations. Unrecognized caller settings go
/// in `extensions` and reach the transport unmodified.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides URL resolution entirely.
    pub url: Option<String>,
    /// Explicit body override, suppressing the automatic JSON body.
    pub body: Option<String>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Uninterpreted pass-through to the transport.
    pub extensions: BTreeMap<String, Value>,
}

impl RequestOptions {
    fn sync_options(&self, url: String) -> SyncOptions {
        SyncOptions {
            url: Some(url),
            body: self.body.clone(),
            headers: self.headers.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

/// Option bag for collection fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides URL resolution entirely.
    pub url: Option<String>,
    /// Overrides the collection's configured model type.
    pub model: Option<ModelType>,
    /// Append to the current contents instead of replacing them.
    pub append: bool,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Uninterpreted pass-through to the transport.
    pub extensions: BTreeMap<String, Value>,
}

/// Outcome of an operation that applies the server response to a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Saved {
    /// The response was applied; carries the raw response body.
    Applied(Value),
    /// The model's `apply` hook declined the response; nothing was mutated
    /// and downstream effects were skipped. Not an error.
    Vetoed(Value),
}

impl Saved {
    pub fn response(&self) -> &Value {
        match self {
            Saved::Applied(body) | Saved::Vetoed(body) => body,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Saved::Applied(_))
    }
}

/// Outcome of a destroy.
#[derive(Debug, Clone, PartialEq)]
pub enum Destroyed {
    /// The model had no identity; no request was issued.
    Local,
    /// The server acknowledged the delete; carries the raw response body.
    Remote(Value),
}

/// Maps CRUD operations onto HTTP requests and entity lifecycle updates.
pub struct Endpoint<T: Transport> {
    url: Option<String>,
    adapter: SyncAdapter<T>,
    resolver: Option<UrlResolver>,
}

impl<T: Transport> Endpoint<T> {
    pub fn new(transport: T) -> Self {
        Self {
            url: None,
            adapter: SyncAdapter::new(transport),
            resolver: None,
        }
    }

    /// Set the fallback base URL used when neither the options nor the
    /// entity provide one.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Configure the sync adapter's emulation modes.
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.adapter.set_config(config);
        self
    }

    /// Replace the default URL mapping rule entirely.
    pub fn with_url_resolver(mut self, resolver: impl Fn(&Model) -> Option<String> + 'static) -> Self {
        self.resolver = Some(Rc::new(resolver));
        self
    }

    /// Resolve the target URL for a model: the model's own URL, else the
    /// endpoint default, else a configuration error. A new model maps to the
    /// base resource URL; an existing one gets its percent-encoded identity
    /// appended as a path segment.
    pub fn resolve_url(&self, model: &Model) -> Result<String, RestError> {
        if let Some(resolver) = &self.resolver {
            return resolver(model).ok_or(RestError::MissingUrl);
        }
        let base = model
            .url()
            .or_else(|| self.url.clone())
            .ok_or(RestError::MissingUrl)?;
        if model.is_new() {
            return Ok(base);
        }
        let id = model.get_id().unwrap_or(Value::Null);
        let join = if base.ends_with('/') { "" } else { "/" };
        Ok(format!("{base}{join}{}", encode_id(&id)))
    }

    /// POST the model to the resource URL and apply the response.
    pub async fn create(&self, model: &Model, options: &RequestOptions) -> Result<Saved, RestError> {
        self.rest(Verb::Create, model, options).await
    }

    /// GET the model's URL and apply the response.
    pub async fn read(&self, model: &Model, options: &RequestOptions) -> Result<Saved, RestError> {
        self.rest(Verb::Read, model, options).await
    }

    /// PUT the model to its URL and apply the response.
    pub async fn update(&self, model: &Model, options: &RequestOptions) -> Result<Saved, RestError> {
        self.rest(Verb::Update, model, options).await
    }

    /// Create or update, depending on whether the model has an identity.
    pub async fn save(&self, model: &Model, options: &RequestOptions) -> Result<Saved, RestError> {
        if model.is_new() {
            self.create(model, options).await
        } else {
            self.update(model, options).await
        }
    }

    /// DELETE the model. A model with no identity short-circuits: only its
    /// destroy hook runs and nothing touches the network.
    pub async fn destroy(
        &self,
        model: &Model,
        options: &RequestOptions,
    ) -> Result<Destroyed, RestError> {
        if model.is_new() {
            trace!("destroying a model with no identity, skipping the network");
            model.on_destroy();
            return Ok(Destroyed::Local);
        }
        let url = match &options.url {
            Some(url) => url.clone(),
            None => self.resolve_url(model)?,
        };
        let payload = model.snapshot();
        let response = self
            .adapter
            .dispatch(Verb::Delete, Some(&payload), &options.sync_options(url))
            .await;
        let response = match response {
            Ok(response) => response,
            Err(error) => {
                model.on_error(&error);
                return Err(error);
            }
        };
        let body = match decode_body(&response) {
            Ok(body) => body,
            Err(error) => {
                model.on_error(&error);
                return Err(error);
            }
        };
        model.on_destroy();
        Ok(Destroyed::Remote(body))
    }

    /// Create the model against the collection's URL and, when the response
    /// is applied (not vetoed), push it onto the collection.
    pub async fn add(
        &self,
        collection: &Collection,
        model: &Model,
        options: &RequestOptions,
    ) -> Result<Saved, RestError> {
        let url = match &options.url {
            Some(url) => url.clone(),
            None => collection
                .url()
                .or_else(|| self.url.clone())
                .ok_or(RestError::MissingUrl)?,
        };
        let mut options = options.clone();
        options.url = Some(url);
        let outcome = self.rest(Verb::Create, model, &options).await?;
        match &outcome {
            Saved::Applied(_) => collection.push(model.clone()),
            Saved::Vetoed(_) => trace!("vetoed create, skipping the collection push"),
        }
        Ok(outcome)
    }

    /// Load the collection from the server. Without `append`, the contents
    /// are replaced; with it, fetched models land after the existing ones,
    /// in server-response order either way.
    pub async fn fetch(
        &self,
        collection: &Collection,
        options: &FetchOptions,
    ) -> Result<Value, RestError> {
        let url = options
            .url
            .clone()
            .or_else(|| collection.url())
            .or_else(|| self.url.clone())
            .ok_or(RestError::MissingUrl)?;
        let model_type = options
            .model
            .clone()
            .or_else(|| collection.model_type())
            .ok_or(RestError::MissingModel)?;
        debug!(url = %url, append = options.append, "fetching collection");

        let sync = SyncOptions {
            url: Some(url),
            body: None,
            headers: options.headers.clone(),
            extensions: options.extensions.clone(),
        };
        let response = match self.adapter.dispatch(Verb::Read, None, &sync).await {
            Ok(response) => response,
            Err(error) => {
                collection.on_error(&error);
                return Err(error);
            }
        };
        let body = match decode_body(&response) {
            Ok(body) => body,
            Err(error) => {
                collection.on_error(&error);
                return Err(error);
            }
        };
        let parsed = collection.parse(body.clone());
        if !options.append {
            collection.clear();
        }
        collection.append(parsed, Some(&model_type));
        Ok(body)
    }

    /// The shared model-centric routine: resolve the URL, dispatch, and on
    /// success parse and apply the response. Server errors route through the
    /// model's error hook and never mutate it.
    async fn rest(
        &self,
        verb: Verb,
        model: &Model,
        options: &RequestOptions,
    ) -> Result<Saved, RestError> {
        let url = match &options.url {
            Some(url) => url.clone(),
            None => self.resolve_url(model)?,
        };
        debug!(verb = verb.as_str(), url = %url, "model operation");
        let payload = model.snapshot();
        let response = self
            .adapter
            .dispatch(verb, Some(&payload), &options.sync_options(url))
            .await;
        let response = match response {
            Ok(response) => response,
            Err(error) => {
                model.on_error(&error);
                return Err(error);
            }
        };
        let body = match decode_body(&response) {
            Ok(body) => body,
            Err(error) => {
                model.on_error(&error);
                return Err(error);
            }
        };
        let parsed = model.parse(body.clone());
        if model.set(&parsed) {
            Ok(Saved::Applied(body))
        } else {
            Ok(Saved::Vetoed(body))
        }
    }
}

fn encode_id(id: &Value) -> String {
    let text = match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    utf8_percent_encode(&text, ID_SEGMENT).to_string()
}

fn decode_body(response: &HttpResponse) -> Result<Value, RestError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| RestError::Deserialize(e.to_string()))
}
