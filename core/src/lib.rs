//! Client-side REST synchronization for models and collections.
//!
//! # Overview
//! Maps in-memory models and collections onto a REST HTTP API: an
//! [`Endpoint`] resolves the URL and verb for each CRUD operation, dispatches
//! through an injected [`Transport`], and applies the server response back
//! onto the entity. Attributes may be plain JSON values or reactive
//! [`Cell`]s; the same merge and snapshot logic serves both, so observable
//! view-models need no separate code path.
//!
//! # Design
//! - Models and collections are cheap shared handles (`Rc`-based,
//!   single-threaded); a collection and its caller observe the same
//!   instances.
//! - The transport is a trait taking an [`HttpRequest`] as plain data, which
//!   keeps the core deterministic and easy to test against scripted
//!   responses.
//! - Types derive through explicit initializer chains ([`EntityType`]) that
//!   run base-first exactly once, with hook tables for response parsing,
//!   merge vetoes, and lifecycle observation.
//! - Operations are async and complete exactly once; concurrent operations
//!   on one collection interleave in completion order by design.

pub mod collection;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod http;
pub mod model;
pub mod reactive;
pub mod sync;

pub use collection::{Collection, CollectionConfig, CollectionExtensions, CollectionType};
pub use endpoint::{Destroyed, Endpoint, FetchOptions, RequestOptions, Saved};
pub use entity::{EntityType, InitArgs, Initializer};
pub use error::RestError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{Attr, Model, ModelExtensions, ModelType};
pub use reactive::{Cell, ListenerId, ObservableVec};
pub use sync::{SyncAdapter, SyncConfig, SyncOptions, Transport, Verb};
