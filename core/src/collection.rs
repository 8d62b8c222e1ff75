//! Collections: ordered sequences of models with bulk load semantics.
//!
//! # Design
//! A [`Collection`] is a shared handle over an ordered model sequence plus
//! its sync configuration (default URL, default model type for
//! deserialization). The sequence is either a plain `Vec` or an
//! [`ObservableVec`]; every operation dispatches on the store kind, so a
//! reactive collection runs the same logic and additionally notifies
//! subscribers. Order is insertion order and models are never deduplicated
//! by identity.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::entity::{EntityType, InitArgs, Initializer};
use crate::error::RestError;
use crate::model::{Model, ModelType};
use crate::reactive::ObservableVec;

/// Response-body transform hook for collection fetches.
pub type CollectionParseHook = Rc<dyn Fn(&Collection, Value) -> Value>;

/// Error-observation hook, invoked by the endpoint before an error propagates.
pub type CollectionErrorHook = Rc<dyn Fn(&Collection, &RestError)>;

/// Hook table resolved along a derivation chain (derived overrides base).
#[derive(Clone, Default)]
pub struct CollectionHooks {
    pub parse: Option<CollectionParseHook>,
    pub on_error: Option<CollectionErrorHook>,
}

/// What a derivation step adds: an initializer, hook overrides, statics.
#[derive(Clone, Default)]
pub struct CollectionExtensions {
    pub init: Option<Initializer<Collection>>,
    pub parse: Option<CollectionParseHook>,
    pub on_error: Option<CollectionErrorHook>,
    pub statics: BTreeMap<String, Value>,
}

/// Construction-time configuration for a collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionConfig {
    /// Default URL used by endpoint operations on this collection.
    pub url: Option<String>,
    /// Default type used to coerce fetched payloads into models.
    pub model: Option<ModelType>,
    /// Back the sequence with an observable store.
    pub reactive: bool,
}

/// A derivable collection type.
#[derive(Clone)]
pub struct CollectionType {
    entity: EntityType<Collection>,
    hooks: Rc<CollectionHooks>,
}

impl fmt::Debug for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionType").finish_non_exhaustive()
    }
}

impl Default for CollectionType {
    fn default() -> Self {
        Self::root()
    }
}

impl CollectionType {
    /// The root collection type. Its initializer appends the first
    /// constructor argument as seed data.
    pub fn root() -> Self {
        let init: Initializer<Collection> = Rc::new(|collection: &Collection, args: &InitArgs| {
            if let Some(seed) = args.first() {
                collection.append(seed.clone(), None);
            }
        });
        Self {
            entity: EntityType::root().derive(Some(init), BTreeMap::new()),
            hooks: Rc::new(CollectionHooks::default()),
        }
    }

    /// Derive a new collection type. Initializers chain base-first; hooks and
    /// statics override base-by-name.
    pub fn derive(&self, extensions: CollectionExtensions) -> Self {
        Self {
            entity: self.entity.derive(extensions.init, extensions.statics),
            hooks: Rc::new(CollectionHooks {
                parse: extensions.parse.or_else(|| self.hooks.parse.clone()),
                on_error: extensions.on_error.or_else(|| self.hooks.on_error.clone()),
            }),
        }
    }

    /// Construct an instance, running the initializer chain base-first.
    pub fn create(&self, config: CollectionConfig, args: InitArgs) -> Collection {
        let collection = Collection::blank(config, self.hooks.clone());
        self.entity.initialize(&collection, &args);
        collection
    }

    /// Look up a type-level member.
    pub fn static_field(&self, name: &str) -> Option<&Value> {
        self.entity.static_field(name)
    }
}

enum Store {
    Plain(Vec<Model>),
    Reactive(ObservableVec<Model>),
}

struct CollectionState {
    store: Store,
    url: Option<String>,
    model: Option<ModelType>,
}

/// An ordered container of models. Cloning shares the instance.
#[derive(Clone)]
pub struct Collection {
    state: Rc<RefCell<CollectionState>>,
    hooks: Rc<CollectionHooks>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.len())
            .field("url", &self.url())
            .finish()
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new(CollectionConfig::default())
    }
}

impl Collection {
    fn blank(config: CollectionConfig, hooks: Rc<CollectionHooks>) -> Self {
        let store = if config.reactive {
            Store::Reactive(ObservableVec::new())
        } else {
            Store::Plain(Vec::new())
        };
        Self {
            state: Rc::new(RefCell::new(CollectionState {
                store,
                url: config.url,
                model: config.model,
            })),
            hooks,
        }
    }

    /// An empty root-type collection.
    pub fn new(config: CollectionConfig) -> Self {
        CollectionType::root().create(config, InitArgs::none())
    }

    /// A root-type collection pre-populated from `seed` (a JSON array or a
    /// single value), coerced through the configured model type.
    pub fn seeded(config: CollectionConfig, seed: Value) -> Self {
        CollectionType::root().create(config, InitArgs::one(seed))
    }

    /// The collection's configured URL, if any.
    pub fn url(&self) -> Option<String> {
        self.state.borrow().url.clone()
    }

    /// The collection's configured model type, if any.
    pub fn model_type(&self) -> Option<ModelType> {
        self.state.borrow().model.clone()
    }

    /// The observable store, when this collection is reactive.
    pub fn observable(&self) -> Option<ObservableVec<Model>> {
        match &self.state.borrow().store {
            Store::Reactive(observable) => Some(observable.clone()),
            Store::Plain(_) => None,
        }
    }

    /// Snapshot of the current model handles, in order.
    pub fn models(&self) -> Vec<Model> {
        match &self.state.borrow().store {
            Store::Plain(models) => models.clone(),
            Store::Reactive(observable) => observable.items(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.state.borrow().store {
            Store::Plain(models) => models.len(),
            Store::Reactive(observable) => observable.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset the sequence to empty.
    pub fn clear(&self) {
        let observable = match &self.state.borrow().store {
            Store::Reactive(observable) => Some(observable.clone()),
            Store::Plain(_) => None,
        };
        match observable {
            // Notify outside the state borrow: listeners may read back.
            Some(observable) => observable.clear(),
            None => {
                if let Store::Plain(models) = &mut self.state.borrow_mut().store {
                    models.clear();
                }
            }
        }
    }

    /// Append one already-constructed model to the end.
    pub fn push(&self, model: Model) {
        let observable = match &self.state.borrow().store {
            Store::Reactive(observable) => Some(observable.clone()),
            Store::Plain(_) => None,
        };
        match observable {
            Some(observable) => observable.push(model),
            None => {
                if let Store::Plain(models) = &mut self.state.borrow_mut().store {
                    models.push(model);
                }
            }
        }
    }

    /// Turn one raw payload into a model: the override type wins, then the
    /// collection's configured type; with neither, the raw value is wrapped
    /// in a root-type model, its fields preserved verbatim.
    pub fn coerce(&self, data: Value, model: Option<&ModelType>) -> Model {
        match model.cloned().or_else(|| self.model_type()) {
            Some(ty) => ty.create(InitArgs::one(data)),
            None => Model::from_value(data),
        }
    }

    /// Append `data` (an array, element by element in order, or a single
    /// value) after coercion. Existing contents are preserved.
    pub fn append(&self, data: Value, model: Option<&ModelType>) {
        match data {
            Value::Array(items) => {
                for item in items {
                    let coerced = self.coerce(item, model);
                    self.push(coerced);
                }
            }
            item => {
                let coerced = self.coerce(item, model);
                self.push(coerced);
            }
        }
    }

    /// Replace the contents: `clear` then `append`.
    pub fn reset(&self, data: Value, model: Option<&ModelType>) {
        self.clear();
        self.append(data, model);
    }

    /// Transform a response body before it is appended. Identity by default.
    pub fn parse(&self, body: Value) -> Value {
        match self.hooks.parse.clone() {
            Some(parse) => parse(self, body),
            None => body,
        }
    }

    /// Invoke the type's error hook, if any.
    pub fn on_error(&self, error: &RestError) {
        if let Some(hook) = self.hooks.on_error.clone() {
            hook(self, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelExtensions;
    use serde_json::json;

    fn ids(collection: &Collection) -> Vec<Value> {
        collection
            .models()
            .iter()
            .map(|m| m.get_id().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn append_concatenates_regardless_of_chunking() {
        let whole = Collection::default();
        whole.append(json!([{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]), None);

        let chunked = Collection::default();
        chunked.append(json!([{"id": 1}, {"id": 2}]), None);
        chunked.append(json!([{"id": 3}]), None);
        chunked.append(json!({"id": 4}), None);

        assert_eq!(ids(&whole), ids(&chunked));
        assert_eq!(ids(&whole), vec![json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn append_preserves_existing_contents() {
        let collection = Collection::default();
        collection.append(json!([{"id": "a"}]), None);
        collection.append(json!([{"id": "b"}, {"id": "c"}]), None);
        assert_eq!(ids(&collection), vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn append_coerces_every_element_to_the_configured_type() {
        let ty = ModelType::root().derive(ModelExtensions {
            init: Some(Rc::new(|model: &Model, _args: &InitArgs| {
                model.put("kind", json!("task"));
            })),
            ..Default::default()
        });
        let collection = Collection::new(CollectionConfig {
            model: Some(ty),
            ..Default::default()
        });

        collection.append(json!([{"id": 1}, {"id": 2}]), None);
        for model in collection.models() {
            assert_eq!(model.attr("kind"), Some(json!("task")));
        }
    }

    #[test]
    fn coerce_override_wins_over_the_configured_type() {
        let configured = ModelType::root().derive(ModelExtensions {
            init: Some(Rc::new(|model: &Model, _args: &InitArgs| {
                model.put("kind", json!("configured"));
            })),
            ..Default::default()
        });
        let override_ty = ModelType::root().derive(ModelExtensions {
            init: Some(Rc::new(|model: &Model, _args: &InitArgs| {
                model.put("kind", json!("override"));
            })),
            ..Default::default()
        });
        let collection = Collection::new(CollectionConfig {
            model: Some(configured),
            ..Default::default()
        });

        let model = collection.coerce(json!({"id": 1}), Some(&override_ty));
        assert_eq!(model.attr("kind"), Some(json!("override")));
    }

    #[test]
    fn coerce_without_a_type_preserves_the_bag() {
        let collection = Collection::default();
        let model = collection.coerce(json!({"id": 5, "note": "raw"}), None);
        assert_eq!(model.snapshot(), json!({"id": 5, "note": "raw"}));
    }

    #[test]
    fn reset_replaces_contents() {
        let collection = Collection::default();
        collection.append(json!([{"id": 1}, {"id": 2}]), None);
        collection.reset(json!([{"id": 9}]), None);
        assert_eq!(ids(&collection), vec![json!(9)]);
    }

    #[test]
    fn clear_empties_the_sequence() {
        let collection = Collection::default();
        collection.append(json!([{"id": 1}]), None);
        collection.clear();
        assert!(collection.is_empty());
    }

    #[test]
    fn seeded_collections_run_the_root_initializer() {
        let collection = Collection::seeded(
            CollectionConfig::default(),
            json!([{"id": 1}, {"id": 2}]),
        );
        assert_eq!(ids(&collection), vec![json!(1), json!(2)]);
    }

    #[test]
    fn reactive_store_notifies_on_push_and_clear() {
        let collection = Collection::new(CollectionConfig {
            reactive: true,
            ..Default::default()
        });
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let sink = lengths.clone();
        collection
            .observable()
            .expect("reactive store")
            .subscribe(move |models| sink.borrow_mut().push(models.len()));

        collection.append(json!([{"id": 1}, {"id": 2}]), None);
        collection.clear();
        assert_eq!(*lengths.borrow(), vec![1, 2, 0]);
    }

    #[test]
    fn plain_collections_have_no_observable_store() {
        assert!(Collection::default().observable().is_none());
    }

    #[test]
    fn derived_collection_parse_hook_unwraps_an_envelope() {
        let ty = CollectionType::root().derive(CollectionExtensions {
            parse: Some(Rc::new(|_collection: &Collection, body: Value| {
                body.get("items").cloned().unwrap_or(body)
            })),
            ..Default::default()
        });
        let collection = ty.create(CollectionConfig::default(), InitArgs::none());
        assert_eq!(
            collection.parse(json!({"items": [{"id": 1}]})),
            json!([{"id": 1}])
        );
    }
}
