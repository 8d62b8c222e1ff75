//! Models: single REST resource instances.
//!
//! # Design
//! A [`Model`] is a named attribute bag behind a cheap shared handle
//! (`Rc<RefCell<..>>`, single-threaded), so a collection and a caller always
//! observe the same instance. Each attribute is either a plain JSON value or
//! a reactive [`Cell`]; merge and snapshot logic dispatches on the kind, so
//! reactive models need no separate code path. Behavior lives in a
//! [`ModelType`]: the derivation chain plus a hook table (`parse`, `apply`,
//! `on_error`, `on_destroy`) resolved derived-over-base.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::entity::{EntityType, InitArgs, Initializer};
use crate::error::RestError;
use crate::reactive::Cell;

/// Attribute holding the identity of a model.
pub const ID_FIELD: &str = "id";

/// Attribute holding a model's own URL override.
pub const URL_FIELD: &str = "url";

/// One attribute of a model: a plain value or an observable cell.
#[derive(Clone)]
pub enum Attr {
    Plain(Value),
    Reactive(Cell<Value>),
}

impl Attr {
    /// The current value, read through the cell when reactive.
    pub fn value(&self) -> Value {
        match self {
            Attr::Plain(value) => value.clone(),
            Attr::Reactive(cell) => cell.read(),
        }
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Plain(value) => write!(f, "Plain({value:?})"),
            Attr::Reactive(cell) => write!(f, "Reactive({:?})", cell.read()),
        }
    }
}

/// Response-body transform hook.
pub type ParseHook = Rc<dyn Fn(&Model, Value) -> Value>;

/// Merge-override hook; returning `false` vetoes the update and every
/// downstream effect of the success path that triggered it.
pub type ApplyHook = Rc<dyn Fn(&Model, &Value) -> bool>;

/// Error-observation hook, invoked by the endpoint before an error propagates.
pub type ErrorHook = Rc<dyn Fn(&Model, &RestError)>;

/// Destruction hook, invoked when a destroy completes (or short-circuits).
pub type DestroyHook = Rc<dyn Fn(&Model)>;

/// Hook table resolved along a derivation chain (derived overrides base).
#[derive(Clone, Default)]
pub struct ModelHooks {
    pub parse: Option<ParseHook>,
    pub apply: Option<ApplyHook>,
    pub on_error: Option<ErrorHook>,
    pub on_destroy: Option<DestroyHook>,
}

/// What a derivation step adds: an initializer, hook overrides, statics.
#[derive(Clone, Default)]
pub struct ModelExtensions {
    pub init: Option<Initializer<Model>>,
    pub parse: Option<ParseHook>,
    pub apply: Option<ApplyHook>,
    pub on_error: Option<ErrorHook>,
    pub on_destroy: Option<DestroyHook>,
    pub statics: BTreeMap<String, Value>,
}

/// A derivable model type: initializer chain, statics, and hooks.
#[derive(Clone)]
pub struct ModelType {
    entity: EntityType<Model>,
    hooks: Rc<ModelHooks>,
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType").finish_non_exhaustive()
    }
}

impl Default for ModelType {
    fn default() -> Self {
        Self::root()
    }
}

impl ModelType {
    /// The root model type. Its initializer merges the first constructor
    /// argument into the attribute bag.
    pub fn root() -> Self {
        let init: Initializer<Model> = Rc::new(|model: &Model, args: &InitArgs| {
            if let Some(data) = args.first() {
                model.merge(data);
            }
        });
        Self {
            entity: EntityType::root().derive(Some(init), BTreeMap::new()),
            hooks: Rc::new(ModelHooks::default()),
        }
    }

    /// Derive a new model type. Initializers chain base-first; hooks and
    /// statics override base-by-name.
    pub fn derive(&self, extensions: ModelExtensions) -> Self {
        Self {
            entity: self.entity.derive(extensions.init, extensions.statics),
            hooks: Rc::new(ModelHooks {
                parse: extensions.parse.or_else(|| self.hooks.parse.clone()),
                apply: extensions.apply.or_else(|| self.hooks.apply.clone()),
                on_error: extensions.on_error.or_else(|| self.hooks.on_error.clone()),
                on_destroy: extensions
                    .on_destroy
                    .or_else(|| self.hooks.on_destroy.clone()),
            }),
        }
    }

    /// Construct an instance, running the initializer chain base-first with
    /// the full argument list.
    pub fn create(&self, args: InitArgs) -> Model {
        let model = Model::blank(self.hooks.clone());
        self.entity.initialize(&model, &args);
        model
    }

    /// Look up a type-level member.
    pub fn static_field(&self, name: &str) -> Option<&Value> {
        self.entity.static_field(name)
    }
}

#[derive(Default)]
struct ModelState {
    attrs: BTreeMap<String, Attr>,
}

/// A single REST resource instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Model {
    state: Rc<RefCell<ModelState>>,
    hooks: Rc<ModelHooks>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model({:?})", self.snapshot())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    fn blank(hooks: Rc<ModelHooks>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ModelState::default())),
            hooks,
        }
    }

    /// An empty root-type model.
    pub fn new() -> Self {
        ModelType::root().create(InitArgs::none())
    }

    /// A root-type model seeded from a JSON object.
    pub fn from_value(data: Value) -> Self {
        ModelType::root().create(InitArgs::one(data))
    }

    /// Read one attribute, through its cell when reactive.
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.state.borrow().attrs.get(name).map(Attr::value)
    }

    /// The reactive cell backing `name`, if that attribute is reactive.
    pub fn cell(&self, name: &str) -> Option<Cell<Value>> {
        match self.state.borrow().attrs.get(name) {
            Some(Attr::Reactive(cell)) => Some(cell.clone()),
            _ => None,
        }
    }

    /// Attach a reactive cell as the attribute `name`. Subsequent merges
    /// write through the cell instead of replacing it.
    pub fn bind(&self, name: impl Into<String>, cell: Cell<Value>) {
        self.state
            .borrow_mut()
            .attrs
            .insert(name.into(), Attr::Reactive(cell));
    }

    /// Set one plain attribute directly.
    pub fn put(&self, name: impl Into<String>, value: Value) {
        self.state
            .borrow_mut()
            .attrs
            .insert(name.into(), Attr::Plain(value));
    }

    /// The identity value, unwrapped from its cell when reactive.
    pub fn get_id(&self) -> Option<Value> {
        self.attr(ID_FIELD)
    }

    /// True iff the identity is absent or falsy.
    pub fn is_new(&self) -> bool {
        match self.get_id() {
            None => true,
            Some(value) => is_falsy(&value),
        }
    }

    /// The model's own URL override, if any.
    pub fn url(&self) -> Option<String> {
        self.attr(URL_FIELD)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// Apply `data` to the model. Runs the type's `apply` hook when present;
    /// otherwise merges. Returns false when the hook vetoes the update.
    pub fn set(&self, data: &Value) -> bool {
        match self.hooks.apply.clone() {
            Some(apply) => apply(self, data),
            None => {
                self.merge(data);
                true
            }
        }
    }

    /// Default application: merge each field of a JSON object into the bag.
    /// An existing reactive attribute is written through its cell, in place;
    /// anything else is assigned as a plain value. Fields not present in
    /// `data` are untouched. Non-object data is ignored.
    pub fn merge(&self, data: &Value) {
        let Some(map) = data.as_object() else { return };
        for (name, value) in map {
            let cell = match self.state.borrow().attrs.get(name) {
                Some(Attr::Reactive(cell)) => Some(cell.clone()),
                _ => None,
            };
            match cell {
                Some(cell) => cell.write(value.clone()),
                None => self.put(name.clone(), value.clone()),
            }
        }
    }

    /// A plain-data snapshot of the bag: every attribute becomes a plain
    /// value, reactive ones read through their cells. Hooks are type-level
    /// behavior and never appear here.
    pub fn snapshot(&self) -> Value {
        let state = self.state.borrow();
        let mut map = Map::new();
        for (name, attr) in &state.attrs {
            map.insert(name.clone(), attr.value());
        }
        Value::Object(map)
    }

    /// Transform a response body before it is applied. Identity by default.
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

    /// Invoke the type's destroy hook, if any.
    pub fn on_destroy(&self) {
        if let Some(hook) = self.hooks.on_destroy.clone() {
            hook(self);
        }
    }
}

/// The empty-identity rule: JSON null, false, 0, and "" count as absent.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
