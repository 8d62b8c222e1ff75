//! Type derivation with chained initialization.
//!
//! # Design
//! Derivation is explicit composition rather than language-level inheritance.
//! An [`EntityType`] holds an ordered list of initializer closures and a map
//! of static (type-level) members. Deriving clones the chain and appends the
//! new initializer, so constructing an instance runs every ancestor's
//! initializer exactly once, base-first, each receiving the full original
//! argument list. A derivation step that supplies no initializer adds nothing
//! to the chain.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// The full argument list passed to a constructor, forwarded unchanged to
/// every initializer in the chain.
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    values: Vec<Value>,
}

impl InitArgs {
    /// No arguments.
    pub fn none() -> Self {
        Self { values: Vec::new() }
    }

    /// A single argument.
    pub fn one(value: Value) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// An explicit argument list.
    pub fn list(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// The first argument, if any.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The argument at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One step of a derivation chain's construction-time initialization.
pub type Initializer<S> = Rc<dyn Fn(&S, &InitArgs)>;

/// A derivable type descriptor: the ordered initializer chain plus any
/// type-level members accumulated along the chain.
pub struct EntityType<S> {
    initializers: Vec<Initializer<S>>,
    statics: BTreeMap<String, Value>,
}

impl<S> Clone for EntityType<S> {
    fn clone(&self) -> Self {
        Self {
            initializers: self.initializers.clone(),
            statics: self.statics.clone(),
        }
    }
}

impl<S> fmt::Debug for EntityType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("initializers", &self.initializers.len())
            .field("statics", &self.statics)
            .finish()
    }
}

impl<S> Default for EntityType<S> {
    fn default() -> Self {
        Self::root()
    }
}

impl<S> EntityType<S> {
    /// The root of a derivation chain: no initializers, no statics.
    pub fn root() -> Self {
        Self {
            initializers: Vec::new(),
            statics: BTreeMap::new(),
        }
    }

    /// Derive a new type: the ancestor chain plus `init` (when given), with
    /// `statics` merged over the ancestors' (derived wins on name clashes).
    /// The result supports further derivation.
    pub fn derive(&self, init: Option<Initializer<S>>, statics: BTreeMap<String, Value>) -> Self {
        let mut initializers = self.initializers.clone();
        if let Some(init) = init {
            initializers.push(init);
        }
        let mut merged = self.statics.clone();
        merged.extend(statics);
        Self {
            initializers,
            statics: merged,
        }
    }

    /// Run the initializer chain on a freshly built instance, base-first,
    /// each step receiving the full original argument list.
    pub fn initialize(&self, target: &S, args: &InitArgs) {
        for init in &self.initializers {
            init(target, args);
        }
    }

    /// Look up a type-level member.
    pub fn static_field(&self, name: &str) -> Option<&Value> {
        self.statics.get(name)
    }
}
