//! The service container.
//!
//! [`Container`] stores [`Definition`]s by id and a [`ClassRegistry`] of
//! constructor shapes. It implements [`Locator`], the read-only view the
//! [`Resolver`] and the route invoker consume.
//!
//! ```rust
//! use branch::{Args, Class, Container, Object, Parameter};
//!
//! struct Mailer { sender: String }
//!
//! let mut container = Container::new();
//! container.register(
//!     Class::new("Mailer", |args: Args| Ok(Object::new(Mailer { sender: args.string("sender")? })))
//!         .param(Parameter::typed("sender", "String")),
//! );
//! container.set("sender", "noreply@example.com", true);
//!
//! let mailer = container.make("Mailer", Default::default()).unwrap();
//! assert_eq!(mailer.downcast::<Mailer>().unwrap().sender, "noreply@example.com");
//! ```

mod class;
mod definition;
mod resolver;

use std::collections::HashMap;

use tracing::debug;

pub use class::{Args, Class, ClassRegistry, Constructor, Parameter};
pub use definition::{Definition, DefinitionClassifier, ObjectDescriptor, Overrides};
pub use resolver::Resolver;

use crate::action::{CALLBACK_ACTION, CallbackAction};
use crate::error::{Error, Result};
use crate::middleware::trace;
use crate::value::{Object, Value};

/// Read access to registered entries, plus object building.
///
/// This is all the resolver and the route invoker ever need from the
/// surrounding container; neither mutates it.
pub trait Locator: Send + Sync {
    /// `true` when an entry named `name` is registered.
    fn has(&self, name: &str) -> bool;

    /// Resolves the entry named `name`. Fails when `has(name)` is false.
    fn get(&self, name: &str) -> Result<Value>;

    /// Builds one object; equivalent to [`Resolver::resolve_object`].
    fn build(&self, descriptor: &ObjectDescriptor) -> Result<Object>;
}

/// Definitions by id plus the classes they may refer to.
///
/// Build it once at startup, then share it behind an `Arc`. `get` resolves
/// the stored definition on every call, so class and closure entries produce
/// a fresh value each time; register an [`Object`] literal to share one
/// instance.
#[derive(Debug)]
pub struct Container {
    definitions: HashMap<String, Definition>,
    classes: ClassRegistry,
}

impl Container {
    /// A container with the built-in classes registered: `CallbackAction`
    /// (also available as an entry of the same name) and `Trace`.
    pub fn new() -> Self {
        let mut container = Self::empty();
        container.register(CallbackAction::class());
        container.register(trace::Trace::class());
        container.set_definition(CALLBACK_ACTION, Definition::ClassName(CALLBACK_ACTION.to_owned()));
        container
    }

    /// A container with nothing registered.
    pub fn empty() -> Self {
        Self { definitions: HashMap::new(), classes: ClassRegistry::new() }
    }

    /// Registers a constructible class.
    ///
    /// Register classes before setting string definitions that name them:
    /// a string is only classified as a class name if the class is known.
    pub fn register(&mut self, class: Class) -> &mut Self {
        debug!(class = class.name(), params = class.parameters().len(), "registering class");
        self.classes.register(class);
        self
    }

    /// Classifies `value` and stores it under `id`.
    ///
    /// With `replace == false` an existing entry is left untouched.
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<Value>, replace: bool) -> &mut Self {
        let definition = DefinitionClassifier::new(&self.classes).classify(value.into());
        self.store(id.into(), definition, replace);
        self
    }

    /// Stores an already classified definition, replacing any previous one.
    pub fn set_definition(&mut self, id: impl Into<String>, definition: Definition) -> &mut Self {
        self.store(id.into(), definition, true);
        self
    }

    pub fn set_multiple<I, K, V>(&mut self, entries: I, replace: bool) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (id, value) in entries {
            self.set(id, value, replace);
        }
        self
    }

    fn store(&mut self, id: String, definition: Definition, replace: bool) {
        if !replace && self.definitions.contains_key(&id) {
            debug!(%id, "keeping existing definition");
            return;
        }
        debug!(%id, ?definition, "storing definition");
        self.definitions.insert(id, definition);
    }

    /// Builds `class` with named argument overrides.
    pub fn make(&self, class: &str, overrides: Overrides) -> Result<Object> {
        self.build(&ObjectDescriptor::with_args(class, overrides))
    }

    /// Resolves `parameters` against the container and calls `f` with the
    /// positional values.
    pub fn call<R>(
        &self,
        parameters: &[Parameter],
        overrides: &Overrides,
        f: impl FnOnce(Vec<Value>) -> R,
    ) -> Result<R> {
        let args = self.resolver().resolve_args(parameters, overrides)?;
        Ok(f(args))
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self, &self.classes)
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }
}

impl Default for Container {
    fn default() -> Self { Self::new() }
}

impl Locator for Container {
    fn has(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<Value> {
        let definition = self.definitions.get(name).ok_or_else(|| Error::NotFound {
            id: name.to_owned(),
        })?;
        self.resolver().resolve(definition, &Overrides::new())
    }

    fn build(&self, descriptor: &ObjectDescriptor) -> Result<Object> {
        self.resolver().resolve_object(descriptor)
    }
}
