//! Constructor-shape registry.
//!
//! Rust has no runtime reflection, so every constructible class is described
//! up front: its name, its constructor parameters in declared order, and a
//! constructor function receiving the resolved arguments. The resolver only
//! ever looks at these records.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Builds an instance from its resolved constructor arguments.
pub type Constructor = Arc<dyn Fn(Args) -> Result<Object> + Send + Sync + 'static>;

/// One constructor parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    declared_type: Option<String>,
    default: Option<Value>,
}

impl Parameter {
    /// A parameter with no declared type and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), declared_type: None, default: None }
    }

    /// A parameter with a declared type, reported in resolution errors.
    pub fn typed(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self { name: name.into(), declared_type: Some(declared_type.into()), default: None }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn declared_type(&self) -> Option<&str> { self.declared_type.as_deref() }
    pub fn default(&self) -> Option<&Value> { self.default.as_ref() }
    pub fn has_default(&self) -> bool { self.default.is_some() }
}

/// The constructor shape of one registered class.
///
/// A class without parameters stands for a type with no constructor (or a
/// zero-argument one): it is built without any argument resolution.
///
/// ```rust
/// use branch::{Args, Class, Object, Parameter};
///
/// struct Greeter { greeting: String, times: i64 }
///
/// let class = Class::new("Greeter", |args: Args| {
///     Ok(Object::new(Greeter {
///         greeting: args.string("greeting")?,
///         times: args.int("times")?,
///     }))
/// })
/// .param(Parameter::typed("greeting", "String"))
/// .param(Parameter::typed("times", "i64").with_default(1));
///
/// assert_eq!(class.parameters().len(), 2);
/// ```
#[derive(Clone)]
pub struct Class {
    name: String,
    parameters: Vec<Parameter>,
    constructor: Constructor,
}

impl Class {
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Args) -> Result<Object> + Send + Sync + 'static,
    {
        Self { name: name.into(), parameters: Vec::new(), constructor: Arc::new(constructor) }
    }

    /// Appends a constructor parameter. Order of calls is declaration order.
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn parameters(&self) -> &[Parameter] { &self.parameters }

    /// Runs the constructor with positional arguments matching
    /// [`parameters`](Self::parameters).
    pub(crate) fn construct(&self, values: Vec<Value>) -> Result<Object> {
        let entries = self.parameters.iter()
            .map(|p| p.name.clone())
            .zip(values)
            .collect();
        let object = (self.constructor)(Args { entries })?;
        Ok(object.with_class(&self.name))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Constructor arguments, in declared order, addressable by parameter name.
#[derive(Debug, Default)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn value(&self, name: &str) -> Result<Value> {
        self.get(name).cloned().ok_or_else(|| invalid(name, "provided"))
    }

    pub fn string(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::Str(s)) => Ok(s.clone()),
            _ => Err(invalid(name, "a string")),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.get(name).and_then(Value::as_int).ok_or_else(|| invalid(name, "an integer"))
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.get(name).and_then(Value::as_bool).ok_or_else(|| invalid(name, "a boolean"))
    }

    /// The argument as a shared handle to a `T` built by the container.
    pub fn object<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)
            .and_then(Value::as_object)
            .and_then(Object::downcast::<T>)
            .ok_or_else(|| invalid(name, std::any::type_name::<T>()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn invalid(name: &str, expected: &'static str) -> Error {
    Error::InvalidArgument { parameter: name.to_owned(), expected }
}

/// All classes the container knows how to build, by name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Class>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, replacing any previous class with the same name.
    pub fn register(&mut self, class: Class) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize { self.classes.len() }
    pub fn is_empty(&self) -> bool { self.classes.is_empty() }
}
