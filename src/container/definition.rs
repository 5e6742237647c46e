//! Definitions and their classification.

use std::collections::HashMap;
use std::fmt;

use crate::container::class::ClassRegistry;
use crate::value::{Factory, Value};

/// Named constructor arguments supplied by a caller.
///
/// Overrides win over locator lookup and defaults, and are passed to the
/// constructor verbatim.
pub type Overrides = HashMap<String, Value>;

/// Describes one object to build: a class plus named argument overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectDescriptor {
    pub class: String,
    pub args: Overrides,
}

impl ObjectDescriptor {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), args: Overrides::new() }
    }

    pub fn with_args(class: impl Into<String>, args: Overrides) -> Self {
        Self { class: class.into(), args }
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Reads a descriptor out of a class-name string or a `{class, args}` map.
    ///
    /// The class is not checked against any registry; building an unknown
    /// class fails later with [`Error::UnknownClass`](crate::Error::UnknownClass).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(class) => Some(Self::new(class.as_str())),
            Value::Map(_) => descriptor_from_map(value),
            _ => None,
        }
    }
}

fn descriptor_from_map(value: &Value) -> Option<ObjectDescriptor> {
    let map = value.as_map()?;
    let class = map.get("class")?.as_str()?;
    let args = match map.get("args") {
        None => Overrides::new(),
        Some(Value::Map(args)) => args.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Some(_) => return None,
    };
    Some(ObjectDescriptor::with_args(class, args))
}

/// How to produce a value.
#[derive(Clone)]
pub enum Definition {
    /// Invoked with the locator; its return value is the result.
    Closure(Factory),
    /// A class to instantiate with named argument overrides.
    Descriptor(ObjectDescriptor),
    /// A bare registered class name.
    ClassName(String),
    /// Anything else; resolves to itself.
    Literal(Value),
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure(..)"),
            Self::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
            Self::ClassName(c) => f.debug_tuple("ClassName").field(c).finish(),
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
        }
    }
}

/// Decides which kind of [`Definition`] a raw value is.
///
/// The predicates are independent of each other; [`classify`](Self::classify)
/// applies them in the order closure, array-object, string-object, and falls
/// back to a literal.
#[derive(Clone, Copy, Debug)]
pub struct DefinitionClassifier<'a> {
    classes: &'a ClassRegistry,
}

impl<'a> DefinitionClassifier<'a> {
    pub fn new(classes: &'a ClassRegistry) -> Self {
        Self { classes }
    }

    pub fn is_closure_definition(&self, value: &Value) -> bool {
        matches!(value, Value::Closure(_))
    }

    /// A map with a string `class` entry and, if present, a map of `args`.
    pub fn is_array_object_definition(&self, value: &Value) -> bool {
        descriptor_from_map(value).is_some()
    }

    /// A string naming a registered class.
    pub fn is_string_object_definition(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|name| self.classes.contains(name))
    }

    pub fn classify(&self, value: Value) -> Definition {
        if let Value::Closure(factory) = value {
            return Definition::Closure(factory);
        }
        if let Some(descriptor) = descriptor_from_map(&value) {
            return Definition::Descriptor(descriptor);
        }
        if self.is_string_object_definition(&value) {
            if let Value::Str(class) = value {
                return Definition::ClassName(class);
            }
        }
        Definition::Literal(value)
    }
}
