//! Route configuration: what a matched path dispatches to.

use std::fmt;

use http::Method;
use serde::Deserialize;

use crate::container::{ObjectDescriptor, Overrides};
use crate::error::{Error, Result};
use crate::handler::{BoxedHandler, Handler};
use crate::value::Value;

/// What terminates a route's pipeline.
#[derive(Clone)]
pub enum RouteHandler {
    /// A closure, run through a [`CallbackAction`](crate::CallbackAction).
    Callback(BoxedHandler),
    /// A registered class implementing [`Action`](crate::Action).
    Class(String),
    /// Anything else a route table contained. Rejected at dispatch.
    Other(Value),
}

impl From<Value> for RouteHandler {
    fn from(value: Value) -> Self {
        match value {
            Value::Str(class) => Self::Class(class),
            other => Self::Other(other),
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Class(class) => f.debug_tuple("Class").field(class).finish(),
            Self::Other(value) => f.debug_tuple("Other").field(value).finish(),
        }
    }
}

/// One middleware of a route.
#[derive(Clone, Debug, PartialEq)]
pub enum MiddlewareEntry {
    /// A class name or a `{class, args}` map, already read into a descriptor.
    Bare(ObjectDescriptor),
    /// A class name with constructor overrides.
    Named { name: String, parameters: Overrides },
}

impl MiddlewareEntry {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Bare(ObjectDescriptor::new(name))
    }

    pub fn named(name: impl Into<String>, parameters: Overrides) -> Self {
        Self::Named { name: name.into(), parameters }
    }

    /// What the invoker asks the locator to build.
    pub fn descriptor(&self) -> ObjectDescriptor {
        match self {
            Self::Bare(descriptor) => descriptor.clone(),
            Self::Named { name, parameters } => {
                ObjectDescriptor::with_args(name.as_str(), parameters.clone())
            }
        }
    }

    /// Reads the entry at `index` of a route table's middleware list.
    ///
    /// Accepted shapes:
    ///
    /// ```toml
    /// middleware = [
    ///     "Trace",                                        # bare class name
    ///     { class = "Trace", args = { label = "api" } },  # bare descriptor
    ///     { Auth = { parameters = { role = "admin" } } }, # named
    /// ]
    /// ```
    ///
    /// A map with a `class` key must be a complete descriptor. A named entry
    /// accepts `parameters` and nothing else.
    pub fn from_config(index: usize, item: Value, path: &str) -> Result<Self> {
        let invalid = |key: String| Error::MiddlewareConfiguration { key, path: path.to_owned() };

        let is_descriptor = matches!(&item, Value::Map(map) if map.contains_key("class"));
        if is_descriptor || matches!(item, Value::Str(_)) {
            return ObjectDescriptor::from_value(&item)
                .map(Self::Bare)
                .ok_or_else(|| invalid(index.to_string()));
        }

        match item {
            Value::Map(map) if map.len() == 1 => {
                let Some((name, config)) = map.into_iter().next() else {
                    return Err(invalid(index.to_string()));
                };
                let Value::Map(mut config) = config else {
                    return Err(invalid(name));
                };
                let parameters = match config.remove("parameters") {
                    None => Overrides::new(),
                    Some(Value::Map(parameters)) => parameters.into_iter().collect(),
                    Some(_) => return Err(invalid(name)),
                };
                if !config.is_empty() {
                    return Err(invalid(name));
                }
                Ok(Self::Named { name, parameters })
            }
            _ => Err(invalid(index.to_string())),
        }
    }
}

/// A matched route's dispatch configuration.
#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub path: String,
    pub handler: RouteHandler,
    pub middleware: Vec<MiddlewareEntry>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, handler: RouteHandler) -> Self {
        Self { path: path.into(), handler, middleware: Vec::new() }
    }

    /// A route served by the registered action class `class`.
    pub fn action(path: impl Into<String>, class: impl Into<String>) -> Self {
        Self::new(path, RouteHandler::Class(class.into()))
    }

    /// A route served by a closure handler.
    pub fn callback(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(path, RouteHandler::Callback(handler.into_boxed_handler()))
    }

    /// Appends a middleware; entries run in the order they are added.
    pub fn with_middleware(mut self, entry: MiddlewareEntry) -> Self {
        self.middleware.push(entry);
        self
    }
}

/// A route as written in a configuration file.
#[derive(Clone, Debug, Deserialize)]
pub struct RouteSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    pub handler: Value,
    #[serde(default)]
    pub middleware: Vec<Value>,
}

fn default_method() -> String {
    "GET".to_owned()
}

impl RouteSpec {
    /// Validates the method and middleware shapes and builds the route.
    pub fn into_route(self) -> Result<(Method, RouteConfig)> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidMethod { method: self.method.clone() })?;
        let middleware = self.middleware.into_iter()
            .enumerate()
            .map(|(index, item)| MiddlewareEntry::from_config(index, item, &self.path))
            .collect::<Result<Vec<_>>>()?;

        Ok((method, RouteConfig {
            handler: RouteHandler::from(self.handler),
            path: self.path,
            middleware,
        }))
    }
}
