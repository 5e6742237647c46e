//! Dynamic values flowing through the container.
//!
//! Everything the resolver hands out is a [`Value`]: literals loaded from
//! configuration, factory closures, and [`Object`]s built from registered
//! classes. Values are cheap to clone: closures and objects are shared
//! behind `Arc`.

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::action::Action;
use crate::container::Locator;
use crate::error::Result;
use crate::middleware::Middleware;

/// A closure definition: invoked with the locator, returns the produced value.
pub type Factory = Arc<dyn Fn(&dyn Locator) -> Result<Value> + Send + Sync + 'static>;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Closure(Factory),
    Object(Object),
}

impl Value {
    /// Wraps a closure into a [`Value::Closure`].
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&dyn Locator) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(f))
    }

    /// Builds a [`Value::Map`] from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Closure(_) => "closure",
            Self::Object(_) => "object",
        }
    }
}

/// Closures and objects compare by identity, everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Closure(a), Self::Closure(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Closure(_) => f.write_str("Closure(..)"),
            Self::Object(o) => write!(f, "Object({})", o.class()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Self::Int(i.into()) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Self::Float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Str(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self { Self::Object(o) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

// ── Deserialization ───────────────────────────────────────────────────────────

/// Values loaded from configuration are always literals: closures and objects
/// only ever come from code.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {v} does not fit in i64")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((k, v)) = map.next_entry::<String, Value>()? {
            entries.insert(k, v);
        }
        Ok(Value::Map(entries))
    }
}

// ── Object ────────────────────────────────────────────────────────────────────

/// What an [`Object`] can be used as besides a plain service.
#[derive(Clone)]
enum Role {
    Service,
    Middleware(Arc<dyn Middleware>),
    Action(Arc<dyn Action>),
}

/// An instance built by a registered class constructor.
///
/// The instance lives behind one `Arc`. Middleware and actions additionally
/// keep a trait-object view of the same allocation, so an object can be both
/// downcast to its concrete type and dispatched through its trait.
#[derive(Clone)]
pub struct Object {
    class: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
    role: Role,
}

impl Object {
    /// A plain service object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            class: Arc::from(type_name::<T>()),
            inner: Arc::new(value),
            role: Role::Service,
        }
    }

    /// An object usable as a middleware in a pipeline.
    pub fn middleware<T: Middleware>(value: T) -> Self {
        let value = Arc::new(value);
        Self {
            class: Arc::from(type_name::<T>()),
            inner: value.clone(),
            role: Role::Middleware(value),
        }
    }

    /// An object usable as the terminal action of a route.
    pub fn action<T: Action>(value: T) -> Self {
        let value = Arc::new(value);
        Self {
            class: Arc::from(type_name::<T>()),
            inner: value.clone(),
            role: Role::Action(value),
        }
    }

    /// Re-tags the object with the class name it was registered under.
    pub(crate) fn with_class(mut self, class: &str) -> Self {
        self.class = Arc::from(class);
        self
    }

    /// The registered class name (the Rust type name for objects built
    /// outside the container).
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Shared handle to the concrete instance, if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    pub fn as_middleware(&self) -> Option<Arc<dyn Middleware>> {
        match &self.role {
            Role::Middleware(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<Arc<dyn Action>> {
        match &self.role {
            Role::Action(a) => Some(Arc::clone(a)),
            _ => None,
        }
    }

    /// `true` when both handles point at the same instance.
    pub fn same_instance(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            Role::Service => "service",
            Role::Middleware(_) => "middleware",
            Role::Action(_) => "action",
        };
        f.debug_struct("Object")
            .field("class", &self.class)
            .field("role", &role)
            .finish()
    }
}
