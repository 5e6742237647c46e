//! Unified error type.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by branch's fallible operations.
///
/// Resolution and dispatch errors are never recovered inside the crate. The
/// server's dispatch boundary logs them and answers `500 Internal Server
/// Error`; everything else propagates to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A constructor parameter has no override, no locator entry and no default.
    #[error("cannot resolve parameter `{parameter}`{}: no override, no registered entry and no default", type_suffix(.declared_type))]
    MissingType {
        parameter: String,
        declared_type: Option<String>,
    },

    /// A route handler is neither a closure nor a class name.
    #[error("handler type is not recognized for path `{path}`")]
    UnrecognizedHandler { path: String },

    /// A middleware entry is neither a class reference nor a named entry.
    #[error("can't recognize middleware with key `{key}` for path `{path}`")]
    MiddlewareConfiguration { key: String, path: String },

    /// `get` was called for an id the container does not hold.
    #[error("no entry registered for `{id}`")]
    NotFound { id: String },

    /// A descriptor names a class with no registered constructor shape.
    #[error("class `{class}` is not registered")]
    UnknownClass { class: String },

    /// A constructor received an argument of the wrong shape.
    #[error("argument `{parameter}` is not {expected}")]
    InvalidArgument {
        parameter: String,
        expected: &'static str,
    },

    /// A middleware entry built an object that is not a middleware.
    #[error("class `{class}` does not implement Middleware")]
    NotMiddleware { class: String },

    /// A route handler built an object that is not an action.
    #[error("class `{class}` does not implement Action")]
    NotAction { class: String },

    /// The locator handed out a callback action that already has a target.
    #[error("callback action for path `{path}` is already bound")]
    CallbackAlreadyBound { path: String },

    /// A route table entry names an unknown HTTP method.
    #[error("invalid HTTP method `{method}`")]
    InvalidMethod { method: String },

    /// A route path was rejected by the router.
    #[error("invalid route `{path}`: {message}")]
    InvalidRoute { path: String, message: String },

    /// Configuration could not be loaded or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging { message: String },

    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

fn type_suffix(declared_type: &Option<String>) -> String {
    match declared_type {
        Some(ty) => format!(" of type `{ty}`"),
        None => String::new(),
    }
}
