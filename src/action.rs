//! Terminal steps of a route's pipeline.

use std::fmt;
use std::sync::OnceLock;

use http::StatusCode;
use tracing::error;

use crate::container::Class;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::{PathArgs, Request};
use crate::response::Response;
use crate::value::Object;

/// Container id and class name of [`CallbackAction`].
pub const CALLBACK_ACTION: &str = "CallbackAction";

/// The handler at the end of a route's middleware chain.
///
/// Register an implementation as a class whose constructor returns
/// [`Object::action`]; the route invoker builds a fresh one per request and
/// calls it with the path arguments the router extracted.
pub trait Action: Send + Sync + 'static {
    fn call(&self, req: Request, args: PathArgs) -> BoxFuture;
}

/// Action running a closure handler bound at dispatch time.
///
/// Obtained fresh from the locator for each request; a handler can be bound
/// exactly once.
#[derive(Default)]
pub struct CallbackAction {
    handler: OnceLock<BoxedHandler>,
}

impl CallbackAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class() -> Class {
        Class::new(CALLBACK_ACTION, |_| Ok(Object::action(CallbackAction::new())))
    }

    /// Sets the invocation target. Returns `false` if one was already bound.
    pub fn bind(&self, handler: BoxedHandler) -> bool {
        self.handler.set(handler).is_ok()
    }

    pub fn is_bound(&self) -> bool {
        self.handler.get().is_some()
    }
}

impl fmt::Debug for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAction").field("bound", &self.is_bound()).finish()
    }
}

impl Action for CallbackAction {
    /// The closure sees the path arguments through [`Request::param`].
    fn call(&self, mut req: Request, args: PathArgs) -> BoxFuture {
        req.set_params(args);
        match self.handler.get() {
            Some(handler) => handler.call(req),
            None => {
                error!(path = req.path(), "callback action invoked without a handler");
                Box::pin(async { Response::status(StatusCode::INTERNAL_SERVER_ERROR) })
            }
        }
    }
}
