//! Per-request route dispatch.
//!
//! ```text
//! RouteConfig { path, handler, middleware }  +  path args
//!        ↓ build every middleware through the locator   (fail fast)
//!        ↓ build the action, bind the path args         (fail fast)
//!        ↓ pipe middleware in declared order
//! MiddlewarePipe::process(request, action)  →  Response
//! ```
//!
//! Nothing runs until every middleware and the action are built: a malformed
//! route never partially dispatches.

use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, CALLBACK_ACTION, CallbackAction};
use crate::container::{Locator, ObjectDescriptor};
use crate::error::{Error, Result};
use crate::handler::{BoundAction, BoxedHandler};
use crate::middleware::{Middleware, MiddlewarePipe};
use crate::request::{PathArgs, Request};
use crate::response::Response;
use crate::route::{MiddlewareEntry, RouteConfig, RouteHandler};

/// Dispatches one request through its route's pipeline.
///
/// Created per request; [`invoke`](Self::invoke) consumes it.
pub struct RouteInvoker<'a> {
    locator: &'a dyn Locator,
    request: Request,
    pipe: MiddlewarePipe,
    path: String,
}

impl<'a> RouteInvoker<'a> {
    pub fn new(locator: &'a dyn Locator, request: Request, pipe: MiddlewarePipe) -> Self {
        Self { locator, request, pipe, path: String::new() }
    }

    pub async fn invoke(mut self, route: &RouteConfig, args: PathArgs) -> Result<Response> {
        self.path.clone_from(&route.path);

        let middleware = self.build_middleware(&route.middleware)?;
        let action = self.build(&route.handler)?;
        let terminal = BoundAction::new(action, args);

        for m in middleware {
            self.pipe.pipe(m);
        }

        debug!(path = %self.path, middleware = self.pipe.len(), "dispatching route");
        Ok(self.pipe.process(self.request, terminal).await)
    }

    fn build_middleware(&self, entries: &[MiddlewareEntry]) -> Result<Vec<Arc<dyn Middleware>>> {
        entries.iter()
            .map(|entry| {
                let object = self.locator.build(&entry.descriptor())?;
                object.as_middleware().ok_or_else(|| Error::NotMiddleware {
                    class: object.class().to_owned(),
                })
            })
            .collect()
    }

    fn build(&self, handler: &RouteHandler) -> Result<Arc<dyn Action>> {
        match handler {
            RouteHandler::Callback(callback) => self.build_callback(callback),
            RouteHandler::Class(class) => self.build_action(class),
            RouteHandler::Other(value) => {
                debug!(path = %self.path, kind = value.kind(), "unrecognized handler");
                Err(Error::UnrecognizedHandler { path: self.path.clone() })
            }
        }
    }

    fn build_callback(&self, callback: &BoxedHandler) -> Result<Arc<dyn Action>> {
        let not_action = |class: &str| Error::NotAction { class: class.to_owned() };

        let value = self.locator.get(CALLBACK_ACTION)?;
        let object = value.as_object().ok_or_else(|| not_action(CALLBACK_ACTION))?;
        let action = object.downcast::<CallbackAction>().ok_or_else(|| not_action(object.class()))?;

        if !action.bind(Arc::clone(callback)) {
            return Err(Error::CallbackAlreadyBound { path: self.path.clone() });
        }
        Ok(action)
    }

    fn build_action(&self, class: &str) -> Result<Arc<dyn Action>> {
        let object = self.locator.build(&ObjectDescriptor::new(class))?;
        object.as_action().ok_or_else(|| Error::NotAction { class: object.class().to_owned() })
    }
}
