//! Pipeline terminals and closure handlers.
//!
//! The innermost step of every [`MiddlewarePipe`](crate::MiddlewarePipe) is a
//! [`BoxedHandler`]:
//!
//! ```text
//! RouteHandler::Class("ShowUser")
//!        ↓ locator.build → Arc<dyn Action>
//! BoundAction { action, args }          ← path args captured once
//!        ↓ terminal.call(req)
//! action.call(req, args)
//!
//! RouteHandler::Callback(f)             ← f.into_boxed_handler() at route setup
//!        ↓ bound to a fresh CallbackAction
//! BoundAction { CallbackAction, args }
//!        ↓ terminal.call(req)
//! f(req with params set)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::action::Action;
use crate::request::{PathArgs, Request};
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Erased request-to-response step.
pub trait ErasedHandler: Send + Sync {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A shared, type-erased request handler.
pub type BoxedHandler = Arc<dyn ErasedHandler + 'static>;

/// Implemented for every valid closure handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete closure `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// An action together with the path arguments of the current request.
pub(crate) struct BoundAction {
    action: Arc<dyn Action>,
    args: PathArgs,
}

impl BoundAction {
    pub(crate) fn new(action: Arc<dyn Action>, args: PathArgs) -> BoxedHandler {
        Arc::new(Self { action, args })
    }
}

impl ErasedHandler for BoundAction {
    fn call(&self, req: Request) -> BoxFuture {
        self.action.call(req, self.args.clone())
    }
}
