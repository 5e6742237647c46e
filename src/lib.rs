//! # branch
//!
//! A constructor-injection container and a middleware route dispatcher for
//! small HTTP services.
//!
//! - [`Container`] stores definitions (closures, object descriptors, class
//!   names, literals) and builds objects by resolving each constructor
//!   parameter from an override, a same-named entry, or a default.
//! - [`Router`] maps method + path to a [`RouteConfig`]; for each request a
//!   [`RouteInvoker`] builds the route's middleware and action through the
//!   container and runs them as a [`MiddlewarePipe`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use branch::{
//!     Action, Args, BoxFuture, Class, Container, MiddlewareEntry, Object, Parameter, PathArgs,
//!     Request, Response, RouteConfig, Router, Server,
//! };
//!
//! struct ShowUser { greeting: String }
//!
//! impl Action for ShowUser {
//!     fn call(&self, _req: Request, args: PathArgs) -> BoxFuture {
//!         let body = format!("{}, user {}", self.greeting, args["id"]);
//!         Box::pin(async move { Response::text(body) })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut container = Container::new();
//!     container
//!         .register(
//!             Class::new("ShowUser", |args: Args| {
//!                 Ok(Object::action(ShowUser { greeting: args.string("greeting")? }))
//!             })
//!             .param(Parameter::typed("greeting", "String")),
//!         )
//!         .set("greeting", "hello", true);
//!
//!     let app = Router::new().get(
//!         RouteConfig::action("/users/{id}", "ShowUser")
//!             .with_middleware(MiddlewareEntry::class("Trace")),
//!     );
//!
//!     Server::bind(([0, 0, 0, 0], 3000).into())
//!         .serve(app, container)
//!         .await
//!         .unwrap();
//! }
//! ```

mod action;
mod error;
mod handler;
mod invoker;
mod request;
mod response;
mod route;
mod router;
mod server;
mod value;

pub mod config;
pub mod container;
pub mod health;
pub mod logging;
pub mod middleware;

pub use action::{Action, CALLBACK_ACTION, CallbackAction};
pub use config::{AppConfig, ConfigLoader};
pub use container::{
    Args, Class, Container, Definition, DefinitionClassifier, Locator, ObjectDescriptor, Overrides,
    Parameter, Resolver,
};
pub use error::{Error, Result};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
pub use invoker::RouteInvoker;
pub use middleware::{Middleware, MiddlewarePipe, Next};
pub use request::{PathArgs, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::{MiddlewareEntry, RouteConfig, RouteHandler, RouteSpec};
pub use router::Router;
pub use server::Server;
pub use value::{Factory, Object, Value};
