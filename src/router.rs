//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A match yields the
//! route's [`RouteConfig`] and the extracted path arguments; dispatch hands
//! both to a fresh [`RouteInvoker`].

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{debug, error};

use crate::container::Locator;
use crate::error::{Error, Result};
use crate::invoker::RouteInvoker;
use crate::middleware::MiddlewarePipe;
use crate::request::{PathArgs, Request};
use crate::response::Response;
use crate::route::{RouteConfig, RouteSpec};

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<RouteConfig>>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Builds a router from configuration-loaded route tables.
    pub fn from_specs(specs: impl IntoIterator<Item = RouteSpec>) -> Result<Self> {
        let mut router = Self::new();
        for spec in specs {
            let (method, route) = spec.into_route()?;
            router.insert(method, route)?;
        }
        Ok(router)
    }

    /// Registers a route for `method`. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax:
    ///
    /// ```rust
    /// # use branch::{RouteConfig, Router};
    /// # use http::Method;
    /// Router::new()
    ///     .route(Method::GET,    RouteConfig::action("/users/{id}", "ShowUser"))
    ///     .route(Method::DELETE, RouteConfig::action("/users/{id}", "DeleteUser"));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the path is invalid or conflicts with an existing route. Use
    /// [`insert`](Self::insert) to handle that as an error.
    pub fn route(mut self, method: Method, route: RouteConfig) -> Self {
        let path = route.path.clone();
        self.insert(method, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, route: RouteConfig) -> Self { self.route(Method::GET, route) }
    pub fn post(self, route: RouteConfig) -> Self { self.route(Method::POST, route) }
    pub fn put(self, route: RouteConfig) -> Self { self.route(Method::PUT, route) }
    pub fn delete(self, route: RouteConfig) -> Self { self.route(Method::DELETE, route) }

    pub fn insert(&mut self, method: Method, route: RouteConfig) -> Result<()> {
        let path = route.path.clone();
        debug!(%method, %path, "registering route");
        self.routes
            .entry(method)
            .or_default()
            .insert(path.clone(), Arc::new(route))
            .map_err(|e| Error::InvalidRoute { path, message: e.to_string() })
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<(Arc<RouteConfig>, PathArgs)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let route = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((route, params))
    }

    /// Routes one request and produces one response.
    ///
    /// This is the HTTP error boundary: an unmatched route answers `404`, a
    /// dispatch error is logged and answers `500`.
    pub async fn dispatch(&self, locator: &dyn Locator, mut request: Request) -> Response {
        let Some((route, args)) = self.lookup(request.method(), request.path()) else {
            debug!(method = %request.method(), path = request.path(), "no route matched");
            return Response::status(StatusCode::NOT_FOUND);
        };
        request.set_params(args.clone());

        match RouteInvoker::new(locator, request, MiddlewarePipe::new()).invoke(&route, args).await {
            Ok(response) => response,
            Err(e) => {
                error!(path = %route.path, error = %e, "dispatch failed");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
