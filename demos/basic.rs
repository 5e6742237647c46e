//! Minimal branch application: container-built actions and middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'x-role: admin' -X DELETE http://localhost:3000/users/42
//!   curl http://localhost:3000/healthz
//!
//! Routes and container entries can also come from a TOML file passed as the
//! first argument (see `ConfigLoader`).

use std::sync::Arc;

use branch::{
    Action, Args, BoxFuture, Class, ConfigLoader, Container, Middleware, MiddlewareEntry, Next,
    Object, Overrides, Parameter, PathArgs, Request, Response, RouteConfig, Router, Server, Value,
    health, logging,
};
use http::StatusCode;

struct UserStore {
    prefix: String,
}

// GET /users/{id}
struct ShowUser {
    store: Arc<UserStore>,
}

impl Action for ShowUser {
    fn call(&self, _req: Request, args: PathArgs) -> BoxFuture {
        let id = args.get("id").cloned().unwrap_or_default();
        let body = format!(r#"{{"id":"{}{id}","name":"alice"}}"#, self.store.prefix);
        Box::pin(async move { Response::json(body) })
    }
}

// DELETE /users/{id} → 204 No Content
struct DeleteUser;

impl Action for DeleteUser {
    fn call(&self, _req: Request, _args: PathArgs) -> BoxFuture {
        Box::pin(async { Response::status(StatusCode::NO_CONTENT) })
    }
}

/// Lets the request through only when `x-role` matches `role`.
struct RequireRole {
    role: String,
}

impl Middleware for RequireRole {
    fn process(&self, req: Request, next: Next) -> BoxFuture {
        if req.header("x-role") == Some(self.role.as_str()) {
            next.run(req)
        } else {
            Box::pin(async { Response::status(StatusCode::FORBIDDEN) })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), branch::Error> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = std::env::args().nth(1) {
        loader = loader.with_file(path);
    }
    let config = loader.load()?;
    logging::init(&config.logging)?;

    let mut container = Container::new();
    container
        .register(
            Class::new("UserStore", |args: Args| {
                Ok(Object::new(UserStore { prefix: args.string("prefix")? }))
            })
            .param(Parameter::typed("prefix", "String").with_default("u-")),
        )
        .register(
            Class::new("ShowUser", |args: Args| {
                Ok(Object::action(ShowUser { store: args.object::<UserStore>("store")? }))
            })
            .param(Parameter::typed("store", "UserStore")),
        )
        .register(Class::new("DeleteUser", |_| Ok(Object::action(DeleteUser))))
        .register(
            Class::new("RequireRole", |args: Args| {
                Ok(Object::middleware(RequireRole { role: args.string("role")? }))
            })
            .param(Parameter::typed("role", "String")),
        )
        .set("store", "UserStore", true);
    config.apply_definitions(&mut container);

    let admin = Overrides::from([("role".to_owned(), Value::from("admin"))]);
    let mut app = Router::new()
        .get(RouteConfig::action("/users/{id}", "ShowUser").with_middleware(MiddlewareEntry::class("Trace")))
        .delete(
            RouteConfig::action("/users/{id}", "DeleteUser")
                .with_middleware(MiddlewareEntry::class("Trace"))
                .with_middleware(MiddlewareEntry::named("RequireRole", admin)),
        )
        .get(RouteConfig::callback("/healthz", health::liveness))
        .get(RouteConfig::callback("/readyz", health::readiness));
    for spec in config.routes.iter().cloned() {
        let (method, route) = spec.into_route()?;
        app.insert(method, route)?;
    }

    Server::from_config(&config.server).serve(app, container).await
}
