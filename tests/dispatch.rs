use std::sync::{Arc, Mutex};

use branch::{
    Action, Args, BoxFuture, Class, Container, Middleware, MiddlewareEntry, Next, Object,
    Overrides, Parameter, PathArgs, Request, Response, RouteConfig, RouteHandler, Router, Value,
};
use http::{HeaderName, HeaderValue, Method, StatusCode};

type Log = Arc<Mutex<Vec<String>>>;

struct Auth {
    role: String,
    log: Log,
}

impl Middleware for Auth {
    fn process(&self, req: Request, next: Next) -> BoxFuture {
        let log = Arc::clone(&self.log);
        log.lock().unwrap().push(format!("Auth({})", self.role));
        if req.header("x-role") != Some(self.role.as_str()) {
            return Box::pin(async { Response::status(StatusCode::UNAUTHORIZED) });
        }
        Box::pin(async move {
            let response = next.run(req).await;
            log.lock().unwrap().push("Auth:after".to_owned());
            response.with_header("x-auth", "checked")
        })
    }
}

struct ActionWithArgs {
    greeting: String,
    log: Log,
}

impl Action for ActionWithArgs {
    fn call(&self, req: Request, args: PathArgs) -> BoxFuture {
        let id = args.get("id").cloned().unwrap_or_default();
        self.log.lock().unwrap().push(format!("ActionWithArgs(id={id})"));
        let body = format!("{} {id} via {}", self.greeting, req.path());
        Box::pin(async move { Response::text(body) })
    }
}

fn app(log: &Log) -> (Router, Container) {
    let mut container = Container::new();
    let auth_log = Arc::clone(log);
    let action_log = Arc::clone(log);
    container
        .register(
            Class::new("Auth", move |args: Args| {
                Ok(Object::middleware(Auth { role: args.string("role")?, log: Arc::clone(&auth_log) }))
            })
            .param(Parameter::typed("role", "String")),
        )
        .register(
            Class::new("ActionWithArgs", move |args: Args| {
                Ok(Object::action(ActionWithArgs {
                    greeting: args.string("greeting")?,
                    log: Arc::clone(&action_log),
                }))
            })
            .param(Parameter::typed("greeting", "String").with_default("hi")),
        )
        .set("greeting", "hello", true);

    let admin = Overrides::from([("role".to_owned(), Value::from("admin"))]);
    let router = Router::new()
        .get(
            RouteConfig::action("/x/{id}", "ActionWithArgs")
                .with_middleware(MiddlewareEntry::named("Auth", admin)),
        )
        .get(RouteConfig::callback("/ping/{id}", |req: Request| async move {
            format!("pong {}", req.param("id").unwrap_or("?"))
        }))
        .get(RouteConfig::new("/broken", RouteHandler::Other(Value::from(1))))
        .get(RouteConfig::action("/missing", "NotRegistered"));

    (router, container)
}

fn as_admin(req: Request) -> Request {
    req.with_header(HeaderName::from_static("x-role"), HeaderValue::from_static("admin"))
}

#[tokio::test]
async fn middleware_runs_before_the_action_with_bound_path_args() {
    let log = Log::default();
    let (router, container) = app(&log);

    let response = router
        .dispatch(&container, as_admin(Request::new(Method::GET, "/x/42")))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.body(), b"hello 42 via /x/42");
    assert_eq!(response.header("x-auth"), Some("checked"));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["Auth(admin)", "ActionWithArgs(id=42)", "Auth:after"]
    );
}

#[tokio::test]
async fn short_circuit_returns_the_middleware_response() {
    let log = Log::default();
    let (router, container) = app(&log);

    let response = router.dispatch(&container, Request::new(Method::GET, "/x/42")).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(*log.lock().unwrap(), vec!["Auth(admin)"]);
}

#[tokio::test]
async fn closure_routes_see_path_params() {
    let (router, container) = app(&Log::default());

    let response = router.dispatch(&container, Request::new(Method::GET, "/ping/7")).await;

    assert_eq!(response.body(), b"pong 7");
}

#[tokio::test]
async fn unmatched_routes_answer_404() {
    let (router, container) = app(&Log::default());

    let wrong_path = router.dispatch(&container, Request::new(Method::GET, "/nope")).await;
    let wrong_method = router.dispatch(&container, Request::new(Method::POST, "/x/1")).await;

    assert_eq!(wrong_path.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(wrong_method.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dispatch_errors_answer_500() {
    let (router, container) = app(&Log::default());

    let broken = router.dispatch(&container, Request::new(Method::GET, "/broken")).await;
    let missing = router.dispatch(&container, Request::new(Method::GET, "/missing")).await;

    assert_eq!(broken.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn trace_middleware_is_available_by_default() {
    let container = Container::new();
    let router = Router::new().get(
        RouteConfig::callback("/", |_req: Request| async { "traced" })
            .with_middleware(MiddlewareEntry::class("Trace")),
    );

    let response = router.dispatch(&container, Request::new(Method::GET, "/")).await;

    assert_eq!(response.body(), b"traced");
}
