//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: tracing, authentication, header rewriting.
//!
//! A [`MiddlewarePipe`] runs its middleware strictly in the order they were
//! piped. Each one receives the request and a [`Next`] continuation; it may
//! answer on its own without calling `next`, or forward and post-process:
//!
//! ```rust
//! use branch::middleware::{Middleware, Next};
//! use branch::{BoxFuture, Request};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn process(&self, req: Request, next: Next) -> BoxFuture {
//!         Box::pin(async move {
//!             next.run(req).await.with_header("x-powered-by", "branch")
//!         })
//!     }
//! }
//! ```

pub mod trace;

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;

pub use trace::Trace;

/// One step of a request pipeline.
pub trait Middleware: Send + Sync + 'static {
    fn process(&self, req: Request, next: Next) -> BoxFuture;
}

/// The rest of the pipeline after the current middleware.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    terminal: BoxedHandler,
}

impl Next {
    /// Runs the remaining middleware, then the final handler.
    pub fn run(self, req: Request) -> BoxFuture {
        let current = self.chain.get(self.index).cloned();
        match current {
            Some(middleware) => {
                let next = Next { index: self.index + 1, ..self };
                middleware.process(req, next)
            }
            None => self.terminal.call(req),
        }
    }

    /// Number of middleware still ahead of the final handler.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

/// Ordered chain of middleware executed in front of a final handler.
///
/// Built fresh for every request; [`process`](Self::process) consumes it.
#[derive(Default)]
pub struct MiddlewarePipe {
    queue: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware`; first piped runs first.
    pub fn pipe(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.queue.push(middleware);
        self
    }

    pub fn len(&self) -> usize { self.queue.len() }
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    /// Runs the chain against `req`, with `final_handler` as the innermost step.
    pub fn process(self, req: Request, final_handler: BoxedHandler) -> BoxFuture {
        let next = Next { chain: Arc::from(self.queue), index: 0, terminal: final_handler };
        next.run(req)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::{Method, StatusCode};

    use super::*;
    use crate::handler::Handler;
    use crate::response::Response;

    /// Records its name into a shared log on the way in and on the way out.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn process(&self, req: Request, next: Next) -> BoxFuture {
            let name = self.name;
            let log = Arc::clone(&self.log);
            log.lock().unwrap().push(format!("{name}:in"));
            Box::pin(async move {
                let response = next.run(req).await;
                log.lock().unwrap().push(format!("{name}:out"));
                response.with_header("x-seen-by", name)
            })
        }
    }

    struct Deny;

    impl Middleware for Deny {
        fn process(&self, _req: Request, _next: Next) -> BoxFuture {
            Box::pin(async { Response::status(StatusCode::FORBIDDEN) })
        }
    }

    fn final_handler(log: Arc<Mutex<Vec<String>>>) -> BoxedHandler {
        (move |_req: Request| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("final".to_owned());
                Response::text("done")
            }
        })
        .into_boxed_handler()
    }

    #[tokio::test]
    async fn empty_pipe_calls_the_final_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let response = MiddlewarePipe::new()
            .process(Request::new(Method::GET, "/"), final_handler(Arc::clone(&log)))
            .await;

        assert_eq!(response.body(), b"done");
        assert_eq!(*log.lock().unwrap(), vec!["final"]);
    }

    #[tokio::test]
    async fn middleware_run_in_pipe_order_around_the_final_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipe = MiddlewarePipe::new();
        pipe.pipe(Arc::new(Recorder { name: "outer", log: Arc::clone(&log) }))
            .pipe(Arc::new(Recorder { name: "inner", log: Arc::clone(&log) }));

        let response = pipe
            .process(Request::new(Method::GET, "/"), final_handler(Arc::clone(&log)))
            .await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer:in", "inner:in", "final", "inner:out", "outer:out"]
        );
        assert_eq!(response.header("x-seen-by"), Some("inner"));
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipe = MiddlewarePipe::new();
        pipe.pipe(Arc::new(Recorder { name: "first", log: Arc::clone(&log) }))
            .pipe(Arc::new(Deny))
            .pipe(Arc::new(Recorder { name: "never", log: Arc::clone(&log) }));

        let response = pipe
            .process(Request::new(Method::GET, "/"), final_handler(Arc::clone(&log)))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(*log.lock().unwrap(), vec!["first:in", "first:out"]);
    }

    struct CountRemaining(Arc<Mutex<Vec<usize>>>);

    impl Middleware for CountRemaining {
        fn process(&self, req: Request, next: Next) -> BoxFuture {
            self.0.lock().unwrap().push(next.remaining());
            next.run(req)
        }
    }

    #[tokio::test]
    async fn next_reports_the_middleware_still_ahead() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipe = MiddlewarePipe::new();
        for _ in 0..3 {
            pipe.pipe(Arc::new(CountRemaining(Arc::clone(&seen))));
        }
        assert_eq!(pipe.len(), 3);

        pipe.process(Request::new(Method::GET, "/"), final_handler(Arc::default())).await;

        assert_eq!(*seen.lock().unwrap(), vec![2, 1, 0]);
    }
}
