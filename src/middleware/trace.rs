//! Per-request tracing span with method, path, status and latency.

use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::container::{Args, Class, Parameter};
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::value::Object;

/// Wraps the rest of the pipeline in a `request` span.
///
/// Registered in every [`Container::new`](crate::Container::new) as class
/// `Trace`, with an optional `label` argument (default `"http"`).
#[derive(Debug, Clone)]
pub struct Trace {
    label: String,
}

impl Trace {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    pub fn class() -> Class {
        Class::new("Trace", |args: Args| Ok(Object::middleware(Trace::new(args.string("label")?))))
            .param(Parameter::typed("label", "String").with_default("http"))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Middleware for Trace {
    fn process(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!(
            "request",
            label = %self.label,
            method = %req.method(),
            path = req.path(),
        );
        Box::pin(
            async move {
                let started = Instant::now();
                let response = next.run(req).await;
                info!(
                    status = response.status_code().as_u16(),
                    latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "request completed"
                );
                response
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::container::{Container, ObjectDescriptor};
    use crate::container::Locator;
    use crate::handler::Handler;
    use crate::middleware::MiddlewarePipe;
    use crate::response::Response;

    #[test]
    fn class_defaults_the_label() {
        let object = Container::new().build(&ObjectDescriptor::new("Trace")).unwrap();

        assert!(object.as_middleware().is_some());
        assert_eq!(object.downcast::<Trace>().unwrap().label(), "http");
    }

    #[tokio::test]
    async fn passes_the_response_through() {
        let mut pipe = MiddlewarePipe::new();
        pipe.pipe(std::sync::Arc::new(Trace::new("test")));
        let ok = (|_req: Request| async { Response::text("ok") }).into_boxed_handler();

        let response = pipe.process(Request::new(Method::GET, "/"), ok).await;

        assert_eq!(response.body(), b"ok");
    }
}
