//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`; no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_MAX_BODY_BYTES, ServerConfig};
use crate::container::Locator;
use crate::error::Error;
use crate::request::{PathArgs, Request};
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body_bytes: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::bind(config.addr).max_body_bytes(config.max_body_bytes)
    }

    /// Largest request body read before answering `413 Payload Too Large`.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Starts accepting connections and dispatching them through `router`,
    /// resolving middleware and actions from `locator`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve<L: Locator + 'static>(self, router: Router, locator: L) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared read-only across connection tasks.
        let router = Arc::new(router);
        let locator = Arc::new(locator);
        let max_body_bytes = self.max_body_bytes;

        info!(addr = %self.addr, max_body_bytes, "branch listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a SIGTERM stops accepting even
                // when more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let locator = Arc::clone(&locator);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req: hyper::Request<Incoming>| {
                            let router = Arc::clone(&router);
                            let locator = Arc::clone(&locator);
                            async move { handle(&router, &*locator, req, max_body_bytes).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("branch stopped");
        Ok(())
    }
}

/// Reads at most `max_body_bytes` of body, then hands the request to the
/// router's error boundary.
async fn handle<B>(
    router: &Router,
    locator: &dyn Locator,
    req: hyper::Request<B>,
    max_body_bytes: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(path = parts.uri.path(), max_body_bytes, "request body too large");
            return Ok(Response::status(StatusCode::PAYLOAD_TOO_LARGE).into_inner());
        }
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let request = Request::from_parts(parts, body, PathArgs::new());
    Ok(router.dispatch(locator, request).await.into_inner())
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT; elsewhere only Ctrl-C.
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
