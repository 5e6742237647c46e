//! Built-in health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the process serve traffic? Failure → pulled from the load balancer. |
//!
//! Register them as closure routes:
//!
//! ```rust
//! use branch::{RouteConfig, Router, health};
//!
//! let app = Router::new()
//!     .get(RouteConfig::callback("/healthz", health::liveness))
//!     .get(RouteConfig::callback("/readyz", health::readiness));
//! ```

use crate::{Request, Response};

/// Liveness probe handler. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe handler (default implementation).
///
/// Returns `200 OK` with body `"ready"`. Replace it with your own handler
/// if readiness depends on a warm-up period or on downstream services.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
