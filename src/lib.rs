//! # road
//!
//! A minimal request pipeline: an ordered chain of middleware (the [`Road`])
//! that turns `(method, url, body, headers)` into a [`Response`], and a
//! templated path [`Router`] that plugs into that chain as one more
//! middleware.
//!
//! ## The contract
//!
//! - Middleware run in the order they were added. Each one either answers
//!   the request itself or calls [`Next::run`] and gets control back, in
//!   reverse order, once the rest of the chain has answered.
//! - Every request gets its own [`Context`]. Middleware extend it with typed
//!   capabilities (cookies, parsed body, stored values) that later middleware
//!   read back.
//! - Falling off the end of the chain is `404 Page not found`.
//! - Errors are never swallowed. They travel back up until a middleware
//!   chooses to turn them into a response, or reach the caller.
//!
//! What road deliberately leaves to the host: sockets, TLS, timeouts. See
//! [`RoadService`] for the hyper seam.
//!
//! ## Quick start
//!
//! ```rust
//! use road::middleware::{Cookies, TrailingSlash};
//! use road::{from_fn, Arg, Road, Router};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> road::Result<()> {
//! let mut road = Road::new()
//!     .with(TrailingSlash::new())
//!     .with(Cookies::new());
//!
//! Router::new()
//!     .get("/users/#id", from_fn(|_cx, req, _next| async move {
//!         let id = req.param("id").and_then(Arg::as_number).unwrap_or_default();
//!         Ok(format!("user {id}"))
//!     }))
//!     .apply_middleware(&mut road);
//!
//! let res = road.request("GET", "/users/42", None, vec![]).await?;
//! assert_eq!(res.text(), "user 42");
//!
//! let res = road.request("GET", "/users/42/", None, vec![]).await?;
//! assert_eq!((res.status(), res.header("location")), (302, Some("/users/42")));
//! # Ok(())
//! # }
//! ```

mod chain;
mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod service;

pub mod middleware;

pub use chain::{Next, Road};
pub use context::Context;
pub use error::{Error, Result};
pub use handler::{from_fn, BoxFuture, FromFn, Handler};
pub use request::{Arg, Headers, Request, Url};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{AllowedMethods, MethodNotAllowed, RouteFile, Router};
pub use service::RoadService;

pub use http::{Method, StatusCode};
