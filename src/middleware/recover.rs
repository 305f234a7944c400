//! Error-to-response translation.
//!
//! The chain itself never turns an error into a response. Install
//! [`Recover`] as the outermost middleware to get a `500` instead of an `Err`
//! from [`Road::request`](crate::Road::request); anything registered after it
//! is covered.

use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use crate::chain::Next;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

type Mapper = Arc<dyn Fn(&Error) -> Response + Send + Sync>;

/// Catches errors raised further down the chain.
#[derive(Clone)]
pub struct Recover {
    map: Mapper,
}

impl Default for Recover {
    fn default() -> Self {
        Self::new()
    }
}

impl Recover {
    /// Maps every error to `500` with the error's message as the body.
    pub fn new() -> Self {
        Self::with(|e| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(e.to_string())
        })
    }

    /// Maps errors with `f`.
    pub fn with(f: impl Fn(&Error) -> Response + Send + Sync + 'static) -> Self {
        Self { map: Arc::new(f) }
    }
}

impl Handler for Recover {
    fn call(&self, _cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        let map = Arc::clone(&self.map);
        let (method, path) = (req.method().to_owned(), req.path().to_owned());
        Box::pin(async move {
            match next.run(req).await {
                Ok(res) => Ok(res),
                Err(e) => {
                    error!(%method, %path, error = %e, "request failed, recovered");
                    Ok(map(&e))
                }
            }
        })
    }
}
