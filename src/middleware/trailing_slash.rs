//! Trailing-slash normalization.
//!
//! `/users/` is redirected (`302`) to `/users`. The root path `/` is left
//! alone. Install it before any router so templates never have to account for
//! the extra empty segment.

use http::StatusCode;

use crate::chain::Next;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Copy, Debug, Default)]
pub struct TrailingSlash;

impl TrailingSlash {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for TrailingSlash {
    fn call(&self, _cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        if let Some(trimmed) = req.path().strip_suffix('/').filter(|t| !t.is_empty()) {
            let res = Response::redirect(StatusCode::FOUND, trimmed);
            return Box::pin(async move { Ok(res) });
        }
        next.run(req)
    }
}
