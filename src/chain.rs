//! The middleware chain executor.
//!
//! A [`Road`] is an ordered list of [`Handler`]s. Every call to
//! [`Road::request`] walks that list from the start with its own cursor and
//! its own [`Context`]:
//!
//! ```text
//! request ─► m0 ─► m1 ─► … ─► mN ─► (404 Page not found)
//!   ◄──────  m0 ◄─ m1 ◄─ … ◄─ mN
//! ```
//!
//! Each middleware gets control once on the way in and, if it awaited
//! [`Next::run`], once more on the way out, in reverse registration order.
//! A middleware that resolves without calling `next` ends the inbound pass
//! right there.
//!
//! The executor has no error policy. An `Err` travels back through every
//! awaited `next.run(..)` until a middleware maps it to a response, or it
//! reaches the caller.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::Result;
use crate::handler::{boxed, BoxFuture, BoxedHandler, Handler};
use crate::request::{Headers, Request};
use crate::response::Response;

/// The middleware chain.
///
/// Build it once at startup with [`Road::with`]; each call returns `self` so
/// registrations chain naturally. Cloning a road is cheap and shares the list.
///
/// ```rust
/// use road::{from_fn, Road};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> road::Result<()> {
/// let road = Road::new()
///     .with(from_fn(|_cx, req, next| async move {
///         let mut res = next.run(req).await?;
///         res.set_header("x-powered-by", "road");
///         Ok(res)
///     }))
///     .with(from_fn(|_cx, _req, _next| async move { Ok("hello") }));
///
/// let res = road.request("GET", "/", None, vec![]).await?;
/// assert_eq!(res.text(), "hello");
/// assert_eq!(res.header("x-powered-by"), Some("road"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Road {
    chain: Arc<Vec<BoxedHandler>>,
}

impl Road {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware. Returns `self` for chaining.
    pub fn with(mut self, handler: impl Handler) -> Self {
        self.push(handler);
        self
    }

    /// Appends a middleware in place.
    ///
    /// Requests already travelling the road keep the list they started with.
    pub fn push(&mut self, handler: impl Handler) -> &mut Self {
        Arc::make_mut(&mut self.chain).push(boxed(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Sends one request down the road.
    ///
    /// Resolves to the response the chain produced, or to the first error no
    /// middleware caught. An empty road, or one where every middleware called
    /// `next`, resolves to `404 Page not found`.
    pub async fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
        headers: Headers,
    ) -> Result<Response> {
        self.dispatch(Request::new(method, url, body, headers)).await
    }

    /// Like [`request`](Road::request), for a request that is already built.
    pub async fn dispatch(&self, req: Request) -> Result<Response> {
        let method = req.method().to_owned();
        let url = req.url().as_str().to_owned();

        let next = Next {
            chain: Arc::clone(&self.chain),
            cursor: 0,
            cx: Context::new(self.clone()),
        };

        match next.run(req).await {
            Ok(res) => {
                debug!(%method, %url, status = res.status(), "request resolved");
                Ok(res)
            }
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Road {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Road").field("middleware", &self.chain.len()).finish()
    }
}

/// The rest of the chain, as seen by one middleware.
///
/// `run` consumes the continuation, so a middleware continues the chain at
/// most once per request.
pub struct Next {
    chain: Arc<Vec<BoxedHandler>>,
    cursor: usize,
    cx: Context,
}

impl Next {
    /// Hands `req` to the next middleware and resolves to whatever the rest of
    /// the chain produced.
    pub fn run(self, req: Request) -> BoxFuture<Result<Response>> {
        let Some(handler) = self.chain.get(self.cursor).map(Arc::clone) else {
            trace!(path = req.path(), "end of road");
            return Box::pin(async { Ok(Response::not_found()) });
        };

        let cx = self.cx.clone();
        let next = Next { cursor: self.cursor + 1, ..self };
        handler.call(cx, req, next)
    }

    /// The context of the request this continuation belongs to.
    pub fn context(&self) -> &Context {
        &self.cx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;

    #[tokio::test]
    async fn empty_road_resolves_to_not_found() {
        let res = Road::new()
            .request("POST", "/anything?x=1", Some("body".into()), vec![("a".into(), "b".into())])
            .await
            .unwrap();
        assert_eq!(res, Response::not_found());
    }

    #[tokio::test]
    async fn pushing_after_a_clone_leaves_the_clone_alone() {
        let mut road = Road::new().with(from_fn(|_cx, req, next| next.run(req)));
        let snapshot = road.clone();
        road.push(from_fn(|_cx, _req, _next| async { Ok("late") }));

        assert_eq!(road.len(), 2);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.request("GET", "/", None, vec![]).await.unwrap().status(), 404);
        assert_eq!(road.request("GET", "/", None, vec![]).await.unwrap().text(), "late");
    }
}
