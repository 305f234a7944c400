//! The one signature shared by every middleware and every route handler.
//!
//! # How async handlers are stored
//!
//! The road holds middleware of *different* types in one ordered list, and a
//! router holds route handlers of different types in one table. Both use
//! **trait objects** (`dyn Handler`) so everything is stored uniformly.
//!
//! ```text
//! |cx, req, next| async move { … }          ← user writes this
//!        ↓ road.with(f) / router.get("/", f)
//! Arc::new(f) as Arc<dyn Handler>           ← BoxedHandler
//!        ↓  at request time
//! handler.call(cx, req, next)               ← one vtable dispatch
//!        ↓
//! Box::pin(async { f(..).await?.into_response() })  ← BoxFuture
//! ```
//!
//! Types that need configuration (CORS, cookies, the router itself) implement
//! [`Handler`] directly instead of going through a closure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::chain::Next;
use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` lets a multi-threaded executor move the future across
/// threads; nothing in the chain borrows from the caller.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A handler shared by every request travelling down the same road.
pub(crate) type BoxedHandler = Arc<dyn Handler>;

/// Implemented by every middleware and every route handler.
///
/// A handler receives the request's [`Context`], the [`Request`], and the
/// [`Next`] continuation. It either resolves to a response without touching
/// `next` (short-circuit), or awaits `next.run(req)` and returns, possibly
/// after rewriting, what came back.
///
/// It is satisfied automatically by any closure or `fn` of the shape
///
/// ```text
/// Fn(Context, Request, Next) -> impl Future<Output = Result<impl IntoResponse>>
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context, Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        // The closure returns its concrete `Fut`; normalize its output and box
        // the whole thing so the return type matches the trait signature.
        let fut = (self)(cx, req, next);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// Turns a closure into a [`Handler`].
///
/// A closure passed straight to [`Road::with`](crate::Road::with) has to spell
/// out its argument types, and often its error type too. Going through
/// `from_fn` lets the compiler infer both:
///
/// ```rust
/// use road::{from_fn, Road};
///
/// let road = Road::new().with(from_fn(|_cx, req, next| async move {
///     if req.path() == "/ping" {
///         return Ok("pong".into());
///     }
///     next.run(req).await
/// }));
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Context, Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn(f)
}

/// A closure adapted by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut, R> Handler for FromFn<F>
where
    F: Fn(Context, Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        Handler::call(&self.0, cx, req, next)
    }
}

pub(crate) fn boxed(handler: impl Handler) -> BoxedHandler {
    Arc::new(handler)
}
