//! Per-request capability bag.
//!
//! A fresh [`Context`] is created by every [`Road::request`] call and handed
//! to each middleware in turn. Middleware extend it with typed slots: the
//! cookie middleware inserts its jar, the body parser its parsed body, and so
//! on. Each slot is read back through an extension trait exported next to the
//! middleware that fills it (`CookieContext`, `BodyContext`, `StoreContext`).
//!
//! Slots live behind a mutex that is only ever held inside the synchronous
//! accessors below, never across an `.await`, so one request's middleware can
//! not deadlock each other and requests never contend: no two requests share a
//! context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::Extensions;

use crate::chain::Road;
use crate::error::Result;
use crate::handler::BoxFuture;
use crate::request::Headers;
use crate::response::Response;

/// The capabilities available to one in-flight request.
///
/// Cloning a `Context` is cheap and yields a handle to the *same* request
/// state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    road: Road,
    slots: Mutex<Extensions>,
}

impl Context {
    pub(crate) fn new(road: Road) -> Self {
        Self { inner: Arc::new(Inner { road, slots: Mutex::new(Extensions::new()) }) }
    }

    /// Issues a sub-request through the same road the current request is
    /// travelling. The sub-request gets its own context.
    pub fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
        headers: Headers,
    ) -> BoxFuture<Result<Response>> {
        let road = self.inner.road.clone();
        let (method, url) = (method.to_owned(), url.to_owned());
        Box::pin(async move { road.request(&method, &url, body, headers).await })
    }

    /// The road this request is travelling.
    pub fn road(&self) -> &Road {
        &self.inner.road
    }

    /// Stores `value` in its type's slot, returning whatever was there.
    pub fn insert<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.slots().insert(value)
    }

    /// A copy of the value in `T`'s slot.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.slots().get::<T>().cloned()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.slots().get::<T>().is_some()
    }

    /// Runs `f` against the value in `T`'s slot, if there is one.
    ///
    /// `f` runs while the slot map is locked: it must not call back into this
    /// context.
    pub fn with<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Send + Sync + 'static,
    {
        self.slots().get_mut::<T>().map(f)
    }

    fn slots(&self) -> MutexGuard<'_, Extensions> {
        // A panicking accessor cannot leave the map half-updated.
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("slots", &self.slots().len()).finish()
    }
}
