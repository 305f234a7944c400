//! Per-request key/value storage.
//!
//! For cross-cutting data that one middleware produces and an unrelated one
//! consumes, typically on the way back out: a route stores the page title, a
//! layout middleware installed further up wraps the body once `next` resolves
//! and reads the title back.
//!
//! ```rust
//! use road::middleware::store::{StoreContext, StoreVals};
//! use road::{from_fn, Response, Road};
//!
//! let road = Road::new()
//!     .with(StoreVals::new())
//!     .with(from_fn(|cx, req, next| async move {
//!         let res = next.run(req).await?;
//!         let title: String = cx.get_val("title")?.unwrap_or_default();
//!         Ok(Response::new(format!("<title>{title}</title>{}", res.text())))
//!     }))
//!     .with(from_fn(|cx, _req, _next| async move {
//!         cx.store_val("title", String::from("Home"))?;
//!         Ok("<p>welcome</p>")
//!     }));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::Next;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Default)]
struct ValStore(HashMap<String, Arc<dyn Any + Send + Sync>>);

/// The value store middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreVals;

impl StoreVals {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for StoreVals {
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        cx.insert(ValStore::default());
        next.run(req)
    }
}

/// Value storage on a [`Context`] travelling behind [`StoreVals`].
pub trait StoreContext {
    /// Stores `val` under `key`, replacing any previous value.
    fn store_val<T: Send + Sync + 'static>(&self, key: &str, val: T) -> Result<()>;

    /// The value under `key`, if one of type `T` was stored.
    fn get_val<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Result<Option<T>>;
}

impl StoreContext for Context {
    fn store_val<T: Send + Sync + 'static>(&self, key: &str, val: T) -> Result<()> {
        self.with(|store: &mut ValStore| {
            store.0.insert(key.to_owned(), Arc::new(val));
        })
        .ok_or(Error::MissingCapability("store_val"))
    }

    fn get_val<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Result<Option<T>> {
        self.with(|store: &mut ValStore| {
            store.0.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
        })
        .ok_or(Error::MissingCapability("get_val"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Road;

    #[test]
    fn values_are_typed() {
        let cx = Context::new(Road::new());
        cx.insert(ValStore::default());

        cx.store_val("title", String::from("Home")).unwrap();
        cx.store_val("count", 3_u32).unwrap();

        assert_eq!(cx.get_val::<String>("title").unwrap(), Some("Home".to_owned()));
        assert_eq!(cx.get_val::<u32>("count").unwrap(), Some(3));
        assert_eq!(cx.get_val::<u32>("title").unwrap(), None);
        assert_eq!(cx.get_val::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn storing_without_the_middleware_fails() {
        let cx = Context::new(Road::new());
        assert!(matches!(cx.store_val("a", 1_u8), Err(Error::MissingCapability(_))));
    }
}
