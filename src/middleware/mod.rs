//! Standard middleware.
//!
//! Each one is an ordinary [`Handler`](crate::Handler) and composes with the
//! others in any order, except where one relies on what another adds to the
//! context:
//!
//! - [`cookie`], [`cors`] and [`body`] run before the routes that read what
//!   they add;
//! - [`trailing_slash`] runs before any router;
//! - [`recover`] and [`trace`] go first so they wrap everything else.
//!
//! Capabilities added to the [`Context`](crate::Context) are read through the
//! extension trait next to the middleware that provides them:
//! [`CookieContext`](cookie::CookieContext),
//! [`BodyContext`](body::BodyContext),
//! [`StoreContext`](store::StoreContext).

pub mod body;
pub mod cookie;
pub mod cors;
pub mod recover;
pub mod store;
pub mod trace;
pub mod trailing_slash;

pub use body::{BodyContext, BodyParser, ParsedBody};
pub use cookie::{CookieContext, CookieOptions, Cookies, SameSite};
pub use cors::Cors;
pub use recover::Recover;
pub use store::{StoreContext, StoreVals};
pub use trace::Trace;
pub use trailing_slash::TrailingSlash;
